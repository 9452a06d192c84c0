//! User endpoints

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use axum_extra::extract::WithRejection;

use super::converters::{post_to_response, profile_to_response};
use super::dto::{PageParams, PostResponse, UserResponse};
use crate::AppState;
use crate::auth::{CurrentUser, MaybeUser};
use crate::error::AppError;
use crate::service::{Page, PageRequest, PostService, UserService};

/// GET /users/:user_id
pub async fn get_user(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user_service = UserService::new(state.db.clone());
    let profile = user_service.profile(&user_id).await?;
    let is_following = user_service
        .is_following(viewer.user_id(), &user_id)
        .await?;

    Ok(Json(profile_to_response(profile, is_following)))
}

/// POST /users/:user_id/follow
pub async fn follow_user(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<()>, AppError> {
    UserService::new(state.db.clone())
        .follow(&session.user_id, &user_id)
        .await?;

    Ok(Json(()))
}

/// POST /users/:user_id/unfollow
pub async fn unfollow_user(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<()>, AppError> {
    UserService::new(state.db.clone())
        .unfollow(&session.user_id, &user_id)
        .await?;

    Ok(Json(()))
}

/// GET /users/:user_id/posts
pub async fn get_user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    WithRejection(Query(params), _): WithRejection<Query<PageParams>, AppError>,
) -> Result<Json<Page<PostResponse>>, AppError> {
    let page = PageRequest::new(
        params.page.unwrap_or(1),
        state.config.pagination.user_posts_page_size,
    )?;
    let posts = PostService::new(state.db.clone(), state.config.posting.clone())
        .user_posts(&user_id, page)
        .await?;

    Ok(Json(posts.map(post_to_response)))
}
