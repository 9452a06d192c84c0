//! Post and feed endpoints

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use axum_extra::extract::WithRejection;

use super::converters::post_to_response;
use super::dto::{CreatePostRequest, FeedParams, PostResponse};
use crate::AppState;
use crate::auth::{CurrentUser, MaybeUser};
use crate::error::AppError;
use crate::service::{FeedMode, FeedService, Page, PageRequest, PostService};

/// GET /posts/
///
/// `query` selects the feed (`all` by default), `page` is 1-based.
pub async fn list_posts(
    State(state): State<AppState>,
    viewer: MaybeUser,
    WithRejection(Query(params), _): WithRejection<Query<FeedParams>, AppError>,
) -> Result<Json<Page<PostResponse>>, AppError> {
    let mode = match params.query.as_deref() {
        Some(query) => query.parse::<FeedMode>()?,
        None => FeedMode::default(),
    };
    let page = PageRequest::new(
        params.page.unwrap_or(1),
        state.config.pagination.feed_page_size,
    )?;

    let feed = FeedService::new(state.db.clone())
        .feed(viewer.user_id(), mode, page)
        .await?;

    Ok(Json(feed.map(post_to_response)))
}

/// POST /posts/
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    WithRejection(Json(req), _): WithRejection<Json<CreatePostRequest>, AppError>,
) -> Result<Json<PostResponse>, AppError> {
    let view = PostService::new(state.db.clone(), state.config.posting.clone())
        .create_post(&session.user_id, &req.body)
        .await?;

    Ok(Json(post_to_response(view)))
}

/// POST /posts/:post_id/repost
pub async fn repost(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(post_id): Path<String>,
) -> Result<Json<PostResponse>, AppError> {
    let view = PostService::new(state.db.clone(), state.config.posting.clone())
        .create_repost(&session.user_id, &post_id)
        .await?;

    Ok(Json(post_to_response(view)))
}

/// POST /posts/:post_id/quote
pub async fn quote(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(post_id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<CreatePostRequest>, AppError>,
) -> Result<Json<PostResponse>, AppError> {
    let view = PostService::new(state.db.clone(), state.config.posting.clone())
        .create_quote_post(&session.user_id, &post_id, &req.body)
        .await?;

    Ok(Json(post_to_response(view)))
}
