//! Conversion functions from service views to API DTOs

use crate::api::dto::*;
use crate::service::{PostView, UserProfile};

/// Convert a profile to `UserResponse`
pub fn profile_to_response(profile: UserProfile, is_following: bool) -> UserResponse {
    let UserProfile { user, stats } = profile;

    UserResponse {
        display_name: user
            .display_name
            .clone()
            .unwrap_or_else(|| user.username.clone()),
        id: user.id,
        username: user.username,
        created_at: user.created_at,
        followers_count: stats.followers_count,
        following_count: stats.following_count,
        posts_count: stats.posts_count,
        is_following,
    }
}

/// Convert a rendered post to `PostResponse`
pub fn post_to_response(view: PostView) -> PostResponse {
    let PostView {
        post,
        author_username,
        parent,
    } = view;

    PostResponse {
        kind: post.kind(),
        author: AuthorResponse {
            id: post.author_id,
            username: author_username,
        },
        parent: parent.map(|parent| Box::new(post_to_response(*parent))),
        id: post.id,
        body: post.body,
        parent_id: post.parent_id,
        created_at: post.created_at,
    }
}
