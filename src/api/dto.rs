//! API request and response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::PostKind;

/// User profile response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
    /// Whether the requesting user follows this user
    pub is_following: bool,
}

/// Minimal author info embedded in posts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorResponse {
    pub id: String,
    pub username: String,
}

/// Post response
///
/// `parent` is populated for reposts and quote posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub kind: PostKind,
    pub body: Option<String>,
    pub author: AuthorResponse,
    pub parent_id: Option<String>,
    pub parent: Option<Box<PostResponse>>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /posts/` and `POST /posts/:post_id/quote`
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    pub body: String,
}

/// `?page=N`
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
}

/// `?query=all|following&page=N`
#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
    pub query: Option<String>,
    pub page: Option<u32>,
}
