//! API layer
//!
//! HTTP handlers for:
//! - Users and follow relationships
//! - Posts, reposts, quote posts and feeds
//! - Metrics (Prometheus)

mod converters;
mod dto;
pub mod metrics;
mod posts;
mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub use converters::*;
pub use dto::*;
pub use metrics::metrics_router;

/// Create the Posterr API router
///
/// `/posts` and `/posts/` are both routed to the same handlers. Every routed
/// request, including rejected ones, is recorded in the HTTP metrics.
pub fn posterr_api_router() -> Router<AppState> {
    Router::new()
        .route("/users/:user_id", get(users::get_user))
        .route("/users/:user_id/follow", post(users::follow_user))
        .route("/users/:user_id/unfollow", post(users::unfollow_user))
        .route("/users/:user_id/posts", get(users::get_user_posts))
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/", get(posts::list_posts).post(posts::create_post))
        .route("/posts/:post_id/repost", post(posts::repost))
        .route("/posts/:post_id/quote", post(posts::quote))
        .route_layer(axum::middleware::from_fn(
            crate::metrics::track_http_metrics,
        ))
}
