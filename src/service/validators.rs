//! Rules deciding whether a social action is allowed right now.

use chrono::{DateTime, Duration, Utc};

use crate::data::Database;
use crate::error::AppError;

/// Length of the rolling posting window
pub const POSTING_WINDOW_HOURS: i64 = 24;

/// Start of the rolling window ending at `now`.
///
/// Posts created strictly after this instant count toward the limit.
pub fn posting_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(POSTING_WINDOW_HOURS)
}

/// A user may follow anyone but themselves.
///
/// Whether the target exists is the caller's concern.
pub fn can_follow(actor_id: &str, target_id: &str) -> Result<(), AppError> {
    if actor_id == target_id {
        return Err(AppError::SelfFollow);
    }
    Ok(())
}

/// Fails once `recent_posts` has reached `limit`.
pub fn check_daily_limit(recent_posts: i64, limit: u32) -> Result<(), AppError> {
    if recent_posts >= i64::from(limit) {
        return Err(AppError::DailyLimitExceeded { limit });
    }
    Ok(())
}

/// Check the posting limit for `user_id` over the 24 hours before `now`.
pub async fn can_post(
    db: &Database,
    user_id: &str,
    limit: u32,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let recent = db
        .count_posts_since(user_id, posting_window_start(now))
        .await?;
    check_daily_limit(recent, limit)
}

/// Trim a post body and reject empty or overlong text.
pub fn validate_body(body: &str, max_chars: usize) -> Result<String, AppError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(AppError::InvalidPayload(
            "body must not be empty".to_string(),
        ));
    }

    let length = body.chars().count();
    if length > max_chars {
        return Err(AppError::InvalidPayload(format!(
            "body must be at most {max_chars} characters, got {length}"
        )));
    }

    Ok(body.to_string())
}
