//! Data models
//!
//! Rust structs representing database rows.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered user
///
/// Users are created by an external registration flow (or the seed list at
/// startup) and are read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate counts shown on a profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct UserStats {
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
}

// =============================================================================
// Follow relationships
// =============================================================================

/// `follower_id` sees posts authored by `followee_id`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub id: String,
    pub follower_id: String,
    pub followee_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Post
// =============================================================================

/// A post, repost or quote post
///
/// The kind is not stored; it follows from which of `body` and `parent_id`
/// are present (see [`Post::kind`]).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    /// Text content, `None` for reposts
    pub body: Option<String>,
    /// Referenced post for reposts and quote posts
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn kind(&self) -> PostKind {
        match (&self.body, &self.parent_id) {
            (None, Some(_)) => PostKind::Repost,
            (Some(_), Some(_)) => PostKind::Quote,
            _ => PostKind::Post,
        }
    }
}

/// Kind of post, derived from its shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    /// Original content, no parent
    Post,
    /// No content, re-displays the parent
    Repost,
    /// Own content alongside the parent
    Quote,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Repost => "repost",
            Self::Quote => "quote",
        }
    }
}

/// Post row joined with its author's username
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostWithAuthor {
    #[sqlx(flatten)]
    pub post: Post,
    pub author_username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(body: Option<&str>, parent_id: Option<&str>) -> Post {
        Post {
            id: EntityId::new().0,
            author_id: EntityId::new().0,
            body: body.map(str::to_string),
            parent_id: parent_id.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn kind_follows_body_and_parent() {
        assert_eq!(post(Some("hi"), None).kind(), PostKind::Post);
        assert_eq!(post(None, Some("p")).kind(), PostKind::Repost);
        assert_eq!(post(Some("hi"), Some("p")).kind(), PostKind::Quote);
    }

    #[test]
    fn entity_ids_sort_by_creation() {
        let first = EntityId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = EntityId::new();
        assert!(first.0 < second.0);
    }
}
