//! Feed service
//!
//! Assembles the global feed and the feed of followed users.

use std::str::FromStr;
use std::sync::Arc;

use super::page::{Page, PageRequest};
use super::post::{PostView, render_posts};
use crate::data::Database;
use crate::error::AppError;
use crate::metrics::start_db_timer;

/// Which posts a feed contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedMode {
    /// Every post
    #[default]
    All,
    /// Posts by users the viewer follows, excluding the viewer's own
    Following,
}

impl FeedMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Following => "following",
        }
    }
}

impl FromStr for FeedMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "following" => Ok(Self::Following),
            other => Err(AppError::InvalidPayload(format!(
                "query must be one of: all, following (got {other:?})"
            ))),
        }
    }
}

/// Feed service
pub struct FeedService {
    db: Arc<Database>,
}

impl FeedService {
    /// Create new feed service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get one page of the feed, newest first
    ///
    /// An anonymous viewer follows nobody, so their `Following` feed is empty.
    pub async fn feed(
        &self,
        viewer_id: Option<&str>,
        mode: FeedMode,
        page: PageRequest,
    ) -> Result<Page<PostView>, AppError> {
        let _timer = start_db_timer("SELECT", "posts");

        let (rows, count) = match (mode, viewer_id) {
            (FeedMode::All, _) => (
                self.db.get_all_posts(page.size, page.offset()).await?,
                self.db.count_all_posts().await?,
            ),
            (FeedMode::Following, Some(viewer_id)) => (
                self.db
                    .get_following_posts(viewer_id, page.size, page.offset())
                    .await?,
                self.db.count_following_posts(viewer_id).await?,
            ),
            (FeedMode::Following, None) => (Vec::new(), 0),
        };

        tracing::debug!(
            viewer_id = ?viewer_id,
            mode = mode.as_str(),
            page = page.number,
            returned = rows.len(),
            total = count,
            "Feed assembled"
        );

        Ok(Page {
            items: render_posts(&self.db, rows).await?,
            count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PostingConfig;
    use crate::data::{EntityId, User};
    use crate::service::{PostService, UserService};
    use chrono::Utc;
    use tempfile::TempDir;

    async fn create_test_db() -> (Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("service-feed.db");
        let db = Database::connect(&db_path).await.unwrap();
        (Arc::new(db), temp_dir)
    }

    async fn seed_user(db: &Database, username: &str) -> User {
        let user = User {
            id: EntityId::new().0,
            username: username.to_string(),
            display_name: None,
            created_at: Utc::now(),
        };
        db.insert_user_if_absent(&user).await.unwrap();
        user
    }

    fn first_page() -> PageRequest {
        PageRequest::new(1, 10).unwrap()
    }

    #[test]
    fn feed_mode_parses_known_values() {
        assert_eq!("all".parse::<FeedMode>().unwrap(), FeedMode::All);
        assert_eq!(
            "Following".parse::<FeedMode>().unwrap(),
            FeedMode::Following
        );
        assert!(matches!(
            "friends".parse::<FeedMode>(),
            Err(AppError::InvalidPayload(_))
        ));
    }

    #[tokio::test]
    async fn following_feed_excludes_own_and_unfollowed_posts() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let carol = seed_user(&db, "carol").await;

        let users = UserService::new(db.clone());
        let posts = PostService::new(db.clone(), PostingConfig::default());
        let feed = FeedService::new(db.clone());

        users.follow(&alice.id, &bob.id).await.unwrap();
        let bobs = posts.create_post(&bob.id, "from bob").await.unwrap();
        posts.create_post(&carol.id, "from carol").await.unwrap();
        posts.create_post(&alice.id, "from alice").await.unwrap();

        let page = feed
            .feed(Some(alice.id.as_str()), FeedMode::Following, first_page())
            .await
            .unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].post.id, bobs.post.id);

        let all = feed
            .feed(Some(alice.id.as_str()), FeedMode::All, first_page())
            .await
            .unwrap();
        assert_eq!(all.count, 3);
        let bodies: Vec<_> = all
            .items
            .iter()
            .filter_map(|view| view.post.body.clone())
            .collect();
        assert_eq!(bodies, vec!["from alice", "from carol", "from bob"]);
    }

    #[tokio::test]
    async fn unfollowing_removes_posts_from_following_feed() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;

        let users = UserService::new(db.clone());
        let posts = PostService::new(db.clone(), PostingConfig::default());
        let feed = FeedService::new(db.clone());

        users.follow(&alice.id, &bob.id).await.unwrap();
        posts.create_post(&bob.id, "hello").await.unwrap();
        users.unfollow(&alice.id, &bob.id).await.unwrap();

        let page = feed
            .feed(Some(alice.id.as_str()), FeedMode::Following, first_page())
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.count, 0);
    }

    #[tokio::test]
    async fn anonymous_following_feed_is_empty() {
        let (db, _temp_dir) = create_test_db().await;
        let bob = seed_user(&db, "bob").await;
        let posts = PostService::new(db.clone(), PostingConfig::default());
        let feed = FeedService::new(db.clone());

        posts.create_post(&bob.id, "hello").await.unwrap();

        let following = feed
            .feed(None, FeedMode::Following, first_page())
            .await
            .unwrap();
        assert!(following.items.is_empty());

        let all = feed.feed(None, FeedMode::All, first_page()).await.unwrap();
        assert_eq!(all.items.len(), 1);
    }

    #[tokio::test]
    async fn reposts_in_feed_carry_their_parent() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let posts = PostService::new(db.clone(), PostingConfig::default());
        let feed = FeedService::new(db.clone());

        let original = posts.create_post(&alice.id, "original").await.unwrap();
        posts
            .create_repost(&bob.id, &original.post.id)
            .await
            .unwrap();

        let page = feed.feed(None, FeedMode::All, first_page()).await.unwrap();
        let repost = &page.items[0];
        assert!(repost.post.body.is_none());
        assert_eq!(
            repost.parent.as_ref().map(|parent| parent.post.id.as_str()),
            Some(original.post.id.as_str())
        );
    }
}
