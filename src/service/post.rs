//! Post service
//!
//! Creates posts, reposts and quote posts under the daily limit, and
//! renders stored posts together with the post they reference.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use super::page::{Page, PageRequest};
use super::validators;
use crate::config::PostingConfig;
use crate::data::{Database, EntityId, Post, PostWithAuthor};
use crate::error::AppError;
use crate::metrics::{POST_LIMIT_REJECTIONS_TOTAL, POSTS_CREATED_TOTAL, start_db_timer};

/// A post ready for display
///
/// Reposts and quote posts carry their parent, one level deep.
#[derive(Debug, Clone)]
pub struct PostView {
    pub post: Post,
    pub author_username: String,
    pub parent: Option<Box<PostView>>,
}

impl From<PostWithAuthor> for PostView {
    fn from(row: PostWithAuthor) -> Self {
        Self {
            post: row.post,
            author_username: row.author_username,
            parent: None,
        }
    }
}

/// Attach parents to `rows`, loading them in one batch query.
pub(crate) async fn render_posts(
    db: &Database,
    rows: Vec<PostWithAuthor>,
) -> Result<Vec<PostView>, AppError> {
    let mut parent_ids: Vec<String> = rows
        .iter()
        .filter_map(|row| row.post.parent_id.clone())
        .collect();
    parent_ids.sort();
    parent_ids.dedup();

    let parents: HashMap<String, PostView> = db
        .get_posts_by_ids(&parent_ids)
        .await?
        .into_iter()
        .map(|row| (row.post.id.clone(), PostView::from(row)))
        .collect();

    Ok(rows
        .into_iter()
        .map(|row| {
            let parent = row
                .post
                .parent_id
                .as_ref()
                .and_then(|id| parents.get(id))
                .cloned()
                .map(Box::new);
            PostView {
                parent,
                ..PostView::from(row)
            }
        })
        .collect())
}

/// Post service
pub struct PostService {
    db: Arc<Database>,
    posting: PostingConfig,
}

impl PostService {
    /// Create new post service
    pub fn new(db: Arc<Database>, posting: PostingConfig) -> Self {
        Self { db, posting }
    }

    /// Create an original post
    ///
    /// # Errors
    /// - `InvalidPayload` if the body is empty or too long
    /// - `DailyLimitExceeded` if the author is at the limit
    pub async fn create_post(&self, author_id: &str, body: &str) -> Result<PostView, AppError> {
        let body = validators::validate_body(body, self.posting.max_body_chars)?;
        self.insert(author_id, Some(body), None).await
    }

    /// Repost `parent_id` without adding content
    ///
    /// # Errors
    /// - `DailyLimitExceeded` if the author is at the limit
    /// - `NotFound` if the parent post does not exist
    pub async fn create_repost(
        &self,
        author_id: &str,
        parent_id: &str,
    ) -> Result<PostView, AppError> {
        self.insert(author_id, None, Some(parent_id.to_string()))
            .await
    }

    /// Quote `parent_id` with a body of one's own
    ///
    /// # Errors
    /// - `InvalidPayload` if the body is empty or too long
    /// - `DailyLimitExceeded` if the author is at the limit
    /// - `NotFound` if the parent post does not exist
    pub async fn create_quote_post(
        &self,
        author_id: &str,
        parent_id: &str,
        body: &str,
    ) -> Result<PostView, AppError> {
        let body = validators::validate_body(body, self.posting.max_body_chars)?;
        self.insert(author_id, Some(body), Some(parent_id.to_string()))
            .await
    }

    /// Get a post with its parent
    pub async fn get(&self, id: &str) -> Result<PostView, AppError> {
        let row = self.db.get_post(id).await?.ok_or(AppError::NotFound("Post"))?;
        let mut views = render_posts(&self.db, vec![row]).await?;
        views.pop().ok_or(AppError::NotFound("Post"))
    }

    /// A user's posts, newest first
    pub async fn user_posts(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<Page<PostView>, AppError> {
        if !self.db.user_exists(user_id).await? {
            return Err(AppError::NotFound("User"));
        }

        let _timer = start_db_timer("SELECT", "posts");
        let rows = self
            .db
            .get_user_posts(user_id, page.size, page.offset())
            .await?;
        let count = self.db.count_user_posts(user_id).await?;

        Ok(Page {
            items: render_posts(&self.db, rows).await?,
            count,
        })
    }

    async fn insert(
        &self,
        author_id: &str,
        body: Option<String>,
        parent_id: Option<String>,
    ) -> Result<PostView, AppError> {
        let now = Utc::now();
        let limit = self.posting.daily_limit;

        if let Err(error) = validators::can_post(&self.db, author_id, limit, now).await {
            if matches!(error, AppError::DailyLimitExceeded { .. }) {
                POST_LIMIT_REJECTIONS_TOTAL.inc();
                tracing::info!(author_id, limit, "Post rejected by daily limit");
            }
            return Err(error);
        }

        if let Some(parent_id) = &parent_id {
            if !self.db.post_exists(parent_id).await? {
                return Err(AppError::NotFound("Post"));
            }
        }

        let post = Post {
            id: EntityId::new().0,
            author_id: author_id.to_string(),
            body,
            parent_id,
            created_at: now,
        };

        let _timer = start_db_timer("INSERT", "posts");
        let inserted = self
            .db
            .insert_post_within_limit(&post, validators::posting_window_start(now), limit)
            .await?;
        if !inserted {
            // A concurrent request took the last slot after the check above.
            POST_LIMIT_REJECTIONS_TOTAL.inc();
            tracing::info!(author_id, limit, "Post rejected by daily limit at insert");
            return Err(AppError::DailyLimitExceeded { limit });
        }

        let kind = post.kind();
        POSTS_CREATED_TOTAL.with_label_values(&[kind.as_str()]).inc();
        tracing::info!(
            post_id = %post.id,
            author_id,
            kind = kind.as_str(),
            parent_id = ?post.parent_id,
            "Post created"
        );

        self.get(&post.id).await
    }
}
