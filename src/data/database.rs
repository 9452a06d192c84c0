//! SQLite database operations
//!
//! All database access goes through this module.
//! Uses SQLx with runtime-checked queries.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Columns selected for every post read, joined with the author's username.
const POST_COLUMNS: &str = r#"
    p.id, p.author_id, p.body, p.parent_id, p.created_at,
    u.username AS author_username
"#;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Get user by ID
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get user by username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Check whether a user exists
    pub async fn user_exists(&self, id: &str) -> Result<bool, AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    /// Insert a user unless the username is already taken.
    ///
    /// # Returns
    /// `true` if inserted, `false` if a user with that username existed.
    pub async fn insert_user_if_absent(&self, user: &User) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO users (id, username, display_name, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Follower, following and post counts for a user.
    pub async fn get_user_stats(&self, user_id: &str) -> Result<UserStats, AppError> {
        let stats = sqlx::query_as::<_, UserStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM follows WHERE followee_id = ?1) AS followers_count,
                (SELECT COUNT(*) FROM follows WHERE follower_id = ?1) AS following_count,
                (SELECT COUNT(*) FROM posts WHERE author_id = ?1) AS posts_count
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    // =========================================================================
    // Follow relationships
    // =========================================================================

    /// Check whether `follower_id` follows `followee_id`
    pub async fn is_following(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ? AND followee_id = ?)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert follow relationship unless the pair already exists.
    ///
    /// # Returns
    /// `true` if a new row was inserted.
    pub async fn insert_follow_if_absent(&self, follow: &Follow) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO follows (id, follower_id, followee_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&follow.id)
        .bind(&follow.follower_id)
        .bind(&follow.followee_id)
        .bind(follow.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete follow relationship
    ///
    /// # Returns
    /// `true` if a row was removed.
    pub async fn delete_follow(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Get post by ID
    pub async fn get_post(&self, id: &str) -> Result<Option<PostWithAuthor>, AppError> {
        let query = format!(
            "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON u.id = p.author_id WHERE p.id = ?"
        );
        let post = sqlx::query_as::<_, PostWithAuthor>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    /// Check whether a post exists
    pub async fn post_exists(&self, id: &str) -> Result<bool, AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    /// Get multiple posts by ID (batch operation to avoid N+1)
    pub async fn get_posts_by_ids(&self, ids: &[String]) -> Result<Vec<PostWithAuthor>, AppError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let mut all_posts = Vec::new();

        // SQLite caps bound parameters per statement
        for chunk in ids.chunks(100) {
            let placeholders = chunk.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let query = format!(
                "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON u.id = p.author_id WHERE p.id IN ({placeholders})"
            );

            let mut query_builder = sqlx::query_as::<_, PostWithAuthor>(&query);
            for id in chunk {
                query_builder = query_builder.bind(id);
            }

            let posts = query_builder.fetch_all(&self.pool).await?;
            all_posts.extend(posts);
        }

        Ok(all_posts)
    }

    /// Insert a post unconditionally
    pub async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, body, parent_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.author_id)
        .bind(&post.body)
        .bind(&post.parent_id)
        .bind(post.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a post only while its author has fewer than `limit` posts
    /// created after `since`.
    ///
    /// The count and the insert run as one statement inside an immediate
    /// transaction, so two concurrent requests cannot both slip under the limit.
    ///
    /// # Returns
    /// `true` if inserted, `false` if the limit was already reached.
    pub async fn insert_post_within_limit(
        &self,
        post: &Post,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<bool, AppError> {
        // Take the write lock up front so concurrent writers wait on the busy
        // timeout instead of failing a read-to-write lock upgrade.
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, body, parent_id, created_at)
            SELECT ?, ?, ?, ?, ?
            WHERE (SELECT COUNT(*) FROM posts WHERE author_id = ? AND created_at > ?) < ?
            "#,
        )
        .bind(&post.id)
        .bind(&post.author_id)
        .bind(&post.body)
        .bind(&post.parent_id)
        .bind(post.created_at)
        .bind(&post.author_id)
        .bind(since)
        .bind(i64::from(limit))
        .execute(&mut *conn)
        .await;

        match result {
            Ok(result) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(result.rows_affected() == 1)
            }
            Err(error) => {
                if let Err(rollback_error) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                    tracing::warn!(%rollback_error, "Rollback after failed post insert failed");
                }
                Err(error.into())
            }
        }
    }

    /// Count posts by `author_id` created strictly after `since`
    pub async fn count_posts_since(
        &self,
        author_id: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM posts WHERE author_id = ? AND created_at > ?",
        )
        .bind(author_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Get a user's posts, newest first
    pub async fn get_user_posts(
        &self,
        user_id: &str,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostWithAuthor>, AppError> {
        let query = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p JOIN users u ON u.id = p.author_id
            WHERE p.author_id = ?
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT ? OFFSET ?
            "#
        );
        let posts = sqlx::query_as::<_, PostWithAuthor>(&query)
            .bind(user_id)
            .bind(i64::from(limit))
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    /// Count a user's posts
    pub async fn count_user_posts(&self, user_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE author_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Get every post, newest first
    pub async fn get_all_posts(
        &self,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostWithAuthor>, AppError> {
        let query = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p JOIN users u ON u.id = p.author_id
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT ? OFFSET ?
            "#
        );
        let posts = sqlx::query_as::<_, PostWithAuthor>(&query)
            .bind(i64::from(limit))
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    /// Count every post
    pub async fn count_all_posts(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Get posts authored by users `viewer_id` follows, newest first.
    ///
    /// The viewer's own posts are never included.
    pub async fn get_following_posts(
        &self,
        viewer_id: &str,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostWithAuthor>, AppError> {
        let query = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            JOIN users u ON u.id = p.author_id
            JOIN follows f ON f.followee_id = p.author_id AND f.follower_id = ?1
            WHERE p.author_id <> ?1
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT ?2 OFFSET ?3
            "#
        );
        let posts = sqlx::query_as::<_, PostWithAuthor>(&query)
            .bind(viewer_id)
            .bind(i64::from(limit))
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    /// Count posts authored by users `viewer_id` follows
    pub async fn count_following_posts(&self, viewer_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM posts p
            JOIN follows f ON f.followee_id = p.author_id AND f.follower_id = ?1
            WHERE p.author_id <> ?1
            "#,
        )
        .bind(viewer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
