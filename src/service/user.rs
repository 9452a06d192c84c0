//! User service
//!
//! Profiles and follow relationships. Every method takes the acting user's
//! id explicitly.

use std::sync::Arc;

use crate::data::{Database, EntityId, Follow, User, UserStats};
use crate::error::AppError;
use crate::metrics::{FOLLOW_ACTIONS_TOTAL, start_db_timer};

use super::validators;

/// A user with aggregate counts
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub user: User,
    pub stats: UserStats,
}

/// User service
pub struct UserService {
    db: Arc<Database>,
}

impl UserService {
    /// Create new user service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get a user's public profile
    ///
    /// # Errors
    /// `NotFound` if the user does not exist
    pub async fn profile(&self, user_id: &str) -> Result<UserProfile, AppError> {
        let _timer = start_db_timer("SELECT", "users");
        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or(AppError::NotFound("User"))?;
        let stats = self.db.get_user_stats(user_id).await?;

        Ok(UserProfile { user, stats })
    }

    /// Whether `actor_id` follows `target_id`
    ///
    /// An anonymous actor follows nobody.
    pub async fn is_following(
        &self,
        actor_id: Option<&str>,
        target_id: &str,
    ) -> Result<bool, AppError> {
        match actor_id {
            Some(actor_id) => self.db.is_following(actor_id, target_id).await,
            None => Ok(false),
        }
    }

    /// Follow `target_id`
    ///
    /// Following an already-followed user is a no-op.
    ///
    /// # Errors
    /// - `NotFound` if the target does not exist
    /// - `SelfFollow` if actor and target are the same user
    pub async fn follow(&self, actor_id: &str, target_id: &str) -> Result<(), AppError> {
        self.ensure_user_exists(target_id).await?;
        validators::can_follow(actor_id, target_id)?;

        let follow = Follow {
            id: EntityId::new().0,
            follower_id: actor_id.to_string(),
            followee_id: target_id.to_string(),
            created_at: chrono::Utc::now(),
        };

        let _timer = start_db_timer("INSERT", "follows");
        let inserted = self.db.insert_follow_if_absent(&follow).await?;
        if inserted {
            FOLLOW_ACTIONS_TOTAL.with_label_values(&["follow"]).inc();
            tracing::info!(follower_id = actor_id, followee_id = target_id, "User followed");
        } else {
            tracing::debug!(
                follower_id = actor_id,
                followee_id = target_id,
                "Follow already present"
            );
        }

        Ok(())
    }

    /// Unfollow `target_id`
    ///
    /// Unfollowing a user who is not followed is a no-op.
    ///
    /// # Errors
    /// `NotFound` if the target does not exist
    pub async fn unfollow(&self, actor_id: &str, target_id: &str) -> Result<(), AppError> {
        self.ensure_user_exists(target_id).await?;

        let _timer = start_db_timer("DELETE", "follows");
        let removed = self.db.delete_follow(actor_id, target_id).await?;
        if removed {
            FOLLOW_ACTIONS_TOTAL.with_label_values(&["unfollow"]).inc();
            tracing::info!(follower_id = actor_id, followee_id = target_id, "User unfollowed");
        }

        Ok(())
    }

    /// Create users for `usernames` that do not exist yet.
    ///
    /// # Returns
    /// Number of users created
    pub async fn ensure_users(&self, usernames: &[String]) -> Result<usize, AppError> {
        let mut created = 0;

        for username in usernames {
            let username = username.trim();
            if username.is_empty() {
                return Err(AppError::Config(
                    "seed.users must not contain empty usernames".to_string(),
                ));
            }

            let user = User {
                id: EntityId::new().0,
                username: username.to_string(),
                display_name: Some(username.to_string()),
                created_at: chrono::Utc::now(),
            };

            if self.db.insert_user_if_absent(&user).await? {
                tracing::info!(user_id = %user.id, username, "Seed user created");
                created += 1;
            }
        }

        Ok(created)
    }

    async fn ensure_user_exists(&self, user_id: &str) -> Result<(), AppError> {
        if self.db.user_exists(user_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("User"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_db() -> (Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("service-user.db");
        let db = Database::connect(&db_path).await.unwrap();
        (Arc::new(db), temp_dir)
    }

    async fn seed(service: &UserService, db: &Database, username: &str) -> User {
        service.ensure_users(&[username.to_string()]).await.unwrap();
        db.get_user_by_username(username).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn profile_includes_counts() {
        let (db, _temp_dir) = create_test_db().await;
        let service = UserService::new(db.clone());
        let alice = seed(&service, &db, "alice").await;
        let bob = seed(&service, &db, "bob").await;

        service.follow(&alice.id, &bob.id).await.unwrap();

        let profile = service.profile(&bob.id).await.unwrap();
        assert_eq!(profile.user.username, "bob");
        assert_eq!(
            profile.stats,
            UserStats {
                followers_count: 1,
                following_count: 0,
                posts_count: 0,
            }
        );

        let profile = service.profile(&alice.id).await.unwrap();
        assert_eq!(profile.stats.following_count, 1);
    }

    #[tokio::test]
    async fn profile_of_unknown_user_is_not_found() {
        let (db, _temp_dir) = create_test_db().await;
        let service = UserService::new(db);

        let error = service.profile("missing").await.unwrap_err();
        assert!(matches!(error, AppError::NotFound("User")));
    }

    #[tokio::test]
    async fn follow_then_unfollow_restores_state() {
        let (db, _temp_dir) = create_test_db().await;
        let service = UserService::new(db.clone());
        let alice = seed(&service, &db, "alice").await;
        let bob = seed(&service, &db, "bob").await;

        service.follow(&alice.id, &bob.id).await.unwrap();
        assert!(service.is_following(Some(alice.id.as_str()), &bob.id).await.unwrap());

        // Duplicate follow is a no-op success
        service.follow(&alice.id, &bob.id).await.unwrap();
        assert_eq!(db.get_user_stats(&bob.id).await.unwrap().followers_count, 1);

        service.unfollow(&alice.id, &bob.id).await.unwrap();
        assert!(!service.is_following(Some(alice.id.as_str()), &bob.id).await.unwrap());

        // Unfollowing again is a no-op success
        service.unfollow(&alice.id, &bob.id).await.unwrap();
    }

    #[tokio::test]
    async fn self_follow_is_rejected_without_side_effects() {
        let (db, _temp_dir) = create_test_db().await;
        let service = UserService::new(db.clone());
        let alice = seed(&service, &db, "alice").await;

        let error = service.follow(&alice.id, &alice.id).await.unwrap_err();
        assert!(matches!(error, AppError::SelfFollow));
        assert!(!db.is_following(&alice.id, &alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn follow_unknown_target_is_not_found() {
        let (db, _temp_dir) = create_test_db().await;
        let service = UserService::new(db.clone());
        let alice = seed(&service, &db, "alice").await;

        let error = service.follow(&alice.id, "missing").await.unwrap_err();
        assert!(matches!(error, AppError::NotFound("User")));

        let error = service.unfollow(&alice.id, "missing").await.unwrap_err();
        assert!(matches!(error, AppError::NotFound("User")));
    }

    #[tokio::test]
    async fn anonymous_actor_follows_nobody() {
        let (db, _temp_dir) = create_test_db().await;
        let service = UserService::new(db.clone());
        let alice = seed(&service, &db, "alice").await;

        assert!(!service.is_following(None, &alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn ensure_users_is_idempotent() {
        let (db, _temp_dir) = create_test_db().await;
        let service = UserService::new(db);
        let names = vec!["alice".to_string(), "bob".to_string()];

        assert_eq!(service.ensure_users(&names).await.unwrap(), 2);
        assert_eq!(service.ensure_users(&names).await.unwrap(), 0);

        let error = service
            .ensure_users(&["  ".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::Config(_)));
    }
}
