//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub posting: PostingConfig,
    pub pagination: PaginationConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Posting rules
#[derive(Debug, Clone, Deserialize)]
pub struct PostingConfig {
    /// Posts (of any kind) a user may create in a rolling 24 hour window
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
    /// Maximum post body length in characters
    #[serde(default = "default_max_body_chars")]
    pub max_body_chars: usize,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            daily_limit: default_daily_limit(),
            max_body_chars: default_max_body_chars(),
        }
    }
}

fn default_daily_limit() -> u32 {
    5
}

fn default_max_body_chars() -> usize {
    777
}

/// Fixed page sizes per endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_user_posts_page_size")]
    pub user_posts_page_size: u32,
    #[serde(default = "default_feed_page_size")]
    pub feed_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            user_posts_page_size: default_user_posts_page_size(),
            feed_page_size: default_feed_page_size(),
        }
    }
}

fn default_user_posts_page_size() -> u32 {
    5
}

fn default_feed_page_size() -> u32 {
    10
}

/// Session token verification
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for session tokens (32+ bytes)
    pub session_secret: String,
    /// Session max age in seconds (default: 604800 = 7 days)
    pub session_max_age: i64,
}

/// Users created at startup when missing
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SeedConfig {
    #[serde(default)]
    pub users: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub fn default_filter(&self) -> String {
        format!("posterr={0},tower_http={0}", self.level.to_ascii_lowercase())
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (POSTERR__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.path", "data/posterr.db")?
            .set_default("posting.daily_limit", 5)?
            .set_default("posting.max_body_chars", 777)?
            .set_default("pagination.user_posts_page_size", 5)?
            .set_default("pagination.feed_page_size", 10)?
            .set_default("auth.session_max_age", 604800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("POSTERR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject secrets and limits that would make the service unusable
    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_SESSION_SECRET_BYTES: usize = 32;

        if self.auth.session_secret.len() < MIN_SESSION_SECRET_BYTES {
            return Err(crate::error::AppError::Config(format!(
                "auth.session_secret must be at least {} bytes",
                MIN_SESSION_SECRET_BYTES
            )));
        }

        if self.auth.session_max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.session_max_age must be greater than 0".to_string(),
            ));
        }

        if self.posting.daily_limit == 0 {
            return Err(crate::error::AppError::Config(
                "posting.daily_limit must be greater than 0".to_string(),
            ));
        }

        if self.posting.max_body_chars == 0 {
            return Err(crate::error::AppError::Config(
                "posting.max_body_chars must be greater than 0".to_string(),
            ));
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(crate::error::AppError::Config(format!(
                "logging.level must be one of trace, debug, info, warn, error (got {:?})",
                self.logging.level
            )));
        }

        if !matches!(
            self.logging.format.to_ascii_lowercase().as_str(),
            "pretty" | "json"
        ) {
            return Err(crate::error::AppError::Config(format!(
                "logging.format must be \"pretty\" or \"json\" (got {:?})",
                self.logging.format
            )));
        }

        if self.pagination.user_posts_page_size == 0 || self.pagination.feed_page_size == 0 {
            return Err(crate::error::AppError::Config(
                "pagination page sizes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/posterr-test.db"),
            },
            posting: PostingConfig::default(),
            pagination: PaginationConfig::default(),
            auth: AuthConfig {
                session_secret: "x".repeat(32),
                session_max_age: 604_800,
            },
            seed: SeedConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        let config = valid_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.posting.daily_limit, 5);
        assert_eq!(config.pagination.user_posts_page_size, 5);
        assert_eq!(config.pagination.feed_page_size, 10);
        assert_eq!(config.server.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn validate_rejects_short_session_secret() {
        let mut config = valid_config();
        config.auth.session_secret = "short-secret".to_string();

        let error = config
            .validate()
            .expect_err("session secret shorter than 32 bytes must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("auth.session_secret")
        ));
    }

    #[test]
    fn validate_rejects_zero_daily_limit() {
        let mut config = valid_config();
        config.posting.daily_limit = 0;

        let error = config.validate().expect_err("zero limit must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("posting.daily_limit")
        ));
    }

    #[test]
    fn validate_rejects_zero_page_size() {
        let mut config = valid_config();
        config.pagination.feed_page_size = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn logging_settings_drive_the_subscriber() {
        let mut config = valid_config();
        config.logging.level = "DEBUG".to_string();
        config.logging.format = "json".to_string();

        assert!(config.validate().is_ok());
        assert_eq!(
            config.logging.default_filter(),
            "posterr=debug,tower_http=debug"
        );
        assert!(config.logging.is_json());

        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());

        config.logging.format = "pretty".to_string();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }
}
