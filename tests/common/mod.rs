//! Common test utilities for E2E tests

#![allow(dead_code)]

use posterr::data::User;
use posterr::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const SEED_USERS: [&str; 4] = ["alice", "bob", "carol", "dave"];

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance with the default rules
    pub async fn new() -> Self {
        Self::with_posting(config::PostingConfig::default()).await
    }

    /// Create a test server with custom posting rules
    pub async fn with_posting(posting: config::PostingConfig) -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            database: config::DatabaseConfig { path: db_path },
            posting,
            pagination: config::PaginationConfig::default(),
            auth: config::AuthConfig {
                session_secret: "test-secret-key-that-is-32-bytes!".to_string(),
                session_max_age: 604800,
            },
            seed: config::SeedConfig {
                users: SEED_USERS.iter().map(|name| name.to_string()).collect(),
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = posterr::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Look up a seeded user
    pub async fn user(&self, username: &str) -> User {
        self.state
            .db
            .get_user_by_username(username)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("seed user {username} missing"))
    }

    /// Create a session token for `user`
    pub fn token_for(&self, user: &User) -> String {
        use posterr::auth::{Session, create_session_token};

        let session = Session::new(user.id.clone(), 3600);
        create_session_token(&session, &self.state.config.auth.session_secret)
            .expect("Failed to create test token")
    }

    /// POST with a bearer token and optional JSON body
    pub async fn post_as(
        &self,
        user: &User,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> reqwest::Response {
        let mut request = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", self.token_for(user)));
        if let Some(body) = body {
            request = request.json(&body);
        }
        request.send().await.unwrap()
    }

    /// GET, authenticated as `user` when given
    pub async fn get_as(&self, user: Option<&User>, path: &str) -> reqwest::Response {
        let mut request = self.client.get(self.url(path));
        if let Some(user) = user {
            request = request.header("Authorization", format!("Bearer {}", self.token_for(user)));
        }
        request.send().await.unwrap()
    }
}
