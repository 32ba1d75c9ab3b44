//! Common test utilities for E2E tests

use chrono::Utc;
use clipstream::data::{Account, EntityId, Video};
use clipstream::{config, AppState};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Password used for all accounts created through the test helpers
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "test.example.com".to_string(),
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig {
                path: db_path.clone(),
            },
            storage: config::StorageConfig {
                endpoint: "https://storage.test.example.com".to_string(),
                region: "auto".to_string(),
                bucket: "test-media".to_string(),
                public_url: "https://media.test.example.com".to_string(),
                access_key_id: "test-key".to_string(),
                secret_access_key: "test-secret".to_string(),
            },
            auth: config::AuthConfig {
                access_token_secret: "access-secret-key-32-bytes-long!".to_string(),
                access_token_ttl_seconds: 900,
                refresh_token_secret: "refresh-secret-key-32-bytes-long".to_string(),
                refresh_token_ttl_seconds: 864_000,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client (no cookie store: tokens are passed explicitly)
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router and spawn server in background
        let app = clipstream::build_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

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

    /// Insert an account directly, with [`TEST_PASSWORD`] as the password
    pub async fn create_account(&self, username: &str) -> Account {
        let now = Utc::now();
        let account = Account {
            id: EntityId::new().0,
            username: username.to_string(),
            email: format!("{username}@test.example.com"),
            full_name: format!("Test {username}"),
            password_hash: clipstream::auth::password::hash_password(TEST_PASSWORD).unwrap(),
            avatar_url: None,
            cover_image_url: None,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        self.state.db.insert_account(&account).await.unwrap();
        account
    }

    /// Log in over HTTP; returns (access token, refresh token)
    pub async fn login(&self, username: &str) -> (String, String) {
        let response = self
            .client
            .post(self.url("/api/v1/users/login"))
            .json(&serde_json::json!({
                "username": username,
                "password": TEST_PASSWORD,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "login should succeed");

        let body: serde_json::Value = response.json().await.unwrap();
        (
            body["data"]["accessToken"].as_str().unwrap().to_string(),
            body["data"]["refreshToken"].as_str().unwrap().to_string(),
        )
    }

    /// Insert a video directly, bypassing the upload endpoint
    pub async fn create_video(&self, owner_id: &str, title: &str, published: bool) -> Video {
        let now = Utc::now();
        let video = Video {
            id: EntityId::new().0,
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            description: format!("about {title}"),
            video_url: format!("https://media.test.example.com/videos/{title}.mp4"),
            video_key: format!("videos/{title}.mp4"),
            thumbnail_url: format!("https://media.test.example.com/thumbnails/{title}.png"),
            thumbnail_key: format!("thumbnails/{title}.png"),
            duration: 120.0,
            views: 0,
            is_published: published,
            created_at: now,
            updated_at: now,
        };
        self.state.db.insert_video(&video).await.unwrap();
        video
    }
}

/// Bearer header value for a token
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
