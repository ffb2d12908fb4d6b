//! Common test utilities for E2E tests

#![allow(dead_code)]

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;
use vidtube::{AppState, config};

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub temp_dir: TempDir,
    pub client: reqwest::Client,
}

/// A registered and logged-in user
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let media_dir = temp_dir.path().join("media");

        // Bind first so the media URL can point at this server
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: addr.port(),
                domain: format!("localhost:{}", addr.port()),
                protocol: "http".to_string(),
                cors_origin: "*".to_string(),
            },
            database: config::DatabaseConfig { path: db_path },
            storage: config::StorageConfig {
                media: config::MediaStorageConfig {
                    backend: config::StorageBackend::Local,
                    bucket: "test-media".to_string(),
                    public_url: format!("{}/media", addr_str),
                    local_dir: media_dir,
                },
            },
            cloudflare: None,
            auth: config::AuthConfig {
                token_secret: "test-secret-key-that-is-32-bytes!!".to_string(),
                access_token_ttl: 3600,
                refresh_token_ttl: 86_400,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        let state = AppState::new(config).await.unwrap();

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        let app = vidtube::build_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        Self {
            addr: addr_str,
            state,
            temp_dir,
            client,
        }
    }

    /// Get full URL for a path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Get full URL for an `/api/v1` path
    pub fn api(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }

    /// Registration form with every field filled in
    pub fn registration_form(username: &str) -> Form {
        Form::new()
            .text("fullName", format!("{} Tester", username))
            .text("username", username.to_string())
            .text("email", format!("{}@example.com", username))
            .text("password", TEST_PASSWORD)
            .part("avatar", image_part("avatar.png"))
    }

    /// Register and log in a user
    pub async fn create_user(&self, username: &str) -> TestUser {
        let response = self
            .client
            .post(self.api("/users/register"))
            .multipart(Self::registration_form(username))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201, "registration of {username} failed");

        self.login(username).await
    }

    /// Log in an existing user
    pub async fn login(&self, username: &str) -> TestUser {
        let response = self
            .client
            .post(self.api("/users/login"))
            .json(&serde_json::json!({ "username": username, "password": TEST_PASSWORD }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: Value = response.json().await.unwrap();
        TestUser {
            id: body["data"]["user"]["id"].as_str().unwrap().to_string(),
            username: username.to_string(),
            access_token: body["data"]["accessToken"].as_str().unwrap().to_string(),
            refresh_token: body["data"]["refreshToken"].as_str().unwrap().to_string(),
        }
    }

    /// Publish a video and return its id
    pub async fn publish_video(&self, user: &TestUser, title: &str) -> String {
        let form = Form::new()
            .text("title", title.to_string())
            .text("description", format!("{} description", title))
            .part("videoFile", video_part())
            .part("thumbnail", image_part("thumb.png"));

        let response = self
            .client
            .post(self.api("/videos/publish-video"))
            .bearer_auth(&user.access_token)
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);

        let body: Value = response.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Authenticated GET returning status and body
    pub async fn get(&self, user: &TestUser, path: &str) -> (u16, Value) {
        let response = self
            .client
            .get(self.api(path))
            .bearer_auth(&user.access_token)
            .send()
            .await
            .unwrap();
        split(response).await
    }

    /// Authenticated request with an optional JSON body
    pub async fn send(
        &self,
        method: reqwest::Method,
        user: &TestUser,
        path: &str,
        body: Option<Value>,
    ) -> (u16, Value) {
        let mut request = self
            .client
            .request(method, self.api(path))
            .bearer_auth(&user.access_token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        split(request.send().await.unwrap()).await
    }
}

/// Status and JSON body of a response
pub async fn split(response: reqwest::Response) -> (u16, Value) {
    let status = response.status().as_u16();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

/// A small PNG-typed upload
pub fn image_part(file_name: &str) -> Part {
    Part::bytes(vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 1, 2, 3, 4])
        .file_name(file_name.to_string())
        .mime_str("image/png")
        .unwrap()
}

/// A minimal MP4 whose movie header says 2.5 seconds
pub fn video_part() -> Part {
    Part::bytes(sample_mp4(1000, 2500))
        .file_name("clip.mp4")
        .mime_str("video/mp4")
        .unwrap()
}

fn mp4_box(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = ((body.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out
}

pub fn sample_mp4(timescale: u32, duration: u32) -> Vec<u8> {
    let mut mvhd = vec![0u8; 12];
    mvhd.extend_from_slice(&timescale.to_be_bytes());
    mvhd.extend_from_slice(&duration.to_be_bytes());
    mvhd.extend_from_slice(&[0u8; 80]);

    let mut file = mp4_box(b"ftyp", b"isom\0\0\0\0isommp41");
    file.extend(mp4_box(b"moov", &mp4_box(b"mvhd", &mvhd)));
    file
}
