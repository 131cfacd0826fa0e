#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

use recipe_api::config::{AppConfig, StoreBackend};
use recipe_api::database::{self, MemoryStore, Store};
use recipe_api::{app, AppState};

pub const PASSWORD: &str = "testpass123";

/// One in-process server per test, backed by a fresh in-memory store.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
    media: TempDir,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let media = tempfile::tempdir().context("failed to create media dir")?;
        let config = AppConfig::in_memory(media.path());
        Self::serve(Arc::new(MemoryStore::new()), config, media).await
    }

    /// Same server backed by `PgStore` on `DATABASE_URL`; `None` when it is unset.
    ///
    /// Tests share the database, so they must use [`unique_email`] accounts.
    pub async fn spawn_postgres() -> Result<Option<Self>> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping Postgres-backed test");
            return Ok(None);
        };

        let media = tempfile::tempdir().context("failed to create media dir")?;
        let mut config = AppConfig::in_memory(media.path());
        config.database.backend = StoreBackend::Postgres;
        config.database.url = Some(url);

        let store = database::open_store(&config.database)
            .await
            .context("failed to open Postgres store")?;
        Self::serve(store, config, media).await.map(Some)
    }

    async fn serve(store: Arc<dyn Store>, config: AppConfig, media: TempDir) -> Result<Self> {
        let state = AppState::new(store, config);

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;

        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
            media,
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn media_root(&self) -> PathBuf {
        self.media.path().to_path_buf()
    }

    pub async fn create_user(&self, email: &str, password: &str, name: &str) -> Result<Response> {
        Ok(self
            .client
            .post(self.url("/api/user/create"))
            .json(&json!({ "email": email, "password": password, "name": name }))
            .send()
            .await?)
    }

    pub async fn request_token(&self, email: &str, password: &str) -> Result<Response> {
        Ok(self
            .client
            .post(self.url("/api/user/token"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?)
    }

    /// Register a user with the default password and return its token
    pub async fn login_new_user(&self, email: &str) -> Result<String> {
        let res = self.create_user(email, PASSWORD, "Test name").await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "user create failed: {}", res.status());

        let res = self.request_token(email, PASSWORD).await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "token request failed: {}", res.status());
        let body: Value = res.json().await?;
        body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .context("token missing from response")
    }

    pub fn get(&self, token: &str, path: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    pub fn post(&self, token: &str, path: &str, body: Value) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token).json(&body)
    }

    pub fn put(&self, token: &str, path: &str, body: Value) -> RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(token).json(&body)
    }

    pub fn patch(&self, token: &str, path: &str, body: Value) -> RequestBuilder {
        self.client.patch(self.url(path)).bearer_auth(token).json(&body)
    }

    pub fn delete(&self, token: &str, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(token)
    }

    /// POST and return the `data` of a 201 response
    pub async fn create(&self, token: &str, path: &str, body: Value) -> Result<Value> {
        let res = self.post(token, path, body).send().await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create at {} failed: {}", path, res.status());
        Ok(data(res).await?)
    }

    pub async fn create_tag(&self, token: &str, name: &str) -> Result<i64> {
        let tag = self.create(token, "/api/recipe/tags", json!({ "name": name })).await?;
        tag["id"].as_i64().context("tag id missing")
    }

    pub async fn create_ingredient(&self, token: &str, name: &str) -> Result<i64> {
        let ingredient = self
            .create(token, "/api/recipe/ingredients", json!({ "name": name }))
            .await?;
        ingredient["id"].as_i64().context("ingredient id missing")
    }

    /// Create a recipe with defaults, overriding any keys in `extra`
    pub async fn create_recipe(&self, token: &str, extra: Value) -> Result<Value> {
        let mut body = json!({
            "title": "Sample recipe",
            "time_minutes": 10,
            "price": "5.00"
        });
        if let (Some(target), Value::Object(extra)) = (body.as_object_mut(), extra) {
            target.extend(extra);
        }
        self.create(token, "/api/recipe/recipes", body).await
    }
}

/// Email that no other test run has registered
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, uuid::Uuid::new_v4().simple())
}

/// Unwrap the success envelope
pub async fn data(res: Response) -> Result<Value> {
    let body: Value = res.json().await?;
    anyhow::ensure!(body["success"] == json!(true), "not a success envelope: {}", body);
    Ok(body["data"].clone())
}

/// Collect `field` of every object in a JSON array
pub fn pluck<'a>(items: &'a Value, field: &str) -> Vec<&'a Value> {
    items
        .as_array()
        .map(|items| items.iter().map(|item| &item[field]).collect())
        .unwrap_or_default()
}
