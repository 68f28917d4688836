#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use heritage_keeper::app::{self, AppState, RouterOptions};
use heritage_keeper::config::SsoClientConfig;
use heritage_keeper::database::MemoryStore;
use heritage_keeper::identity::IdentityClient;
use heritage_keeper::services::KeeperService;
use heritage_keeper::sso::{self, AuthService, MemoryCredentialStore};

pub const APP_ID: i32 = 1;
pub const APP_SECRET: &str = "test-secret";
pub const TOKEN_TTL: Duration = Duration::from_secs(3600);
pub const PASSWORD: &str = "password123";

/// keeper-sso and keeper-api running in-process on ephemeral ports
pub struct TestServer {
    pub base_url: String,
    pub sso_url: String,
    pub credentials: Arc<MemoryCredentialStore>,
    pub store: Arc<MemoryStore>,
    client: reqwest::Client,
}

async fn serve(router: Router) -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(addr)
}

fn identity_client(address: String) -> Result<IdentityClient> {
    let config = SsoClientConfig {
        address,
        timeout_ms: 2000,
        retries_count: 2,
    };
    Ok(IdentityClient::new(&config)?.with_backoff(Duration::from_millis(5)))
}

async fn serve_keeper(identity: IdentityClient, store: Arc<MemoryStore>) -> Result<String> {
    let state = AppState::new(
        KeeperService::new(store),
        Arc::new(identity),
        APP_ID,
        APP_SECRET,
    );
    let addr = serve(app::router(state, &RouterOptions::default())).await?;
    Ok(format!("http://{}", addr))
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let credentials = Arc::new(MemoryCredentialStore::with_app(APP_ID, "keeper", APP_SECRET));
        let auth = AuthService::new(credentials.clone(), TOKEN_TTL);
        let sso_addr = serve(sso::router(Arc::new(auth), Duration::from_secs(5))).await?;
        let sso_url = format!("http://{}", sso_addr);

        let store = Arc::new(MemoryStore::new());
        let base_url = serve_keeper(identity_client(sso_url.clone())?, store.clone()).await?;

        Ok(Self {
            base_url,
            sso_url,
            credentials,
            store,
            client: reqwest::Client::new(),
        })
    }

    /// keeper-api wired to an identity address nothing listens on
    pub async fn spawn_without_sso() -> Result<Self> {
        let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let sso_url = format!("http://{}", dead.local_addr()?);
        drop(dead);

        let store = Arc::new(MemoryStore::new());
        let base_url = serve_keeper(identity_client(sso_url.clone())?, store.clone()).await?;

        Ok(Self {
            base_url,
            sso_url,
            credentials: Arc::new(MemoryCredentialStore::new()),
            store,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, optionally authenticated and with a JSON body
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut req = self.client.request(method, self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await?;
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, path, Some(token), Some(body)).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::PUT, path, Some(token), Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::DELETE, path, Some(token), None).await
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<(StatusCode, Value)> {
        let body = json!({ "username": username, "email": email, "password": password });
        self.send(Method::POST, "/api/auth/register", None, Some(body)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(StatusCode, Value)> {
        let body = json!({ "email": email, "password": password, "app_id": APP_ID });
        self.send(Method::POST, "/api/auth/login", None, Some(body)).await
    }

    /// Register `username@example.com` and return its user id and bearer token
    pub async fn sign_up(&self, username: &str) -> Result<(i64, String)> {
        let email = format!("{}@example.com", username);

        let (status, body) = self.register(username, &email, PASSWORD).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register failed: {} {}", status, body);
        let user_id = body["user_id"].as_i64().context("register response missing user_id")?;

        let (status, body) = self.login(&email, PASSWORD).await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);
        let token = body["token"].as_str().context("login response missing token")?.to_string();

        Ok((user_id, token))
    }

    pub async fn create_collection(&self, token: &str, name: &str) -> Result<i64> {
        let body = json!({
            "name": name,
            "description": format!("{} description", name),
            "cover_image_url": "https://img.example.com/cover.png",
            "is_public": false,
        });
        let (status, body) = self.post("/api/keeper/collection", token, body).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create collection failed: {} {}", status, body);
        body["id"].as_i64().context("collection response missing id")
    }
}
