//! Retrying client for the keeper-sso RPC surface.
//!
//! Every call is bounded by a per-attempt timeout. Transient failures
//! (see [`RpcCode::is_transient`]) are retried with a linear backoff until
//! `retries_count` attempts have been made; any other failure is returned
//! to the caller immediately.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use super::{
    Identity, IdentityError, IsAdminRequest, IsAdminResponse, LoginRequest, LoginResponse,
    RegisterRequest, RegisterResponse, RpcCode, RpcStatus, IS_ADMIN_PATH, LOGIN_PATH,
    REGISTER_PATH,
};
use crate::config::SsoClientConfig;

const DEFAULT_BACKOFF: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    max_attempts: u32,
    backoff: Duration,
}

impl IdentityClient {
    pub fn new(config: &SsoClientConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| IdentityError::new(RpcCode::Internal, format!("failed to build http client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.address.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
            max_attempts: config.retries_count.max(1),
            backoff: DEFAULT_BACKOFF,
        })
    }

    /// Override the delay unit between attempts (attempt `n` waits `n * backoff`)
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    async fn call<Req, Resp>(&self, operation: &'static str, path: &str, body: &Req) -> Result<Resp, IdentityError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let mut attempt: u32 = 1;
        loop {
            match self.call_once(path, body).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(operation, attempt, "identity call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    let delay = self.backoff * attempt;
                    tracing::debug!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient identity error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::debug!(operation, attempt, error = %err, "identity call failed");
                    return Err(err);
                }
            }
        }
    }

    async fn call_once<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, IdentityError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return response.json::<Resp>().await.map_err(|e| {
                if e.is_timeout() {
                    transport_error(e)
                } else {
                    IdentityError::new(RpcCode::Internal, format!("malformed response: {}", e))
                }
            });
        }

        match response.json::<RpcStatus>().await {
            Ok(rpc_status) => Err(rpc_status.into()),
            Err(_) => Err(IdentityError::new(
                RpcCode::from_http_status(status),
                format!("identity service returned {}", status),
            )),
        }
    }
}

fn transport_error(err: reqwest::Error) -> IdentityError {
    if err.is_timeout() {
        IdentityError::new(RpcCode::DeadlineExceeded, "identity call timed out")
    } else if err.is_connect() {
        IdentityError::new(RpcCode::Unavailable, format!("identity service unreachable: {}", err))
    } else {
        IdentityError::new(RpcCode::Unavailable, format!("identity transport error: {}", err))
    }
}

#[async_trait]
impl Identity for IdentityClient {
    async fn register(&self, email: &str, password: &str) -> Result<i64, IdentityError> {
        let request = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: RegisterResponse = self.call("register", REGISTER_PATH, &request).await?;
        Ok(response.user_id)
    }

    async fn login(&self, email: &str, password: &str, app_id: i32) -> Result<String, IdentityError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            app_id,
        };
        let response: LoginResponse = self.call("login", LOGIN_PATH, &request).await?;
        Ok(response.token)
    }

    async fn is_admin(&self, user_id: i64) -> Result<bool, IdentityError> {
        let request = IsAdminRequest { user_id };
        let response: IsAdminResponse = self.call("is_admin", IS_ADMIN_PATH, &request).await?;
        Ok(response.is_admin)
    }
}
