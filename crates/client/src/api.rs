//! HTTP client for the QuizDeck backend REST API.

use reqwest::StatusCode;
use std::time::Duration;

use crate::error::{AuthError, AuthResult};
use crate::profile::ProfileUpdate;
use crate::types::{Credentials, LoginPayload, Registration, UserRecord};

/// Thin reqwest wrapper around the backend endpoints the client consumes.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a new backend client with the default 30s request timeout.
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a backend client with an explicit request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `POST /auth/login`. No auth header; returns the token-plus-user payload.
    pub async fn login(&self, credentials: &Credentials) -> AuthResult<LoginPayload> {
        let response = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(credentials)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// `POST /auth/register`. Pass-through: returns the server-defined body.
    pub async fn register(&self, registration: &Registration) -> AuthResult<serde_json::Value> {
        let response = self
            .client
            .post(format!("{}/auth/register", self.base_url))
            .json(registration)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// `GET /questions` with bearer auth, used as a liveness/permission probe.
    ///
    /// Returns the HTTP status of any completed response; only transport
    /// failures (no response at all) surface as `AuthError::Network`.
    pub async fn probe_questions(&self, token: &str) -> AuthResult<StatusCode> {
        let response = self
            .client
            .get(format!("{}/questions", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;

        Ok(response.status())
    }

    /// `PUT /users/{id}` with a multipart profile form and bearer auth.
    pub async fn update_user(
        &self,
        token: &str,
        user_id: i64,
        update: ProfileUpdate,
    ) -> AuthResult<UserRecord> {
        let response = self
            .client
            .put(format!("{}/users/{}", self.base_url, user_id))
            .bearer_auth(token)
            .multipart(update.into_form())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Turn a non-success response into `Rejected`, preferring the server's own
/// message over the bare status line.
async fn rejection(response: reqwest::Response) -> AuthError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let reason = server_message(&body).unwrap_or_else(|| status.to_string());
    AuthError::rejected(reason)
}

/// Pull a human-readable message out of an error body, if there is one.
fn server_message(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                if !text.is_empty() {
                    return Some(text.to_string());
                }
            }
        }
        return None;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
