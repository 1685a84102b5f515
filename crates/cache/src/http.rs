//! HTTP session against the remote API.
//!
//! Bearer token authentication on every request. Non-success statuses are
//! returned as [`FetchError::Status`] with the numeric code so callers can
//! tell a revoked token apart from a transient failure.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;
use crate::session::{FetchFuture, RemoteSession, SessionConnector};

pub const DEFAULT_BASE_URL: &str = "https://api.zeit.co";

const DEPLOYMENTS_ENDPOINT: &str = "/now/deployments";
const ALIASES_ENDPOINT: &str = "/now/aliases";

/// Builds [`HttpSession`]s sharing one connection pool.
#[derive(Clone)]
pub struct HttpConnector {
    http: reqwest::Client,
    base_url: String,
}

impl HttpConnector {
    pub fn new() -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Sets a custom base URL. Trailing slashes are dropped.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl SessionConnector for HttpConnector {
    fn connect(&self, token: &str) -> Arc<dyn RemoteSession> {
        Arc::new(HttpSession {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: token.to_string(),
        })
    }
}

/// An authenticated session.
pub struct HttpSession {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpSession {
    /// Performs an authenticated GET and returns the `field` of the body,
    /// or the whole body when it has no such field.
    async fn get(&self, endpoint: &str, field: &str) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = resp.status();
        debug!(endpoint, status = status.as_u16(), "remote response");

        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let value: Value =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(extract_field(value, field))
    }
}

impl RemoteSession for HttpSession {
    fn get_deployments(&self) -> FetchFuture<'_> {
        Box::pin(self.get(DEPLOYMENTS_ENDPOINT, "deployments"))
    }

    fn get_aliases(&self) -> FetchFuture<'_> {
        Box::pin(self.get(ALIASES_ENDPOINT, "aliases"))
    }
}

fn extract_field(body: Value, field: &str) -> Value {
    match body {
        Value::Object(mut map) => match map.remove(field) {
            Some(v) => v,
            None => Value::Object(map),
        },
        other => other,
    }
}
