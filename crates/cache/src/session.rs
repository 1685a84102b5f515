//! Remote session seam and token resolution.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use stagecast_settings::{ConfigStore, keys};
use tracing::debug;

use crate::error::FetchError;

/// Future returned by every remote fetch.
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, FetchError>> + Send + 'a>>;

/// An authenticated handle to the remote API.
pub trait RemoteSession: Send + Sync {
    /// Fetches the current deployments.
    fn get_deployments(&self) -> FetchFuture<'_>;

    /// Fetches the current aliases.
    fn get_aliases(&self) -> FetchFuture<'_>;
}

/// Opens sessions from an auth token.
pub trait SessionConnector: Send + Sync {
    fn connect(&self, token: &str) -> Arc<dyn RemoteSession>;
}

/// Opens a session with `explicit_token`, falling back to the stored token.
///
/// Empty tokens count as absent. Returns `None` when neither is available.
pub fn connect(
    store: &ConfigStore,
    explicit_token: Option<&str>,
    connector: &dyn SessionConnector,
) -> Option<Arc<dyn RemoteSession>> {
    let token = match explicit_token.filter(|t| !t.is_empty()) {
        Some(t) => t.to_string(),
        None => store.get_str(keys::USER_TOKEN).filter(|t| !t.is_empty())?,
    };
    debug!(explicit = explicit_token.is_some(), "opening remote session");
    Some(connector.connect(&token))
}
