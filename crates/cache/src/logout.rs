//! Session teardown after authorization is revoked.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use stagecast_settings::{ConfigStore, keys};
use tracing::{info, warn};

pub type LogoutFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Ends the local session.
pub trait LogoutHandler: Send + Sync {
    fn logout(&self) -> LogoutFuture<'_>;
}

/// Logs out by forgetting the stored token and every cached entry.
#[derive(Clone)]
pub struct ClearSession {
    store: Arc<ConfigStore>,
}

impl ClearSession {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }
}

impl LogoutHandler for ClearSession {
    fn logout(&self) -> LogoutFuture<'_> {
        Box::pin(async move {
            for key in [keys::USER_TOKEN, keys::CACHE_PREFIX] {
                if let Err(e) = self.store.delete(key) {
                    warn!(key, error = %e, "failed to clear session key");
                }
            }
            info!("logged out");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn clears_token_and_cache() {
        let store = Arc::new(ConfigStore::in_memory());
        store.set(keys::USER_TOKEN, json!("tok")).unwrap();
        store.set("now.cache.deployments", json!([1])).unwrap();
        store.set("now.cache.aliases", json!([2])).unwrap();
        store.set("ui.theme", json!("dark")).unwrap();

        ClearSession::new(store.clone()).logout().await;

        assert_eq!(store.get(keys::USER_TOKEN), None);
        assert_eq!(store.get(keys::CACHE_PREFIX), None);
        assert_eq!(store.get("ui.theme"), Some(json!("dark")));
    }

    #[tokio::test]
    async fn logout_without_session_is_harmless() {
        let store = Arc::new(ConfigStore::in_memory());
        ClearSession::new(store.clone()).logout().await;
        assert_eq!(store.get("now"), None);
    }
}
