//! Fetches one cache kind and writes it into the configuration store.

use std::sync::Arc;

use stagecast_settings::{ConfigStore, keys};
use tracing::{debug, error};

use crate::error::CacheError;
use crate::kind::CacheKind;
use crate::session::RemoteSession;

#[derive(Clone)]
pub struct CacheSynchronizer {
    store: Arc<ConfigStore>,
}

impl CacheSynchronizer {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    /// Refreshes the kind named `kind`.
    ///
    /// Unknown names are logged and skipped without error.
    pub async fn refresh(
        &self,
        kind: &str,
        session: &dyn RemoteSession,
    ) -> Result<(), CacheError> {
        let Some(kind) = CacheKind::from_name(kind) else {
            error!(kind, "not able to resolve cache kind");
            return Ok(());
        };
        self.refresh_kind(kind, session).await
    }

    /// Fetches `kind` and overwrites `now.cache.<kind>` with the payload.
    pub async fn refresh_kind(
        &self,
        kind: CacheKind,
        session: &dyn RemoteSession,
    ) -> Result<(), CacheError> {
        let payload = kind.fetch(session).await?;
        self.store.set(&keys::cache_key(kind.name()), payload)?;
        debug!(kind = %kind, "cache entry refreshed");
        Ok(())
    }
}
