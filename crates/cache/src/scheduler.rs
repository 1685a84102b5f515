//! Periodic cache refresh with revocation handling.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use stagecast_notify::ErrorReporter;
use stagecast_settings::ConfigStore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::kind::CacheKind;
use crate::logout::LogoutHandler;
use crate::session::{SessionConnector, connect};
use crate::sync::CacheSynchronizer;

/// How a single refresh call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No token was available; the loop was stopped.
    SessionMissing,
    Refreshed,
    /// At least one fetch failed. A named refresh also stops the loop.
    Failed,
    /// The remote answered 403; the loop was stopped and logout ran.
    Revoked,
}

/// Handle to the recurring refresh task.
///
/// Stopping is permanent. Clones share the same cancellation state.
#[derive(Debug, Clone, Default)]
pub struct RefreshLoop {
    cancel: CancellationToken,
}

impl RefreshLoop {
    /// A handle with no task attached, for one-shot refreshes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns the recurring refresh. The first refresh happens one `period`
    /// after start; each tick runs a full refresh to completion.
    pub fn start(scheduler: Arc<RefreshScheduler>, period: Duration) -> (Self, JoinHandle<()>) {
        let handle = Self::new();
        let task_handle = handle.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Skip the immediate tick.
            ticker.tick().await;

            info!(period_secs = period.as_secs_f64(), "refresh loop started");
            loop {
                tokio::select! {
                    _ = task_handle.cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let outcome = scheduler.refresh_cache(None, Some(&task_handle)).await;
                        debug!(?outcome, "scheduled refresh finished");
                    }
                }
            }
            debug!("refresh loop exited");
        });

        (handle, task)
    }

    /// Stops the loop. Calling it again is a no-op.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            info!("stopping the refreshing process");
            self.cancel.cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Resolves once the loop has been stopped.
    pub async fn stopped(&self) {
        self.cancel.cancelled().await;
    }
}

/// Drives the cache synchronizer for one kind or for all of them.
pub struct RefreshScheduler {
    store: Arc<ConfigStore>,
    connector: Arc<dyn SessionConnector>,
    synchronizer: CacheSynchronizer,
    reporter: Arc<dyn ErrorReporter>,
    logout: Arc<dyn LogoutHandler>,
    token: Option<String>,
}

impl RefreshScheduler {
    pub fn new(
        store: Arc<ConfigStore>,
        connector: Arc<dyn SessionConnector>,
        reporter: Arc<dyn ErrorReporter>,
        logout: Arc<dyn LogoutHandler>,
    ) -> Self {
        Self {
            synchronizer: CacheSynchronizer::new(store.clone()),
            store,
            connector,
            reporter,
            logout,
            token: None,
        }
    }

    /// Uses `token` instead of the stored one.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Refreshes `kind`, or every known kind when `kind` is `None`.
    ///
    /// `refresh_loop` is stopped when there is no session, when a named
    /// refresh fails, and when a full refresh hits a 403.
    pub async fn refresh_cache(
        &self,
        kind: Option<&str>,
        refresh_loop: Option<&RefreshLoop>,
    ) -> RefreshOutcome {
        let stop_loop = || {
            if let Some(l) = refresh_loop {
                l.stop();
            }
        };

        let Some(session) = connect(&self.store, self.token.as_deref(), self.connector.as_ref())
        else {
            debug!("no session, nothing to refresh");
            stop_loop();
            return RefreshOutcome::SessionMissing;
        };

        if let Some(kind) = kind {
            return match self.synchronizer.refresh(kind, session.as_ref()).await {
                Ok(()) => RefreshOutcome::Refreshed,
                Err(e) => {
                    self.reporter.show_error(
                        &format!("Not able to refresh {kind}"),
                        Some(&e as &dyn std::error::Error),
                    );
                    stop_loop();
                    RefreshOutcome::Failed
                }
            };
        }

        let results = join_all(
            CacheKind::ALL
                .into_iter()
                .map(|k| self.synchronizer.refresh_kind(k, session.as_ref())),
        )
        .await;

        let failures: Vec<_> = CacheKind::ALL
            .into_iter()
            .zip(results)
            .filter_map(|(k, r)| r.err().map(|e| (k, e)))
            .collect();

        if failures.is_empty() {
            info!(
                at = %chrono::Local::now().format("%H:%M:%S"),
                "Refreshed entire cache"
            );
            return RefreshOutcome::Refreshed;
        }

        for (k, e) in &failures {
            warn!(kind = %k, error = %e, status = ?e.status_code(), "cache refresh failed");
        }

        if failures.iter().any(|(_, e)| e.is_authorization_revoked()) {
            warn!("authorization revoked, logging out");
            stop_loop();
            self.logout.logout().await;
            return RefreshOutcome::Revoked;
        }

        RefreshOutcome::Failed
    }
}
