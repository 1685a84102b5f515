//! Share orchestration: check, derive, provision, track, compose.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use stagecast_notify::{Analytics, ErrorReporter};
use tracing::{debug, info};

use crate::composer::PackageComposer;
use crate::error::ShareError;
use crate::fs_ops::{PackageJsonInjector, TreeCopier};
use crate::identifier::PackageIdentifier;
use crate::manifest::PackageManifest;
use crate::staging::{StagingArea, StagingProvisioner, remove_entry};
use crate::status::StatusTracker;

/// Analytics event emitted once a staging area exists.
pub const SHARED_EVENT: &str = "Shared";

/// A request to share one local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    pub source_path: PathBuf,
}

impl ShareRequest {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
        }
    }
}

type IdentifierLock = Arc<tokio::sync::Mutex<()>>;

/// Runs share requests end to end.
pub struct ShareWorkflow {
    provisioner: StagingProvisioner,
    composer: PackageComposer,
    status: StatusTracker,
    reporter: Arc<dyn ErrorReporter>,
    analytics: Arc<dyn Analytics>,
    locks: Mutex<HashMap<PackageIdentifier, IdentifierLock>>,
}

impl ShareWorkflow {
    pub fn new(
        provisioner: StagingProvisioner,
        composer: PackageComposer,
        reporter: Arc<dyn ErrorReporter>,
        analytics: Arc<dyn Analytics>,
    ) -> Self {
        Self {
            provisioner,
            composer,
            status: StatusTracker::new(),
            reporter,
            analytics,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Workflow using the filesystem collaborators from this crate.
    pub fn with_default_collaborators(
        provisioner: StagingProvisioner,
        reporter: Arc<dyn ErrorReporter>,
        analytics: Arc<dyn Analytics>,
    ) -> Self {
        let injector = Arc::new(PackageJsonInjector);
        let copier = Arc::new(TreeCopier::new(injector.clone()));
        Self::new(
            provisioner,
            PackageComposer::new(copier, injector),
            reporter,
            analytics,
        )
    }

    pub fn status(&self) -> &StatusTracker {
        &self.status
    }

    pub fn provisioner(&self) -> &StagingProvisioner {
        &self.provisioner
    }

    /// Shares `request.source_path` and returns the populated staging area.
    ///
    /// Every failure is handed to the error reporter before it is returned.
    pub async fn share(&self, request: ShareRequest) -> Result<StagingArea, ShareError> {
        let result = self.run(&request.source_path).await;
        if let Err(e) = &result {
            self.reporter
                .show_error(e.user_message(), Some(e as &dyn std::error::Error));
        }
        result
    }

    async fn run(&self, source: &Path) -> Result<StagingArea, ShareError> {
        match tokio::fs::try_exists(source).await {
            Ok(true) => {}
            Ok(false) => return Err(ShareError::PathNotFound(source.to_path_buf())),
            Err(e) => return Err(ShareError::Io(e)),
        }

        let _sharing = self.status.begin();

        let identifier = PackageIdentifier::derive(source);
        let manifest = PackageManifest::for_source(source);

        let lock = self.lock_for(&identifier);
        let result = {
            let _held = lock.lock().await;
            self.provision_and_compose(source, &identifier, &manifest)
                .await
        };
        drop(lock);
        self.release_lock(&identifier);
        result
    }

    async fn provision_and_compose(
        &self,
        source: &Path,
        identifier: &PackageIdentifier,
        manifest: &PackageManifest,
    ) -> Result<StagingArea, ShareError> {
        let staging = self.provisioner.provision(identifier).await?;
        info!(
            identifier = %identifier,
            path = %staging.path().display(),
            "[{}] created temporary directory for sharing",
            manifest.name
        );

        self.analytics.track(SHARED_EVENT);

        self.composer.compose(source, &staging, manifest).await?;
        Ok(staging)
    }

    /// Removes the staging area a previous share of `source` left behind.
    ///
    /// Returns `false` when there was nothing to remove.
    pub async fn discard(&self, source: &Path) -> Result<bool, ShareError> {
        let identifier = PackageIdentifier::derive(source);
        let target = self.provisioner.target_path(&identifier);

        let lock = self.lock_for(&identifier);
        let removed = {
            let _held = lock.lock().await;
            match remove_entry(&target).await {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(ShareError::Io(e)),
            }
        };
        drop(lock);
        self.release_lock(&identifier);

        if let Ok(true) = removed {
            debug!(identifier = %identifier, "discarded staging area");
        }
        removed
    }

    fn lock_for(&self, identifier: &PackageIdentifier) -> IdentifierLock {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(identifier.clone()).or_default().clone()
    }

    /// Drops the map entry once no share or discard holds it.
    fn release_lock(&self, identifier: &PackageIdentifier) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(identifier)
            .is_some_and(|l| Arc::strong_count(l) == 1)
        {
            locks.remove(identifier);
        }
    }
}
