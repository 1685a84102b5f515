//! Populates a staging area from a file or a directory.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use crate::error::ShareError;
use crate::manifest::PackageManifest;
use crate::staging::StagingArea;

/// Boxed future returned by the composer collaborators.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Copies a whole directory tree into a staging area.
///
/// Implementations are responsible for writing the manifest as part of the
/// copy; the composer does not inject it separately for directories.
pub trait ContentCopier: Send + Sync {
    fn copy_contents<'a>(
        &'a self,
        source: &'a Path,
        destination: &'a Path,
        manifest: &'a PackageManifest,
    ) -> BoxFuture<'a, Result<(), ShareError>>;
}

/// Writes the package manifest at a staging root.
pub trait ManifestInjector: Send + Sync {
    fn inject<'a>(
        &'a self,
        root: &'a Path,
        manifest: &'a PackageManifest,
    ) -> BoxFuture<'a, Result<(), ShareError>>;
}

/// Branches on the source entry type and delegates to the collaborators.
#[derive(Clone)]
pub struct PackageComposer {
    copier: Arc<dyn ContentCopier>,
    injector: Arc<dyn ManifestInjector>,
}

impl PackageComposer {
    pub fn new(copier: Arc<dyn ContentCopier>, injector: Arc<dyn ManifestInjector>) -> Self {
        Self { copier, injector }
    }

    /// Fills `staging` from `source`.
    ///
    /// The entry type comes from `symlink_metadata`, so a symlink is neither
    /// a file nor a directory here and is rejected.
    pub async fn compose(
        &self,
        source: &Path,
        staging: &StagingArea,
        manifest: &PackageManifest,
    ) -> Result<(), ShareError> {
        let meta = match tokio::fs::symlink_metadata(source).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ShareError::PathNotFound(source.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        let file_type = meta.file_type();

        if file_type.is_dir() {
            debug!(source = %source.display(), "composing from directory");
            return self
                .copier
                .copy_contents(source, staging.path(), manifest)
                .await;
        }

        if !file_type.is_file() {
            return Err(ShareError::UnsupportedEntry(source.to_path_buf()));
        }

        let Some(base) = source.file_name() else {
            return Err(ShareError::UnsupportedEntry(source.to_path_buf()));
        };
        let content_dir = staging.content_dir();
        let target = content_dir.join(base);

        tokio::fs::create_dir_all(&content_dir)
            .await
            .map_err(|e| ShareError::Copy {
                from: source.to_path_buf(),
                to: content_dir.clone(),
                source: e,
            })?;
        let bytes = tokio::fs::copy(source, &target)
            .await
            .map_err(|e| ShareError::Copy {
                from: source.to_path_buf(),
                to: target.clone(),
                source: e,
            })?;
        debug!(source = %source.display(), target = %target.display(), bytes, "copied file");

        self.injector.inject(staging.path(), manifest).await
    }
}
