//! Staging directory provisioning with bounded retries.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::ShareError;
use crate::identifier::PackageIdentifier;
use crate::manifest::CONTENT_DIR;

/// Retry policy for staging directory creation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total creation attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Maximum delay between attempts (backoff cap).
    pub max_delay: Duration,
    /// Multiplier for each subsequent attempt.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy with the same attempt bound and no waiting between attempts.
    pub fn immediate() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exp);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// A provisioned staging directory.
///
/// Not removed on drop: the directory must survive so a later share of the
/// same source updates it in place. Call [`StagingArea::remove`] to discard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingArea {
    path: PathBuf,
    identifier: PackageIdentifier,
}

impl StagingArea {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn identifier(&self) -> &PackageIdentifier {
        &self.identifier
    }

    /// Directory single files are copied into.
    pub fn content_dir(&self) -> PathBuf {
        self.path.join(CONTENT_DIR)
    }

    /// Deletes the staging directory and everything in it.
    pub async fn remove(self) -> io::Result<()> {
        tokio::fs::remove_dir_all(&self.path).await?;
        debug!(identifier = %self.identifier, "removed staging directory");
        Ok(())
    }
}

/// Creates identifier-addressed staging directories under a root.
#[derive(Debug, Clone)]
pub struct StagingProvisioner {
    root: PathBuf,
    retry: RetryPolicy,
}

impl StagingProvisioner {
    /// Provisioner rooted at `root` with the default retry policy.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Provisioner rooted at the platform temp directory.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The deterministic path a staging area for `identifier` lives at.
    pub fn target_path(&self, identifier: &PackageIdentifier) -> PathBuf {
        self.root.join(identifier)
    }

    /// Creates the staging directory for `identifier`.
    ///
    /// Creation is non-recursive and fails when the directory already
    /// exists. Before every retry the leftover directory is removed; a
    /// failed removal is logged and the retry still happens. Fails with
    /// [`ShareError::Provisioning`] once the attempt bound is reached.
    pub async fn provision(
        &self,
        identifier: &PackageIdentifier,
    ) -> Result<StagingArea, ShareError> {
        let target = self.target_path(identifier);
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match tokio::fs::create_dir(&target).await {
                Ok(()) => {
                    debug!(identifier = %identifier, attempt, "staging directory created");
                    return Ok(StagingArea {
                        path: target,
                        identifier: identifier.clone(),
                    });
                }
                Err(e) if attempt >= max_attempts => {
                    warn!(
                        identifier = %identifier,
                        attempt,
                        error = %e,
                        "giving up on staging directory"
                    );
                    return Err(ShareError::Provisioning {
                        identifier: identifier.to_string(),
                        attempts: attempt,
                        source: e,
                    });
                }
                Err(e) => {
                    info!(
                        identifier = %identifier,
                        attempt,
                        error = %e,
                        "staging directory creation failed, retrying"
                    );
                }
            }

            remove_leftover(&target).await;
            tokio::time::sleep(self.retry.delay_after_attempt(attempt)).await;
        }
    }
}

/// Best-effort removal of whatever occupies a staging path.
async fn remove_leftover(target: &Path) {
    match remove_entry(target).await {
        Ok(()) => debug!(path = %target.display(), "removed stale staging entry"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            path = %target.display(),
            error = %e,
            "could not remove stale staging entry"
        ),
    }
}

/// Removes `path` whether it is a directory tree, a file or a symlink.
/// Symlinks are removed themselves, never followed.
pub(crate) async fn remove_entry(path: &Path) -> io::Result<()> {
    let meta = tokio::fs::symlink_metadata(path).await?;
    if meta.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(path: &str) -> PackageIdentifier {
        PackageIdentifier::derive(Path::new(path))
    }

    fn provisioner(root: &Path) -> StagingProvisioner {
        StagingProvisioner::new(root).with_retry(RetryPolicy::immediate())
    }

    #[tokio::test]
    async fn provision_creates_directory_at_target() {
        let tmp = tempfile::tempdir().unwrap();
        let p = provisioner(tmp.path());
        let identifier = id("/tmp/photo.png");

        let area = p.provision(&identifier).await.unwrap();
        assert_eq!(area.path(), tmp.path().join(identifier.as_str()));
        assert_eq!(area.identifier(), &identifier);
        assert!(area.path().is_dir());
    }

    #[tokio::test]
    async fn provision_twice_reuses_same_path() {
        let tmp = tempfile::tempdir().unwrap();
        let p = provisioner(tmp.path());
        let identifier = id("/srv/site");

        let first = p.provision(&identifier).await.unwrap();
        std::fs::write(first.path().join("stale.txt"), b"old").unwrap();

        let second = p.provision(&identifier).await.unwrap();
        assert_eq!(first.path(), second.path());
        assert!(second.path().is_dir());
        assert!(
            !second.path().join("stale.txt").exists(),
            "leftover content should be cleaned before the retry"
        );
    }

    #[tokio::test]
    async fn provision_replaces_leftover_file_at_target() {
        let tmp = tempfile::tempdir().unwrap();
        let p = provisioner(tmp.path());
        let identifier = id("/srv/report.pdf");
        std::fs::write(p.target_path(&identifier), b"not a directory").unwrap();

        let area = p.provision(&identifier).await.unwrap();
        assert!(area.path().is_dir());
        assert_eq!(std::fs::read_dir(area.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn provision_replaces_leftover_symlink_without_following_it() {
        let tmp = tempfile::tempdir().unwrap();
        let outside = tmp.path().join("outside");
        std::fs::create_dir(&outside).unwrap();
        std::fs::write(outside.join("keep.txt"), b"keep").unwrap();
        let root = tmp.path().join("staging");
        std::fs::create_dir(&root).unwrap();
        let p = provisioner(&root);
        let identifier = id("/srv/linked");
        std::os::unix::fs::symlink(&outside, p.target_path(&identifier)).unwrap();

        let area = p.provision(&identifier).await.unwrap();
        assert!(area.path().is_dir());
        assert!(!area.path().is_symlink());
        assert!(outside.join("keep.txt").is_file());
    }

    #[tokio::test]
    async fn provision_gives_up_after_max_attempts() {
        let tmp = tempfile::tempdir().unwrap();
        // A regular file as the root makes every create_dir fail.
        let root = tmp.path().join("not-a-dir");
        std::fs::write(&root, b"x").unwrap();
        let p = provisioner(&root);

        let err = p.provision(&id("/tmp/a")).await.unwrap_err();
        match err {
            ShareError::Provisioning { attempts, .. } => assert_eq!(attempts, 5),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn provision_respects_custom_attempt_bound() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("missing").join("deeper");
        let p = StagingProvisioner::new(&root).with_retry(RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::immediate()
        });

        let err = p.provision(&id("/tmp/a")).await.unwrap_err();
        assert!(matches!(err, ShareError::Provisioning { attempts: 2, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn provision_backs_off_between_attempts() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("not-a-dir");
        std::fs::write(&root, b"x").unwrap();
        let p = StagingProvisioner::new(&root);

        let started = tokio::time::Instant::now();
        let _ = p.provision(&id("/tmp/a")).await;
        // 50 + 100 + 200 + 400 ms between five attempts.
        assert!(started.elapsed() >= Duration::from_millis(750));
    }

    #[tokio::test]
    async fn remove_deletes_staging_area() {
        let tmp = tempfile::tempdir().unwrap();
        let p = provisioner(tmp.path());
        let area = p.provision(&id("/tmp/gone")).await.unwrap();
        std::fs::create_dir_all(area.content_dir()).unwrap();
        let path = area.path().to_path_buf();

        area.remove().await.unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn retry_delay_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after_attempt(1), Duration::from_millis(50));
        assert_eq!(policy.delay_after_attempt(2), Duration::from_millis(100));
        assert_eq!(policy.delay_after_attempt(3), Duration::from_millis(200));
        assert_eq!(policy.delay_after_attempt(10), Duration::from_secs(1));
        assert_eq!(RetryPolicy::immediate().delay_after_attempt(3), Duration::ZERO);
    }
}
