//! Share flow: package a local file or directory into a staging area.
//!
//! The staging area is a directory under the temp root whose name is
//! derived from the source path, so sharing the same path again lands in
//! the same place and the remote side sees an update instead of a new
//! deployment.
//!
//! # Pipeline
//!
//! 1. **Check**: the source path must exist
//! 2. **Derive**: `shared-<hash>` identifier and manifest defaults
//! 3. **Provision**: create the staging directory, retrying with cleanup
//! 4. **Track**: emit the `Shared` event
//! 5. **Compose**: copy the tree or the single file, inject `package.json`

pub mod composer;
pub mod error;
pub mod fs_ops;
pub mod identifier;
pub mod manifest;
pub mod staging;
pub mod status;
pub mod workflow;

pub use composer::{BoxFuture, ContentCopier, ManifestInjector, PackageComposer};
pub use error::ShareError;
pub use fs_ops::{PackageJsonInjector, TreeCopier};
pub use identifier::PackageIdentifier;
pub use manifest::{PackageManifest, to_id};
pub use staging::{RetryPolicy, StagingArea, StagingProvisioner};
pub use status::{ShareStatus, StatusGuard, StatusTracker};
pub use workflow::{SHARED_EVENT, ShareRequest, ShareWorkflow};
