//! Deterministic staging identifiers.

use std::fmt;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Namespace tag keeping staging directories apart from unrelated temp dirs.
pub const NAMESPACE: &str = "shared";

/// Stable identifier for a shared source path: `shared-<hash>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentifier(String);

impl PackageIdentifier {
    /// Derives the identifier from the raw bytes of the path.
    ///
    /// Pure: the same path always yields the same identifier, and the
    /// filesystem is never consulted. Paths that are not valid UTF-8 hash
    /// their exact encoding, so two of them never share a staging area just
    /// because their lossy renderings match.
    pub fn derive(source: &Path) -> Self {
        let digest = Sha256::digest(source.as_os_str().as_encoded_bytes());
        Self(format!("{NAMESPACE}-{}", hex::encode(&digest[..16])))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for PackageIdentifier {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}
