//! Package manifest defaults injected into every staging area.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Manifest file name at the staging root.
pub const MANIFEST_FILE: &str = "package.json";

/// Subdirectory single files (and plain directories) are staged under.
pub const CONTENT_DIR: &str = "content";

/// Startup command that serves the staged content.
pub const START_SCRIPT: &str = "serve ./content";

/// Static file server package and the version pinned for it.
pub const SERVE_PACKAGE: &str = "serve";
pub const SERVE_VERSION: &str = "3.2.7";

/// Fallback name when the source name has no identifier-safe characters.
const FALLBACK_NAME: &str = "shared";

/// Package descriptor for a staged share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl PackageManifest {
    /// Builds the defaults for `source`, named after its final segment
    /// without extension.
    pub fn for_source(source: &Path) -> Self {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::named(to_id(&stem))
    }

    /// Builds the defaults with an explicit name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scripts: BTreeMap::from([("start".to_string(), START_SCRIPT.to_string())]),
            dependencies: BTreeMap::from([(
                SERVE_PACKAGE.to_string(),
                SERVE_VERSION.to_string(),
            )]),
        }
    }
}

/// Normalizes `raw` into an identifier-safe name.
///
/// Lowercase ASCII letters and digits are kept; every run of anything else
/// becomes a single `-`, with no leading or trailing `-`.
pub fn to_id(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        out
    }
}
