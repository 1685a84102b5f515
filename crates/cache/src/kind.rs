//! The kinds of remote state kept in the local cache.

use std::fmt;

use crate::session::{FetchFuture, RemoteSession};

/// A named slice of remote state with exactly one fetch method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Deployments,
    Aliases,
}

impl CacheKind {
    /// Every kind refreshed by a full refresh.
    pub const ALL: [CacheKind; 2] = [CacheKind::Deployments, CacheKind::Aliases];

    pub fn name(self) -> &'static str {
        match self {
            Self::Deployments => "deployments",
            Self::Aliases => "aliases",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Starts the fetch this kind maps to.
    pub fn fetch(self, session: &dyn RemoteSession) -> FetchFuture<'_> {
        match self {
            Self::Deployments => session.get_deployments(),
            Self::Aliases => session.get_aliases(),
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
