//! Cache refresh error types.

use stagecast_settings::SettingsError;

/// HTTP status the remote API answers with once a token is revoked.
pub const STATUS_FORBIDDEN: u16 = 403;

/// A failed remote fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The remote answered with a non-success status.
    #[error("Error: {code} {message}")]
    Status { code: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            message: message.into(),
        }
    }

    /// Status code carried by the failure, if the remote answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_authorization_revoked(&self) -> bool {
        self.status_code() == Some(STATUS_FORBIDDEN)
    }
}

/// A failed refresh of one cache kind.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The fetch itself failed; the remote error is kept as is.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("could not persist cache entry: {0}")]
    Store(#[from] SettingsError),
}

impl CacheError {
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            Self::Fetch(e) => Some(e),
            Self::Store(_) => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.fetch_error().and_then(FetchError::status_code)
    }

    pub fn is_authorization_revoked(&self) -> bool {
        self.fetch_error()
            .is_some_and(FetchError::is_authorization_revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_keeps_code_first() {
        let e = FetchError::status(403, "Forbidden");
        assert_eq!(e.to_string(), "Error: 403 Forbidden");
        assert_eq!(e.status_code(), Some(403));
        assert!(e.is_authorization_revoked());
    }

    #[test]
    fn non_status_errors_have_no_code() {
        let e = FetchError::Transport("connection refused".into());
        assert_eq!(e.status_code(), None);
        assert!(!e.is_authorization_revoked());
        assert!(!FetchError::status(500, "Internal Server Error").is_authorization_revoked());
    }

    #[test]
    fn cache_error_exposes_fetch_status() {
        let e = CacheError::from(FetchError::status(403, "Forbidden"));
        assert_eq!(e.to_string(), "Error: 403 Forbidden");
        assert_eq!(e.status_code(), Some(403));
        assert!(e.is_authorization_revoked());

        let store = CacheError::from(SettingsError::InvalidKey("".into()));
        assert_eq!(store.status_code(), None);
        assert!(!store.is_authorization_revoked());
    }
}
