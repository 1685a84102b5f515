//! Local cache of remote deployment state.
//!
//! A [`RefreshScheduler`] connects a [`RemoteSession`] from the stored
//! token, fans out one fetch per [`CacheKind`], and writes each payload
//! under `now.cache.<kind>`. A 403 during a full refresh means the session
//! was revoked: the [`RefreshLoop`] is stopped for good and the
//! [`LogoutHandler`] runs.

pub mod error;
pub mod http;
pub mod kind;
pub mod logout;
pub mod scheduler;
pub mod session;
pub mod sync;

pub use error::{CacheError, FetchError};
pub use http::{DEFAULT_BASE_URL, HttpConnector, HttpSession};
pub use kind::CacheKind;
pub use logout::{ClearSession, LogoutFuture, LogoutHandler};
pub use scheduler::{RefreshLoop, RefreshOutcome, RefreshScheduler};
pub use session::{FetchFuture, RemoteSession, SessionConnector, connect};
pub use sync::CacheSynchronizer;
