//! Persistent configuration store.
//!
//! Holds the session token and the locally cached remote state in a single
//! JSON document. Keys are dotted paths (`now.cache.aliases`) addressing
//! nested objects.

pub mod keys;
mod store;

pub use store::{ConfigStore, SettingsError, default_config_path};
