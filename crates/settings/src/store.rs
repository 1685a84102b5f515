//! JSON-file backed configuration store.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde_json::{Map, Value};
use tracing::debug;

/// Errors from configuration store operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    #[error("configuration document is not a JSON object")]
    NotAnObject,
}

/// Process-wide configuration store.
///
/// The document is cached in memory and, for file-backed stores, written
/// back to disk after every mutation. Writes are last-writer-wins per key.
pub struct ConfigStore {
    path: Option<PathBuf>,
    data: RwLock<Value>,
}

impl ConfigStore {
    /// Opens a file-backed store, loading the existing document if present.
    pub fn open(path: PathBuf) -> Result<Self, SettingsError> {
        let data = load_document(&path)?;
        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    /// Creates a store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(Value::Object(Map::new())),
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns a copy of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        key.split('.')
            .try_fold(&*data, |node, segment| node.get(segment))
            .cloned()
    }

    /// Returns the value under `key` if it is a string.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Stores `value` under `key`, replacing whatever was there.
    ///
    /// Intermediate segments that are missing or not objects are replaced
    /// with empty objects.
    pub fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let segments = split_key(key)?;
        {
            let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
            insert_path(&mut data, &segments, value);
        }
        self.persist()
    }

    /// Removes `key`. Returns `true` if a value was removed.
    pub fn delete(&self, key: &str) -> Result<bool, SettingsError> {
        let segments = split_key(key)?;
        let removed = {
            let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
            remove_path(&mut data, &segments)
        };
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Writes the current document to disk (no-op for in-memory stores).
    fn persist(&self) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        let json = serde_json::to_string_pretty(&*data)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        set_permissions_0600(path);
        debug!("persisted configuration to {:?}", path);
        Ok(())
    }
}

fn split_key(key: &str) -> Result<Vec<&str>, SettingsError> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(SettingsError::InvalidKey(key.to_string()));
    }
    Ok(segments)
}

fn insert_path(root: &mut Value, segments: &[&str], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut node = root;
    for segment in parents {
        node = as_object(node)
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    as_object(node).insert((*last).to_string(), value);
}

fn remove_path(root: &mut Value, segments: &[&str]) -> bool {
    let Some((last, parents)) = segments.split_last() else {
        return false;
    };
    let mut node = root;
    for segment in parents {
        match node.get_mut(*segment) {
            Some(next) => node = next,
            None => return false,
        }
    }
    node.as_object_mut()
        .is_some_and(|map| map.remove(*last).is_some())
}

/// Coerces `node` into an object, discarding any non-object value.
fn as_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

/// Loads the configuration document from disk.
fn load_document(path: &Path) -> Result<Value, SettingsError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    let data: Value = serde_json::from_str(&content)?;
    if !data.is_object() {
        return Err(SettingsError::NotAnObject);
    }
    debug!("loaded configuration from {:?}", path);
    Ok(data)
}

fn set_permissions_0600(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("stagecast").join("config.json"))
}

/// Returns the platform-specific config directory.
fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join(".config"))
    }
}
