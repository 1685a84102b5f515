//! Well-known configuration keys.

/// Authentication token for the remote API.
pub const USER_TOKEN: &str = "now.user.token";

/// Prefix under which every cache kind is stored.
pub const CACHE_PREFIX: &str = "now.cache";

/// Returns the key a cache kind is persisted under (`now.cache.<kind>`).
pub fn cache_key(kind: &str) -> String {
    format!("{CACHE_PREFIX}.{kind}")
}
