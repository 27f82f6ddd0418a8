//! Environment variable utilities
//!
//! Small parsing helpers for the `CBG_*` configuration variables.
//!
//! # Usage
//!
//! ```ignore
//! use callgroup_core::env::{env_get, env_get_bool};
//!
//! let spin: usize = env_get("CBG_STRESS_THREADS", 8);
//! let flush: bool = env_get_bool("CBG_FLUSH_EPRINT", false);
//! ```

use std::str::FromStr;

/// Get environment variable parsed as type T, or return default
///
/// Works with any type that implements `FromStr`. Unset and unparsable
/// values both fall back to the default.
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Get environment variable as boolean
///
/// Accepts "1", "true", "yes", "on" (case-insensitive) as true.
/// Any other set value is false; unset returns the default.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// Get environment variable as a string, None when unset
#[inline]
pub fn env_get_opt(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_get_default() {
        // Key chosen to never exist in a test environment
        let v: usize = env_get("CBG_TEST_UNSET_KEY_7391", 17);
        assert_eq!(v, 17);
        assert!(env_get_bool("CBG_TEST_UNSET_KEY_7391", true));
        assert_eq!(env_get_opt("CBG_TEST_UNSET_KEY_7391"), None);
    }
}
