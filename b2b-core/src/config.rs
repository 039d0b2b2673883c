//! # Configuration
//!
//! A flat string key/value store with `app.set()` / `app.get()`
//! semantics. Keys are dotted (`paginate.max`, `scope.policy`).
//!
//! ```rust
//! use b2b_core::AppConfig;
//!
//! let mut cfg = AppConfig::new();
//! cfg.set("paginate.default", "10");
//! cfg.set("scope.policy", "strict");
//!
//! let snap = cfg.snapshot();
//! assert_eq!(snap.get_u64("paginate.default"), Some(10));
//! assert_eq!(snap.get("scope.policy"), Some("strict"));
//! ```
//!
//! Environment variables override defaults through [`AppConfig::load_env`]:
//! `B2B__PAGINATE__MAX=50` becomes `paginate.max = "50"`.

use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Default)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Import `PREFIX` + `SECTION__KEY` variables from an iterator of
    /// `(name, value)` pairs, lowercasing and turning `__` into `.`.
    ///
    /// Returns how many keys were set.
    pub fn load_vars<I>(&mut self, prefix: &str, vars: I) -> usize
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut n = 0;
        for (key, value) in vars {
            let Some(stripped) = key.strip_prefix(prefix) else {
                continue;
            };
            if stripped.is_empty() {
                continue;
            }
            let normalized = stripped.to_lowercase().replace("__", ".");
            tracing::debug!(key = %normalized, "config override from environment");
            self.set(normalized, value);
            n += 1;
        }
        n
    }

    /// [`AppConfig::load_vars`] over the process environment.
    pub fn load_env(&mut self, prefix: &str) -> usize {
        self.load_vars(prefix, std::env::vars())
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            map: self.values.clone(),
        }
    }
}

/// Read-only copy of the configuration, handed to hooks and services.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    map: HashMap<String, String>,
}

impl ConfigSnapshot {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get_parsed(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_parsed(key)
    }

    /// Parse a value with `FromStr`; unparsable values read as absent.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse::<T>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_vars_become_dotted_keys() {
        let mut cfg = AppConfig::new();
        let n = cfg.load_vars(
            "B2B__",
            vec![
                ("B2B__PAGINATE__MAX".to_string(), "50".to_string()),
                ("B2B__SCOPE__POLICY".to_string(), "permissive".to_string()),
                ("PATH".to_string(), "/usr/bin".to_string()),
            ],
        );
        assert_eq!(n, 2);
        assert_eq!(cfg.get("paginate.max"), Some("50"));
        assert_eq!(cfg.get("scope.policy"), Some("permissive"));
        assert!(!cfg.has("path"));
    }

    #[test]
    fn snapshot_parses_values() {
        let mut cfg = AppConfig::new();
        cfg.set("paginate.max", " 25 ");
        cfg.set("feature.on", "true");
        cfg.set("broken", "abc");

        let snap = cfg.snapshot();
        assert_eq!(snap.get_u64("paginate.max"), Some(25));
        assert_eq!(snap.get_bool("feature.on"), Some(true));
        assert_eq!(snap.get_u64("broken"), None);
        assert_eq!(snap.get_u64("missing"), None);
    }
}
