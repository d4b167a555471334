//! # Configuration
//!
//! A minimal string key/value store with dotted keys, plus a loader for
//! environment overrides:
//!
//! ```rust
//! use chara_core::ConfigStore;
//!
//! let mut config = ConfigStore::new();
//! config.set("http.port", "3030");
//! config.load_env_from("CHARA__", [("CHARA__HTTP__PORT", "8080")]);
//!
//! let snapshot = config.snapshot();
//! assert_eq!(snapshot.get_u16("http.port"), Some(8080));
//! ```
//!
//! `CHARA__CLOUDINARY__API_KEY` becomes `cloudinary.api_key`: the prefix is
//! stripped, the rest lowercased, and `__` turns into `.`.

use std::collections::HashMap;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "CHARA__";

#[derive(Debug, Default, Clone)]
pub struct ConfigStore {
    values: HashMap<String, String>,
}

impl ConfigStore {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env(defaults: &[(&str, &str)]) -> Self {
        let mut config = Self::new();
        for (key, value) in defaults {
            config.set(*key, *value);
        }
        config.load_env_from(ENV_PREFIX, std::env::vars());
        config
    }

    /// Set a configuration key to a string value.
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

    /// Apply every `(name, value)` pair whose name starts with `prefix`.
    pub fn load_env_from<I, K, V>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in vars {
            if let Some(stripped) = name.as_ref().strip_prefix(prefix) {
                let key = stripped.to_lowercase().replace("__", ".");
                self.set(key, value);
            }
        }
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(self.values.clone())
    }
}

/// Read-only view handed to components at startup.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    map: HashMap<String, String>,
}

impl ConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    /// Present and non-blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map
            .get(key)
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    pub fn get_u16(&self, key: &str) -> Option<u16> {
        self.get(key).and_then(|v| v.trim().parse::<u16>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    /// Comma separated list, blanks dropped.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_names_map_to_dotted_keys() {
        let mut config = ConfigStore::new();
        config.load_env_from(
            ENV_PREFIX,
            [
                ("CHARA__CLOUDINARY__API_KEY", "k"),
                ("CHARA__BLOB__MAX_IMAGE_MB", "4"),
                ("OTHER__HTTP__PORT", "1"),
            ],
        );

        let snap = config.snapshot();
        assert_eq!(snap.get("cloudinary.api_key"), Some("k"));
        assert_eq!(snap.get_u64("blob.max_image_mb"), Some(4));
        assert!(!config.has("http.port"));
    }

    #[test]
    fn blank_values_read_as_absent() {
        let mut config = ConfigStore::new();
        config.set("database.url", " ");
        config.set("blob.allowed_types", "image/png, ,image/gif");

        let snap = config.snapshot();
        assert_eq!(snap.get("database.url"), None);
        assert_eq!(snap.get_list("blob.allowed_types"), vec!["image/png", "image/gif"]);
    }
}
