use anyhow::{bail, Context, Result};
use chara_blob::{BlobConfig, CloudinaryConfig};
use chara_core::{ConfigSnapshot, ConfigStore, LifecyclePolicy};

/// Built-in values; `CHARA__*` environment variables override them.
pub const DEFAULTS: &[(&str, &str)] = &[
    ("http.host", "127.0.0.1"),
    ("http.port", "3030"),
    ("blob.folder", "character"),
    ("blob.max_image_mb", "10"),
    (
        "blob.allowed_types",
        "image/png,image/jpeg,image/gif,image/webp,application/octet-stream",
    ),
    ("cloudinary.api_base", "https://api.cloudinary.com"),
    ("lifecycle.orphans", "compensate"),
    ("lifecycle.superseded", "remove"),
];

const CLOUDINARY_KEYS: [&str; 3] = [
    "cloudinary.cloud_name",
    "cloudinary.api_key",
    "cloudinary.api_secret",
];

/// Everything the server needs at startup, resolved from config.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// `None` keeps records in memory.
    pub database_url: Option<String>,
    pub blob: BlobConfig,
    /// `None` keeps images in memory.
    pub cloudinary: Option<CloudinaryConfig>,
    pub policy: LifecyclePolicy,
}

impl Settings {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_snapshot(&ConfigStore::from_env(DEFAULTS).snapshot())
    }

    /// Defaults only, for tests and embedding.
    pub fn defaults() -> ConfigStore {
        let mut config = ConfigStore::new();
        for (key, value) in DEFAULTS {
            config.set(*key, *value);
        }
        config
    }

    pub fn from_snapshot(cfg: &ConfigSnapshot) -> Result<Self> {
        let port = match cfg.get("http.port") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("http.port is not a port number: {raw}"))?,
            None => 3030,
        };

        let max_image_mb = match cfg.get("blob.max_image_mb") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("blob.max_image_mb is not a number: {raw}"))?,
            None => 10,
        };

        let max_image_bytes = max_image_mb
            .checked_mul(1024 * 1024)
            .context("blob.max_image_mb too large")?;
        let mut blob = BlobConfig::new().with_max_image_bytes(max_image_bytes);
        if let Some(folder) = cfg.get("blob.folder") {
            blob = blob.with_folder(folder.trim());
        }
        for content_type in cfg.get_list("blob.allowed_types") {
            blob = blob.allow_content_type(content_type);
        }

        let policy = LifecyclePolicy {
            orphans: match cfg.get("lifecycle.orphans") {
                Some(raw) => raw.parse().map_err(anyhow::Error::msg)?,
                None => Default::default(),
            },
            superseded: match cfg.get("lifecycle.superseded") {
                Some(raw) => raw.parse().map_err(anyhow::Error::msg)?,
                None => Default::default(),
            },
        };

        Ok(Self {
            host: cfg
                .get_string("http.host")
                .unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            database_url: cfg.get_string("database.url"),
            blob,
            cloudinary: cloudinary_config(cfg)?,
            policy,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// All three credentials or none.
fn cloudinary_config(cfg: &ConfigSnapshot) -> Result<Option<CloudinaryConfig>> {
    let values: Vec<Option<&str>> = CLOUDINARY_KEYS.iter().map(|k| cfg.get(k)).collect();

    match values.as_slice() {
        [Some(cloud_name), Some(api_key), Some(api_secret)] => {
            let mut config = CloudinaryConfig::new(*cloud_name, *api_key, *api_secret);
            if let Some(api_base) = cfg.get("cloudinary.api_base") {
                config = config.with_api_base(api_base);
            }
            Ok(Some(config))
        }
        [None, None, None] => Ok(None),
        _ => {
            let missing: Vec<&str> = CLOUDINARY_KEYS
                .iter()
                .zip(&values)
                .filter(|(_, v)| v.is_none())
                .map(|(k, _)| *k)
                .collect();
            bail!("incomplete cloudinary credentials, missing {}", missing.join(", "))
        }
    }
}
