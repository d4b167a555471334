//! chara-server: wires configuration, backends and the HTTP app together.

pub mod settings;

use std::sync::Arc;

use anyhow::Result;
use chara_axum::middlewares::MultipartConfig;
use chara_axum::CharaAxumApp;
use chara_blob::{BlobAdapter, BlobStore, CloudinaryStore, MemoryBlobStore};
use chara_core::{CharacterLifecycle, MemoryRecordStore, RecordStore};
use chara_sqlx::SqliteRecordStore;
use tracing::{info, warn};

pub use settings::Settings;

/// Build the app from `CHARA__*` environment settings.
pub async fn build() -> Result<CharaAxumApp> {
    build_with(&Settings::from_env()?).await
}

/// Build the app, choosing backends from `settings`.
pub async fn build_with(settings: &Settings) -> Result<CharaAxumApp> {
    let records: Arc<dyn RecordStore> = match &settings.database_url {
        Some(url) => Arc::new(SqliteRecordStore::connect(url).await?),
        None => {
            warn!("database.url not set, records are kept in memory");
            Arc::new(MemoryRecordStore::new())
        }
    };

    let blobs: Arc<dyn BlobStore> = match &settings.cloudinary {
        Some(config) => {
            info!(cloud_name = %config.cloud_name, "images hosted on cloudinary");
            Arc::new(CloudinaryStore::new(config.clone())?)
        }
        None => {
            warn!("cloudinary credentials not set, images are kept in memory");
            Arc::new(MemoryBlobStore::new())
        }
    };

    Ok(assemble(records, blobs, settings))
}

/// Assemble the app around already-built backends.
pub fn assemble(
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    settings: &Settings,
) -> CharaAxumApp {
    let blobs = BlobAdapter::from_arc(blobs, settings.blob.clone());
    let lifecycle = CharacterLifecycle::from_arc(records, blobs).with_policy(settings.policy);
    let form = MultipartConfig::default().max_image_size(settings.blob.max_image_bytes as usize);

    CharaAxumApp::with_form_config(lifecycle, form).service("/health", || async { "ok" })
}
