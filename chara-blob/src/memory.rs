use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{BlobError, BlobId, BlobRef, BlobResult, BlobStore, ImagePut, Removal};

const DEFAULT_BASE_URL: &str = "https://blobs.local";

/// In-process blob store for tests and local runs.
///
/// Locators follow the hosted layout, `<base>/upload/<folder>/<uuid>.<ext>`,
/// so the default codec reads them back. Clones share the same contents.
#[derive(Clone)]
pub struct MemoryBlobStore {
    base_url: String,
    blobs: Arc<RwLock<HashMap<BlobId, Bytes>>>,
    unavailable: Arc<AtomicBool>,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            blobs: Arc::new(RwLock::new(HashMap::new())),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Simulate an outage: every call fails with `StoreUnavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn contains(&self, id: &BlobId) -> bool {
        self.blobs.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    fn check_available(&self) -> BlobResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BlobError::unavailable_msg("memory blob store is offline"));
        }
        Ok(())
    }

    /// `<base>/upload/<folder...>/<file>`, escaped where the segments need it.
    fn locator(&self, folder: &[&str], file: &str) -> BlobResult<String> {
        let mut url = Url::parse(&self.base_url).map_err(BlobError::unavailable)?;
        url.path_segments_mut()
            .map_err(|_| BlobError::unavailable_msg("memory blob base url cannot hold a path"))?
            .pop_if_empty()
            .push("upload")
            .extend(folder)
            .push(file);
        Ok(url.into())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, image: ImagePut) -> BlobResult<BlobRef> {
        self.check_available()?;

        let name = Uuid::new_v4().simple().to_string();
        let folder: Vec<&str> = image
            .folder
            .as_deref()
            .map(|f| f.split('/').filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        let locator = self.locator(&folder, &format!("{name}.{}", image.extension()))?;

        let id = if folder.is_empty() {
            BlobId(name)
        } else {
            BlobId(format!("{}/{name}", folder.join("/")))
        };
        self.blobs.write().await.insert(id.clone(), image.bytes);

        Ok(BlobRef::new(locator, id))
    }

    async fn remove(&self, id: &BlobId) -> BlobResult<Removal> {
        self.check_available()?;

        match self.blobs.write().await.remove(id) {
            Some(_) => Ok(Removal::Removed),
            None => Ok(Removal::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_then_codec_then_remove() {
        let store = MemoryBlobStore::new();
        let put = ImagePut::new(vec![1u8, 2, 3])
            .with_content_type("image/png")
            .with_folder("character");

        let blob = store.store(put).await.unwrap();
        assert!(blob.locator.starts_with("https://blobs.local/upload/character/"));
        assert!(blob.locator.ends_with(".png"));

        let derived = store.codec().identifier(&blob.locator).unwrap();
        assert_eq!(derived, blob.identifier);

        assert_eq!(store.remove(&derived).await.unwrap(), Removal::Removed);
        assert_eq!(store.remove(&derived).await.unwrap(), Removal::NotFound);
    }

    #[tokio::test]
    async fn folder_with_spaces_is_escaped_in_locator_only() {
        let store = MemoryBlobStore::new();
        let put = ImagePut::new(vec![1u8])
            .with_content_type("image/png")
            .with_folder("my chars");

        let blob = store.store(put).await.unwrap();
        assert!(blob.locator.starts_with("https://blobs.local/upload/my%20chars/"));
        assert!(Url::parse(&blob.locator).is_ok());
        assert!(blob.identifier.as_str().starts_with("my chars/"));

        let derived = store.codec().identifier(&blob.locator).unwrap();
        assert_eq!(derived, blob.identifier);
        assert_eq!(store.remove(&derived).await.unwrap(), Removal::Removed);
    }

    #[tokio::test]
    async fn outage_fails_both_operations() {
        let store = MemoryBlobStore::new();
        store.set_unavailable(true);

        let err = store.store(ImagePut::new(vec![1u8])).await.unwrap_err();
        assert!(err.is_unavailable());
        let err = store.remove(&BlobId::from("x")).await.unwrap_err();
        assert!(err.is_unavailable());
        assert!(store.is_empty().await);
    }
}
