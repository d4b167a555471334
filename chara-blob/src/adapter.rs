use std::sync::Arc;

use tracing::debug;

use crate::{
    BlobConfig, BlobError, BlobId, BlobRef, BlobResult, BlobStore, CodecError, ImagePut,
    LocatorCodec, Removal,
};

/// The blob adapter services embed.
///
/// Wraps a [`BlobStore`] with upload validation and the locator codec, so
/// callers can put images and later release them by URL alone.
#[derive(Clone)]
pub struct BlobAdapter {
    store: Arc<dyn BlobStore>,
    codec: LocatorCodec,
    config: BlobConfig,
}

impl BlobAdapter {
    /// Create a new blob adapter; the codec comes from the store
    pub fn new<S: BlobStore + 'static>(store: S, config: BlobConfig) -> Self {
        Self::from_arc(Arc::new(store), config)
    }

    /// Create from an already shared store
    pub fn from_arc(store: Arc<dyn BlobStore>, config: BlobConfig) -> Self {
        let codec = store.codec();
        Self {
            store,
            codec,
            config,
        }
    }

    /// Validate and store an image under the configured folder
    pub async fn put(&self, image: ImagePut) -> BlobResult<BlobRef> {
        if image.is_empty() {
            return Err(BlobError::rejected("Image is empty"));
        }

        let size = image.len() as u64;
        if size > self.config.max_image_bytes {
            return Err(BlobError::rejected(format!(
                "Image size {} exceeds maximum {}",
                size, self.config.max_image_bytes
            )));
        }

        if !self.config.accepts(image.content_type.as_deref()) {
            return Err(BlobError::rejected(format!(
                "Content type {} not allowed",
                image.content_type.as_deref().unwrap_or("<none>")
            )));
        }

        let image = match image.folder {
            Some(_) => image,
            None => image.with_folder(self.config.folder.clone()),
        };

        let blob = self.store.store(image).await?;
        debug!(identifier = %blob.identifier, locator = %blob.locator, "stored image blob");
        Ok(blob)
    }

    /// Remove a blob by identifier
    pub async fn remove(&self, id: &BlobId) -> BlobResult<Removal> {
        let outcome = self.store.remove(id).await?;
        debug!(identifier = %id, ?outcome, "removed image blob");
        Ok(outcome)
    }

    /// Derive the identifier behind a stored locator
    pub fn identifier(&self, locator: &str) -> Result<BlobId, CodecError> {
        self.codec.identifier(locator)
    }

    /// Remove the blob a stored locator points at
    pub async fn release(&self, locator: &str) -> BlobResult<Removal> {
        let id = self.identifier(locator)?;
        self.remove(&id).await
    }
}
