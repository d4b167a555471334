use async_trait::async_trait;

use crate::{BlobId, BlobRef, BlobResult, ImagePut};

/// Core blob storage operations - implemented by every image host backend.
///
/// On `store` success the blob exists remotely; on failure nothing should,
/// though that part is up to the host. `remove` is idempotent: an identifier
/// that is already gone yields [`crate::Removal::NotFound`], and only
/// transport-level trouble is an error.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload an image and return where it lives
    async fn store(&self, image: ImagePut) -> BlobResult<BlobRef>;

    /// Delete a blob by identifier
    async fn remove(&self, id: &BlobId) -> BlobResult<crate::Removal>;

    /// Codec able to read this store's locators back into identifiers
    fn codec(&self) -> crate::LocatorCodec {
        crate::LocatorCodec::default()
    }
}
