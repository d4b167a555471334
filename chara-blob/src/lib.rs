//! # chara-blob: image blob storage for Chara Vault
//!
//! `chara-blob` owns everything on the blob side of a character record:
//! storing the uploaded image with a remote host, removing it again, and
//! recovering the identifier needed for removal from nothing but the public
//! URL the record keeps.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ CharacterLife-  │  ← orchestration (chara-core)
//! │ cycle           │
//! ├─────────────────┤
//! │   BlobAdapter   │  ← validation + locator codec
//! ├─────────────────┤
//! │   BlobStore     │  ← store / remove primitives
//! └─────────────────┘
//! ```
//!
//! The store itself is a two-method capability so any host can sit behind
//! it. Two are shipped: [`MemoryBlobStore`] for tests and local runs, and
//! [`CloudinaryStore`] for Cloudinary-style signed uploads.
//!
//! ```rust
//! use chara_blob::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! let blobs = BlobAdapter::new(MemoryBlobStore::new(), BlobConfig::default());
//!
//! let put = ImagePut::new(b"\x89PNG...".to_vec()).with_content_type("image/png");
//! let blob = blobs.put(put).await?;
//!
//! // Later, with only the stored URL at hand:
//! let outcome = blobs.release(&blob.locator).await?;
//! assert_eq!(outcome, Removal::Removed);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
mod cloudinary;
mod codec;
mod config;
mod error;
mod memory;
pub mod store;
mod types;

pub use adapter::BlobAdapter;
pub use cloudinary::{CloudinaryConfig, CloudinaryStore};
pub use codec::{CodecError, LocatorCodec};
pub use config::BlobConfig;
pub use error::{BlobError, BlobResult};
pub use memory::MemoryBlobStore;
pub use store::BlobStore;
pub use types::{BlobId, BlobRef, ImagePut, Removal};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobAdapter, BlobConfig, BlobError, BlobId, BlobRef, BlobResult, BlobStore, ImagePut,
        LocatorCodec, MemoryBlobStore, Removal,
    };
}
