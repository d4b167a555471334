use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Identifier a blob host needs to delete a blob (e.g. `character/abc123`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobId(pub String);

impl BlobId {
    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BlobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Reference to a stored blob, as handed back by a [`crate::BlobStore`].
///
/// `locator` is the externally resolvable URL that gets persisted on the
/// record; `identifier` is what the host needs to remove the blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    pub locator: String,
    pub identifier: BlobId,
}

impl BlobRef {
    pub fn new<S: Into<String>>(locator: S, identifier: BlobId) -> Self {
        Self {
            locator: locator.into(),
            identifier,
        }
    }
}

/// Outcome of a remove call. Both variants are success: removal is idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Removal {
    Removed,
    NotFound,
}

/// Image bytes to store, plus whatever the client told us about them
#[derive(Debug, Clone)]
pub struct ImagePut {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub filename: Option<String>,
    pub folder: Option<String>,
}

impl ImagePut {
    pub fn new<B: Into<Bytes>>(bytes: B) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: None,
            filename: None,
            folder: None,
        }
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_filename<S: Into<String>>(mut self, filename: S) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_folder<S: Into<String>>(mut self, folder: S) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Best guess at a file extension: filename first, then content type.
    pub fn extension(&self) -> &str {
        if let Some(ext) = self
            .filename
            .as_deref()
            .and_then(|f| f.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && !ext.contains('/'))
        {
            return ext;
        }

        match self.content_type.as_deref() {
            Some("image/png") => "png",
            Some("image/jpeg") | Some("image/jpg") => "jpg",
            Some("image/gif") => "gif",
            Some("image/webp") => "webp",
            Some("image/svg+xml") => "svg",
            _ => "bin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_prefers_filename() {
        let put = ImagePut::new(vec![1u8])
            .with_filename("haru.jpeg")
            .with_content_type("image/png");
        assert_eq!(put.extension(), "jpeg");
    }

    #[test]
    fn extension_falls_back_to_content_type() {
        let put = ImagePut::new(vec![1u8]).with_content_type("image/webp");
        assert_eq!(put.extension(), "webp");

        let unknown = ImagePut::new(vec![1u8]).with_filename("noext");
        assert_eq!(unknown.extension(), "bin");
    }
}
