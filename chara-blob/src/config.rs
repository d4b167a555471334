use std::collections::BTreeSet;

/// Configuration for image blob operations
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Absolute max size allowed for a single image (safety guard)
    pub max_image_bytes: u64,

    /// Allowed content types (empty = all allowed)
    pub allowed_content_types: BTreeSet<String>,

    /// Folder images are grouped under at the host
    pub folder: String,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: 10 * 1024 * 1024, // 10MB
            allowed_content_types: BTreeSet::new(),
            folder: "character".to_string(),
        }
    }
}

impl BlobConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max image size
    pub fn with_max_image_bytes(mut self, bytes: u64) -> Self {
        self.max_image_bytes = bytes;
        self
    }

    /// Add an allowed content type
    pub fn allow_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.allowed_content_types.insert(content_type.into());
        self
    }

    /// Set the host folder
    pub fn with_folder<S: Into<String>>(mut self, folder: S) -> Self {
        self.folder = folder.into();
        self
    }

    /// Whether `content_type` passes the allow-list. A missing content type
    /// only passes when the list is empty.
    pub fn accepts(&self, content_type: Option<&str>) -> bool {
        if self.allowed_content_types.is_empty() {
            return true;
        }
        content_type.is_some_and(|ct| self.allowed_content_types.contains(ct))
    }
}
