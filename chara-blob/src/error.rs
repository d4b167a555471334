use thiserror::Error;

/// Result type for blob operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors that can occur during blob operations
#[derive(Error, Debug)]
pub enum BlobError {
    /// The host could not be reached, timed out, or failed on its side.
    #[error("Blob store unavailable: {source}")]
    StoreUnavailable {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The host (or local validation) refused the content.
    #[error("Upload rejected: {reason}")]
    UploadRejected { reason: String },

    #[error("Invalid blob locator: {source}")]
    Locator {
        #[from]
        source: crate::CodecError,
    },
}

impl BlobError {
    /// Create an unavailable error from any error type
    pub fn unavailable<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::StoreUnavailable {
            source: Box::new(error),
        }
    }

    /// Create an unavailable error from a plain message
    pub fn unavailable_msg<S: Into<String>>(message: S) -> Self {
        let message: String = message.into();
        Self::StoreUnavailable {
            source: message.into(),
        }
    }

    /// Create an upload rejected error
    pub fn rejected<S: Into<String>>(reason: S) -> Self {
        Self::UploadRejected {
            reason: reason.into(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}
