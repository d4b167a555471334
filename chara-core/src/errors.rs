//! # Errors
//!
//! Structured, transport-agnostic errors for the character service.
//! Every failure a caller can see has a kind with a stable status code,
//! `name` and `className`; the server crate decides how to serialize it.
//!
//! Blob cleanup failures have no kind: they are logged where they
//! happen and never reach a caller.

use std::fmt;

use anyhow::Error as AnyError;
use serde_json::Value;

/// A convenience result type for core APIs.
pub type CharaResult<T> = std::result::Result<T, CharaError>;

/// Error kinds a caller can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,        // 400
    NotFound,          // 404
    InternalError,     // 500
    ImageUploadFailed, // 502
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::InternalError => 500,
            ErrorKind::ImageUploadFailed => 502,
        }
    }

    /// Error `name` (e.g. "NotFound")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::InternalError => "InternalError",
            ErrorKind::ImageUploadFailed => "ImageUploadFailed",
        }
    }

    /// Error `className` (kebab-cased)
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotFound => "not-found",
            ErrorKind::InternalError => "internal-error",
            ErrorKind::ImageUploadFailed => "image-upload-failed",
        }
    }
}

/// A structured error:
/// - kind (name, code, class_name)
/// - message
/// - errors (optional per-field details)
/// - source (never sent to clients)
#[derive(Debug)]
pub struct CharaError {
    pub kind: ErrorKind,
    pub message: String,
    pub errors: Option<Value>,
    pub source: Option<AnyError>,
}

impl CharaError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            errors: None,
            source: None,
        }
    }

    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_source(mut self, source: impl Into<AnyError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// A version safe to hand to clients:
    /// - the source is dropped
    /// - internal errors lose their message detail
    pub fn sanitize_for_client(&self) -> CharaError {
        let message = match self.kind {
            ErrorKind::InternalError => "Internal error".to_string(),
            _ => self.message.clone(),
        };
        CharaError {
            kind: self.kind,
            message,
            errors: self.errors.clone(),
            source: None,
        }
    }

    /// JSON payload.
    pub fn to_json(&self) -> Value {
        let mut base = serde_json::json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });

        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        base
    }

    // ---- Constructors ----

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn image_upload_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::ImageUploadFailed, msg)
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, msg)
    }
}

impl fmt::Display for CharaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for CharaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Record store failures surface as internal errors.
impl From<AnyError> for CharaError {
    fn from(err: AnyError) -> Self {
        match err.downcast::<CharaError>() {
            Ok(chara) => chara,
            Err(other) => CharaError::internal(other.to_string()).with_source(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_shape() {
        let err = CharaError::bad_request("Missing data").with_errors(json!({"age": ["required"]}));
        assert_eq!(
            err.to_json(),
            json!({
                "name": "BadRequest",
                "message": "Missing data",
                "code": 400,
                "className": "bad-request",
                "errors": {"age": ["required"]}
            })
        );
    }

    #[test]
    fn internal_detail_is_hidden_from_clients() {
        let err: CharaError = anyhow::anyhow!("database is locked").into();
        assert!(err.is(ErrorKind::InternalError));
        assert!(err.source.is_some());

        let safe = err.sanitize_for_client();
        assert_eq!(safe.message, "Internal error");
        assert!(safe.source.is_none());
    }

    #[test]
    fn anyhow_wrapped_chara_error_keeps_its_kind() {
        let wrapped = anyhow::Error::new(CharaError::not_found("gone"));
        let err: CharaError = wrapped.into();
        assert!(err.is(ErrorKind::NotFound));
    }
}
