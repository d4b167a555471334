//! Recovering a removable blob identifier from a stored locator.
//!
//! Records only keep the public URL of their image. Hosts such as
//! Cloudinary lay those URLs out as
//! `https://<host>/<cloud>/image/upload[/v<version>]/<folder>/<name>.<ext>`
//! and expect `<folder>/<name>` back on deletion, so the identifier is
//! rebuilt from the path: everything after the marker segment, minus the
//! extension. A locator that doesn't follow the convention can't be
//! reclaimed; callers treat that as a soft failure.

use percent_encoding::percent_decode_str;
use reqwest::Url;
use thiserror::Error;

use crate::BlobId;

/// Default marker segment preceding the identifier
pub const DEFAULT_MARKER: &str = "upload";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("locator is not a valid URL: {0}")]
    NotAUrl(String),

    #[error("locator path has no `{marker}` segment")]
    MarkerMissing { marker: String },

    #[error("locator path has nothing after the `{marker}` segment")]
    EmptyIdentifier { marker: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorCodec {
    marker: String,
    skip_version: bool,
}

impl Default for LocatorCodec {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            skip_version: false,
        }
    }
}

impl LocatorCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different marker segment than `upload`
    pub fn with_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.marker = marker.into();
        self
    }

    /// Drop a `v<digits>` segment sitting right after the marker
    pub fn skip_version_segment(mut self) -> Self {
        self.skip_version = true;
        self
    }

    /// Derive the identifier for `locator`.
    pub fn identifier(&self, locator: &str) -> Result<BlobId, CodecError> {
        let url = Url::parse(locator.trim()).map_err(|e| CodecError::NotAUrl(e.to_string()))?;

        // Stores issue identifiers unescaped, `my chars/abc` rather than `my%20chars/abc`.
        let segments: Vec<String> = url
            .path_segments()
            .map(|s| {
                s.map(|seg| percent_decode_str(seg).decode_utf8_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        let marker_at = segments
            .iter()
            .position(|s| *s == self.marker)
            .ok_or_else(|| CodecError::MarkerMissing {
                marker: self.marker.clone(),
            })?;

        let mut rest: Vec<&str> = segments[marker_at + 1..]
            .iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect();

        if self.skip_version && rest.len() > 1 && is_version_segment(rest[0]) {
            rest.remove(0);
        }

        let with_ext = rest.join("/");
        let identifier = strip_extension(&with_ext);
        if identifier.is_empty() {
            return Err(CodecError::EmptyIdentifier {
                marker: self.marker.clone(),
            });
        }

        Ok(BlobId(identifier.to_string()))
    }
}

fn is_version_segment(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Strip the last `.ext` of the final path segment.
fn strip_extension(path: &str) -> &str {
    let last_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[last_start..].rfind('.') {
        Some(dot) if last_start + dot + 1 < path.len() => &path[..last_start + dot],
        _ => path,
    }
}
