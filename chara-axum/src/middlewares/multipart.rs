use std::collections::{HashMap, HashSet};

use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use chara_blob::ImagePut;
use chara_core::{CharaError, CharaResult, CreateRequest, UpdateRequest};
use serde_json::json;
use tracing::debug;

/// Extra room for form boundaries and text fields on top of the image itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Configuration for decoding character forms
#[derive(Debug, Clone)]
pub struct MultipartConfig {
    /// Incoming field name -> canonical field name
    pub aliases: HashMap<String, String>,
    /// Canonical field names to treat as files
    pub file_fields: HashSet<String>,
    /// Maximum total request size in bytes
    pub max_total_size: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self::new()
            .alias("nombre", "name")
            .alias("edad", "age")
            .alias("imagen", "image")
            .file_field("image")
            .max_image_size(10 * 1024 * 1024)
    }
}

impl MultipartConfig {
    /// Empty config: no aliases, no file fields.
    pub fn new() -> Self {
        Self {
            aliases: HashMap::new(),
            file_fields: HashSet::new(),
            max_total_size: FORM_OVERHEAD_BYTES,
        }
    }

    /// Accept `from` as another name for `to`
    pub fn alias(mut self, from: &str, to: &str) -> Self {
        self.aliases.insert(from.to_string(), to.to_string());
        self
    }

    /// Add field name to treat as file
    pub fn file_field(mut self, field_name: &str) -> Self {
        self.file_fields.insert(field_name.to_string());
        self
    }

    /// Size the request limit for images up to `bytes`
    pub fn max_image_size(mut self, bytes: usize) -> Self {
        self.max_total_size = bytes.saturating_add(FORM_OVERHEAD_BYTES);
        self
    }

    pub fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    fn is_file_field(&self, canonical: &str, filename: Option<&str>) -> bool {
        self.file_fields.contains(canonical) || filename.is_some()
    }
}

/// A decoded form: text fields by canonical name plus at most one image.
#[derive(Debug, Default)]
pub struct CharacterForm {
    fields: HashMap<String, String>,
    image: Option<ImagePut>,
}

impl CharacterForm {
    /// Read every part of `multipart`. Zero-byte files count as no image.
    pub async fn read(mut multipart: Multipart, config: &MultipartConfig) -> CharaResult<Self> {
        let mut form = CharacterForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(raw_name) = field.name().map(str::to_string) else {
                continue;
            };
            let name = config.canonical(&raw_name).to_string();
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);

            if config.is_file_field(&name, filename.as_deref()) {
                let bytes = field.bytes().await.map_err(multipart_error)?;
                debug!(field = %raw_name, size = bytes.len(), "read file field");
                if bytes.is_empty() || name != "image" {
                    continue;
                }

                let mut image = ImagePut::new(bytes);
                if let Some(ct) = content_type {
                    image = image.with_content_type(ct);
                }
                if let Some(filename) = filename.filter(|f| !f.is_empty()) {
                    image = image.with_filename(filename);
                }
                form.image = Some(image);
            } else {
                let value = field.text().await.map_err(multipart_error)?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn into_create_request(self) -> CharaResult<CreateRequest> {
        CreateRequest::decode(self.text("name"), self.text("age"), self.image.clone())
    }

    /// `id` from the path wins over an `id` form field.
    pub fn into_update_request(self, id: Option<&str>) -> CharaResult<UpdateRequest> {
        let id = id.or_else(|| self.text("id"));
        UpdateRequest::decode(id, self.text("name"), self.text("age"), self.image.clone())
    }
}

pub(crate) fn multipart_rejection(rejection: MultipartRejection) -> CharaError {
    CharaError::bad_request("Expected a multipart/form-data body")
        .with_errors(json!({"_form": [rejection.body_text()]}))
}

fn multipart_error(err: MultipartError) -> CharaError {
    CharaError::bad_request("Failed to parse multipart data")
        .with_errors(json!({"_form": [err.body_text()]}))
}
