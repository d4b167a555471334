use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use crate::{BlobError, BlobId, BlobRef, BlobResult, BlobStore, ImagePut, LocatorCodec, Removal};

const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";

/// Credentials and endpoint for a Cloudinary-style image host.
///
/// Passed explicitly to [`CloudinaryStore::new`]; nothing is read from the
/// process environment here.
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl CloudinaryConfig {
    pub fn new<N, K, S>(cloud_name: N, api_key: K, api_secret: S) -> Self
    where
        N: Into<String>,
        K: Into<String>,
        S: Into<String>,
    {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Point at a different API host (tests, proxies)
    pub fn with_api_base<S: Into<String>>(mut self, api_base: S) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Signed-upload client for Cloudinary's image API
#[derive(Clone)]
pub struct CloudinaryStore {
    config: CloudinaryConfig,
    client: Client,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> BlobResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(BlobError::unavailable)?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1_1/{}/image/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            action
        )
    }

    /// SHA-256 request signature: params sorted by key, joined as
    /// `k=v&k=v`, followed by the API secret, hex encoded.
    pub fn signature(&self, params: &[(&str, &str)]) -> String {
        let sorted: BTreeMap<&str, &str> = params.iter().copied().collect();
        let joined = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        hasher.update(self.config.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    async fn upload_error(resp: Response) -> BlobError {
        let status = resp.status();
        let message = resp
            .json::<ErrorResponse>()
            .await
            .map(|e| e.error.message)
            .unwrap_or_else(|_| status.to_string());

        if status.is_client_error() {
            BlobError::rejected(message)
        } else {
            BlobError::unavailable_msg(format!("{status}: {message}"))
        }
    }
}

#[async_trait]
impl BlobStore for CloudinaryStore {
    #[instrument(skip_all, fields(cloud = %self.config.cloud_name, size = image.len()))]
    async fn store(&self, image: ImagePut) -> BlobResult<BlobRef> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let folder = image.folder.clone().unwrap_or_default();

        let mut signed = vec![("timestamp", timestamp.as_str())];
        if !folder.is_empty() {
            signed.push(("folder", folder.as_str()));
        }
        let signature = self.signature(&signed);

        let filename = image
            .filename
            .clone()
            .unwrap_or_else(|| format!("upload.{}", image.extension()));
        let mut part = Part::bytes(image.bytes.to_vec()).file_name(filename);
        if let Some(ct) = image.content_type.as_deref() {
            part = part
                .mime_str(ct)
                .map_err(|e| BlobError::rejected(format!("Invalid content type {ct}: {e}")))?;
        }

        let mut form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        if !folder.is_empty() {
            form = form.text("folder", folder);
        }

        let resp = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(BlobError::unavailable)?;

        if !resp.status().is_success() {
            return Err(Self::upload_error(resp).await);
        }

        let body: UploadResponse = resp.json().await.map_err(BlobError::unavailable)?;
        debug!(public_id = %body.public_id, "image uploaded");

        Ok(BlobRef::new(body.secure_url, BlobId(body.public_id)))
    }

    #[instrument(skip_all, fields(cloud = %self.config.cloud_name, public_id = %id))]
    async fn remove(&self, id: &BlobId) -> BlobResult<Removal> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.signature(&[("public_id", id.as_str()), ("timestamp", &timestamp)]);

        let params = [
            ("public_id", id.as_str()),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.config.api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        let resp = self
            .client
            .post(self.endpoint("destroy"))
            .form(&params)
            .send()
            .await
            .map_err(BlobError::unavailable)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BlobError::unavailable_msg(format!("destroy returned {status}")));
        }

        let body: DestroyResponse = resp.json().await.map_err(BlobError::unavailable)?;
        match body.result.as_str() {
            "ok" => Ok(Removal::Removed),
            "not found" => Ok(Removal::NotFound),
            other => Err(BlobError::unavailable_msg(format!(
                "unexpected destroy result: {other}"
            ))),
        }
    }

    fn codec(&self) -> LocatorCodec {
        // secure_url carries `/v<version>/` between `upload` and the public id
        LocatorCodec::default().skip_version_segment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_sorts_params_and_appends_secret() {
        let store = CloudinaryStore::new(CloudinaryConfig::new("demo", "key", "abcd")).unwrap();
        let sig = store.signature(&[("timestamp", "1315060510"), ("folder", "character")]);
        assert_eq!(
            sig,
            "02fec149a79b88d6f8129de6e4dfcbfc543ffef94dac81b8a62eb1b8a512f7f4"
        );
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let config = CloudinaryConfig::new("demo", "key", "secret").with_api_base("http://host/");
        let store = CloudinaryStore::new(config).unwrap();
        assert_eq!(store.endpoint("destroy"), "http://host/v1_1/demo/image/destroy");
    }
}
