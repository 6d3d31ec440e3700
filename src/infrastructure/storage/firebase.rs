use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;
use zeroize::Zeroizing;

use crate::{errors::StorageError, repositories::storage::ObjectStorage, settings::AppConfig};

/// Firebase / Google Cloud Storage through the public `v0` REST surface.
#[derive(Clone)]
pub struct FirebaseStorage {
    client: Client,
    endpoint: String,
    bucket: String,
    token: Option<Zeroizing<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

impl FirebaseStorage {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        token: Option<Zeroizing<String>>,
    ) -> Self {
        FirebaseStorage {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            token,
        }
    }

    /// Every request is bounded by the configured upload timeout.
    pub fn from_config(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(config.upload_timeout())
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to an HTTP client without a request timeout");
                Client::new()
            });

        Self::new(
            client,
            &config.firebase_endpoint,
            &config.firebase_bucket,
            config.storage_token(),
        )
    }

    fn object_url(&self, object_name: &str) -> String {
        format!(
            "{}/v0/b/{}/o/{}",
            self.endpoint,
            self.bucket,
            urlencoding::encode(object_name)
        )
    }

    /// Tokenized download URL in the format Firebase clients hand out.
    pub fn download_url(&self, object_name: &str, token: Option<&str>) -> String {
        match token {
            Some(token) => format!("{}?alt=media&token={}", self.object_url(object_name), token),
            None => format!("{}?alt=media", self.object_url(object_name)),
        }
    }

    /// Recovers the object name from a download URL issued for this bucket.
    pub fn object_name_from_url(&self, url: &str) -> Result<String, StorageError> {
        let parsed = Url::parse(url).map_err(|_| StorageError::InvalidUrl(url.to_string()))?;
        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.collect())
            .unwrap_or_default();

        match segments.as_slice() {
            ["v0", "b", bucket, "o", encoded] if *bucket == self.bucket && !encoded.is_empty() => {
                urlencoding::decode(encoded)
                    .map(|name| name.into_owned())
                    .map_err(|_| StorageError::InvalidUrl(url.to_string()))
            }
            _ => Err(StorageError::InvalidUrl(url.to_string())),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.as_str()),
            None => request,
        }
    }
}

async fn error_for_status(response: reqwest::Response, key: &str) -> Result<reqwest::Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(StorageError::NotFound(key.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    Err(StorageError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ObjectStorage for FirebaseStorage {
    #[instrument(skip(self, bytes), fields(bucket = %self.bucket, size = bytes.len()))]
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, StorageError> {
        if key.trim().is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        let request = self
            .client
            .post(format!("{}/v0/b/{}/o", self.endpoint, self.bucket))
            .query(&[("name", key)])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec());

        let response = self.authorize(request).send().await?;
        let response = error_for_status(response, key).await?;
        let uploaded: UploadResponse = response.json().await?;

        let token = uploaded
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|t| !t.is_empty());

        debug!(object = %uploaded.name, "Object stored");
        Ok(self.download_url(&uploaded.name, token))
    }

    #[instrument(skip(self))]
    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let object_name = self.object_name_from_url(url)?;

        let request = self.client.delete(self.object_url(&object_name));
        let response = self.authorize(request).send().await?;
        error_for_status(response, &object_name).await?;

        debug!(object = %object_name, "Object deleted");
        Ok(())
    }
}
