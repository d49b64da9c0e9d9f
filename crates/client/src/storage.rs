//! REST client for the object-storage API.
//!
//! Buckets, signed upload/download URLs, and raw byte transfer. The
//! orchestration layer talks to the [`ObjectStore`] trait; [`OssApi`] is
//! the production implementation over the storage service's bucket/object
//! endpoints.

use async_trait::async_trait;
use serde::Deserialize;

use daflow_core::{BucketDescriptor, RetentionPolicy};

use crate::error::ClientError;

// ---------------------------------------------------------------------------
// ObjectStore trait
// ---------------------------------------------------------------------------

/// Bucket management, signed URLs, and byte transfer.
///
/// Signed URLs are time-limited; the orchestrator never refreshes an
/// expired URL transparently.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch a bucket's descriptor, or `None` if the bucket does not exist.
    async fn get_bucket(&self, bucket_key: &str) -> Result<Option<BucketDescriptor>, ClientError>;

    /// Create a bucket. Fails if the key is already taken.
    async fn create_bucket(
        &self,
        bucket_key: &str,
        region: &str,
        policy: RetentionPolicy,
    ) -> Result<BucketDescriptor, ClientError>;

    /// Produce a signed URL granting write access to an object that may
    /// not exist yet.
    async fn signed_upload_url(
        &self,
        bucket_key: &str,
        object_key: &str,
        minutes_valid: u32,
    ) -> Result<String, ClientError>;

    /// Produce a signed URL granting read access to an existing object.
    /// Fails with [`ClientError::ObjectMissing`] if the object key does
    /// not exist in the bucket.
    async fn signed_download_url(
        &self,
        bucket_key: &str,
        object_key: &str,
        minutes_valid: u32,
    ) -> Result<String, ClientError>;

    /// Upload bytes to a signed URL in a single PUT.
    async fn put_object(&self, url: &str, bytes: Vec<u8>) -> Result<(), ClientError>;

    /// Download the bytes behind a signed URL.
    async fn get_object(&self, url: &str) -> Result<Vec<u8>, ClientError>;
}

// ---------------------------------------------------------------------------
// OssApi
// ---------------------------------------------------------------------------

/// HTTP client for one object-storage endpoint.
pub struct OssApi {
    client: reqwest::Client,
    base_url: String,
}

/// Signed-URL responses: some endpoints answer `{"url": ...}`, others
/// `{"signedUrl": ...}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedUrlResponse {
    url: Option<String>,
    signed_url: Option<String>,
}

impl SignedUrlResponse {
    fn into_url(self, endpoint: &str) -> Result<String, ClientError> {
        self.url
            .or(self.signed_url)
            .ok_or_else(|| ClientError::MissingSignedUrl {
                endpoint: endpoint.to_string(),
            })
    }
}

impl OssApi {
    /// Create a new API client.
    ///
    /// * `base_url` - e.g. `https://storage.example.com/oss/v2`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: {
                let mut url: String = base_url.into();
                while url.ends_with('/') {
                    url.pop();
                }
                url
            },
        }
    }

    // ---- private helpers ----

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ObjectStore for OssApi {
    async fn get_bucket(&self, bucket_key: &str) -> Result<Option<BucketDescriptor>, ClientError> {
        let response = self
            .client
            .get(format!("{}/buckets/{}/details", self.base_url, bucket_key))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let descriptor: BucketDescriptor = Self::parse_response(response).await?;
        Ok(Some(descriptor))
    }

    async fn create_bucket(
        &self,
        bucket_key: &str,
        region: &str,
        policy: RetentionPolicy,
    ) -> Result<BucketDescriptor, ClientError> {
        let body = serde_json::json!({
            "bucketKey": bucket_key,
            "region": region,
            "policyKey": policy.as_str(),
        });

        let response = self
            .client
            .post(format!("{}/buckets", self.base_url))
            .json(&body)
            .send()
            .await?;

        let descriptor: BucketDescriptor = Self::parse_response(response).await?;

        tracing::info!(bucket_key, region, policy = %policy, "Bucket created");

        Ok(descriptor)
    }

    async fn signed_upload_url(
        &self,
        bucket_key: &str,
        object_key: &str,
        minutes_valid: u32,
    ) -> Result<String, ClientError> {
        let endpoint = format!(
            "{}/buckets/{}/objects/{}/signed",
            self.base_url, bucket_key, object_key
        );

        let response = self
            .client
            .post(&endpoint)
            .query(&[
                ("access", "readwrite".to_string()),
                ("minutesExpiration", minutes_valid.to_string()),
            ])
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let signed: SignedUrlResponse = Self::parse_response(response).await?;
        signed.into_url(&endpoint)
    }

    async fn signed_download_url(
        &self,
        bucket_key: &str,
        object_key: &str,
        minutes_valid: u32,
    ) -> Result<String, ClientError> {
        let endpoint = format!(
            "{}/buckets/{}/objects/{}/signeds3download",
            self.base_url, bucket_key, object_key
        );

        let response = self
            .client
            .get(&endpoint)
            .query(&[("minutesExpiration", minutes_valid.to_string())])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::ObjectMissing {
                bucket_key: bucket_key.to_string(),
                object_key: object_key.to_string(),
            });
        }

        let signed: SignedUrlResponse = Self::parse_response(response).await?;
        signed.into_url(&endpoint)
    }

    async fn put_object(&self, url: &str, bytes: Vec<u8>) -> Result<(), ClientError> {
        let response = self.client.put(url).body(bytes).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn get_object(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let response = self.client.get(url).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- SignedUrlResponse ---------------------------------------------------

    #[test]
    fn signed_response_prefers_url_field() {
        let parsed: SignedUrlResponse =
            serde_json::from_str(r#"{"url":"https://a","signedUrl":"https://b"}"#).unwrap();
        assert_eq!(parsed.into_url("ep").unwrap(), "https://a");
    }

    #[test]
    fn signed_response_falls_back_to_signed_url() {
        let parsed: SignedUrlResponse =
            serde_json::from_str(r#"{"signedUrl":"https://b"}"#).unwrap();
        assert_eq!(parsed.into_url("ep").unwrap(), "https://b");
    }

    #[test]
    fn signed_response_without_url_errors() {
        let parsed: SignedUrlResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            parsed.into_url("ep"),
            Err(ClientError::MissingSignedUrl { .. })
        ));
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let api = OssApi::new("https://storage.example.com/oss/v2//");
        assert_eq!(api.base_url, "https://storage.example.com/oss/v2");
    }
}
