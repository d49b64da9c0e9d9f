//! File staging against the object store.
//!
//! Turns local input files into signed download URLs for the remote
//! engine and prepares signed upload URLs for declared outputs. Every
//! call is self-contained: there is no bucket cache, no partial-upload
//! rollback, and no hidden state.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use daflow_client::ObjectStore;
use daflow_core::bucket::validate_bucket_key;
use daflow_core::{BucketDescriptor, RetentionPolicy, WorkflowError};

/// Stages input/output files for work items via an [`ObjectStore`].
pub struct FileStaging {
    store: Arc<dyn ObjectStore>,
    /// Validity window for the signed URLs this component issues.
    signed_url_minutes: u32,
}

impl FileStaging {
    pub fn new(store: Arc<dyn ObjectStore>, signed_url_minutes: u32) -> Self {
        Self {
            store,
            signed_url_minutes,
        }
    }

    /// Ensure a bucket exists, idempotently.
    ///
    /// An existing bucket with the same policy is returned unmodified.
    /// An existing bucket with a different policy is a caller error,
    /// never silently resolved.
    pub async fn ensure_bucket(
        &self,
        bucket_key: &str,
        region: &str,
        policy: RetentionPolicy,
    ) -> Result<BucketDescriptor, WorkflowError> {
        validate_bucket_key(bucket_key)?;

        if let Some(existing) = self.store.get_bucket(bucket_key).await? {
            if existing.policy != policy {
                return Err(WorkflowError::Configuration(format!(
                    "Bucket '{bucket_key}' already exists with policy '{}', requested '{policy}'",
                    existing.policy
                )));
            }
            tracing::debug!(bucket_key, "Bucket already exists");
            return Ok(existing);
        }

        let descriptor = self.store.create_bucket(bucket_key, region, policy).await?;
        Ok(descriptor)
    }

    /// Upload a local file and return a signed download URL for it.
    ///
    /// `object_key` defaults to the file's base name. An unreadable file
    /// fails with `Io`; a store rejection or an upload exceeding `timeout`
    /// fails with `Transfer`.
    pub async fn upload_input_file(
        &self,
        local_path: &Path,
        bucket_key: &str,
        object_key: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<String, WorkflowError> {
        let object_key = match object_key {
            Some(key) => key.to_string(),
            None => local_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    WorkflowError::Configuration(format!(
                        "Cannot derive object key from path '{}'",
                        local_path.display()
                    ))
                })?,
        };

        let bytes = tokio::fs::read(local_path).await?;
        let size = bytes.len();

        let upload_url = self
            .store
            .signed_upload_url(bucket_key, &object_key, self.signed_url_minutes)
            .await?;

        let put = self.store.put_object(&upload_url, bytes);
        match timeout {
            Some(limit) => tokio::time::timeout(limit, put)
                .await
                .map_err(|_| {
                    WorkflowError::Transfer(format!(
                        "Upload of '{object_key}' to bucket '{bucket_key}' exceeded {}s",
                        limit.as_secs()
                    ))
                })?
                .map_err(|e| WorkflowError::Transfer(e.to_string()))?,
            None => put
                .await
                .map_err(|e| WorkflowError::Transfer(e.to_string()))?,
        }

        tracing::info!(
            bucket_key,
            object_key = %object_key,
            size_bytes = size,
            "Input file uploaded",
        );

        // Download URL for the work-item argument.
        let download_url = self
            .store
            .signed_download_url(bucket_key, &object_key, self.signed_url_minutes)
            .await?;
        Ok(download_url)
    }

    /// Produce a signed upload URL for a not-yet-existing output object.
    /// Touches no local disk.
    pub async fn prepare_output_url(
        &self,
        object_key: &str,
        bucket_key: &str,
        minutes_valid: Option<u32>,
    ) -> Result<String, WorkflowError> {
        let url = self
            .store
            .signed_upload_url(
                bucket_key,
                object_key,
                minutes_valid.unwrap_or(self.signed_url_minutes),
            )
            .await?;
        Ok(url)
    }

    /// Download an output object to `local_path`, creating parent
    /// directories as needed. A missing object fails with `NotFound`.
    pub async fn download_output_file(
        &self,
        bucket_key: &str,
        object_key: &str,
        local_path: &Path,
    ) -> Result<(), WorkflowError> {
        let url = self
            .store
            .signed_download_url(bucket_key, object_key, self.signed_url_minutes)
            .await?;

        let bytes = self
            .store
            .get_object(&url)
            .await
            .map_err(|e| WorkflowError::Transfer(e.to_string()))?;

        if let Some(parent) = local_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(local_path, &bytes).await?;

        tracing::info!(
            bucket_key,
            object_key,
            local_path = %local_path.display(),
            size_bytes = bytes.len(),
            "Output file downloaded",
        );

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
