//! Errors from the HTTP collaborator layer.

use daflow_core::WorkflowError;

/// Errors raised by the automation and object-store HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote endpoint returned a non-2xx status code.
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The requested object does not exist in the bucket.
    #[error("Object '{object_key}' not found in bucket '{bucket_key}'")]
    ObjectMissing {
        bucket_key: String,
        object_key: String,
    },

    /// A signed-URL response contained no usable URL.
    #[error("No signed URL in response from {endpoint}")]
    MissingSignedUrl { endpoint: String },
}

/// Map client failures onto the orchestration taxonomy: rejected remote
/// calls keep their status/payload, missing objects become `NotFound`,
/// everything transport-shaped becomes a retryable `Transfer`.
impl From<ClientError> for WorkflowError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api { status, body } => WorkflowError::RemoteJob { status, body },
            ClientError::ObjectMissing {
                bucket_key,
                object_key,
            } => WorkflowError::NotFound(format!(
                "object '{object_key}' in bucket '{bucket_key}'"
            )),
            ClientError::Request(e) => WorkflowError::Transfer(e.to_string()),
            ClientError::MissingSignedUrl { endpoint } => {
                WorkflowError::Transfer(format!("no signed URL in response from {endpoint}"))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
