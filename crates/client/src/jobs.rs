//! REST client for the remote automation API work-item endpoints.
//!
//! Wraps work-item submission, status retrieval, and cancellation using
//! [`reqwest`]. The orchestration layer talks to the [`JobClient`] trait;
//! [`AutomationApi`] is the production implementation.

use async_trait::async_trait;
use serde::Deserialize;

use daflow_core::{WorkItemSnapshot, WorkItemSpec};

use crate::error::ClientError;

// ---------------------------------------------------------------------------
// JobClient trait
// ---------------------------------------------------------------------------

/// Start/status/cancel operations for remote work items.
#[async_trait]
pub trait JobClient: Send + Sync {
    /// Submit a work item. Returns the server-assigned work-item id.
    async fn start(&self, spec: &WorkItemSpec) -> Result<String, ClientError>;

    /// Fetch the latest status snapshot for a work item.
    async fn get_status(&self, workitem_id: &str) -> Result<WorkItemSnapshot, ClientError>;

    /// Request cancellation. Returns as soon as the remote system accepts
    /// the request; the work item reaches its terminal status later.
    async fn cancel(&self, workitem_id: &str) -> Result<(), ClientError>;
}

// ---------------------------------------------------------------------------
// AutomationApi
// ---------------------------------------------------------------------------

/// HTTP client for one automation API endpoint.
pub struct AutomationApi {
    client: reqwest::Client,
    base_url: String,
}

/// Response returned by `POST /workitems` after successfully queuing.
#[derive(Debug, Deserialize)]
struct StartResponse {
    /// Server-assigned work-item identifier.
    id: String,
}

impl AutomationApi {
    /// Create a new API client.
    ///
    /// * `base_url` - e.g. `https://automation.example.com/v3`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: trim_trailing_slash(base_url.into()),
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across clients).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: trim_trailing_slash(base_url.into()),
        }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the response
    /// unchanged on success, or a [`ClientError::Api`] containing the
    /// status and body text on failure.
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

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ClientError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl JobClient for AutomationApi {
    async fn start(&self, spec: &WorkItemSpec) -> Result<String, ClientError> {
        let response = self
            .client
            .post(format!("{}/workitems", self.base_url))
            .json(spec)
            .send()
            .await?;

        let parsed: StartResponse = Self::parse_response(response).await?;

        tracing::info!(
            workitem_id = %parsed.id,
            activity_id = %spec.activity_id,
            "WorkItem submitted",
        );

        Ok(parsed.id)
    }

    async fn get_status(&self, workitem_id: &str) -> Result<WorkItemSnapshot, ClientError> {
        let response = self
            .client
            .get(format!("{}/workitems/{}", self.base_url, workitem_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn cancel(&self, workitem_id: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(format!("{}/workitems/{}", self.base_url, workitem_id))
            .send()
            .await?;

        tracing::info!(workitem_id, "WorkItem cancellation requested");

        Self::check_status(response).await
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
