//! Error taxonomy for work-item orchestration.
//!
//! A job that legitimately ends in `failed` or `cancelled` is NOT an error:
//! it comes back as a normal [`WorkItemResult`](crate::WorkItemResult).
//! `WorkflowError` covers only infrastructure failures (caller mistakes,
//! transfer problems, local wait timeouts, rejected remote calls), which
//! need a different recovery path (retry the call) than a failed job
//! (inspect the report and resubmit).

/// Infrastructure-level failures of the orchestration machinery.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Caller mistake (missing bucket key, conflicting bucket policy).
    /// Not retryable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A signed-URL upload or download failed. Retryable by the caller.
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// The local wait exceeded its deadline. The remote job may still be
    /// running; this is not a job failure and does not cancel anything.
    #[error("WorkItem {workitem_id} timed out after {seconds}s")]
    Timeout {
        workitem_id: String,
        seconds: u64,
    },

    /// The remote system rejected a start/status/cancel call.
    #[error("Remote job API error ({status}): {body}")]
    RemoteJob {
        /// HTTP status code returned by the remote system.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// An expected output object is missing (e.g. the job produced none).
    #[error("Not found: {0}")]
    NotFound(String),

    /// A local file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
