//! Concurrent batch execution with bounded parallelism.
//!
//! Runs many independent work-item orchestrations at once, at most
//! `max_concurrency` in flight, and returns one entry per spec in the
//! original input order no matter which job finishes first. One job's
//! failure (including a local timeout) never aborts its siblings.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use daflow_client::JobClient;
use daflow_core::{WorkItemResult, WorkItemSpec, WorkflowError};

use crate::watcher::wait_for_completion;

/// Concurrency bound applied when the caller does not supply one.
/// Unbounded fan-out against the remote API is never allowed.
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Start every spec and wait for its terminal result, concurrently.
///
/// Each entry is `Ok` with the job's terminal result (success, failed, or
/// cancelled alike) or `Err` with the infrastructure failure that stopped
/// that one orchestration. Dropping the returned future drops every
/// in-flight wait with it; remote jobs keep running regardless.
pub async fn run_batch_workitems(
    jobs: Arc<dyn JobClient>,
    specs: Vec<WorkItemSpec>,
    poll_interval: Duration,
    timeout: Duration,
    max_concurrency: Option<usize>,
) -> Vec<Result<WorkItemResult, WorkflowError>> {
    let bound = max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY).max(1);
    let total = specs.len();

    tracing::info!(total, bound, "Starting work-item batch");

    let results: Vec<Result<WorkItemResult, WorkflowError>> = stream::iter(
        specs
            .into_iter()
            .map(|spec| run_one(Arc::clone(&jobs), spec, poll_interval, timeout)),
    )
    // `buffered` keeps at most `bound` orchestrations in flight and
    // yields results in input order.
    .buffered(bound)
    .collect()
    .await;

    let failed = results.iter().filter(|r| r.is_err()).count();
    tracing::info!(total, failed, "Work-item batch finished");

    results
}

/// One batch entry: submit, then wait for the terminal status.
async fn run_one(
    jobs: Arc<dyn JobClient>,
    spec: WorkItemSpec,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<WorkItemResult, WorkflowError> {
    let workitem_id = jobs.start(&spec).await?;
    wait_for_completion(jobs.as_ref(), &workitem_id, poll_interval, timeout, None).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
