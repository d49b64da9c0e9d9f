//! Polling completion strategy.
//!
//! Drives one work item from "started" to a terminal status by querying
//! the remote system at a fixed interval. Timeout is a local-wait failure
//! only: the remote job keeps running and is never cancelled here.

use std::time::Duration;

use tokio::time::Instant;

use daflow_client::JobClient;
use daflow_core::{WorkItemResult, WorkItemSnapshot, WorkflowError};

/// Optional observer invoked with each non-terminal snapshot.
///
/// Called at most once per observed status change, not per poll tick, so
/// repeated polls of unchanged state do not flood the caller.
pub type ProgressSink = dyn Fn(&WorkItemSnapshot) + Send + Sync;

/// Poll a work item until it reaches a terminal status.
///
/// The deadline is measured from the start of this wait, not from job
/// submission. Reaching it yields [`WorkflowError::Timeout`]; reaching a
/// terminal status yields the final [`WorkItemResult`], including
/// `failed` and `cancelled`, which are results here rather than errors.
pub async fn wait_for_completion(
    jobs: &dyn JobClient,
    workitem_id: &str,
    poll_interval: Duration,
    timeout: Duration,
    progress: Option<&ProgressSink>,
) -> Result<WorkItemResult, WorkflowError> {
    let deadline = Instant::now() + timeout;
    let mut last_status = None;

    loop {
        let snapshot = jobs.get_status(workitem_id).await?;

        if snapshot.status.is_terminal() {
            tracing::info!(
                workitem_id,
                status = ?snapshot.status,
                report_url = snapshot.report_url.as_deref(),
                "WorkItem reached terminal status",
            );
            return Ok(WorkItemResult::from_snapshot(snapshot));
        }

        if last_status != Some(snapshot.status) {
            tracing::debug!(
                workitem_id,
                status = ?snapshot.status,
                progress = snapshot.progress.as_deref(),
                "WorkItem status changed",
            );
            if let Some(sink) = progress {
                sink(&snapshot);
            }
            last_status = Some(snapshot.status);
        }

        if Instant::now() >= deadline {
            return Err(WorkflowError::Timeout {
                workitem_id: workitem_id.to_string(),
                seconds: timeout.as_secs(),
            });
        }

        tokio::time::sleep(poll_interval).await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use daflow_client::ClientError;
    use daflow_core::{WorkItemSpec, WorkItemStatus};

    /// Job client that replays a scripted status sequence, repeating the
    /// last entry once the script is exhausted.
    struct ScriptedJobs {
        statuses: Vec<WorkItemStatus>,
        polls: AtomicUsize,
    }

    impl ScriptedJobs {
        fn new(statuses: Vec<WorkItemStatus>) -> Self {
            Self {
                statuses,
                polls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl JobClient for ScriptedJobs {
        async fn start(&self, _spec: &WorkItemSpec) -> Result<String, ClientError> {
            Ok("wi-test".into())
        }

        async fn get_status(&self, workitem_id: &str) -> Result<WorkItemSnapshot, ClientError> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            let status = *self
                .statuses
                .get(n)
                .unwrap_or_else(|| self.statuses.last().unwrap());
            Ok(WorkItemSnapshot {
                id: workitem_id.to_string(),
                status,
                report_url: None,
                progress: None,
                stats: None,
                details: None,
            })
        }

        async fn cancel(&self, _workitem_id: &str) -> Result<(), ClientError> {
            Ok(())
        }
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    // -- terminal outcomes ---------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn returns_success_result() {
        let jobs = ScriptedJobs::new(vec![
            WorkItemStatus::Pending,
            WorkItemStatus::InProgress,
            WorkItemStatus::Success,
        ]);

        let result = wait_for_completion(&jobs, "wi-1", secs(1), secs(60), None)
            .await
            .unwrap();

        assert_eq!(result.workitem_id, "wi-1");
        assert_eq!(result.status, WorkItemStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_status_is_a_result_not_an_error() {
        let jobs = ScriptedJobs::new(vec![WorkItemStatus::InProgress, WorkItemStatus::Failed]);

        let result = wait_for_completion(&jobs, "wi-2", secs(1), secs(60), None)
            .await
            .unwrap();

        assert_eq!(result.status, WorkItemStatus::Failed);
    }

    // -- timeout boundary ----------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn never_terminal_times_out() {
        let jobs = ScriptedJobs::new(vec![WorkItemStatus::InProgress]);

        let err = wait_for_completion(&jobs, "wi-3", secs(1), secs(5), None)
            .await
            .unwrap_err();

        assert_matches!(
            err,
            WorkflowError::Timeout { ref workitem_id, seconds: 5 } if workitem_id == "wi-3"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn larger_timeout_lets_the_same_job_finish() {
        // Terminal on the 8th poll: past a 5 s budget at 1 s per tick,
        // within a 60 s one.
        let mut script = vec![WorkItemStatus::InProgress; 7];
        script.push(WorkItemStatus::Success);
        let jobs = ScriptedJobs::new(script);

        let result = wait_for_completion(&jobs, "wi-4", secs(1), secs(60), None)
            .await
            .unwrap();

        assert_eq!(result.status, WorkItemStatus::Success);
    }

    // -- progress deduplication ----------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn progress_fires_once_per_status_change() {
        let jobs = ScriptedJobs::new(vec![
            WorkItemStatus::Pending,
            WorkItemStatus::InProgress,
            WorkItemStatus::InProgress,
            WorkItemStatus::InProgress,
            WorkItemStatus::Success,
        ]);

        let seen: Arc<Mutex<Vec<WorkItemStatus>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |snapshot: &WorkItemSnapshot| {
                seen.lock().unwrap().push(snapshot.status);
            }
        };

        wait_for_completion(&jobs, "wi-5", secs(1), secs(60), Some(&sink))
            .await
            .unwrap();

        // Three polls of `inprogress` collapse into one callback.
        assert_eq!(
            *seen.lock().unwrap(),
            vec![WorkItemStatus::Pending, WorkItemStatus::InProgress]
        );
    }

    // -- unknown status ------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn unknown_status_keeps_polling() {
        let jobs = ScriptedJobs::new(vec![
            WorkItemStatus::Unknown,
            WorkItemStatus::Unknown,
            WorkItemStatus::Success,
        ]);

        let result = wait_for_completion(&jobs, "wi-6", secs(1), secs(60), None)
            .await
            .unwrap();

        assert_eq!(result.status, WorkItemStatus::Success);
    }
}
