//! Webhook completion strategy: the pending-waiter registry.
//!
//! The remote system POSTs a completion payload to an HTTP endpoint (the
//! intake boundary, outside this crate); the intake handler pushes it in
//! here, keyed by work-item id, and the blocked orchestration call (if
//! any) resumes with it.
//!
//! Delivery is at-least-once from the remote side, so intake must be
//! idempotent: a duplicate terminal payload for an already-resolved id is
//! a no-op. A payload with no waiter (the process restarted, or intake
//! raced ahead of the waiter's registration) is parked and handed to the
//! next `wait` for that id. When a delivery races a local timeout,
//! first-to-arrive wins and the loser is discarded, never errored.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::oneshot;

use daflow_core::{WorkItemResult, WorkItemSnapshot, WorkflowError};

/// What happened to one delivered payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// A waiter was blocked on this id and received the result.
    Delivered,
    /// No waiter yet; the result is parked for the next `wait`.
    Parked,
    /// The id was already resolved; this delivery was dropped.
    Duplicate,
    /// The payload's status is not terminal; nothing to resolve.
    NonTerminal,
}

enum PendingWait {
    Waiting(oneshot::Sender<WorkItemResult>),
    Resolved(WorkItemResult),
}

/// Concurrency-safe map from work-item id to its pending completion.
///
/// Intake runs on the HTTP listener's tasks, waits on the orchestration
/// call's task; the interior mutex is held only for map operations, never
/// across an await.
#[derive(Default)]
pub struct CompletionRegistry {
    waits: Mutex<HashMap<String, PendingWait>>,
}

impl CompletionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a callback payload into the registry.
    ///
    /// Safe under remote retries: every outcome, including
    /// [`IntakeOutcome::Duplicate`], is a successful intake.
    pub fn resolve(&self, snapshot: WorkItemSnapshot) -> IntakeOutcome {
        if !snapshot.status.is_terminal() {
            tracing::debug!(
                workitem_id = %snapshot.id,
                status = ?snapshot.status,
                "Ignoring non-terminal completion payload",
            );
            return IntakeOutcome::NonTerminal;
        }

        let workitem_id = snapshot.id.clone();
        let result = WorkItemResult::from_snapshot(snapshot);

        let mut waits = self.waits.lock().unwrap();
        match waits.remove(&workitem_id) {
            Some(PendingWait::Waiting(tx)) => {
                if let Err(result) = tx.send(result) {
                    // The waiter vanished between registering and now
                    // (timed out, lock not yet reacquired). Park the
                    // result so a retry of the wait can still observe it.
                    waits.insert(workitem_id.clone(), PendingWait::Resolved(result));
                    tracing::debug!(workitem_id = %workitem_id, "Waiter gone, parking result");
                    return IntakeOutcome::Parked;
                }
                tracing::info!(workitem_id = %workitem_id, "Completion delivered to waiter");
                IntakeOutcome::Delivered
            }
            Some(PendingWait::Resolved(existing)) => {
                // First-to-arrive wins; put the original back.
                waits.insert(workitem_id.clone(), PendingWait::Resolved(existing));
                tracing::debug!(workitem_id = %workitem_id, "Duplicate completion ignored");
                IntakeOutcome::Duplicate
            }
            None => {
                waits.insert(workitem_id.clone(), PendingWait::Resolved(result));
                tracing::debug!(workitem_id = %workitem_id, "No waiter yet, parking result");
                IntakeOutcome::Parked
            }
        }
    }

    /// Block until a completion payload for `workitem_id` arrives, or the
    /// deadline passes.
    ///
    /// A result parked before this call returns immediately. On timeout
    /// the registration is removed; if a delivery slipped in while the
    /// timeout was firing, that delivery wins and is returned instead.
    pub async fn wait(
        &self,
        workitem_id: &str,
        timeout: Duration,
    ) -> Result<WorkItemResult, WorkflowError> {
        let rx = {
            let mut waits = self.waits.lock().unwrap();
            match waits.remove(workitem_id) {
                Some(PendingWait::Resolved(result)) => return Ok(result),
                // A previous waiter for this id is superseded; its
                // sender is dropped with the old entry.
                Some(PendingWait::Waiting(_)) | None => {
                    let (tx, rx) = oneshot::channel();
                    waits.insert(workitem_id.to_string(), PendingWait::Waiting(tx));
                    rx
                }
            }
        };

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => {
                // Sender dropped without sending: our registration was
                // superseded or cleared.
                Err(WorkflowError::Transfer(format!(
                    "completion wait for '{workitem_id}' was cancelled"
                )))
            }
            Err(_) => {
                let mut waits = self.waits.lock().unwrap();
                match waits.remove(workitem_id) {
                    // Delivery beat us to the lock: accept it.
                    Some(PendingWait::Resolved(result)) => Ok(result),
                    _ => Err(WorkflowError::Timeout {
                        workitem_id: workitem_id.to_string(),
                        seconds: timeout.as_secs(),
                    }),
                }
            }
        }
    }

    /// Number of entries currently registered or parked.
    pub fn len(&self) -> usize {
        self.waits.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use assert_matches::assert_matches;
    use daflow_core::WorkItemStatus;

    fn terminal(id: &str, status: WorkItemStatus) -> WorkItemSnapshot {
        WorkItemSnapshot {
            id: id.into(),
            status,
            report_url: None,
            progress: None,
            stats: None,
            details: None,
        }
    }

    #[tokio::test]
    async fn delivery_resolves_a_blocked_waiter() {
        let registry = Arc::new(CompletionRegistry::new());

        let waiter = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.wait("wi-1", Duration::from_secs(5)).await })
        };
        // Let the waiter register before delivering.
        tokio::task::yield_now().await;

        let outcome = registry.resolve(terminal("wi-1", WorkItemStatus::Success));
        assert_eq!(outcome, IntakeOutcome::Delivered);

        let result = waiter.await.unwrap().unwrap();
        assert_eq!(result.status, WorkItemStatus::Success);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn delivery_before_wait_is_parked() {
        let registry = CompletionRegistry::new();

        let outcome = registry.resolve(terminal("wi-2", WorkItemStatus::Cancelled));
        assert_eq!(outcome, IntakeOutcome::Parked);

        let result = registry.wait("wi-2", Duration::from_secs(1)).await.unwrap();
        assert_eq!(result.status, WorkItemStatus::Cancelled);
    }

    #[tokio::test]
    async fn duplicate_terminal_delivery_is_a_noop() {
        let registry = CompletionRegistry::new();

        assert_eq!(
            registry.resolve(terminal("wi-3", WorkItemStatus::Success)),
            IntakeOutcome::Parked
        );
        assert_eq!(
            registry.resolve(terminal("wi-3", WorkItemStatus::Failed)),
            IntakeOutcome::Duplicate
        );

        // The first delivery won.
        let result = registry.wait("wi-3", Duration::from_secs(1)).await.unwrap();
        assert_eq!(result.status, WorkItemStatus::Success);
    }

    #[tokio::test]
    async fn non_terminal_payload_does_not_resolve() {
        let registry = CompletionRegistry::new();
        assert_eq!(
            registry.resolve(terminal("wi-4", WorkItemStatus::InProgress)),
            IntakeOutcome::NonTerminal
        );
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn delivery_racing_the_deadline_wins() {
        let registry = Arc::new(CompletionRegistry::new());

        let waiter = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.wait("wi-6", Duration::from_secs(2)).await })
        };
        tokio::task::yield_now().await;

        // Simulate a delivery landing between the deadline firing and the
        // waiter reacquiring the lock: park the result while the waiter's
        // channel is still open, so the timeout path runs and must pick
        // the parked result up instead of reporting Timeout.
        let _tx = {
            let mut waits = registry.waits.lock().unwrap();
            let tx = match waits.remove("wi-6") {
                Some(PendingWait::Waiting(tx)) => tx,
                _ => panic!("waiter not registered"),
            };
            waits.insert(
                "wi-6".into(),
                PendingWait::Resolved(WorkItemResult::from_snapshot(terminal(
                    "wi-6",
                    WorkItemStatus::Success,
                ))),
            );
            tx
        };

        let result = waiter.await.unwrap().unwrap();
        assert_eq!(result.status, WorkItemStatus::Success);
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_times_out_and_clears_registration() {
        let registry = CompletionRegistry::new();

        let err = registry
            .wait("wi-5", Duration::from_secs(2))
            .await
            .unwrap_err();

        assert_matches!(err, WorkflowError::Timeout { seconds: 2, .. });
        assert!(registry.is_empty());

        // A late delivery after the timeout parks harmlessly.
        assert_eq!(
            registry.resolve(terminal("wi-5", WorkItemStatus::Success)),
            IntakeOutcome::Parked
        );
    }
}
