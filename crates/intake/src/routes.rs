//! Webhook callback routes.
//!
//! The remote automation system POSTs work-item payloads here. The
//! completion handler feeds them into the shared [`CompletionRegistry`];
//! the progress handler only logs. Both always answer `200 OK` on a
//! well-formed payload, whatever the registry did with it, so the remote
//! side never retries a delivery we already absorbed.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use daflow_core::WorkItemSnapshot;
use daflow_workflow::{CompletionRegistry, IntakeOutcome};

/// POST /callbacks/complete -- terminal status delivery.
async fn on_complete(
    State(registry): State<Arc<CompletionRegistry>>,
    Json(snapshot): Json<WorkItemSnapshot>,
) -> StatusCode {
    let workitem_id = snapshot.id.clone();
    let outcome = registry.resolve(snapshot);

    match outcome {
        IntakeOutcome::Delivered | IntakeOutcome::Parked => {
            tracing::info!(workitem_id = %workitem_id, ?outcome, "Completion callback absorbed");
        }
        IntakeOutcome::Duplicate => {
            tracing::debug!(workitem_id = %workitem_id, "Duplicate completion callback");
        }
        IntakeOutcome::NonTerminal => {
            tracing::warn!(
                workitem_id = %workitem_id,
                "Completion callback carried a non-terminal status",
            );
        }
    }

    StatusCode::OK
}

/// POST /callbacks/progress -- intermediate status delivery, log only.
async fn on_progress(Json(snapshot): Json<WorkItemSnapshot>) -> StatusCode {
    tracing::debug!(
        workitem_id = %snapshot.id,
        status = ?snapshot.status,
        progress = snapshot.progress.as_deref(),
        "Progress callback received",
    );
    StatusCode::OK
}

/// Build the callback route tree over a shared registry.
pub fn router(registry: Arc<CompletionRegistry>) -> Router {
    Router::new()
        .route("/callbacks/complete", post(on_complete))
        .route("/callbacks/progress", post(on_progress))
        .with_state(registry)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
