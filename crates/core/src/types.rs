//! Work-item status model and wire types.
//!
//! Field names follow the remote automation API (camelCase on the wire),
//! so the same types deserialize both `GET /workitems/{id}` responses and
//! webhook callback bodies.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// WorkItemStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a remote work item.
///
/// `Success`, `Failed`, and `Cancelled` are terminal; everything else can
/// still transition. Status strings the remote system invents later map to
/// [`WorkItemStatus::Unknown`] instead of failing deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkItemStatus {
    /// Queued, not yet picked up by an engine.
    Pending,
    /// An engine is executing the work item.
    #[serde(rename = "inprogress")]
    InProgress,
    /// Terminal: completed successfully.
    Success,
    /// Terminal: execution failed (see `details` / report).
    Failed,
    /// Terminal: cancelled before completion.
    Cancelled,
    /// A status string this client does not recognize. Non-terminal.
    #[serde(other)]
    Unknown,
}

impl WorkItemStatus {
    /// Whether no further status transitions can follow.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled)
    }
}

// ---------------------------------------------------------------------------
// WorkItemStats
// ---------------------------------------------------------------------------

/// Per-stage timestamps reported by the remote system.
///
/// Monotonic when present, but each field is individually optional: a
/// missing timestamp means that stage has not been reported yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_queued: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_download_started: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_instructions_started: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_instructions_ended: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_upload_ended: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// WorkItemSnapshot / WorkItemResult
// ---------------------------------------------------------------------------

/// Latest-known remote state of one work item.
///
/// Returned by status polling and delivered by webhook callbacks alike,
/// so callers cannot tell from a snapshot which completion strategy
/// observed it. Immutable once constructed; a newer snapshot replaces
/// the old one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemSnapshot {
    /// Server-assigned work-item id.
    pub id: String,
    pub status: WorkItemStatus,
    /// Pointer to the remote execution log. May appear before a terminal
    /// status does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
    /// Human-readable progress line (e.g. "Downloading input files...").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<WorkItemStats>,
    /// Structured error payload, populated on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Terminal result of one work-item orchestration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItemResult {
    pub workitem_id: String,
    pub status: WorkItemStatus,
    pub report_url: Option<String>,
    pub stats: Option<WorkItemStats>,
    pub details: Option<serde_json::Value>,
}

impl WorkItemResult {
    /// Build a result from the snapshot that reached a terminal status.
    pub fn from_snapshot(snapshot: WorkItemSnapshot) -> Self {
        Self {
            workitem_id: snapshot.id,
            status: snapshot.status,
            report_url: snapshot.report_url,
            stats: snapshot.stats,
            details: snapshot.details,
        }
    }
}

// ---------------------------------------------------------------------------
// Arguments and submission spec
// ---------------------------------------------------------------------------

/// Direction of one argument transfer, from the engine's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentVerb {
    /// The engine downloads this input.
    Get,
    /// The engine uploads this output.
    Put,
    /// The engine probes the URL without transferring a body.
    Head,
}

/// One named argument slot of an activity: a signed URL plus a verb.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemArgument {
    pub url: String,
    pub verb: ArgumentVerb,
    /// File name the engine materializes the argument under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
    /// Extra headers the engine sends when dereferencing the URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

impl WorkItemArgument {
    /// An input argument the engine will `GET`.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            verb: ArgumentVerb::Get,
            local_name: None,
            headers: None,
        }
    }

    /// An output argument the engine will `PUT`.
    pub fn put(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            verb: ArgumentVerb::Put,
            local_name: None,
            headers: None,
        }
    }
}

/// Submission request for one work item.
///
/// `activity_id` is the fully-qualified activity name, e.g.
/// `"owner.ActivityName+alias"`. Argument keys must match the parameter
/// names the activity declares. Arguments are fixed at submission and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemSpec {
    pub activity_id: String,
    pub arguments: HashMap<String, WorkItemArgument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// Callback URL the remote system POSTs the terminal payload to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_complete: Option<String>,
    /// Callback URL the remote system POSTs progress payloads to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_progress: Option<String>,
}

impl WorkItemSpec {
    /// Spec with only the required activity id; arguments added via
    /// [`with_argument`](Self::with_argument).
    pub fn new(activity_id: impl Into<String>) -> Self {
        Self {
            activity_id: activity_id.into(),
            arguments: HashMap::new(),
            nickname: None,
            on_complete: None,
            on_progress: None,
        }
    }

    /// Add a named argument.
    pub fn with_argument(mut self, name: impl Into<String>, arg: WorkItemArgument) -> Self {
        self.arguments.insert(name.into(), arg);
        self
    }

    /// Register the completion callback URL.
    pub fn with_on_complete(mut self, url: impl Into<String>) -> Self {
        self.on_complete = Some(url.into());
        self
    }

    /// Register the progress callback URL.
    pub fn with_on_progress(mut self, url: impl Into<String>) -> Self {
        self.on_progress = Some(url.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
