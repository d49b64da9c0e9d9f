//! Orchestration of remote design-automation work items.
//!
//! Submits work items, stages their input and output files through an
//! object store, waits for completion by status polling or by webhook
//! callback, and fans out batches under a concurrency bound. The HTTP
//! surface that receives the webhooks lives in `daflow-intake`; this
//! crate only consumes its deliveries through [`CompletionRegistry`].

pub mod batch;
pub mod config;
pub mod registry;
pub mod staging;
pub mod watcher;
pub mod workflow;

pub use batch::{run_batch_workitems, DEFAULT_MAX_CONCURRENCY};
pub use config::WorkflowConfig;
pub use registry::{CompletionRegistry, IntakeOutcome};
pub use staging::FileStaging;
pub use watcher::{wait_for_completion, ProgressSink};
pub use workflow::{AutomationWorkflow, FileWorkflowOutcome, FileWorkflowRequest};
