//! HTTP collaborators for the daflow orchestration engine.
//!
//! Two seams, each a trait plus a [`reqwest`]-backed implementation:
//!
//! - [`JobClient`] / [`AutomationApi`] — start, poll, and cancel work
//!   items against the remote automation API.
//! - [`ObjectStore`] / [`OssApi`] — buckets, signed upload/download URLs,
//!   and raw byte transfer against the object storage API.
//!
//! The orchestration crate (`daflow-workflow`) depends only on the traits,
//! so tests substitute scripted fakes without any HTTP.

pub mod error;
pub mod jobs;
pub mod storage;

pub use error::ClientError;
pub use jobs::{AutomationApi, JobClient};
pub use storage::{ObjectStore, OssApi};
