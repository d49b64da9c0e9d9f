//! Shared types for the daflow work-item orchestration platform.
//!
//! This crate has no internal dependencies and carries the data model
//! every other crate agrees on: the work-item status machine, result
//! snapshots, argument/spec wire types, the bucket model, and the
//! error taxonomy.

pub mod bucket;
pub mod error;
pub mod types;

pub use bucket::{BucketDescriptor, RetentionPolicy};
pub use error::WorkflowError;
pub use types::{
    ArgumentVerb, WorkItemArgument, WorkItemResult, WorkItemSnapshot, WorkItemSpec, WorkItemStats,
    WorkItemStatus,
};
