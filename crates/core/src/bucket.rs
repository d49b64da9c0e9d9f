//! Object-storage bucket model and key validation.
//!
//! Buckets are durable external resources: the orchestrator ensures they
//! exist but never deletes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// Minimum length of a bucket key.
const MIN_BUCKET_KEY_LEN: usize = 3;

/// Maximum length of a bucket key.
const MAX_BUCKET_KEY_LEN: usize = 128;

// ---------------------------------------------------------------------------
// RetentionPolicy
// ---------------------------------------------------------------------------

/// How long objects in a bucket are retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionPolicy {
    /// Objects expire after 24 hours.
    Transient,
    /// Objects expire after 30 days.
    Temporary,
    /// Objects are kept until deleted.
    Persistent,
}

impl RetentionPolicy {
    /// Wire name of the policy.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Temporary => "temporary",
            Self::Persistent => "persistent",
        }
    }
}

impl std::fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// BucketDescriptor
// ---------------------------------------------------------------------------

/// A storage namespace as reported by the object store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketDescriptor {
    pub bucket_key: String,
    pub region: String,
    #[serde(rename = "policyKey")]
    pub policy: RetentionPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a bucket key.
///
/// Rules (imposed by the object store):
/// - Length between 3 and 128 characters.
/// - Only lowercase letters, digits, and hyphens.
pub fn validate_bucket_key(key: &str) -> Result<(), WorkflowError> {
    if key.len() < MIN_BUCKET_KEY_LEN || key.len() > MAX_BUCKET_KEY_LEN {
        return Err(WorkflowError::Configuration(format!(
            "Bucket key must be {MIN_BUCKET_KEY_LEN}-{MAX_BUCKET_KEY_LEN} characters, got {}",
            key.len()
        )));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(WorkflowError::Configuration(format!(
            "Bucket key may only contain lowercase letters, digits, and hyphens: '{key}'"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
