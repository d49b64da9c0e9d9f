//! Workflow configuration loaded from environment variables.

use std::time::Duration;

use daflow_core::RetentionPolicy;

/// Default status-poll interval.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Default maximum wait for one work item to reach a terminal state.
pub const DEFAULT_TIMEOUT_SECS: u64 = 3600;

/// Default validity window for signed URLs handed to the remote engine.
pub const DEFAULT_SIGNED_URL_MINUTES: u32 = 60;

/// Default storage region.
pub const DEFAULT_REGION: &str = "US";

/// Orchestration defaults applied when a call does not override them.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Bucket used when a call supplies none. `None` means every call
    /// with files must name its bucket explicitly.
    pub default_bucket: Option<String>,
    /// Interval between status polls.
    pub poll_interval: Duration,
    /// Maximum wait for a terminal state before the local wait fails.
    pub timeout: Duration,
    /// Storage region for bucket creation.
    pub region: String,
    /// Retention policy for buckets this workflow creates.
    pub bucket_policy: RetentionPolicy,
    /// Validity window for signed URLs.
    pub signed_url_minutes: u32,
}

impl WorkflowConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default |
    /// |-----------------------------|---------|
    /// | `DAFLOW_DEFAULT_BUCKET`     | unset   |
    /// | `DAFLOW_POLL_INTERVAL_SECS` | `10`    |
    /// | `DAFLOW_TIMEOUT_SECS`       | `3600`  |
    /// | `DAFLOW_REGION`             | `US`    |
    pub fn from_env() -> Self {
        let default_bucket = std::env::var("DAFLOW_DEFAULT_BUCKET").ok();

        let poll_interval_secs: u64 = std::env::var("DAFLOW_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_POLL_INTERVAL_SECS.to_string())
            .parse()
            .expect("DAFLOW_POLL_INTERVAL_SECS must be a valid u64");

        let timeout_secs: u64 = std::env::var("DAFLOW_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("DAFLOW_TIMEOUT_SECS must be a valid u64");

        let region = std::env::var("DAFLOW_REGION").unwrap_or_else(|_| DEFAULT_REGION.into());

        Self {
            default_bucket,
            poll_interval: Duration::from_secs(poll_interval_secs),
            timeout: Duration::from_secs(timeout_secs),
            region,
            bucket_policy: RetentionPolicy::Transient,
            signed_url_minutes: DEFAULT_SIGNED_URL_MINUTES,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            default_bucket: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            region: DEFAULT_REGION.into(),
            bucket_policy: RetentionPolicy::Transient,
            signed_url_minutes: DEFAULT_SIGNED_URL_MINUTES,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = WorkflowConfig::default();
        assert!(config.default_bucket.is_none());
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.timeout, Duration::from_secs(3600));
        assert_eq!(config.region, "US");
        assert_eq!(config.bucket_policy, RetentionPolicy::Transient);
    }
}
