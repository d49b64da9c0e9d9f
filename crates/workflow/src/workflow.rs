//! End-to-end work-item orchestration.
//!
//! [`AutomationWorkflow`] ties the pieces together: file staging against
//! the object store, work-item submission, completion waiting (polling or
//! webhook), and output retrieval. Each step is also exposed on its own
//! so callers can compose a custom sequence.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;
use uuid::Uuid;

use daflow_client::{JobClient, ObjectStore};
use daflow_core::{
    BucketDescriptor, RetentionPolicy, WorkItemArgument, WorkItemResult, WorkItemSnapshot,
    WorkItemSpec, WorkflowError,
};

use crate::batch::run_batch_workitems;
use crate::config::WorkflowConfig;
use crate::registry::CompletionRegistry;
use crate::staging::FileStaging;
use crate::watcher::{wait_for_completion, ProgressSink};

// ---------------------------------------------------------------------------
// Request / outcome types
// ---------------------------------------------------------------------------

/// Declarative request for one file-based work-item run.
///
/// Built with the `with_*` methods; anything not set falls back to the
/// workflow's [`WorkflowConfig`] defaults.
#[derive(Clone)]
pub struct FileWorkflowRequest {
    pub activity_id: String,
    /// Input files: argument name to local path. Each is uploaded and
    /// passed to the engine as a signed `get` URL.
    pub input_files: Vec<(String, PathBuf)>,
    /// Output slots: argument name to object key. Each becomes a signed
    /// `put` URL the engine writes to.
    pub output_files: Vec<(String, String)>,
    /// Bucket for staging. Falls back to the configured default bucket.
    pub bucket_key: Option<String>,
    /// Fetch declared outputs to `output_dir` after success.
    pub download_outputs: bool,
    /// Destination for downloaded outputs. Defaults to the current
    /// directory; files are named after their object key's base name.
    pub output_dir: Option<PathBuf>,
    /// Completion callback URL. When set, the run waits on the webhook
    /// registry instead of polling.
    pub on_complete_url: Option<String>,
    /// Progress callback URL, forwarded to the remote system as-is.
    pub on_progress_url: Option<String>,
    /// Local observer invoked on each observed status change while
    /// polling. Unused in webhook mode, where no polling happens.
    pub progress: Option<Arc<ProgressSink>>,
    pub poll_interval: Option<Duration>,
    pub timeout: Option<Duration>,
}

impl FileWorkflowRequest {
    pub fn new(activity_id: impl Into<String>) -> Self {
        Self {
            activity_id: activity_id.into(),
            input_files: Vec::new(),
            output_files: Vec::new(),
            bucket_key: None,
            download_outputs: false,
            output_dir: None,
            on_complete_url: None,
            on_progress_url: None,
            progress: None,
            poll_interval: None,
            timeout: None,
        }
    }

    /// Add an input file argument.
    pub fn with_input_file(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.input_files.push((name.into(), path.into()));
        self
    }

    /// Add an output argument stored under `object_key`.
    pub fn with_output_file(
        mut self,
        name: impl Into<String>,
        object_key: impl Into<String>,
    ) -> Self {
        self.output_files.push((name.into(), object_key.into()));
        self
    }

    pub fn with_bucket(mut self, bucket_key: impl Into<String>) -> Self {
        self.bucket_key = Some(bucket_key.into());
        self
    }

    /// Download declared outputs into `output_dir` once the run succeeds.
    pub fn with_downloads(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.download_outputs = true;
        self.output_dir = Some(output_dir.into());
        self
    }

    /// Wait via the webhook registry instead of polling.
    pub fn with_completion_callback(mut self, url: impl Into<String>) -> Self {
        self.on_complete_url = Some(url.into());
        self
    }

    pub fn with_progress_callback(mut self, url: impl Into<String>) -> Self {
        self.on_progress_url = Some(url.into());
        self
    }

    /// Observe non-terminal status changes during the polling wait.
    pub fn with_progress_sink(
        mut self,
        sink: impl Fn(&WorkItemSnapshot) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Arc::new(sink));
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// What a completed file-based run produced.
#[derive(Debug, Clone)]
pub struct FileWorkflowOutcome {
    pub result: WorkItemResult,
    /// Local paths of the outputs fetched after success. Empty when
    /// downloads were not requested or the run did not succeed.
    pub downloaded_files: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// AutomationWorkflow
// ---------------------------------------------------------------------------

/// Facade over job submission, file staging, and completion waiting.
pub struct AutomationWorkflow {
    jobs: Arc<dyn JobClient>,
    staging: FileStaging,
    registry: Arc<CompletionRegistry>,
    config: WorkflowConfig,
}

impl AutomationWorkflow {
    pub fn new(
        jobs: Arc<dyn JobClient>,
        store: Arc<dyn ObjectStore>,
        config: WorkflowConfig,
    ) -> Self {
        let staging = FileStaging::new(store, config.signed_url_minutes);
        Self {
            jobs,
            staging,
            registry: Arc::new(CompletionRegistry::new()),
            config,
        }
    }

    /// Registry the webhook intake surface feeds completions into. Hand
    /// this to the HTTP listener that receives the remote callbacks.
    pub fn registry(&self) -> Arc<CompletionRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    // -- individual steps ----------------------------------------------------

    /// Idempotently ensure the staging bucket exists.
    pub async fn ensure_bucket(
        &self,
        bucket_key: &str,
        policy: Option<RetentionPolicy>,
    ) -> Result<BucketDescriptor, WorkflowError> {
        self.staging
            .ensure_bucket(
                bucket_key,
                &self.config.region,
                policy.unwrap_or(self.config.bucket_policy),
            )
            .await
    }

    /// Upload a local input file; returns a signed download URL for it.
    pub async fn upload_input_file(
        &self,
        local_path: &Path,
        bucket_key: &str,
        object_key: Option<&str>,
    ) -> Result<String, WorkflowError> {
        self.staging
            .upload_input_file(local_path, bucket_key, object_key, None)
            .await
    }

    /// Signed upload URL for an output object the engine will write.
    pub async fn prepare_output_url(
        &self,
        object_key: &str,
        bucket_key: &str,
    ) -> Result<String, WorkflowError> {
        self.staging
            .prepare_output_url(object_key, bucket_key, None)
            .await
    }

    /// Download one output object to a local path.
    pub async fn download_output_file(
        &self,
        bucket_key: &str,
        object_key: &str,
        local_path: &Path,
    ) -> Result<(), WorkflowError> {
        self.staging
            .download_output_file(bucket_key, object_key, local_path)
            .await
    }

    /// Submit a work item; returns the server-assigned id.
    pub async fn start_workitem(&self, spec: &WorkItemSpec) -> Result<String, WorkflowError> {
        let workitem_id = self.jobs.start(spec).await?;
        tracing::info!(
            workitem_id = %workitem_id,
            activity_id = %spec.activity_id,
            "WorkItem started",
        );
        Ok(workitem_id)
    }

    /// Poll a started work item until it reaches a terminal status.
    pub async fn wait_for_completion(
        &self,
        workitem_id: &str,
        progress: Option<&ProgressSink>,
    ) -> Result<WorkItemResult, WorkflowError> {
        wait_for_completion(
            self.jobs.as_ref(),
            workitem_id,
            self.config.poll_interval,
            self.config.timeout,
            progress,
        )
        .await
    }

    /// Request cancellation of a remote work item.
    pub async fn cancel_workitem(&self, workitem_id: &str) -> Result<(), WorkflowError> {
        self.jobs.cancel(workitem_id).await?;
        tracing::info!(workitem_id, "WorkItem cancellation requested");
        Ok(())
    }

    /// Run many specs concurrently with a bounded fan-out. Results come
    /// back in input order; see [`run_batch_workitems`].
    pub async fn run_batch(
        &self,
        specs: Vec<WorkItemSpec>,
        max_concurrency: Option<usize>,
    ) -> Vec<Result<WorkItemResult, WorkflowError>> {
        run_batch_workitems(
            Arc::clone(&self.jobs),
            specs,
            self.config.poll_interval,
            self.config.timeout,
            max_concurrency,
        )
        .await
    }

    // -- unified workflow ----------------------------------------------------

    /// Run one file-based work item end to end.
    ///
    /// Stages inputs, prepares output URLs, submits, waits for the
    /// terminal status (webhook registry when a completion callback URL
    /// is set, polling otherwise), and optionally downloads outputs.
    /// Outputs are fetched only after `success`; a `failed` or
    /// `cancelled` run returns its result with no downloads.
    pub async fn run_workitem_with_files(
        &self,
        request: FileWorkflowRequest,
    ) -> Result<FileWorkflowOutcome, WorkflowError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "workitem_run",
            %run_id,
            activity_id = %request.activity_id,
        );
        self.run_with_files_inner(request).instrument(span).await
    }

    async fn run_with_files_inner(
        &self,
        request: FileWorkflowRequest,
    ) -> Result<FileWorkflowOutcome, WorkflowError> {
        let needs_bucket = !request.input_files.is_empty() || !request.output_files.is_empty();
        let bucket_key = match (&request.bucket_key, &self.config.default_bucket) {
            (Some(key), _) => Some(key.clone()),
            (None, Some(key)) => Some(key.clone()),
            (None, None) if needs_bucket => {
                return Err(WorkflowError::Configuration(
                    "bucket_key must be provided or default_bucket must be set".into(),
                ))
            }
            (None, None) => None,
        };

        let mut spec = WorkItemSpec::new(&request.activity_id);

        if let Some(bucket_key) = bucket_key.as_deref().filter(|_| needs_bucket) {
            self.ensure_bucket(bucket_key, None).await?;

            for (name, path) in &request.input_files {
                let url = self
                    .staging
                    .upload_input_file(path, bucket_key, None, None)
                    .await?;
                spec = spec.with_argument(name, WorkItemArgument::get(url));
            }

            for (name, object_key) in &request.output_files {
                let url = self
                    .staging
                    .prepare_output_url(object_key, bucket_key, None)
                    .await?;
                spec = spec.with_argument(name, WorkItemArgument::put(url));
            }
        }

        if let Some(url) = &request.on_complete_url {
            spec = spec.with_on_complete(url);
        }
        if let Some(url) = &request.on_progress_url {
            spec = spec.with_on_progress(url);
        }

        let workitem_id = self.start_workitem(&spec).await?;

        let timeout = request.timeout.unwrap_or(self.config.timeout);
        let result = if request.on_complete_url.is_some() {
            tracing::debug!(workitem_id = %workitem_id, "Waiting via webhook registry");
            self.registry.wait(&workitem_id, timeout).await?
        } else {
            let poll_interval = request.poll_interval.unwrap_or(self.config.poll_interval);
            wait_for_completion(
                self.jobs.as_ref(),
                &workitem_id,
                poll_interval,
                timeout,
                request.progress.as_deref(),
            )
            .await?
        };

        let mut downloaded_files = Vec::new();
        if request.download_outputs && result.status == daflow_core::WorkItemStatus::Success {
            // bucket_key is always set here: download_outputs implies
            // declared outputs, which require a bucket.
            if let Some(bucket_key) = bucket_key.as_deref() {
                let output_dir = request
                    .output_dir
                    .clone()
                    .unwrap_or_else(|| PathBuf::from("."));
                for (_, object_key) in &request.output_files {
                    let file_name = Path::new(object_key)
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| object_key.clone());
                    let dest = output_dir.join(file_name);
                    self.staging
                        .download_output_file(bucket_key, object_key, &dest)
                        .await?;
                    downloaded_files.push(dest);
                }
            }
        }

        tracing::info!(
            workitem_id = %result.workitem_id,
            status = ?result.status,
            downloaded = downloaded_files.len(),
            "WorkItem run finished",
        );

        Ok(FileWorkflowOutcome {
            result,
            downloaded_files,
        })
    }
}
