//! Migration pipeline executor.
//!
//! This module provides the [`MigrationPipeline`] coordinator. Per run it
//! reads every item of the requested scope once, then drives each item through
//! Classify → Map → Write with:
//! - Async execution via `tokio`
//! - A per-item timeout covering the write and its attachments
//! - A bounded write pool (size 1 unless the destination allows more)
//! - Cooperative cancellation between items
//! - Structured logging via `tracing`
//!
//! One failing item never stops the run; only a source that cannot be listed
//! does.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::MigrationOptions;
use crate::executor::{ExecutorError, WriteExecutor};
use crate::migrate::classify::{classify, Classification};
use crate::migrate::dump::DumpSink;
use crate::migrate::mapper;
use crate::migrate::report::{
    FailureReason, ItemResult, MigrationReport, ResultLog, RunStats, SkipReason,
};
use crate::migrate::staging::{AttachmentStaging, StagingError};
use crate::migrate::writer::{DestinationWriter, WriteOutcome};
use crate::model::{DestinationItem, RawAttachment, RawItem};
use crate::traits::{CollectionScope, DestinationVault, SourceError, SourceVault};

// ============================================================================
// Pipeline Types
// ============================================================================

/// What to migrate and where to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRequest {
    pub scope: CollectionScope,
    /// Destination vault name or ID.
    pub vault: String,
    pub dry_run: bool,
}

impl MigrationRequest {
    pub fn new(source_collection: Option<&str>, vault: &str, dry_run: bool) -> Self {
        Self {
            scope: CollectionScope::from_option(source_collection),
            vault: vault.to_string(),
            dry_run,
        }
    }
}

// ============================================================================
// Pipeline Errors
// ============================================================================

/// Errors that stop a run before any item is processed.
#[derive(thiserror::Error, Debug)]
pub enum MigrationError {
    #[error("Source vault unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Collection not found: {0}")]
    NotFound(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Attachment staging failed: {0}")]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl From<SourceError> for MigrationError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Unavailable(detail) => MigrationError::SourceUnavailable(detail),
            SourceError::NotFound(collection) => MigrationError::NotFound(collection),
        }
    }
}

// ============================================================================
// Pipeline Executor
// ============================================================================

/// Moves items from a [`SourceVault`] into a [`DestinationVault`].
///
/// # Example
///
/// ```ignore
/// let pipeline = MigrationPipeline::new(Arc::new(source), Arc::new(destination))
///     .with_timeout(Duration::from_secs(60));
/// let request = MigrationRequest::new(Some("collection-id"), "Imported", false);
/// let report = pipeline.run(&request, CancellationToken::new()).await?;
/// println!("{}", report);
/// ```
pub struct MigrationPipeline<S, D>
where
    S: SourceVault + 'static,
    D: DestinationVault + 'static,
{
    source: Arc<S>,
    writer: Arc<DestinationWriter<D>>,
    options: MigrationOptions,
}

impl<S, D> MigrationPipeline<S, D>
where
    S: SourceVault + 'static,
    D: DestinationVault + 'static,
{
    /// Creates a pipeline with [`MigrationOptions::default`].
    pub fn new(source: Arc<S>, destination: Arc<D>) -> Self {
        Self {
            source,
            writer: Arc::new(DestinationWriter::new(destination)),
            options: MigrationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: MigrationOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the per-item timeout (rounded up to whole seconds).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        self.options.item_timeout_secs = secs.max(1);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.options.workers = workers;
        self
    }

    pub fn options(&self) -> &MigrationOptions {
        &self.options
    }

    /// Write pool size actually used for this destination.
    pub fn effective_workers(&self) -> usize {
        let requested = self.options.workers.max(1);
        if requested > 1 && !self.writer.destination().supports_parallel_writes() {
            warn!(
                requested,
                destination = self.writer.destination().provider_id(),
                "Destination does not allow parallel writes, using a single worker"
            );
            return 1;
        }
        requested
    }

    /// Runs one migration.
    ///
    /// Items are processed in source order. `cancel` is checked between
    /// items; writes already in flight finish and their results are kept, so
    /// a cancelled run still returns a (partial) report.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError`] only when the run cannot start: the source
    /// cannot be listed, the collection does not exist, the options are
    /// invalid or the staging directory cannot be created. Item failures are
    /// recorded in the report instead.
    pub async fn run(
        &self,
        request: &MigrationRequest,
        cancel: CancellationToken,
    ) -> Result<MigrationReport, MigrationError> {
        let start = Instant::now();
        let mut stats = RunStats::default();
        self.options
            .validate()
            .map_err(MigrationError::InvalidOptions)?;

        // ====================================================================
        // Reading
        // ====================================================================

        info!(
            scope = %request.scope,
            source = self.source.provider_id(),
            "Reading source items"
        );
        let read_start = Instant::now();
        let items = self.source.list_items(&request.scope).await?;
        stats.items_read = items.len();
        stats.read_duration_ms = read_start.elapsed().as_millis() as u64;
        info!(
            count = items.len(),
            duration_ms = stats.read_duration_ms,
            "Source items read"
        );

        let staging = self.prepare_staging(request, &items)?.map(Arc::new);
        let dump = self.options.dump_dir.as_ref().map(DumpSink::new);
        let executor = WriteExecutor::new(self.effective_workers());
        let item_timeout = self.options.item_timeout();

        // ====================================================================
        // Per item: Classifying -> Mapping -> Writing
        // ====================================================================

        let log = ResultLog::new();
        let mut tasks = JoinSet::new();
        let mut dispatched: Vec<(usize, String, String)> = Vec::new();
        let mut cancelled = false;
        let total = items.len();
        let progress = create_progress_bar(total as u64, self.options.show_progress);

        for (index, raw) in items.into_iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            if let Some(dump) = &dump {
                if let Err(e) = dump.dump_source(&raw) {
                    warn!(item = %raw.id, error = %e, "Failed to dump source item");
                }
            }

            let kind = match classify(&raw) {
                Classification::Supported(kind) => kind,
                Classification::Unsupported { tag } => {
                    info!(item = %raw.id, tag, "Skipping unsupported item type");
                    log.record(
                        index,
                        ItemResult::skipped(&raw.id, &raw.name, SkipReason::UnsupportedType { tag }),
                    );
                    progress.inc(1);
                    continue;
                }
            };

            let item = match mapper::translate(&raw, kind) {
                Ok(item) => item,
                Err(e) => {
                    warn!(item = %raw.id, field = %e.field, "Mapping failed: {}", e.reason);
                    log.record(
                        index,
                        ItemResult::failed(
                            &raw.id,
                            &raw.name,
                            FailureReason::MappingError,
                            e.to_string(),
                        ),
                    );
                    progress.inc(1);
                    continue;
                }
            };
            debug!(item = %raw.id, %kind, fields = item.fields.len(), "Item mapped");

            if let Some(dump) = &dump {
                if let Err(e) = dump.dump_translated(&raw, &item) {
                    warn!(item = %raw.id, error = %e, "Failed to dump translated item");
                }
            }

            let slot = executor.acquire().await?;
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            dispatched.push((index, raw.id.clone(), raw.name.clone()));
            let label = raw.id.clone();
            let task = ItemTask {
                index,
                raw,
                item,
                vault: request.vault.clone(),
                dry_run: request.dry_run,
                item_timeout,
                source: Arc::clone(&self.source),
                writer: Arc::clone(&self.writer),
                staging: staging.clone(),
                log: log.clone(),
                created: OnceLock::new(),
                progress: progress.clone(),
            };
            slot.spawn(&mut tasks, &label, task.run());
        }

        if cancelled {
            info!(
                processed = log.len() + tasks.len(),
                total, "Cancellation requested, waiting for in-flight writes"
            );
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Item task aborted");
            }
        }

        // A task that panicked never recorded its result.
        for (index, id, title) in dispatched {
            if !log.contains(index) {
                log.record(
                    index,
                    ItemResult::failed(
                        &id,
                        &title,
                        FailureReason::WriteError,
                        "item task aborted unexpectedly".to_string(),
                    ),
                );
            }
        }

        if cancelled {
            progress.abandon();
        } else {
            progress.finish();
        }

        // ====================================================================
        // Reporting
        // ====================================================================

        stats.total_duration_ms = start.elapsed().as_millis() as u64;
        let report = MigrationReport {
            results: log.into_ordered(),
            dry_run: request.dry_run,
            cancelled,
            stats,
        };

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            skipped = report.skipped(),
            cancelled,
            duration_ms = report.stats.total_duration_ms,
            "Migration finished"
        );
        Ok(report)
    }

    /// Staging is only needed when real writes will carry attachments.
    fn prepare_staging(
        &self,
        request: &MigrationRequest,
        items: &[RawItem],
    ) -> Result<Option<AttachmentStaging>, MigrationError> {
        let has_attachments = items.iter().any(|i| !i.attachments.is_empty());
        if request.dry_run || !self.options.migrate_attachments || !has_attachments {
            return Ok(None);
        }

        let keep = self.options.keep_staging;
        let staging = match &self.options.staging_dir {
            Some(dir) => AttachmentStaging::create(dir.clone(), keep)?,
            None => AttachmentStaging::in_temp_dir(keep)?,
        };
        debug!(path = %staging.root().display(), "Attachment staging ready");
        Ok(Some(staging))
    }
}

/// Bar over the item loop; hidden unless `enabled`.
fn create_progress_bar(total: u64, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let pb = if total > 0 {
        ProgressBar::new(total)
    } else {
        ProgressBar::new_spinner()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Everything one spawned write needs, owned.
struct ItemTask<S, D>
where
    S: SourceVault + 'static,
    D: DestinationVault + 'static,
{
    index: usize,
    raw: RawItem,
    item: DestinationItem,
    vault: String,
    dry_run: bool,
    item_timeout: Duration,
    source: Arc<S>,
    writer: Arc<DestinationWriter<D>>,
    staging: Option<Arc<AttachmentStaging>>,
    log: ResultLog,
    /// Set once the destination has created the item; survives a timeout.
    created: OnceLock<String>,
    progress: ProgressBar,
}

impl<S, D> ItemTask<S, D>
where
    S: SourceVault + 'static,
    D: DestinationVault + 'static,
{
    async fn run(self) {
        let result = match timeout(self.item_timeout, self.write()).await {
            Ok(result) => result,
            Err(_) => {
                let secs = self.item_timeout.as_secs();
                let detail = match self.created.get() {
                    Some(item_id) => format!(
                        "created as {} but attachments did not finish within {}s",
                        item_id, secs
                    ),
                    None => format!("no result after {}s", secs),
                };
                warn!(item = %self.raw.id, timeout_secs = secs, "Item timed out: {}", detail);
                ItemResult::failed(&self.raw.id, &self.raw.name, FailureReason::Timeout, detail)
            }
        };
        self.log.record(self.index, result);
        self.progress.inc(1);
    }

    async fn write(&self) -> ItemResult {
        let (id, title) = (&self.raw.id, &self.raw.name);

        let item_id = match self.writer.write(&self.item, &self.vault, self.dry_run).await {
            Err(e) => {
                warn!(item = %id, error = %e, "Write failed");
                return ItemResult::failed(id, title, FailureReason::WriteError, e.to_string());
            }
            Ok(WriteOutcome::Simulated) => {
                if !self.raw.attachments.is_empty() {
                    debug!(item = %id, count = self.raw.attachments.len(), "Dry run, attachments not copied");
                }
                return ItemResult::success(id, title, None);
            }
            Ok(WriteOutcome::Created { item_id }) => item_id,
        };
        let _ = self.created.set(item_id.clone());

        if let Some(staging) = &self.staging {
            for attachment in &self.raw.attachments {
                if let Err(detail) = self.copy_attachment(staging, &item_id, attachment).await {
                    warn!(item = %id, attachment = %attachment.file_name, "Attachment failed: {}", detail);
                    return ItemResult::failed(
                        id,
                        title,
                        FailureReason::AttachmentError,
                        format!(
                            "created as {} but attachment '{}' failed: {}",
                            item_id, attachment.file_name, detail
                        ),
                    );
                }
            }
        }

        ItemResult::success(id, title, Some(item_id))
    }

    async fn copy_attachment(
        &self,
        staging: &AttachmentStaging,
        item_id: &str,
        attachment: &RawAttachment,
    ) -> Result<(), String> {
        let path = staging
            .path_for(item_id, &attachment.file_name)
            .map_err(|e| e.to_string())?;
        self.source
            .fetch_attachment(&self.raw, attachment, &path)
            .await
            .map_err(|e| e.to_string())?;
        self.writer
            .destination()
            .attach_file(item_id, &path)
            .await
            .map_err(|e| e.to_string())?;
        debug!(item_id, file = %attachment.file_name, "Attachment copied");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
