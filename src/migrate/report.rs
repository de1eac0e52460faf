//! Per-item outcomes and the aggregate run report.

use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Why an item failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    MappingError,
    WriteError,
    Timeout,
    AttachmentError,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureReason::MappingError => "mapping-error",
            FailureReason::WriteError => "write-error",
            FailureReason::Timeout => "timeout",
            FailureReason::AttachmentError => "attachment-error",
        })
    }
}

/// Why an item was not migrated without counting as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    UnsupportedType { tag: i64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedType { tag } => write!(f, "unsupported-type ({})", tag),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ItemOutcome {
    Success {
        /// `None` for dry runs.
        destination_id: Option<String>,
        simulated: bool,
    },
    Failed {
        reason: FailureReason,
        detail: String,
    },
    Skipped {
        reason: SkipReason,
    },
}

/// Outcome of one source item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemResult {
    pub source_id: String,
    pub title: String,
    pub outcome: ItemOutcome,
}

impl ItemResult {
    pub fn success(source_id: &str, title: &str, destination_id: Option<String>) -> Self {
        let simulated = destination_id.is_none();
        Self::new(
            source_id,
            title,
            ItemOutcome::Success {
                destination_id,
                simulated,
            },
        )
    }

    pub fn failed(source_id: &str, title: &str, reason: FailureReason, detail: String) -> Self {
        Self::new(source_id, title, ItemOutcome::Failed { reason, detail })
    }

    pub fn skipped(source_id: &str, title: &str, reason: SkipReason) -> Self {
        Self::new(source_id, title, ItemOutcome::Skipped { reason })
    }

    fn new(source_id: &str, title: &str, outcome: ItemOutcome) -> Self {
        Self {
            source_id: source_id.to_string(),
            title: title.to_string(),
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ItemOutcome::Success { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ItemOutcome::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, ItemOutcome::Skipped { .. })
    }
}

/// Append-only result list shared by concurrent item tasks.
///
/// Entries are tagged with the item's source position so the final report
/// keeps source order regardless of completion order.
#[derive(Debug, Clone, Default)]
pub struct ResultLog {
    entries: Arc<Mutex<Vec<(usize, ItemResult)>>>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, index: usize, result: ItemResult) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((index, result));
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, index: usize) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|(i, _)| *i == index)
    }

    /// Drains the log into source order.
    pub fn into_ordered(self) -> Vec<ItemResult> {
        let mut entries = std::mem::take(
            &mut *self
                .entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        entries.sort_by_key(|(index, _)| *index);
        entries.into_iter().map(|(_, result)| result).collect()
    }
}

/// Timing of one run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunStats {
    /// Items returned by the source
    pub items_read: usize,

    /// Time spent listing source items (milliseconds)
    pub read_duration_ms: u64,

    /// Total time of the run (milliseconds)
    pub total_duration_ms: u64,
}

/// Aggregate outcome of one migration run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    /// One entry per processed item, in source order.
    pub results: Vec<ItemResult>,
    pub dry_run: bool,
    /// Set when the run stopped early; `results` then covers only the items
    /// processed before cancellation.
    pub cancelled: bool,
    pub stats: RunStats,
}

impl MigrationReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.is_failed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.results.iter().filter(|r| r.is_skipped()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemResult> {
        self.results.iter().filter(|r| r.is_failed())
    }

    /// Zero only when no item failed. Skips do not count.
    pub fn exit_code(&self) -> i32 {
        if self.failed() == 0 {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.dry_run { " (dry run)" } else { "" };
        writeln!(f, "Migration summary{}", mode)?;
        if self.cancelled {
            writeln!(f, "   Run was cancelled; remaining items were not processed.")?;
        }
        writeln!(f, "   Processed: {}", self.results.len())?;
        writeln!(f, "   Succeeded: {}", self.succeeded())?;
        writeln!(f, "   Failed:    {}", self.failed())?;
        writeln!(f, "   Skipped:   {}", self.skipped())?;

        if self.failed() > 0 {
            writeln!(f, "\nFailed items:")?;
            for result in self.failures() {
                if let ItemOutcome::Failed { reason, detail } = &result.outcome {
                    writeln!(
                        f,
                        "   - {} ({}): {}: {}",
                        result.title, result.source_id, reason, detail
                    )?;
                }
            }
        }

        if self.skipped() > 0 {
            writeln!(f, "\nSkipped items:")?;
            for result in self.results.iter().filter(|r| r.is_skipped()) {
                if let ItemOutcome::Skipped { reason } = &result.outcome {
                    writeln!(f, "   - {} ({}): {}", result.title, result.source_id, reason)?;
                }
            }
        }
        Ok(())
    }
}
