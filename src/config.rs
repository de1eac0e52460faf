//! Run options for the migration pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Options that shape a migration run.
///
/// Every field has a default, so an empty JSON object is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationOptions {
    /// Concurrent destination writes. Only honored when the destination
    /// declares parallel-safe writes; otherwise 1.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Upper bound for writing one item, attachments included (seconds).
    #[serde(default = "default_item_timeout_secs")]
    pub item_timeout_secs: u64,

    /// Copy source attachments to the created items.
    #[serde(default = "default_true")]
    pub migrate_attachments: bool,

    /// Where attachments are staged. `None` picks a directory under the
    /// system temp dir.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    /// Leave the staging directory in place after the run.
    #[serde(default)]
    pub keep_staging: bool,

    /// Dump raw and translated items as JSON under this directory.
    #[serde(default)]
    pub dump_dir: Option<PathBuf>,

    /// Draw a progress bar on stderr.
    #[serde(default)]
    pub show_progress: bool,
}

fn default_workers() -> usize {
    1
}

fn default_item_timeout_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            item_timeout_secs: default_item_timeout_secs(),
            migrate_attachments: true,
            staging_dir: None,
            keep_staging: false,
            dump_dir: None,
            show_progress: false,
        }
    }
}

impl MigrationOptions {
    pub fn item_timeout(&self) -> Duration {
        Duration::from_secs(self.item_timeout_secs)
    }

    /// Checks option values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be at least 1".to_string());
        }
        if self.item_timeout_secs == 0 {
            return Err("item timeout must be at least 1 second".to_string());
        }
        Ok(())
    }
}
