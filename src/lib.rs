pub mod config;
pub mod executor;
pub mod migrate;
pub mod model;
pub mod providers;
pub mod traits;

// Re-export common types for convenience
pub use config::MigrationOptions;
pub use executor::*;
pub use migrate::{
    FailureReason, ItemOutcome, ItemResult, MigrationError, MigrationPipeline, MigrationReport,
    MigrationRequest, SkipReason,
};
pub use model::*;
pub use providers::{BitwardenCli, OnePasswordCli};
pub use traits::*;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use providers::CliCommand;

/// How to reach the two vault CLIs.
#[derive(Debug, Clone)]
pub struct CliProviders {
    /// `bw`, or a wrapper around it.
    pub bitwarden: CliCommand,
    /// `op`, or a wrapper around it.
    pub onepassword: CliCommand,
    /// Session key of an unlocked `bw` vault.
    pub session: Option<String>,
    /// Declares concurrent `op item create` calls safe.
    pub parallel_writes: bool,
}

impl Default for CliProviders {
    fn default() -> Self {
        Self {
            bitwarden: CliCommand::new("bw"),
            onepassword: CliCommand::new("op"),
            session: None,
            parallel_writes: false,
        }
    }
}

/// Builds a pipeline over the `bw` and `op` CLIs.
pub fn cli_pipeline(
    destination_account: &str,
    options: MigrationOptions,
    providers: CliProviders,
) -> MigrationPipeline<BitwardenCli, OnePasswordCli> {
    let source = BitwardenCli::with_command(providers.bitwarden, providers.session.as_deref());
    let destination = OnePasswordCli::with_command(providers.onepassword, destination_account)
        .with_parallel_writes(providers.parallel_writes);

    MigrationPipeline::new(Arc::new(source), Arc::new(destination)).with_options(options)
}

/// Migrates one collection (or, with `None`, the personal vault) from the
/// `bw` session into `destination_vault` of the `op` account
/// `destination_account`.
///
/// # Errors
///
/// See [`MigrationPipeline::run`].
pub async fn run_migration(
    source_collection: Option<&str>,
    destination_account: &str,
    destination_vault: &str,
    dry_run: bool,
    options: MigrationOptions,
    providers: CliProviders,
    cancel: CancellationToken,
) -> Result<MigrationReport, MigrationError> {
    let request = MigrationRequest::new(source_collection, destination_vault, dry_run);
    cli_pipeline(destination_account, options, providers)
        .run(&request, cancel)
        .await
}
