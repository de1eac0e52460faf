//! vault-migrator CLI
//!
//! Copies Bitwarden items into a 1Password vault using the `bw` and `op`
//! command line tools.

use anyhow::Context;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use vault_migrator::{run_migration, CliProviders, MigrationOptions};

/// Exit status when the run could not start.
const EXIT_NOT_STARTED: u8 = 2;

#[derive(Parser)]
#[command(name = "vault-migrator")]
#[command(version)]
#[command(about = "Migrate Bitwarden items into a 1Password vault", long_about = None)]
struct Cli {
    /// Source collection ID; omit (or pass "null") to migrate every item the
    /// session can read, organization items included
    collection: Option<String>,

    /// 1Password account (sign-in address or account ID)
    #[arg(long, env = "OP_ACCOUNT")]
    account: String,

    /// Destination vault name or ID
    #[arg(long)]
    vault: String,

    /// Validate and translate every item without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Options file (JSON); flags below override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Dump source and translated items as JSON under this directory
    #[arg(long, value_name = "DIR")]
    dump: Option<PathBuf>,

    /// Directory for attachments in transit
    #[arg(long, value_name = "DIR")]
    staging_dir: Option<PathBuf>,

    /// Keep the attachment staging directory after the run
    #[arg(long)]
    keep_staging: bool,

    /// Do not copy attachments
    #[arg(long)]
    no_attachments: bool,

    /// Concurrent writes (needs --parallel-writes)
    #[arg(long)]
    workers: Option<usize>,

    /// Allow concurrent `op item create` calls
    #[arg(long)]
    parallel_writes: bool,

    /// Per-item timeout in seconds
    #[arg(long, value_name = "SECS")]
    item_timeout: Option<u64>,

    /// Session key of an unlocked `bw` vault
    #[arg(long, env = "BW_SESSION", hide_env_values = true)]
    bw_session: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> anyhow::Result<MigrationOptions> {
        let mut options = match &self.config {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Invalid options in {}", path.display()))?
            }
            None => MigrationOptions::default(),
        };

        if let Some(workers) = self.workers {
            options.workers = workers;
        }
        if let Some(secs) = self.item_timeout {
            options.item_timeout_secs = secs;
        }
        if self.dump.is_some() {
            options.dump_dir = self.dump.clone();
        }
        if self.staging_dir.is_some() {
            options.staging_dir = self.staging_dir.clone();
        }
        options.keep_staging |= self.keep_staging;
        if self.no_attachments {
            options.migrate_attachments = false;
        }
        options.show_progress = self.show_progress();
        Ok(options)
    }

    /// The bar replaces per-item log lines on an interactive terminal.
    fn show_progress(&self) -> bool {
        !self.verbose && std::io::stderr().is_terminal()
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "debug"
    } else if cli.show_progress() {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vault_migrator={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_NOT_STARTED)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let options = cli.options()?;
    let providers = CliProviders {
        session: cli.bw_session.clone(),
        parallel_writes: cli.parallel_writes,
        ..Default::default()
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight items");
            on_signal.cancel();
        }
    });

    info!(
        collection = cli.collection.as_deref().unwrap_or("-"),
        vault = %cli.vault,
        dry_run = cli.dry_run,
        timeout = ?Duration::from_secs(options.item_timeout_secs),
        "Starting migration"
    );
    let report = run_migration(
        cli.collection.as_deref(),
        &cli.account,
        &cli.vault,
        cli.dry_run,
        options,
        providers,
        cancel,
    )
    .await
    .context("Migration could not start")?;

    println!("{}", report);
    Ok(report.exit_code() as u8)
}
