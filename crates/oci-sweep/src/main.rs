//! oci-sweep: dependency-ordered teardown of an OCI compartment
//!
//! Discovers every live resource in a compartment and deletes them in a
//! safe order, optionally deleting the compartment itself at the end.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use oci_sweep::cli::{self, DEFAULT_SAMPLES, StdinConfirmer};
use oci_sweep::config::{ProviderConfig, RetryConfig, TeardownConfig, TeardownFlags, WaitConfig};
use oci_sweep::oci::HttpProvider;
use oci_sweep::teardown::{ProgressTracker, RunPhase};
use oci_sweep::Orchestrator;
use oci_sweep_common::defaults::{
    DEFAULT_CLEANUP_PAUSE_MS, DEFAULT_MAX_RETRIES, DEFAULT_MAX_WORKERS,
    DEFAULT_PROGRESS_INTERVAL_SECS, DEFAULT_REGION, DEFAULT_RETRY_DELAY_SECS,
    DEFAULT_WAIT_TIMEOUT_SECS,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "oci-sweep")]
#[command(about = "Delete every resource in an OCI compartment, in dependency order")]
#[command(version)]
struct Args {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long, global = true, env = "OCI_SWEEP_JSON_LOGS")]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

/// Where the compartment lives and how to reach the provider
#[derive(clap::Args, Debug)]
struct ProviderArgs {
    /// Compartment OCID to empty
    #[arg(long, env = "OCI_SWEEP_SCOPE")]
    scope: String,

    /// Base URL of the provider gateway
    #[arg(long, env = "OCI_SWEEP_ENDPOINT", default_value = "http://127.0.0.1:8710")]
    endpoint: String,

    /// Home region
    #[arg(long, env = "OCI_SWEEP_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// Extra regions to list kinds that search does not cover
    #[arg(long, env = "OCI_SWEEP_REGIONS", value_delimiter = ',')]
    regions: Vec<String>,
}

impl From<&ProviderArgs> for ProviderConfig {
    fn from(args: &ProviderArgs) -> Self {
        Self {
            endpoint: args.endpoint.clone(),
            region: args.region.clone(),
            regions: args
                .regions
                .iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

/// Arguments for the teardown command (boxed to keep the enum small)
#[derive(clap::Args, Debug)]
struct TeardownArgs {
    #[command(flatten)]
    provider: ProviderArgs,

    /// Skip confirmation prompts
    #[arg(long, env = "OCI_SWEEP_FORCE")]
    force: bool,

    /// Delete the compartment itself once it is empty
    #[arg(long, env = "OCI_SWEEP_DELETE_SCOPE")]
    delete_scope: bool,

    /// Show what would be deleted, in order, and exit
    #[arg(long)]
    dry_run: bool,

    /// Extra rounds for resources that hit a conflict
    #[arg(long, env = "OCI_SWEEP_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Concurrent deletions within one kind
    #[arg(long, env = "OCI_SWEEP_MAX_WORKERS", default_value_t = DEFAULT_MAX_WORKERS)]
    max_workers: usize,

    /// Base delay between retry rounds, in seconds (grows linearly)
    #[arg(long, env = "OCI_SWEEP_RETRY_DELAY_SECS", default_value_t = DEFAULT_RETRY_DELAY_SECS)]
    retry_delay_secs: u64,

    /// Longest wait for a long-running deletion, in seconds
    #[arg(long, env = "OCI_SWEEP_WAIT_TIMEOUT_SECS", default_value_t = DEFAULT_WAIT_TIMEOUT_SECS)]
    wait_timeout_secs: u64,

    /// Seconds between progress lines (0 disables them)
    #[arg(
        long,
        env = "OCI_SWEEP_PROGRESS_INTERVAL_SECS",
        default_value_t = DEFAULT_PROGRESS_INTERVAL_SECS
    )]
    progress_interval_secs: u64,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

impl From<&TeardownArgs> for TeardownConfig {
    fn from(args: &TeardownArgs) -> Self {
        Self {
            retry: RetryConfig {
                max_retries: args.max_retries,
                max_workers: args.max_workers.max(1),
                base_delay: Duration::from_secs(args.retry_delay_secs),
            },
            wait: WaitConfig {
                timeout: Duration::from_secs(args.wait_timeout_secs),
                ..WaitConfig::default()
            },
            flags: TeardownFlags {
                force: args.force,
                delete_scope: args.delete_scope,
                dry_run: args.dry_run,
            },
            cleanup_pause: Duration::from_millis(DEFAULT_CLEANUP_PAUSE_MS),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every live resource in the compartment
    Discover {
        #[command(flatten)]
        provider: ProviderArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Sample resources shown per kind
        #[arg(long, default_value_t = DEFAULT_SAMPLES)]
        samples: usize,
    },

    /// Delete every resource in the compartment
    Teardown(Box<TeardownArgs>),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

fn init_logging(debug: bool, json: bool) {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug, args.json_logs);

    match args.command {
        Command::Discover {
            provider,
            format,
            samples,
        } => handle_discover(&provider, format, samples).await,
        Command::Teardown(teardown_args) => handle_teardown(&teardown_args).await,
    }
}

fn orchestrator(args: &ProviderArgs) -> Result<Orchestrator<HttpProvider>> {
    let config = ProviderConfig::from(args);
    let provider = HttpProvider::new(&config).context("Failed to set up the provider gateway client")?;
    Ok(Orchestrator::new(provider).with_regions(config.all_regions()))
}

/// Handle the discover command
async fn handle_discover(args: &ProviderArgs, format: OutputFormat, samples: usize) -> Result<()> {
    let orchestrator = orchestrator(args)?;
    let discovered = orchestrator.discover(&args.scope).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&discovered)?),
        OutputFormat::Table => {
            if discovered.is_empty() {
                println!("No live resources found in {}", args.scope);
            } else {
                println!("{}", cli::discovery_table(&discovered, samples));
                println!(
                    "\nTotal: {} resources across {} kinds",
                    discovered.total(),
                    discovered.kinds().count()
                );
            }
        }
    }
    Ok(())
}

/// Handle the teardown command
async fn handle_teardown(args: &TeardownArgs) -> Result<()> {
    let config = TeardownConfig::from(args);
    let orchestrator = orchestrator(&args.provider)?.with_confirmer(Arc::new(StdinConfirmer));
    let scope = args.provider.scope.as_str();

    info!(
        scope = %scope,
        force = config.flags.force,
        delete_scope = config.flags.delete_scope,
        dry_run = config.flags.dry_run,
        max_retries = config.retry.max_retries,
        max_workers = config.retry.max_workers,
        "Starting teardown"
    );

    if config.flags.dry_run {
        let discovered = orchestrator.discover(scope).await?;
        if discovered.is_empty() {
            println!("No live resources found in {scope}");
        } else {
            println!("Deletion plan ({} resources):", discovered.total());
            println!("{}", cli::plan_table(&orchestrator.deletion_plan(&discovered)));
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let printer = (args.progress_interval_secs > 0).then(|| {
        tokio::spawn(print_progress(
            orchestrator.progress(),
            Duration::from_secs(args.progress_interval_secs),
            cancel.clone(),
        ))
    });

    let result = tokio::select! {
        result = orchestrator.run_teardown(scope, &config) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, resources already deleted stay deleted");
            cancel.cancel();
            anyhow::bail!("Teardown interrupted");
        }
    };

    cancel.cancel();
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    let outcome = result?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        cli::print_outcome(&outcome);
    }

    if outcome.report.total_failed() > 0 {
        anyhow::bail!(
            "{} resource(s) could not be deleted",
            outcome.report.total_failed()
        );
    }
    Ok(())
}

async fn print_progress(progress: Arc<ProgressTracker>, every: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(every);
    // First tick fires immediately
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let snapshot = progress.snapshot();
                if matches!(
                    snapshot.current_phase,
                    RunPhase::Cleanup | RunPhase::Deleting | RunPhase::Finalizing
                ) {
                    info!(
                        processed = snapshot.processed_count,
                        total = snapshot.total_resources,
                        deleted = snapshot.deleted_count,
                        failed = snapshot.failed_count,
                        kind = ?snapshot.current_kind,
                        "Progress"
                    );
                }
            }
        }
    }
}
