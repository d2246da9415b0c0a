//! Command-line entry point for the contest-standings service
//!
//! Loads a contest snapshot, builds ranklists or runs rating calculations
//! against it, and prints the results as JSON.

use anyhow::Result;
use clap::{Parser, Subcommand};
use contest_standings::config::AppConfig;
use contest_standings::metrics::MetricsCollector;
use contest_standings::rating::{RatingEngine, RatingPolicy};
use contest_standings::snapshot::Snapshot;
use contest_standings::types::{ContestId, RatingTrigger, UserId};
use contest_standings::utils::current_timestamp;
use contest_standings::ContestRatingService;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Contest Standings - OI/IOI/ACM ranklists and contest ratings
#[derive(Parser)]
#[command(
    name = "contest-standings",
    version,
    about = "Build contest ranklists and compute contest ratings from a snapshot",
    long_about = "Contest Standings reads contests and submissions from a TOML or JSON snapshot, \
                 builds OI, IOI and ACM ranklists, and computes Codeforces-style rating changes \
                 with optional recalculation of every later contest."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Snapshot with contests, submissions and earlier ratings
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to contest snapshot (.toml or .json)"
    )]
    snapshot: PathBuf,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Rating policy override
    #[arg(long, value_name = "POLICY", help = "Override rating policy (simple, top_weighted)")]
    policy: Option<RatingPolicy>,

    /// Print Prometheus metrics to stderr on exit
    #[arg(long, help = "Print collected metrics to stderr before exiting")]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the ranklist of a contest
    Ranklist {
        /// Contest ID
        contest_id: ContestId,
    },
    /// Compute and commit ratings for a contest
    Rate {
        /// Contest ID
        contest_id: ContestId,
        /// Reset and re-rate this contest and every contest ending after it
        #[arg(long)]
        recalculate: bool,
    },
    /// Print a user's rating history
    History {
        /// User ID
        user_id: UserId,
    },
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig, args: &Args) {
    info!("Contest Standings v{}", contest_standings::VERSION);
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Rating policy: {}", config.rating.policy);
    info!("   Default rating: {}", config.rating.default_rating);
    info!("   Snapshot: {}", args.snapshot.display());
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if let Some(policy) = args.policy {
        config.rating.policy = policy;
    }

    if args.metrics {
        config.service.metrics_enabled = true;
    }

    contest_standings::config::validate_config(&config)?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(args: &Args, config: &AppConfig, service: &ContestRatingService) -> Result<()> {
    let now = current_timestamp();

    match &args.command {
        Command::Ranklist { contest_id } => {
            let ranklist = service.ranklist(*contest_id, now).await?;
            print_json(&ranklist)
        }
        Command::Rate {
            contest_id,
            recalculate,
        } => {
            let report = service
                .handle_trigger(
                    RatingTrigger {
                        contest_id: *contest_id,
                        recalculate: *recalculate,
                    },
                    now,
                )
                .await?;

            info!(
                "Rated {} contests with {} policy",
                report.rated_contests.len(),
                config.rating.policy
            );
            print_json(&report)
        }
        Command::History { user_id } => {
            let history = service.rating_history(*user_id)?;
            info!(
                "User {} has {} rated contests, current rating {}",
                user_id,
                history.len(),
                service.current_rating(*user_id)?
            );
            print_json(&history)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config, &args);

    let snapshot = Snapshot::load(&args.snapshot)?;
    let (source, store) = snapshot.into_sources(config.rating.default_rating)?;
    let metrics = Arc::new(MetricsCollector::new()?);

    let service = ContestRatingService::new(
        Arc::new(source),
        Arc::new(store),
        RatingEngine::new(config.rating.policy),
        metrics.clone(),
    );

    if let Err(e) = run(&args, &config, &service).await {
        error!("Command failed: {}", e);
        return Err(e);
    }

    if config.service.metrics_enabled {
        eprint!("{}", metrics.encode_text()?);
    }

    Ok(())
}
