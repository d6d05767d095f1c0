//! OpenTrace - run pipelines of standalone modules.
//!
//! Main entry point for the OpenTrace CLI.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use opentrace_config::{ConfigError, LoadedConfig};
use tracing_appender::non_blocking::WorkerGuard;

mod commands;

use commands::{run, validate};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// OpenTrace - run pipelines of standalone modules
#[derive(Parser)]
#[command(name = "opentrace")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a pipeline
    Run(run::RunArgs),

    /// Check a pipeline without running it
    Validate(validate::ValidateArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = opentrace_config::load_config()?;
    let _guard = init_tracing(&config, cli.verbose)?;

    let ctx = commands::Context {
        config,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Run(args) => run::run(args, &ctx).await,
        Commands::Validate(args) => validate::run(args, &ctx).await,
    }
}

/// Console (human-readable) on stderr plus an optional rotating JSON file.
///
/// A log directory that cannot be created disables the file layer with a
/// warning. The returned guard flushes the file writer on drop.
fn init_tracing(config: &LoadedConfig, verbose: bool) -> Result<Option<WorkerGuard>> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let console_filter = if verbose {
        EnvFilter::new("opentrace=debug,opentrace_pipeline=debug,opentrace_config=debug,info")
    } else if let Ok(filter) = EnvFilter::try_from_default_env() {
        filter
    } else {
        match config.config.logging.level.as_deref() {
            Some(level) => EnvFilter::try_new(level).map_err(|e| ConfigError::Invalid {
                field: "logging.level".to_string(),
                reason: e.to_string(),
            })?,
            None => EnvFilter::new(
                "opentrace=info,opentrace_pipeline=warn,opentrace_config=warn,warn",
            ),
        }
    };

    let file_appender = if config.config.logging.file {
        let logs_dir = config.logs_dir();
        match RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("opentrace.log")
            .build(&logs_dir)
        {
            Ok(appender) => Some(appender),
            Err(e) => {
                eprintln!(
                    "warning: file logging disabled, cannot use {}: {e}",
                    logs_dir.display()
                );
                None
            }
        }
    } else {
        None
    };

    let (file_layer, guard) = match file_appender {
        Some(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new(
                    "opentrace=trace,opentrace_pipeline=trace,opentrace_config=trace,info",
                ));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}
