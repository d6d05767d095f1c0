//! Run command - executes a pipeline and prints each module's result.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use opentrace_pipeline::{CancellationToken, EngineConfig, Pipeline, PipelineEngine};
use tracing::{info, warn};

use super::Context;

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the pipeline YAML file
    pub pipeline: PathBuf,

    /// Directory containing module executables
    #[arg(long, value_name = "DIR")]
    pub bin_dir: Option<PathBuf>,

    /// Per-module timeout in seconds (0 disables)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Run the run command.
pub async fn run(args: RunArgs, ctx: &Context) -> Result<()> {
    let pipeline = Pipeline::load(&args.pipeline)?;
    let module_dir = ctx.module_dir(args.bin_dir.as_deref());
    let timeout = match args.timeout {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => ctx.config.config.modules.timeout(),
    };

    let engine = PipelineEngine::new(EngineConfig::new(module_dir).with_timeout(timeout));

    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling pipeline");
                cancel.cancel();
            }
        }
    });

    let result = engine.execute(&pipeline, &cancel).await;
    interrupt.abort();

    info!(
        status = ?result.status,
        elapsed_ms = result.duration.as_millis() as u64,
        "Run finished"
    );
    if ctx.verbose {
        eprintln!(
            "{} of {} modules completed in {:.2?}",
            result.outputs.len(),
            pipeline.len(),
            result.duration
        );
    }

    let outputs = result.into_result()?;
    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&outputs.to_json())?);
    } else {
        for (name, value) in outputs.iter() {
            println!("{name}: {value}");
        }
    }

    Ok(())
}
