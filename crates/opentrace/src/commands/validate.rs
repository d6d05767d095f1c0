//! Validate command - checks a pipeline without running any module.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use opentrace_pipeline::{Pipeline, module_path};
use serde::Serialize;

use super::Context;

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the pipeline YAML file
    pub pipeline: PathBuf,

    /// Directory containing module executables
    #[arg(long, value_name = "DIR")]
    pub bin_dir: Option<PathBuf>,
}

/// Validation report for JSON output.
#[derive(Debug, Serialize)]
struct ValidateOutput {
    valid: bool,
    modules: usize,
    module_dir: PathBuf,
    problems: Vec<String>,
}

/// Run the validate command.
pub async fn run(args: ValidateArgs, ctx: &Context) -> Result<()> {
    let pipeline = Pipeline::load(&args.pipeline)?;
    let module_dir = ctx.module_dir(args.bin_dir.as_deref());

    let mut problems: Vec<String> = pipeline
        .unresolved_references()
        .into_iter()
        .map(|r| {
            format!(
                "module '{}' references '{}' which does not run before it",
                r.step, r.reference
            )
        })
        .collect();

    for step in &pipeline {
        let path = module_path(&module_dir, &step.name);
        if !path.is_file() {
            problems.push(format!(
                "module '{}' has no executable at {}",
                step.name,
                path.display()
            ));
        }
    }

    if ctx.json_output {
        let output = ValidateOutput {
            valid: problems.is_empty(),
            modules: pipeline.len(),
            module_dir: module_dir.clone(),
            problems: problems.clone(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if problems.is_empty() {
        println!(
            "{}: {} modules OK ({})",
            args.pipeline.display(),
            pipeline.len(),
            module_dir.display()
        );
    } else {
        for problem in &problems {
            eprintln!("  - {problem}");
        }
    }

    if !problems.is_empty() {
        bail!("{} problem(s) found in {}", problems.len(), args.pipeline.display());
    }
    Ok(())
}
