/// `versionize pipeline` command implementation
///
/// Runs every task of a manifest in order, threading the flow version.
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::cli::PipelineArgs;
use crate::cli_utils::versionize_prefix;
use crate::pipeline::{PipelineManifest, PipelineRunner, RunOptions, TaskStatus};

pub fn run(
    args: &PipelineArgs,
    root_override: Option<&Path>,
    default_root_dir: &Path,
    skip_default: bool,
) -> Result<()> {
    let manifest_path = Path::new(&args.manifest);
    if !manifest_path.exists() {
        anyhow::bail!("Pipeline manifest not found: {}", args.manifest);
    }

    let manifest = PipelineManifest::from_file(manifest_path)?;

    let base_dir = match manifest_path.parent() {
        Some(parent) if parent != Path::new("") => parent.to_path_buf(),
        _ => std::env::current_dir().context("Failed to get current directory")?,
    };

    let runner = PipelineRunner::new(RunOptions {
        root_dir: root_override.map(Path::to_path_buf),
        default_root_dir: Some(PathBuf::from(default_root_dir)),
        base_dir,
        no_skip: args.no_skip || !skip_default,
        dry_run: args.dry_run,
        verbose: args.verbose,
    });

    if args.verbose {
        eprintln!(
            "{} Pipeline {} (seed {}, {} tasks, root {})",
            versionize_prefix(),
            args.manifest,
            manifest.version,
            manifest.tasks.len(),
            runner.root_dir(&manifest)?.display()
        );
    }

    let report = runner.run(&manifest)?;

    let width = report
        .tasks
        .iter()
        .map(|t| t.name.len())
        .max()
        .unwrap_or(0);

    for task in &report.tasks {
        let marker = match task.status {
            TaskStatus::Executed => "✓",
            TaskStatus::Skipped => "-",
            TaskStatus::WouldExecute => "?",
            TaskStatus::WouldSkip => "·",
        };
        println!(
            "{} {:width$}  {:13}  {} (flow {})  {}",
            marker,
            task.name,
            task.status.to_string(),
            task.version,
            task.flow,
            task.output.display(),
            width = width
        );
    }

    println!();
    println!(
        "Flow version: {} ({} executed, {} skipped)",
        report.final_version,
        report.executed(),
        report.skipped()
    );

    Ok(())
}
