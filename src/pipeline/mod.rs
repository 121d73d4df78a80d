//! Pipeline runner
//!
//! Drives the tasks of a [`PipelineManifest`] in order. One
//! [`FlowAccumulator`] is seeded with the pipeline version; each task gets
//! the accumulator's running value as its requested version, and the version
//! the task resolved to is folded back before the next task starts.

pub mod executor;
pub mod manifest;

pub use executor::{CommandExecutor, ExecutionContext, ExecutionResult};
pub use manifest::{PipelineManifest, TaskSpec};

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::flow::FlowAccumulator;
use crate::logging::{operations, services, status};
use crate::store::{Decision, Outcome, VersionStore};
use crate::version::Version;

/// What happened to one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Executed,
    Skipped,
    /// Dry run: the task is due
    WouldExecute,
    /// Dry run: the task is up to date
    WouldSkip,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskStatus::Executed => "executed",
            TaskStatus::Skipped => "skipped",
            TaskStatus::WouldExecute => "would execute",
            TaskStatus::WouldSkip => "would skip",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct TaskReport {
    pub name: String,
    pub tag: String,
    pub status: TaskStatus,
    /// Version the task resolved to
    pub version: Version,
    /// Flow version handed to the task
    pub flow: Version,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub tasks: Vec<TaskReport>,
    /// Flow version after the last task
    pub final_version: Version,
}

impl PipelineReport {
    pub fn executed(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Executed)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Skipped)
            .count()
    }
}

/// Runner options
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Root directory, overriding the manifest's
    pub root_dir: Option<PathBuf>,
    /// Root directory used when neither an override nor the manifest sets one
    pub default_root_dir: Option<PathBuf>,
    /// Directory manifest-relative paths are resolved against
    pub base_dir: PathBuf,
    /// Re-run every task even when up to date
    pub no_skip: bool,
    /// Report decisions without running or recording anything
    pub dry_run: bool,
    pub verbose: bool,
}

pub struct PipelineRunner {
    options: RunOptions,
    executor: CommandExecutor,
}

impl PipelineRunner {
    pub fn new(options: RunOptions) -> Self {
        let executor = CommandExecutor::new(options.verbose);
        Self { options, executor }
    }

    /// Root directory used for `manifest`, made absolute
    ///
    /// Task commands run in their own working directory, so the output
    /// paths exported to them must not depend on ours.
    pub fn root_dir(&self, manifest: &PipelineManifest) -> Result<PathBuf> {
        let root = match (&self.options.root_dir, &manifest.root_dir) {
            (Some(root), _) => root.clone(),
            (None, Some(root)) => PipelineManifest::resolve_path(&self.options.base_dir, root),
            (None, None) => self
                .options
                .default_root_dir
                .clone()
                .unwrap_or_else(|| self.options.base_dir.join(crate::store::DEFAULT_ROOT_DIR)),
        };
        std::path::absolute(&root)
            .with_context(|| format!("Failed to resolve root directory: {}", root.display()))
    }

    pub fn run(&self, manifest: &PipelineManifest) -> Result<PipelineReport> {
        let root_dir = self.root_dir(manifest)?;
        let mut flow = FlowAccumulator::new(manifest.version);
        let mut reports = Vec::with_capacity(manifest.tasks.len());

        for task in &manifest.tasks {
            let requested = flow.current();
            let report = self
                .run_task(task, &root_dir, requested)
                .with_context(|| format!("Task '{}' failed", task.name))?;

            flow.combine(report.version);
            reports.push(report);
        }

        info!(
            service = services::PIPELINE,
            tasks = reports.len(),
            final_version = %flow.current(),
            "pipeline finished"
        );

        Ok(PipelineReport {
            tasks: reports,
            final_version: flow.current(),
        })
    }

    fn run_task(&self, task: &TaskSpec, root_dir: &Path, flow: Version) -> Result<TaskReport> {
        let mut store = VersionStore::with_root(task.code_version, &task.dir, root_dir)?;
        let skip = task.skip && !self.options.no_skip;

        let report = |status, version, output| TaskReport {
            name: task.name.clone(),
            tag: task.tag.clone(),
            status,
            version,
            flow,
            output,
        };

        if self.options.dry_run {
            let decision = store.gate(task.tag.as_str()).skip(skip).flow(flow).decide()?;
            let version = decision.version();
            let output = store.version_directory(&version).join(&task.tag);
            let status = match decision {
                Decision::Skip { .. } => TaskStatus::WouldSkip,
                Decision::Execute { .. } => TaskStatus::WouldExecute,
            };
            return Ok(report(status, version, output));
        }

        let cwd = task
            .cwd
            .as_deref()
            .map(|cwd| PipelineManifest::resolve_path(&self.options.base_dir, cwd))
            .unwrap_or_else(|| self.options.base_dir.clone());

        let resolved = store.resolve(Some(flow));
        let outcome = store
            .gate(task.tag.as_str())
            .skip(skip)
            .flow(flow)
            .run(|output| -> Result<()> {
                let ctx = ExecutionContext {
                    env: executor::task_env(output, &resolved.to_string(), &task.tag),
                    cwd: Some(cwd.clone()),
                    timeout: task.timeout(),
                };

                info!(
                    service = services::PIPELINE,
                    operation = operations::RUN_TASK,
                    status = status::EXECUTE,
                    task = %task.name,
                    version = %resolved,
                    "running task"
                );

                let result = self.executor.execute(&task.command, &ctx)?;
                if !result.success() {
                    anyhow::bail!("command exited with code {}", result.exit_code);
                }
                if !output.exists() {
                    warn!(
                        service = services::PIPELINE,
                        task = %task.name,
                        output = %output.display(),
                        "task finished without creating its output"
                    );
                }
                Ok(())
            })?;

        Ok(match outcome {
            Outcome::Skipped { version, .. } => {
                let output = store.version_directory(&version).join(&task.tag);
                report(TaskStatus::Skipped, version, output)
            }
            Outcome::Executed {
                version, output, ..
            } => report(TaskStatus::Executed, version, output),
        })
    }
}
