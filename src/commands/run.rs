/// `versionize run` command implementation
///
/// Gates a single command on the recorded version of its output tag.
use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::RunArgs;
use crate::cli_utils::versionize_prefix;
use crate::pipeline::executor::{self, CommandExecutor, ExecutionContext};
use crate::store::{Outcome, VersionStore};
use crate::version::Version;

pub fn run(args: &RunArgs, root_dir: &Path, skip_default: bool) -> Result<()> {
    let code_version = Version::parse(&args.code_version).context("Invalid --code-version")?;
    let flow = args
        .flow
        .as_deref()
        .map(Version::parse)
        .transpose()
        .context("Invalid --flow")?;

    let mut store = VersionStore::with_root(code_version, &args.dir, root_dir)
        .context("Failed to open version store")?;
    let skip = skip_default && !args.no_skip;
    let resolved = store.resolve(flow);
    let executor = CommandExecutor::new(args.verbose);

    if args.verbose {
        eprintln!(
            "{} Requested version: {} (code {}, flow {})",
            versionize_prefix(),
            resolved,
            code_version,
            flow.unwrap_or(code_version)
        );
    }

    let outcome = store
        .gate(args.tag.as_str())
        .skip(skip)
        .flow_opt(flow)
        .run(|output| -> Result<()> {
            let ctx = ExecutionContext {
                env: executor::task_env(output, &resolved.to_string(), &args.tag),
                cwd: None,
                timeout: args.timeout.map(std::time::Duration::from_secs),
            };

            let result = executor.execute(&args.command, &ctx)?;
            if !result.success() {
                anyhow::bail!(
                    "Command exited with code {}; {} was not recorded",
                    result.exit_code,
                    args.tag
                );
            }
            Ok(())
        })?;

    match &outcome {
        Outcome::Skipped { recorded, .. } => {
            eprintln!(
                "{} {} is up to date (recorded {}), skipped",
                versionize_prefix(),
                args.tag,
                recorded
            );
        }
        Outcome::Executed {
            version, output, ..
        } => {
            eprintln!(
                "{} {} produced at version {}: {}",
                versionize_prefix(),
                args.tag,
                version,
                output.display()
            );
        }
    }

    // The resolved version is the flow input of the next task
    println!("{}", outcome.version());

    Ok(())
}
