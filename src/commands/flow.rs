/// `versionize flow` command implementation
///
/// Prints the running flow version after each input, one per line.
use anyhow::{Context, Result};

use crate::cli::FlowArgs;
use crate::flow::FlowAccumulator;

pub fn run(args: &FlowArgs) -> Result<()> {
    let mut flow = FlowAccumulator::parse(&args.seed).context("Invalid seed version")?;

    if args.versions.is_empty() {
        println!("{}", flow.current());
        return Ok(());
    }

    for version in &args.versions {
        let current = flow
            .combine_str(version)
            .with_context(|| format!("Invalid version in flow: {}", version))?;
        println!("{}", current);
    }

    Ok(())
}
