/// `versionize status` command implementation
///
/// Shows the current version of a store tree and the tag records of one
/// task's version directory.
use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::StatusArgs;
use crate::store::VersionStore;
use crate::version::{Version, INITIAL_VERSION};

pub fn run(args: &StatusArgs, root_dir: &Path) -> Result<()> {
    // Opening a store would create the root
    if !root_dir.exists() {
        println!("Root: {}", root_dir.display());
        println!("Current version: none recorded");
        println!();
        println!("No versions recorded yet.");
        return Ok(());
    }

    let mut store = VersionStore::with_root(INITIAL_VERSION, &args.dir, root_dir)
        .context("Failed to open version store")?;

    let current = store.current_version()?;

    println!("Root: {}", store.root_dir().display());
    match current {
        Some(version) => println!("Current version: {}", version),
        None => println!("Current version: none recorded"),
    }

    let version = match args.for_version.as_deref() {
        Some(raw) => Some(Version::parse(raw).context("Invalid --for-version")?),
        None => current,
    };

    let Some(version) = version else {
        println!();
        println!("No versions recorded yet.");
        return Ok(());
    };

    let dir = store.version_directory(&version);
    println!("Directory: {}", dir.display());
    println!();

    // Reading a missing directory would initialize it
    if !dir.exists() {
        println!("No records for {} in v{}.", args.dir, version.major);
        return Ok(());
    }

    let records = store.records(&version)?;
    if records.is_empty() {
        println!("No records for {} in v{}.", args.dir, version.major);
        return Ok(());
    }

    println!("Records ({} entries):", records.len());
    let width = records.keys().map(String::len).max().unwrap_or(0);
    for (tag, recorded) in &records {
        let present = if dir.join(tag).exists() { "" } else { "  (output missing)" };
        println!("  {:width$}  {}{}", tag, recorded, present, width = width);
    }

    Ok(())
}
