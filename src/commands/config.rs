use anyhow::Result;
use tracing::info;

use crate::cli::ConfigCommands;
use crate::config::VersionizeConfig;

pub fn run(command: &ConfigCommands, effective: &VersionizeConfig) -> Result<()> {
    match command {
        ConfigCommands::Validate { path } => validate(path),
        ConfigCommands::Example => example(),
        ConfigCommands::Show => show(effective),
    }
}

fn validate(path: &str) -> Result<()> {
    info!("Validating config file: {}", path);

    let config = VersionizeConfig::from_file(path)?;
    config.validate()?;

    println!("✓ Configuration file is valid: {}", path);
    println!("\nSummary:");
    println!("  - Root directory: {}", config.store.root_dir);
    println!("  - Skip up-to-date tasks: {}", config.store.skip);
    println!("  - Log level: {}", config.observability.log_level);
    println!("  - Log format: {}", config.observability.log_format);

    Ok(())
}

fn example() -> Result<()> {
    println!("{}", VersionizeConfig::example()?);
    Ok(())
}

fn show(config: &VersionizeConfig) -> Result<()> {
    info!("Showing effective configuration");

    println!("Effective Configuration:\n");
    println!("{}", toml::to_string_pretty(config)?);

    Ok(())
}
