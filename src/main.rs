use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use versionize::cli::{Cli, Commands};
use versionize::{commands, config_discovery, logging};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config_discovery::load_config_with_discovery(cli.config.as_deref())?;

    logging::init(
        &config.observability.log_level,
        Some(config.observability.log_format.as_str()),
    );

    // --root-dir / VERSIONIZE_ROOT_DIR wins over the config file
    let root_override = cli.root_dir.as_ref().map(PathBuf::from);
    let root_dir = root_override
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.store.root_dir));

    match &cli.command {
        Commands::Run(args) => commands::run::run(args, &root_dir, config.store.skip),
        Commands::Status(args) => commands::status::run(args, &root_dir),
        Commands::Pipeline(args) => commands::pipeline::run(
            args,
            root_override.as_deref(),
            &PathBuf::from(&config.store.root_dir),
            config.store.skip,
        ),
        Commands::Flow(args) => commands::flow::run(args),
        Commands::Config(args) => commands::config::run(&args.command, &config),
    }
}
