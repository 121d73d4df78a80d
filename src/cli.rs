use clap::{Parser, Subcommand};

/// versionize - version-gated memoization for data pipelines
///
/// Records, per output artifact, the task version that last produced it and
/// skips re-execution while that record satisfies the requested version.
#[derive(Parser, Debug)]
#[command(name = "versionize")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Version-gated memoization for data pipelines", long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short = 'c', long, env = "VERSIONIZE_CONFIG", global = true)]
    pub config: Option<String>,

    /// Root directory of the version store (overrides config)
    #[arg(long, env = "VERSIONIZE_ROOT_DIR", global = true)]
    pub root_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a command through the skip gate
    Run(RunArgs),

    /// Show recorded versions of a task directory
    Status(StatusArgs),

    /// Run a pipeline manifest
    Pipeline(PipelineArgs),

    /// Print the running flow version over a sequence of versions
    Flow(FlowArgs),

    /// Configuration management utilities
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Version of the task's code
    #[arg(long)]
    pub code_version: String,

    /// Task sub-directory inside each version directory
    #[arg(long)]
    pub dir: String,

    /// Output file name recorded in metadata
    #[arg(long)]
    pub tag: String,

    /// Version requested by the pipeline flow (defaults to the code version)
    #[arg(long)]
    pub flow: Option<String>,

    /// Re-run even when the output is up to date
    #[arg(long)]
    pub no_skip: bool,

    /// Kill the command after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute; the output path is exported as VERSIONIZE_OUTPUT
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Task sub-directory
    #[arg(long)]
    pub dir: String,

    /// Inspect this version's directory instead of the current one
    #[arg(long)]
    pub for_version: Option<String>,
}

#[derive(Parser, Debug)]
pub struct PipelineArgs {
    /// Pipeline manifest (TOML)
    pub manifest: String,

    /// Re-run every task even when up to date
    #[arg(long)]
    pub no_skip: bool,

    /// Show what would run without executing or recording anything
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
pub struct FlowArgs {
    /// Seed version of the flow
    pub seed: String,

    /// Versions folded into the flow, in order
    pub versions: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Config file path
        path: String,
    },

    /// Print an example configuration
    Example,

    /// Show the effective configuration
    Show,
}
