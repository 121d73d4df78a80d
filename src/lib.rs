// Library interface for versionize
// The binary and the integration tests both go through these modules

pub mod cli;
pub mod cli_utils;
pub mod commands;
pub mod config;
pub mod config_discovery;
pub mod error;
pub mod flow;
pub mod logging;
pub mod pipeline;
pub mod store;
pub mod version;

// Re-export commonly used types
pub use error::{Result, VersionizeError};
pub use flow::FlowAccumulator;
pub use store::{Decision, Gate, MetaFile, Outcome, VersionStore};
pub use version::{Version, INITIAL_VERSION};
