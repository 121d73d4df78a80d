pub mod config;
pub mod flow;
pub mod pipeline;
pub mod run;
pub mod status;
