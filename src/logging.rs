//! Structured logging utilities for versionize
//!
//! All logs use structured fields for easy parsing and analysis.
//!
//! # Log Format Conventions
//!
//! - `service`: The component emitting the event ("versionize.store", ...)
//! - `operation`: The operation being performed ("prepare", "commit", ...)
//! - `status`: The result status ("skip", "execute", "success")
//! - `tag`: Output tag the event is about
//! - `version`: Version involved (recorded or requested)
//!
//! # Examples
//!
//! ```rust
//! use tracing::info;
//! use versionize::logging::{operations, services, status};
//!
//! let tag = "filesave.txt";
//! info!(
//!     service = services::STORE,
//!     operation = operations::PREPARE,
//!     status = status::SKIP,
//!     tag,
//!     version = "1.0.1",
//!     "output is up to date"
//! );
//! ```

use std::{fmt as std_fmt, io};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{
    fmt::{self, format::Writer},
    prelude::*,
    EnvFilter,
};

/// Formatter that tags every line with "versionize" instead of the module path
struct VersionizeFormatter {
    with_ansi: bool,
}

impl<S, N> FormatEvent<S, N> for VersionizeFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std_fmt::Result {
        let meta = event.metadata();

        write!(
            writer,
            "{} ",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f")
        )?;

        if self.with_ansi {
            let level_style = match *meta.level() {
                tracing::Level::ERROR => "\x1b[31m", // Red
                tracing::Level::WARN => "\x1b[33m",  // Yellow
                tracing::Level::INFO => "\x1b[32m",  // Green
                tracing::Level::DEBUG => "\x1b[34m", // Blue
                tracing::Level::TRACE => "\x1b[35m", // Magenta
            };
            write!(
                writer,
                "{}{:5}(versionize)\x1b[0m: ",
                level_style,
                meta.level()
            )?;
        } else {
            write!(writer, "{:5}(versionize): ", meta.level())?;
        }

        // Span context: which store the event belongs to
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                let ext = span.extensions();
                if let Some(fields) = ext.get::<fmt::FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{}{{{}}}: ", span.name(), fields)?;
                    }
                }
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format (default for development)
    Pretty,
    /// Compact format (for CI)
    Compact,
    /// JSON format (for log aggregation systems)
    Json,
}

impl LogFormat {
    /// Parse a format name ("pretty", "compact", "json")
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }

    /// Resolve from VERSIONIZE_LOG_FORMAT, then the configured format
    pub fn from_env_or(configured: Option<&str>) -> Self {
        std::env::var("VERSIONIZE_LOG_FORMAT")
            .ok()
            .and_then(|value| Self::parse(&value))
            .or_else(|| configured.and_then(Self::parse))
            .unwrap_or_else(|| {
                // Default: pretty for dev, compact for CI
                if std::env::var("CI").is_ok() {
                    Self::Compact
                } else {
                    Self::Pretty
                }
            })
    }
}

/// Initialize the global tracing subscriber
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "debug", "info", "warn")
/// - `VERSIONIZE_LOG_FORMAT`: Set format ("pretty", "compact", "json")
/// - `CI`: If set, defaults to compact format
///
/// `default_level` and `configured_format` come from the config file and
/// only apply when the matching environment variable is unset.
pub fn init(default_level: &str, configured_format: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format = LogFormat::from_env_or(configured_format);

    // A second init (e.g. in tests) keeps the first subscriber
    let _ = match format {
        LogFormat::Pretty | LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_ansi(format == LogFormat::Pretty)
                    .event_format(VersionizeFormatter {
                        with_ansi: format == LogFormat::Pretty,
                    })
                    .with_writer(io::stderr),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_ansi(false)
                    .with_writer(io::stderr)
                    .json(),
            )
            .try_init(),
    };
}

/// Service names for consistent logging
pub mod services {
    pub const STORE: &str = "versionize.store";
    pub const PIPELINE: &str = "versionize.pipeline";
    pub const EXECUTOR: &str = "versionize.executor";
}

/// Operation names for consistent logging
pub mod operations {
    pub const PREPARE: &str = "prepare";
    pub const COMMIT: &str = "commit";
    pub const RUN_TASK: &str = "run_task";
    pub const EXECUTE: &str = "execute";
}

/// Status values for consistent logging
pub mod status {
    pub const SUCCESS: &str = "success";
    pub const SKIP: &str = "skip";
    pub const EXECUTE: &str = "execute";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_format() {
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("Compact"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("xml"), None);
    }
}
