/// CLI utilities for consistent output formatting
use std::io::IsTerminal;

/// Get a colored prefix
///
/// Returns bright cyan if stderr is a TTY, plain text otherwise.
pub fn versionize_prefix() -> &'static str {
    if std::io::stderr().is_terminal() {
        "\x1b[96m[versionize]\x1b[0m"
    } else {
        "[versionize]"
    }
}
