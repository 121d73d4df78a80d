use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the versioning engine
#[derive(Error, Debug)]
pub enum VersionizeError {
    #[error("Invalid version '{input}': {reason}")]
    InvalidVersion { input: String, reason: String },

    #[error("Corrupt metadata file {}: {source}", path.display())]
    CorruptMetadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Corrupt record '{key}' in {}: {source}", path.display())]
    CorruptRecord {
        path: PathBuf,
        key: String,
        #[source]
        source: Box<VersionizeError>,
    },

    #[error("Failed to encode metadata for {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl VersionizeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VersionizeError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = VersionizeError> = std::result::Result<T, E>;
