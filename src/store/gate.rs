/// Skip gate around a task body
///
/// A [`Gate`] binds one output tag to a store and wraps the body that
/// produces it: the body only runs when the recorded version of the tag is
/// older than the requested one (or when skipping is disabled), and the new
/// version is only recorded after the body returned successfully.
use std::path::{Path, PathBuf};

use super::VersionStore;
use crate::error::VersionizeError;
use crate::version::Version;

/// Result of [`VersionStore::prepare`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The recorded version already satisfies the requested one
    Skip {
        recorded: Version,
        requested: Version,
    },
    /// The body must write `output`, then `version` gets committed
    Execute {
        output: PathBuf,
        version: Version,
        recorded: Version,
    },
}

impl Decision {
    /// Version the call resolved to, whether it runs or not
    pub fn version(&self) -> Version {
        match self {
            Decision::Skip { requested, .. } => *requested,
            Decision::Execute { version, .. } => *version,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Decision::Skip { .. })
    }
}

/// Result of a gated call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Skipped {
        version: Version,
        recorded: Version,
    },
    Executed {
        version: Version,
        output: PathBuf,
        value: T,
    },
}

impl<T> Outcome<T> {
    /// Resolved version, fed back into a pipeline's flow
    pub fn version(&self) -> Version {
        match self {
            Outcome::Skipped { version, .. } | Outcome::Executed { version, .. } => *version,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped { .. })
    }

    pub fn value(self) -> Option<T> {
        match self {
            Outcome::Skipped { .. } => None,
            Outcome::Executed { value, .. } => Some(value),
        }
    }
}

/// Builder for one gated call, see [`VersionStore::gate`]
pub struct Gate<'a> {
    store: &'a mut VersionStore,
    tag: String,
    skip: bool,
    flow: Option<Version>,
}

impl<'a> Gate<'a> {
    pub(super) fn new(store: &'a mut VersionStore, tag: String) -> Self {
        Self {
            store,
            tag,
            skip: true,
            flow: None,
        }
    }

    /// Whether an up-to-date output skips the body (default `true`)
    pub fn skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    /// Version requested by the pipeline flow (default: the code version)
    pub fn flow(mut self, version: Version) -> Self {
        self.flow = Some(version);
        self
    }

    pub fn flow_opt(mut self, version: Option<Version>) -> Self {
        self.flow = version;
        self
    }

    /// Decide without running anything
    pub fn decide(self) -> Result<Decision, VersionizeError> {
        self.store.prepare(&self.tag, self.flow, self.skip)
    }

    /// Run `body` with the output path if the tag is due
    ///
    /// Nothing is recorded when `body` fails.
    pub fn run<T, E, F>(self, body: F) -> Result<Outcome<T>, E>
    where
        F: FnOnce(&Path) -> Result<T, E>,
        E: From<VersionizeError>,
    {
        match self.store.prepare(&self.tag, self.flow, self.skip)? {
            Decision::Skip {
                recorded,
                requested,
            } => Ok(Outcome::Skipped {
                version: requested,
                recorded,
            }),
            Decision::Execute {
                output, version, ..
            } => {
                let value = body(output.as_path())?;
                self.store.commit(&self.tag, &version)?;
                Ok(Outcome::Executed {
                    version,
                    output,
                    value,
                })
            }
        }
    }
}
