//! Flow version accumulation across a pipeline run
//!
//! A pipeline seeds one [`FlowAccumulator`] with its own version and folds
//! every task's resolved version into it. The running maximum is passed to
//! the next task as its requested version, so a code bump in an upstream
//! task forces every downstream task to produce the new version too.

use tracing::debug;

use crate::error::Result;
use crate::version::Version;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowAccumulator {
    current: Version,
}

impl FlowAccumulator {
    pub fn new(initial: Version) -> Self {
        Self { current: initial }
    }

    /// Seed from a version string
    pub fn parse(initial: &str) -> Result<Self> {
        Ok(Self::new(Version::parse(initial)?))
    }

    pub fn current(&self) -> Version {
        self.current
    }

    /// Fold `version` in and return the new running maximum
    pub fn combine(&mut self, version: Version) -> Version {
        let previous = self.current;
        self.current = previous.max(version);
        debug!(
            previous = %previous,
            input = %version,
            current = %self.current,
            "flow version combined"
        );
        self.current
    }

    /// [`combine`](Self::combine) for a version string
    pub fn combine_str(&mut self, version: &str) -> Result<Version> {
        Ok(self.combine(Version::parse(version)?))
    }
}
