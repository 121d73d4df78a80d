//! Semantic version values used by stores and flows.
//!
//! A [`Version`] is `major.minor.patch`, totally ordered by its components.
//! Parsing accepts one to three numeric components (`"1"`, `"1.2"`,
//! `"1.2.3"`); missing components are zero. Anything else is rejected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VersionizeError;

/// Version assumed for a tag that has never been recorded
pub const INITIAL_VERSION: Version = Version::new(0, 0, 0);

/// Prefix of version directory names (`v1`, `v2`, ...)
pub const DIRNAME_PREFIX: &str = "v";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string
    pub fn parse(input: &str) -> Result<Self, VersionizeError> {
        let invalid = |reason: &str| VersionizeError::InvalidVersion {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty version string"));
        }

        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.len() > 3 {
            return Err(invalid("expected at most three components (major.minor.patch)"));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("components must be non-negative integers"));
            }
            *slot = part
                .parse()
                .map_err(|_| invalid("component does not fit in 64 bits"))?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }

    /// Name of the directory holding every version sharing this major
    pub fn dirname(&self) -> String {
        format!("{}{}", DIRNAME_PREFIX, self.major)
    }
}

impl Default for Version {
    fn default() -> Self {
        INITIAL_VERSION
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Version {
    type Error = VersionizeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_version() {
        let version = Version::parse("1.0.2").unwrap();
        assert_eq!(version, Version::new(1, 0, 2));
        assert_eq!(version.to_string(), "1.0.2");
    }

    #[test]
    fn test_parse_short_forms_pad_with_zero() {
        assert_eq!(Version::parse("2").unwrap(), Version::new(2, 0, 0));
        assert_eq!(Version::parse("1.4").unwrap(), Version::new(1, 4, 0));
        assert_eq!(Version::parse("1.0").unwrap(), Version::parse("1.0.0").unwrap());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["", "  ", "a.b.c", "1..2", "1.2.3.4", "-1.0.0", "1.0.0-rc1", "v1.0.0"] {
            let err = Version::parse(input).unwrap_err();
            assert!(
                matches!(err, VersionizeError::InvalidVersion { .. }),
                "expected InvalidVersion for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_ordering_is_numeric_not_lexical() {
        let v9 = Version::parse("1.9.0").unwrap();
        let v10 = Version::parse("1.10.0").unwrap();
        assert!(v10 > v9);
        assert!(Version::parse("2.0.0").unwrap() > Version::parse("1.99.99").unwrap());
        assert_eq!(INITIAL_VERSION, Version::default());
    }

    #[test]
    fn test_dirname_uses_major_only() {
        assert_eq!(Version::parse("1.0.1").unwrap().dirname(), "v1");
        assert_eq!(Version::parse("1.3.0").unwrap().dirname(), "v1");
        assert_eq!(Version::parse("12.0.0").unwrap().dirname(), "v12");
    }

    #[test]
    fn test_serde_as_string() {
        let version = Version::new(3, 1, 4);
        let json = serde_json::to_string(&version).unwrap();
        assert_eq!(json, "\"3.1.4\"");

        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, version);

        assert!(serde_json::from_str::<Version>("\"not.a.version\"").is_err());
    }
}
