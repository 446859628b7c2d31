use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid version '{0}'")]
pub struct VersionError(pub String);

/// Dotted sequence of non-negative integers, e.g. `1.25.91`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version(Vec<u64>);

impl Version {
    /// Version of this build
    pub fn current() -> Result<Self, VersionError> {
        env!("CARGO_PKG_VERSION").parse()
    }

    pub fn components(&self) -> &[u64] {
        &self.0
    }

    /// Component-wise comparison; a missing component is absent, not zero,
    /// so `1.25.0` is newer than `1.25`
    pub fn is_newer_than(&self, other: &Version) -> bool {
        let len = self.0.len().max(other.0.len());
        for i in 0..len {
            match (self.0.get(i), other.0.get(i)) {
                (Some(a), Some(b)) if a != b => return a > b,
                (Some(_), None) => return true,
                (None, Some(_)) => return false,
                _ => {}
            }
        }
        false
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || VersionError(s.to_string());
        if trimmed.is_empty() {
            return Err(invalid());
        }

        trimmed
            .split('.')
            .map(|part| part.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()
            .map(Version)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u64::to_string).collect();
        f.write_str(&parts.join("."))
    }
}
