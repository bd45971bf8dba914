//! Minor-granularity OpenShift versions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// `major.minor` version attached to operator policies.
///
/// Patch levels and pre-release suffixes are dropped on parse, so `4.15.2` and
/// `4.15.0-rc.1` both compare equal to `4.15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PolicyVersion {
    pub major: u32,
    pub minor: u32,
}

impl PolicyVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl FromStr for PolicyVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().trim_start_matches("openshift-v").trim_start_matches('v');
        let core = raw.split(['-', '+']).next().unwrap_or_default();
        let mut parts = core.split('.');
        let major = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| format!("'{}' is not a version", s))?
            .parse::<u32>()
            .map_err(|_| format!("'{}' has a non-numeric major version", s))?;
        let minor = parts
            .next()
            .ok_or_else(|| format!("'{}' has no minor version", s))?
            .parse::<u32>()
            .map_err(|_| format!("'{}' has a non-numeric minor version", s))?;
        Ok(Self { major, minor })
    }
}

impl fmt::Display for PolicyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Serialize for PolicyVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PolicyVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
