//! Strongly-typed migration identifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millisecond-epoch identifier shared by the up and down halves of a migration.
///
/// Ordering is numeric, so `999` sorts before `1000` regardless of how the
/// file system lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MigrationId(u64);

impl MigrationId {
    /// Wrap a raw millisecond value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Parse a decimal identifier, returning `None` for empty, signed,
    /// non-digit or overflowing input.
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        text.parse::<u64>().ok().map(Self)
    }

    /// Identifier for a migration created at `at`.
    ///
    /// Instants before the epoch clamp to zero.
    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        Self(u64::try_from(at.timestamp_millis()).unwrap_or(0))
    }

    /// Return the raw millisecond value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MigrationId {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or("MigrationId must be a non-empty decimal integer")
    }
}

impl From<u64> for MigrationId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
