//! Seconds-since-epoch timestamps.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in time, in whole seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// A timestamp `seconds` after the Unix epoch.
    #[must_use]
    pub const fn from_unix(seconds: u64) -> Self {
        Timestamp(seconds)
    }

    /// Seconds since the Unix epoch.
    #[must_use]
    pub const fn to_unix(self) -> u64 {
        self.0
    }

    /// `self + seconds`, or `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, seconds: u64) -> Option<Self> {
        match self.0.checked_add(seconds) {
            Some(sum) => Some(Timestamp(sum)),
            None => None,
        }
    }

    /// Seconds left until `self`, zero once it has passed.
    #[must_use]
    pub const fn seconds_after(self, now: Timestamp) -> u64 {
        self.0.saturating_sub(now.0)
    }
}

impl From<u64> for Timestamp {
    fn from(seconds: u64) -> Self {
        Timestamp(seconds)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
