//! Caveats that restrict how a delegation may be used.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// The caveats attached to a delegation (`nb` on the wire).
///
/// This is a closed record: unknown keys, a missing key, or a usage limit of
/// zero make the whole token malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawConstraints")]
pub struct Constraints {
    /// How many times the token may be redeemed.
    #[serde(rename = "usage")]
    usage_limit: NonZeroU32,

    /// Last second at which the token is still valid.
    #[serde(rename = "exp")]
    expires_at: Timestamp,
}

impl Constraints {
    /// Build a constraint record.
    #[must_use]
    pub const fn new(usage_limit: NonZeroU32, expires_at: Timestamp) -> Self {
        Constraints {
            usage_limit,
            expires_at,
        }
    }

    /// Getter for the usage limit.
    #[must_use]
    pub const fn usage_limit(&self) -> NonZeroU32 {
        self.usage_limit
    }

    /// Getter for the expiry.
    #[must_use]
    pub const fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// Whether the token is past its expiry at `now`. The expiry second
    /// itself is still valid.
    #[must_use]
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConstraints {
    usage: u32,
    exp: u64,
}

impl TryFrom<RawConstraints> for Constraints {
    type Error = &'static str;

    fn try_from(raw: RawConstraints) -> Result<Self, Self::Error> {
        let usage_limit = NonZeroU32::new(raw.usage).ok_or("usage limit must be at least 1")?;
        Ok(Constraints::new(usage_limit, Timestamp::from_unix(raw.exp)))
    }
}
