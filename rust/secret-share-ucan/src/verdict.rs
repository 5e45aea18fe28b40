//! Outcomes of validating a token.

use serde::{Deserialize, Serialize, ser::SerializeStruct};
use std::fmt;

/// Why a token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reason {
    /// The bytes are not a token.
    Malformed,
    /// The signature does not verify against the issuer.
    BadSignature,
    /// The token is for a different resource.
    ResourceMismatch,
    /// The token is for a different recipient.
    AudienceMismatch,
    /// The token's expiry has passed.
    Expired,
    /// Every use has been redeemed.
    Exhausted,
    /// The usage tracker could not be consulted.
    Unavailable,
}

impl Reason {
    /// The wire name, e.g. `"bad-signature"`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Reason::Malformed => "malformed",
            Reason::BadSignature => "bad-signature",
            Reason::ResourceMismatch => "resource-mismatch",
            Reason::AudienceMismatch => "audience-mismatch",
            Reason::Expired => "expired",
            Reason::Exhausted => "exhausted",
            Reason::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating a token.
///
/// Serializes as `{"valid": true, "remainingUses": n}` or
/// `{"valid": false, "reason": "..."}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// One use was consumed; `remaining_uses` are left.
    Valid {
        /// Uses left after this redemption.
        remaining_uses: u32,
    },
    /// The token was refused and no use was consumed.
    Invalid(Reason),
}

impl Verdict {
    /// Whether the token was accepted.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid { .. })
    }

    /// The refusal reason, if any.
    #[must_use]
    pub const fn reason(&self) -> Option<Reason> {
        match self {
            Verdict::Valid { .. } => None,
            Verdict::Invalid(reason) => Some(*reason),
        }
    }
}

impl From<Reason> for Verdict {
    fn from(reason: Reason) -> Self {
        Verdict::Invalid(reason)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Valid { remaining_uses } => {
                write!(f, "valid ({remaining_uses} uses remaining)")
            }
            Verdict::Invalid(reason) => write!(f, "invalid: {reason}"),
        }
    }
}

impl Serialize for Verdict {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Verdict", 2)?;
        match self {
            Verdict::Valid { remaining_uses } => {
                state.serialize_field("valid", &true)?;
                state.serialize_field("remainingUses", remaining_uses)?;
            }
            Verdict::Invalid(reason) => {
                state.serialize_field("valid", &false)?;
                state.serialize_field("reason", reason)?;
            }
        }
        state.end()
    }
}
