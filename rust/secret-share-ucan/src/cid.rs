//! Content identifiers for tokens.

use ipld_core::cid::{Cid, multihash::Multihash};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};

/// Multicodec code for DAG-CBOR.
pub const DAG_CBOR: u64 = 0x71;

/// Multicodec code for raw bytes.
pub const RAW: u64 = 0x55;

/// Multihash code for SHA2-256.
pub const SHA2_256: u64 = 0x12;

/// CIDv1 of `bytes` under `codec`, hashed with SHA2-256.
#[must_use]
pub fn cid_of(codec: u64, bytes: &[u8]) -> Cid {
    let digest = Sha256::digest(bytes);
    // A 32-byte digest always fits the 64-byte multihash.
    let multihash = Multihash::<64>::wrap(SHA2_256, &digest).unwrap_or_default();
    Cid::new_v1(codec, multihash)
}

/// The identifier of a delegation token: the CID of its canonical DAG-CBOR
/// bytes. Usage records are keyed by it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(Cid);

impl TokenId {
    /// Identify the token encoded as `bytes`.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        TokenId(cid_of(DAG_CBOR, bytes))
    }

    /// Getter for the underlying CID.
    #[must_use]
    pub const fn cid(&self) -> &Cid {
        &self.0
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({})", self.0)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TokenId {
    type Err = ipld_core::cid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TokenId(Cid::from_str(s)?))
    }
}

impl Serialize for TokenId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TokenId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}
