//! Ed25519 `did:key` principal and verifier.

use super::{ED25519_PUB_MULTICODEC, Ed25519Signature, error::Ed25519DidFromStrError};
use crate::{Did, Principal};
use base58::{FromBase58, ToBase58};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

const DID_KEY_PREFIX: &str = "did:key:";

/// The public half of an Ed25519 identity, printed as a `did:key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Verifier(ed25519_dalek::VerifyingKey);

impl Ed25519Verifier {
    /// Raw public key bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }
}

impl From<ed25519_dalek::VerifyingKey> for Ed25519Verifier {
    fn from(key: ed25519_dalek::VerifyingKey) -> Self {
        Ed25519Verifier(key)
    }
}

impl fmt::Display for Ed25519Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw_bytes = Vec::with_capacity(34);
        raw_bytes.extend_from_slice(&ED25519_PUB_MULTICODEC);
        raw_bytes.extend_from_slice(self.0.as_bytes());
        write!(f, "{DID_KEY_PREFIX}z{}", raw_bytes.to_base58())
    }
}

impl FromStr for Ed25519Verifier {
    type Err = Ed25519DidFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let encoded = s
            .strip_prefix(DID_KEY_PREFIX)
            .ok_or(Ed25519DidFromStrError::InvalidDidHeader)?;
        if encoded.contains(':') {
            return Err(Ed25519DidFromStrError::InvalidDidHeader);
        }
        let b58 = encoded
            .strip_prefix('z')
            .ok_or(Ed25519DidFromStrError::MissingBase58Prefix)?;
        let decoded = b58
            .from_base58()
            .map_err(|_| Ed25519DidFromStrError::InvalidBase58)?;

        let (multicodec, key) = decoded
            .split_first_chunk::<2>()
            .ok_or(Ed25519DidFromStrError::InvalidKey)?;
        if *multicodec != ED25519_PUB_MULTICODEC {
            return Err(Ed25519DidFromStrError::InvalidKey);
        }
        let key: [u8; 32] = key
            .try_into()
            .map_err(|_| Ed25519DidFromStrError::InvalidKey)?;
        let key = ed25519_dalek::VerifyingKey::from_bytes(&key)
            .map_err(|_| Ed25519DidFromStrError::InvalidKey)?;

        Ok(Ed25519Verifier(key))
    }
}

impl signature::Verifier<Ed25519Signature> for Ed25519Verifier {
    fn verify(&self, msg: &[u8], signature: &Ed25519Signature) -> Result<(), signature::Error> {
        let signature = ed25519_dalek::Signature::from(*signature);
        self.0.verify_strict(msg, &signature)
    }
}

impl Principal for Ed25519Verifier {
    fn did(&self) -> Did {
        Did::from_trusted(self.to_string())
    }
}

impl Serialize for Ed25519Verifier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ed25519Verifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
