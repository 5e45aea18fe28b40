use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of an Ed25519 signature in bytes.
pub const ED25519_SIGNATURE_LENGTH: usize = 64;

/// A detached Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519Signature([u8; ED25519_SIGNATURE_LENGTH]);

impl Ed25519Signature {
    /// Raw signature bytes (`R || s`).
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; ED25519_SIGNATURE_LENGTH] {
        self.0
    }

    /// Borrow the raw signature bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ED25519_SIGNATURE_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Signature(")?;
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "…)")
    }
}

impl From<[u8; ED25519_SIGNATURE_LENGTH]> for Ed25519Signature {
    fn from(bytes: [u8; ED25519_SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl From<Ed25519Signature> for [u8; ED25519_SIGNATURE_LENGTH] {
    fn from(signature: Ed25519Signature) -> Self {
        signature.0
    }
}

impl From<ed25519_dalek::Signature> for Ed25519Signature {
    fn from(signature: ed25519_dalek::Signature) -> Self {
        Self(signature.to_bytes())
    }
}

impl From<Ed25519Signature> for ed25519_dalek::Signature {
    fn from(signature: Ed25519Signature) -> Self {
        ed25519_dalek::Signature::from_bytes(&signature.0)
    }
}

impl TryFrom<&[u8]> for Ed25519Signature {
    type Error = signature::Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array = <[u8; ED25519_SIGNATURE_LENGTH]>::try_from(bytes)
            .map_err(|_| signature::Error::new())?;
        Ok(Self(array))
    }
}

impl signature::SignatureEncoding for Ed25519Signature {
    type Repr = [u8; ED25519_SIGNATURE_LENGTH];
}

impl Serialize for Ed25519Signature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SignatureVisitor;

        impl serde::de::Visitor<'_> for SignatureVisitor {
            type Value = Ed25519Signature;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{ED25519_SIGNATURE_LENGTH} signature bytes")
            }

            fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                Ed25519Signature::try_from(v)
                    .map_err(|_| E::invalid_length(v.len(), &self))
            }
        }

        deserializer.deserialize_bytes(SignatureVisitor)
    }
}
