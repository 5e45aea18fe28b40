//! Ed25519 signer implementation.

use super::{Ed25519Signature, error::Ed25519KeyError, verifier::Ed25519Verifier};
use crate::{Did, Principal};
use serde::Serialize;
use std::fmt;

/// An `Ed25519` `did:key` signer: the issuing agent's identity.
///
/// The private key never leaves this type except through [`Self::export`],
/// which exists so that the CLI can persist its own identity between runs.
#[derive(Clone)]
pub struct Ed25519Signer {
    verifier: Ed25519Verifier,
    key: ed25519_dalek::SigningKey,
}

impl Ed25519Signer {
    /// Generate a fresh identity from the operating system CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`Ed25519KeyError::Rng`] if no randomness is available. There
    /// is no fallback; callers should treat this as fatal.
    pub fn generate() -> Result<Self, Ed25519KeyError> {
        let mut seed = [0u8; 32];
        getrandom::getrandom(&mut seed).map_err(Ed25519KeyError::Rng)?;
        Ok(ed25519_dalek::SigningKey::from_bytes(&seed).into())
    }

    /// Import an identity from its 32-byte seed.
    ///
    /// # Errors
    ///
    /// Returns [`Ed25519KeyError::InvalidSeedLength`] for any other length.
    pub fn import(seed: &[u8]) -> Result<Self, Ed25519KeyError> {
        let seed: [u8; 32] = seed
            .try_into()
            .map_err(|_| Ed25519KeyError::InvalidSeedLength(seed.len()))?;
        Ok(ed25519_dalek::SigningKey::from_bytes(&seed).into())
    }

    /// Export the 32-byte seed.
    #[must_use]
    pub fn export(&self) -> [u8; 32] {
        self.key.to_bytes()
    }

    /// The public half of this identity.
    #[must_use]
    pub const fn verifier(&self) -> &Ed25519Verifier {
        &self.verifier
    }
}

impl From<ed25519_dalek::SigningKey> for Ed25519Signer {
    fn from(key: ed25519_dalek::SigningKey) -> Self {
        let verifier = Ed25519Verifier::from(key.verifying_key());
        Self { verifier, key }
    }
}

impl fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("did", &self.verifier.to_string())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.verifier)
    }
}

impl signature::Signer<Ed25519Signature> for Ed25519Signer {
    fn try_sign(&self, msg: &[u8]) -> Result<Ed25519Signature, signature::Error> {
        let signature: ed25519_dalek::Signature = signature::Signer::try_sign(&self.key, msg)?;
        Ok(signature.into())
    }
}

impl Principal for Ed25519Signer {
    fn did(&self) -> Did {
        self.verifier.did()
    }
}

impl Serialize for Ed25519Signer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.verifier.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ed25519::{sign, verify};
    use pretty_assertions::assert_eq;
    use signature::{Signer, Verifier};
    use testresult::TestResult;

    fn test_signer(seed: u8) -> Ed25519Signer {
        Ed25519Signer::import(&[seed; 32]).unwrap()
    }

    #[test]
    fn ed25519_did_round_trip() -> TestResult {
        let signer = test_signer(0);
        let parsed: Ed25519Verifier = signer.did().as_str().parse()?;
        assert_eq!(&parsed, signer.verifier());
        Ok(())
    }

    #[test]
    fn it_produces_signatures_its_did_verifies() -> TestResult {
        let signer = test_signer(42);
        let msg = b"test message for signing";

        let signature = sign(&signer, msg)?;

        signer.verifier().verify(msg, &signature)?;
        assert!(verify(&signer.did(), msg, &signature));
        Ok(())
    }

    #[test]
    fn wrong_message_fails_verification() -> TestResult {
        let signer = test_signer(99);
        let signature = signer.try_sign(b"original message")?;

        assert!(
            signer
                .verifier()
                .verify(b"tampered message", &signature)
                .is_err()
        );
        assert!(!verify(&signer.did(), b"tampered message", &signature));
        Ok(())
    }

    #[test]
    fn cross_verification_fails() -> TestResult {
        let alice = test_signer(1);
        let bob = test_signer(2);
        let msg = b"same message";

        let from_alice = alice.try_sign(msg)?;
        let from_bob = bob.try_sign(msg)?;

        assert_ne!(from_alice, from_bob);
        assert!(alice.verifier().verify(msg, &from_bob).is_err());
        assert!(bob.verifier().verify(msg, &from_alice).is_err());
        Ok(())
    }

    #[test]
    fn export_import_roundtrip_preserves_did() -> TestResult {
        let signer = test_signer(77);
        let restored = Ed25519Signer::import(&signer.export())?;

        assert_eq!(restored.did(), signer.did());
        assert_eq!(signer.export(), [77u8; 32]);
        Ok(())
    }

    #[test]
    fn import_rejects_wrong_seed_length() {
        assert!(matches!(
            Ed25519Signer::import(&[0u8; 31]),
            Err(Ed25519KeyError::InvalidSeedLength(31))
        ));
    }

    #[test]
    fn generated_identities_are_distinct() -> TestResult {
        let first = Ed25519Signer::generate()?;
        let second = Ed25519Signer::generate()?;

        assert_ne!(first.did(), second.did());
        assert!(first.did().as_str().starts_with("did:key:z"));
        Ok(())
    }

    #[test]
    fn debug_output_hides_key_material() {
        let signer = test_signer(5);
        let debug = format!("{signer:?}");
        assert!(debug.contains("did:key:z"));
        assert!(!debug.contains("SigningKey"), "{debug}");
    }
}
