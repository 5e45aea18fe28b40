//! Mapping issuer DIDs to signature verifiers.

use crate::{Did, Ed25519Signature};

/// Resolves a DID to something that can check its signatures.
///
/// Resolution is synchronous: token decoding never suspends, so only
/// self-certifying methods such as `did:key` fit here.
pub trait Resolver {
    /// Verifier produced for a resolved DID.
    type Verifier: signature::Verifier<Ed25519Signature>;

    /// Why a DID could not be resolved.
    type Error: std::error::Error;

    /// Resolve `did` to a verifier.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` when the DID method is unsupported or the
    /// identifier does not encode a usable key.
    fn resolve(&self, did: &Did) -> Result<Self::Verifier, Self::Error>;
}

impl<R: Resolver + ?Sized> Resolver for &R {
    type Verifier = R::Verifier;
    type Error = R::Error;

    fn resolve(&self, did: &Did) -> Result<Self::Verifier, Self::Error> {
        (**self).resolve(did)
    }
}
