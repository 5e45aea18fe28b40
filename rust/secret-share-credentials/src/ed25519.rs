//! Ed25519 keys, `did:key` encoding and signatures.

mod eddsa;
mod error;
mod resolver;
mod signer;
mod verifier;

pub use eddsa::Ed25519Signature;
pub use error::{Ed25519DidFromStrError, Ed25519KeyError, Ed25519ResolveError};
pub use resolver::Ed25519KeyResolver;
pub use signer::Ed25519Signer;
pub use verifier::Ed25519Verifier;

/// Multicodec prefix for an Ed25519 public key (`ed25519-pub`, varint `0xed`).
pub(crate) const ED25519_PUB_MULTICODEC: [u8; 2] = [0xed, 0x01];

/// Sign `message` as `identity`.
///
/// # Errors
///
/// Returns [`::signature::Error`] if the signer fails.
pub fn sign<S>(identity: &S, message: &[u8]) -> Result<Ed25519Signature, ::signature::Error>
where
    S: ::signature::Signer<Ed25519Signature> + ?Sized,
{
    identity.try_sign(message)
}

/// Check `signature` over `message` against the public key in `did`.
///
/// Returns `false` for an unparseable DID as well as for a bad signature.
#[must_use]
pub fn verify(did: &crate::Did, message: &[u8], signature: &Ed25519Signature) -> bool {
    use ::signature::Verifier as _;

    did.as_str()
        .parse::<Ed25519Verifier>()
        .map(|verifier| verifier.verify(message, signature).is_ok())
        .unwrap_or(false)
}
