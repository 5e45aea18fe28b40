use crate::{Did, Ed25519Signature};

/// Anything with a DID.
pub trait Principal {
    /// The identifier other parties use to refer to this principal.
    fn did(&self) -> Did;
}

/// A principal that can also sign on its own behalf.
///
/// Delegation tokens are signed by an `Authority` whose [`Principal::did`]
/// becomes the token's issuer.
pub trait Authority: Principal + signature::Signer<Ed25519Signature> {}

impl<T> Authority for T where T: Principal + signature::Signer<Ed25519Signature> {}
