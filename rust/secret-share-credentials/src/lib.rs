//! Identities for the secret-share delegation lifecycle.
//!
//! An identity is an Ed25519 key pair whose public half is published as a
//! `did:key`. The issuing agent holds an [`Ed25519Signer`]; anyone holding a
//! token can recover the matching [`Ed25519Verifier`] from the issuer DID
//! carried inside it, through a [`Resolver`].

pub mod did;
pub use did::{Did, DidParseError};

mod principal;
pub use principal::{Authority, Principal};

pub mod resolver;
pub use resolver::Resolver;

pub mod ed25519;
pub use ed25519::*;
