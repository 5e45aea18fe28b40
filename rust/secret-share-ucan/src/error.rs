//! Error types for issuing, encoding, decoding and tracking tokens.

use crate::{resource::EmptyResource, statement::StatementBuilderError};
use secret_share_credentials::{Did, DidParseError};
use thiserror::Error;

/// Errors from [`crate::DelegationToken::encode`].
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The statement names a different issuer than the identity signing it.
    #[error("statement issuer {statement} does not match signing identity {signer}")]
    IssuerMismatch {
        /// Issuer named in the statement.
        statement: Did,
        /// DID of the signing identity.
        signer: Did,
    },

    /// The signer refused or failed to sign.
    #[error("signing failed: {0}")]
    Signing(signature::Error),

    /// DAG-CBOR encoding failed.
    #[error("encoding error: {0}")]
    Cbor(String),
}

/// The bytes are not a well-formed delegation token.
///
/// A bad signature is *not* malformed: decoding reports it through
/// [`crate::DecodedToken::signature_valid`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedToken {
    /// The text form is not base64url.
    #[error("token text is not base64url: {0}")]
    Text(String),

    /// The bytes do not parse as a token envelope.
    #[error("token structure is invalid: {0}")]
    Structure(String),

    /// The bytes parse, but are not the canonical encoding of what they
    /// contain.
    #[error("token is not canonically encoded")]
    NonCanonical,
}

/// Errors from [`crate::DelegationIssuer::issue`]. All of them are
/// precondition failures; nothing is signed when one is returned.
#[derive(Debug, Error)]
pub enum IssueError {
    /// The recipient is not a DID.
    #[error("invalid recipient: {0}")]
    InvalidRecipient(#[from] DidParseError),

    /// The lifetime is zero or overflows the clock.
    #[error("expiry must be a positive number of seconds, got {0}")]
    InvalidExpiry(u64),

    /// The usage limit is zero.
    #[error("usage limit must be at least 1")]
    InvalidUsageLimit,

    /// The resource reference is empty.
    #[error(transparent)]
    InvalidResource(#[from] EmptyResource),

    /// The statement could not be assembled.
    #[error(transparent)]
    Statement(#[from] StatementBuilderError),

    /// The statement could not be encoded or signed.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// The usage tracker could not answer.
///
/// Validators treat every variant the same way: the redemption is refused
/// with an `unavailable` verdict.
#[derive(Debug, Clone, Error)]
pub enum TrackerError {
    /// The backing store could not be reached or failed mid-operation.
    #[error("usage tracker unavailable: {0}")]
    Unavailable(String),

    /// A stored usage record could not be read back.
    #[error("corrupt usage record for {id}: {reason}")]
    Corrupt {
        /// Token id of the damaged record.
        id: String,
        /// What was wrong with it.
        reason: String,
    },
}
