use crate::{blob::BlobStoreError, config::ConfigError, identity::IdentityError, record::RecordError};
use ipld_core::cid::Cid;
use secret_share_ucan::{IssueError, MalformedToken, TrackerError};
use thiserror::Error;

/// Errors from [`crate::Vault`] operations.
///
/// A token that is merely not good any more (expired, exhausted, for some
/// other secret) is not an error; it is reported as a refused redemption.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Blob(#[from] BlobStoreError),

    #[error(transparent)]
    Issue(#[from] IssueError),

    #[error(transparent)]
    Records(#[from] RecordError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Malformed(#[from] MalformedToken),

    /// A token was redeemed but the secret it points to is gone.
    #[error("secret {0} is missing from the blob store")]
    MissingBlob(Cid),

    /// The gateway URL cannot carry a share link path.
    #[error("unable to build share link from {0}")]
    ShareLink(String),
}
