//! Usage-limited, expiring capability tokens for shared secrets.
//!
//! A [`DelegationToken`] lets one recipient identity retrieve one stored
//! secret, a bounded number of times, until a deadline. Tokens are signed
//! DAG-CBOR envelopes carried as unpadded base64url text, so they can be
//! pasted into a chat or embedded in a link.
//!
//! # Overview
//!
//! 1. The sharing party builds a [`DelegationIssuer`] around its signing
//!    identity and calls [`DelegationIssuer::issue`].
//! 2. The token travels out of band.
//! 3. The redeeming side hands the token text to a [`Validator`], which
//!    decodes it, checks the signature, resource, audience and expiry, and
//!    finally asks its [`UsageTracker`] to consume one use.
//! 4. The result is a [`Verdict`]: either the uses left, or the [`Reason`]
//!    the token was refused.
//!
//! # Example
//!
//! ```ignore
//! use secret_share_credentials::Ed25519Signer;
//! use secret_share_ucan::{
//!     DelegationIssuer, Expectation, IssueRequest, MemoryUsageTracker, Resource, Validator,
//! };
//!
//! async fn share_and_redeem() -> Result<(), Box<dyn std::error::Error>> {
//!     let issuer = DelegationIssuer::new(Ed25519Signer::generate()?);
//!     let token = issuer.issue(IssueRequest {
//!         recipient: "did:key:zAbc".into(),
//!         resource: "bag123".into(),
//!         expires_in_seconds: 600,
//!         usage_limit: 1,
//!     })?;
//!
//!     let validator = Validator::new(MemoryUsageTracker::new());
//!     let verdict = validator
//!         .validate(&token.to_text(), &Expectation::new(Resource::new("bag123")?))
//!         .await;
//!     println!("{verdict}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod ability;
pub mod cid;
pub mod constraints;
pub mod envelope;
pub mod error;
pub mod issuer;
pub mod nonce;
pub mod resource;
pub mod statement;
pub mod summary;
pub mod time;
pub mod token;
pub mod tracker;
pub mod validator;
pub mod verdict;

pub use ability::Ability;
pub use cid::TokenId;
pub use constraints::Constraints;
pub use error::{EncodeError, IssueError, MalformedToken, TrackerError};
pub use issuer::{DelegationIssuer, IssueRequest};
pub use nonce::Nonce;
pub use resource::{EmptyResource, Resource};
pub use statement::{CapabilityStatement, StatementBuilder};
pub use summary::TokenSummary;
pub use time::Timestamp;
pub use token::{DecodedToken, DelegationToken};
pub use tracker::{MemoryUsageTracker, Redemption, UsageTracker};
pub use validator::{Expectation, Validator};
pub use verdict::{Reason, Verdict};
