//! Minting delegation tokens.

use crate::{
    constraints::Constraints, error::IssueError, resource::Resource,
    statement::CapabilityStatement, time::Timestamp, token::DelegationToken,
};
use secret_share_common::{Clock, SystemClock};
use secret_share_credentials::{Authority, Did};
use std::num::NonZeroU32;

/// What to grant, and to whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRequest {
    /// DID of the party allowed to redeem the token.
    pub recipient: String,

    /// Reference to the stored secret.
    pub resource: String,

    /// How long the token stays valid, from the moment of issuance.
    pub expires_in_seconds: u64,

    /// How many times the token may be redeemed.
    pub usage_limit: u32,
}

/// Signs capability statements on behalf of one issuing identity.
///
/// Issuance is pure apart from reading the clock: nothing is stored and no
/// usage record is created until the token is first redeemed.
#[derive(Debug, Clone)]
pub struct DelegationIssuer<A, C = SystemClock> {
    authority: A,
    clock: C,
}

impl<A: Authority> DelegationIssuer<A> {
    /// An issuer that signs as `authority` and reads the system clock.
    pub fn new(authority: A) -> Self {
        DelegationIssuer {
            authority,
            clock: SystemClock,
        }
    }
}

impl<A: Authority, C: Clock> DelegationIssuer<A, C> {
    /// Swap the clock used to compute expiry.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> DelegationIssuer<A, C2> {
        DelegationIssuer {
            authority: self.authority,
            clock,
        }
    }

    /// The issuing identity.
    pub const fn authority(&self) -> &A {
        &self.authority
    }

    /// Build, sign and encode one delegation.
    ///
    /// The token expires at `now + expires_in_seconds`.
    ///
    /// # Errors
    ///
    /// Fails fast, without signing anything, when the recipient is not a
    /// DID, the resource is empty, the lifetime is zero or the usage limit
    /// is zero. Also fails if the nonce cannot be drawn or signing fails.
    #[tracing::instrument(skip_all, fields(resource = %request.resource, recipient = %request.recipient))]
    pub fn issue(&self, request: IssueRequest) -> Result<DelegationToken, IssueError> {
        let audience: Did = request.recipient.parse()?;
        let resource = Resource::new(request.resource)?;
        let usage_limit =
            NonZeroU32::new(request.usage_limit).ok_or(IssueError::InvalidUsageLimit)?;
        if request.expires_in_seconds == 0 {
            return Err(IssueError::InvalidExpiry(request.expires_in_seconds));
        }
        let expires_at = Timestamp::from_unix(self.clock.now())
            .checked_add(request.expires_in_seconds)
            .ok_or(IssueError::InvalidExpiry(request.expires_in_seconds))?;

        let statement = CapabilityStatement::builder()
            .issuer(self.authority.did())
            .audience(audience)
            .resource(resource)
            .constraints(Constraints::new(usage_limit, expires_at))
            .try_build()?;

        let token = DelegationToken::encode(statement, &self.authority)?;

        tracing::info!(
            token = %token.id(),
            %expires_at,
            usage_limit = usage_limit.get(),
            "issued delegation"
        );

        Ok(token)
    }
}
