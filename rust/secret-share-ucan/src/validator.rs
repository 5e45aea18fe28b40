//! Checking and redeeming delegation tokens.

use crate::{
    resource::Resource,
    time::Timestamp,
    token::{DecodedToken, DelegationToken},
    tracker::{Redemption, UsageTracker},
    verdict::{Reason, Verdict},
};
use secret_share_common::{Clock, SystemClock};
use secret_share_credentials::{Did, Ed25519KeyResolver, Resolver};
use std::time::Duration;

/// What the redeeming side expects a token to grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    resource: Resource,
    audience: Option<Did>,
}

impl Expectation {
    /// Expect a grant over `resource`, from any audience.
    #[must_use]
    pub const fn new(resource: Resource) -> Self {
        Expectation {
            resource,
            audience: None,
        }
    }

    /// Additionally require the token to be addressed to `audience`.
    #[must_use]
    pub fn audience(mut self, audience: Did) -> Self {
        self.audience = Some(audience);
        self
    }

    /// The expected resource.
    #[must_use]
    pub const fn resource(&self) -> &Resource {
        &self.resource
    }

    /// The expected audience, if any.
    #[must_use]
    pub const fn expected_audience(&self) -> Option<&Did> {
        self.audience.as_ref()
    }
}

/// Decides whether a presented token may be redeemed, and consumes one use
/// when it may.
///
/// Checks run in a fixed order and stop at the first failure: structure,
/// signature, resource, audience, expiry, then remaining uses. Only the last
/// step touches the [`UsageTracker`], so a refused token never consumes a
/// use.
#[derive(Debug, Clone)]
pub struct Validator<T, C = SystemClock, R = Ed25519KeyResolver> {
    tracker: T,
    clock: C,
    resolver: R,
    tracker_timeout: Option<Duration>,
}

impl<T: UsageTracker> Validator<T> {
    /// A validator backed by `tracker`, reading the system clock and
    /// resolving issuers as Ed25519 `did:key`s.
    pub fn new(tracker: T) -> Self {
        Validator {
            tracker,
            clock: SystemClock,
            resolver: Ed25519KeyResolver,
            tracker_timeout: None,
        }
    }
}

impl<T, C, R> Validator<T, C, R>
where
    T: UsageTracker,
    C: Clock,
    R: Resolver,
{
    /// Swap the clock used for expiry checks.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Validator<T, C2, R> {
        Validator {
            tracker: self.tracker,
            clock,
            resolver: self.resolver,
            tracker_timeout: self.tracker_timeout,
        }
    }

    /// Swap the resolver used to verify issuer signatures.
    pub fn with_resolver<R2: Resolver>(self, resolver: R2) -> Validator<T, C, R2> {
        Validator {
            tracker: self.tracker,
            clock: self.clock,
            resolver,
            tracker_timeout: self.tracker_timeout,
        }
    }

    /// Give up on the tracker after `timeout`, answering `unavailable`.
    #[must_use]
    pub fn with_tracker_timeout(mut self, timeout: Duration) -> Self {
        self.tracker_timeout = Some(timeout);
        self
    }

    /// The usage tracker this validator redeems against.
    pub const fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Validate the base64url text form of a token and, if every check
    /// passes, consume one use.
    pub async fn validate(&self, text: &str, expected: &Expectation) -> Verdict {
        match DelegationToken::text_to_bytes(text) {
            Ok(bytes) => self.validate_bytes(&bytes, expected).await,
            Err(error) => {
                tracing::debug!(%error, "rejecting token text");
                Reason::Malformed.into()
            }
        }
    }

    /// Like [`Self::validate`], for raw token bytes.
    pub async fn validate_bytes(&self, bytes: &[u8], expected: &Expectation) -> Verdict {
        let decoded = match DelegationToken::decode_with(bytes, &self.resolver) {
            Ok(decoded) => decoded,
            Err(error) => {
                tracing::debug!(%error, "rejecting malformed token");
                return Reason::Malformed.into();
            }
        };

        if let Err(reason) = self.check(&decoded, expected) {
            tracing::debug!(token = %decoded.id(), %reason, "rejecting token");
            return reason.into();
        }

        self.redeem(&decoded).await
    }

    fn check(&self, decoded: &DecodedToken, expected: &Expectation) -> Result<(), Reason> {
        if !decoded.signature_valid() {
            return Err(Reason::BadSignature);
        }

        let statement = decoded.statement();
        if statement.resource() != expected.resource() {
            return Err(Reason::ResourceMismatch);
        }

        if let Some(audience) = expected.expected_audience() {
            if statement.audience() != audience {
                return Err(Reason::AudienceMismatch);
            }
        }

        let now = Timestamp::from_unix(self.clock.now());
        if statement.constraints().is_expired_at(now) {
            return Err(Reason::Expired);
        }

        Ok(())
    }

    async fn redeem(&self, decoded: &DecodedToken) -> Verdict {
        let id = decoded.id();
        let limit = decoded.statement().constraints().usage_limit().get();
        let attempt = self.tracker.try_redeem(id, limit);

        let outcome = match self.tracker_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, attempt).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!(token = %id, ?timeout, "usage tracker timed out");
                    return Reason::Unavailable.into();
                }
            },
            None => attempt.await,
        };

        match outcome {
            Ok(Redemption::Redeemed { remaining_uses }) => {
                tracing::info!(token = %id, remaining_uses, "redeemed token");
                Verdict::Valid { remaining_uses }
            }
            Ok(Redemption::Exhausted) => {
                tracing::debug!(token = %id, "token has no uses left");
                Reason::Exhausted.into()
            }
            Err(error) => {
                tracing::warn!(token = %id, %error, "usage tracker unavailable");
                Reason::Unavailable.into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        issuer::{DelegationIssuer, IssueRequest},
        tracker::MemoryUsageTracker,
    };
    use pretty_assertions::assert_eq;
    use secret_share_common::ManualClock;
    use secret_share_credentials::{Ed25519ResolveError, Ed25519Signer, Ed25519Verifier};
    use testresult::TestResult;

    const NOW: u64 = 1_700_000_000;

    fn issue(clock: &ManualClock, usage_limit: u32) -> TestResult<DelegationToken> {
        let issuer = DelegationIssuer::new(Ed25519Signer::import(&[3; 32])?)
            .with_clock(clock.clone());
        Ok(issuer.issue(IssueRequest {
            recipient: "did:key:zAbc".into(),
            resource: "bag123".into(),
            expires_in_seconds: 60,
            usage_limit,
        })?)
    }

    fn expect_bag() -> TestResult<Expectation> {
        Ok(Expectation::new(Resource::new("bag123")?))
    }

    #[tokio::test]
    async fn refused_tokens_consume_nothing() -> TestResult {
        let clock = ManualClock::at(NOW);
        let token = issue(&clock, 1)?;
        let validator = Validator::new(MemoryUsageTracker::new()).with_clock(clock.clone());

        let wrong = Expectation::new(Resource::new("other")?);
        assert_eq!(
            validator.validate(&token.to_text(), &wrong).await,
            Verdict::Invalid(Reason::ResourceMismatch)
        );
        assert!(validator.tracker().is_empty());

        assert_eq!(
            validator.validate(&token.to_text(), &expect_bag()?).await,
            Verdict::Valid { remaining_uses: 0 }
        );
        Ok(())
    }

    #[tokio::test]
    async fn signature_is_checked_before_resource() -> TestResult {
        let clock = ManualClock::at(NOW);
        let token = issue(&clock, 1)?;
        let validator = Validator::new(MemoryUsageTracker::new())
            .with_clock(clock)
            .with_resolver(StaleKeyResolver(*Ed25519Signer::import(&[4; 32])?.verifier()));

        let wrong = Expectation::new(Resource::new("other")?);
        assert_eq!(
            validator.validate(&token.to_text(), &wrong).await,
            Verdict::Invalid(Reason::BadSignature)
        );
        Ok(())
    }

    #[tokio::test]
    async fn the_expiry_second_is_still_valid() -> TestResult {
        let clock = ManualClock::at(NOW);
        let token = issue(&clock, 3)?;
        let validator = Validator::new(MemoryUsageTracker::new()).with_clock(clock.clone());

        clock.set(NOW + 60);
        assert!(
            validator
                .validate(&token.to_text(), &expect_bag()?)
                .await
                .is_valid()
        );

        clock.set(NOW + 61);
        assert_eq!(
            validator.validate(&token.to_text(), &expect_bag()?).await,
            Verdict::Invalid(Reason::Expired)
        );
        Ok(())
    }

    /// Resolves every DID to the same, unrelated key.
    #[derive(Debug, Clone, Copy)]
    struct StaleKeyResolver(Ed25519Verifier);

    impl Resolver for StaleKeyResolver {
        type Verifier = Ed25519Verifier;
        type Error = Ed25519ResolveError;

        fn resolve(&self, _: &Did) -> Result<Self::Verifier, Self::Error> {
            Ok(self.0)
        }
    }
}
