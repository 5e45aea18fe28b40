//! Per-token remaining-use counters.

mod memory;
pub use memory::MemoryUsageTracker;

use crate::{cid::TokenId, error::TrackerError};
use async_trait::async_trait;
use secret_share_common::ConditionalSync;
use std::sync::Arc;

/// Outcome of a redemption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Redemption {
    /// One use was consumed.
    Redeemed {
        /// Uses left after this one.
        remaining_uses: u32,
    },
    /// No uses were left; nothing changed.
    Exhausted,
}

/// Owner of every usage record.
///
/// A usage record is created the first time a token is redeemed, starting
/// from the token's usage limit, and is decremented once per successful
/// redemption. Once it reaches zero it stays there.
///
/// Implementations must make [`UsageTracker::try_redeem`] atomic per token
/// id: two concurrent calls against a record with one use left must yield
/// exactly one [`Redemption::Redeemed`].
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait UsageTracker: ConditionalSync {
    /// Consume one use of `id`, creating its record with
    /// `usage_limit_if_absent` uses if none exists yet.
    async fn try_redeem(
        &self,
        id: &TokenId,
        usage_limit_if_absent: u32,
    ) -> Result<Redemption, TrackerError>;

    /// Remaining uses for `id`, or `None` if it was never redeemed. Never
    /// creates or modifies a record.
    async fn remaining(&self, id: &TokenId) -> Result<Option<u32>, TrackerError>;
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<T> UsageTracker for Arc<T>
where
    T: UsageTracker + ?Sized,
{
    async fn try_redeem(
        &self,
        id: &TokenId,
        usage_limit_if_absent: u32,
    ) -> Result<Redemption, TrackerError> {
        (**self).try_redeem(id, usage_limit_if_absent).await
    }

    async fn remaining(&self, id: &TokenId) -> Result<Option<u32>, TrackerError> {
        (**self).remaining(id).await
    }
}
