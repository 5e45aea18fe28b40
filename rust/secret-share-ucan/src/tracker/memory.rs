use super::{Redemption, UsageTracker};
use crate::{cid::TokenId, error::TrackerError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// A [`UsageTracker`] that keeps its records in process memory.
///
/// Records live in a sharded map; a redemption holds the shard lock for its
/// key only while it reads and decrements, so different tokens never wait
/// on each other beyond shard contention. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryUsageTracker {
    records: Arc<DashMap<TokenId, u32>>,
}

impl MemoryUsageTracker {
    /// An empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tokens with a usage record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no token has been redeemed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl UsageTracker for MemoryUsageTracker {
    async fn try_redeem(
        &self,
        id: &TokenId,
        usage_limit_if_absent: u32,
    ) -> Result<Redemption, TrackerError> {
        let mut remaining = self.records.entry(*id).or_insert(usage_limit_if_absent);

        Ok(match remaining.checked_sub(1) {
            Some(left) => {
                *remaining = left;
                Redemption::Redeemed {
                    remaining_uses: left,
                }
            }
            None => Redemption::Exhausted,
        })
    }

    async fn remaining(&self, id: &TokenId) -> Result<Option<u32>, TrackerError> {
        Ok(self.records.get(id).map(|record| *record))
    }
}
