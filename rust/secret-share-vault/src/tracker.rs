use async_trait::async_trait;
use dashmap::DashMap;
use secret_share_ucan::{Redemption, TokenId, TrackerError, UsageTracker};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::Mutex;

/// A [`UsageTracker`] that keeps one small file per token, holding the
/// remaining use count in decimal.
///
/// Redemptions of the same token are serialized by a per-token async lock,
/// and each update is written to a staging file and renamed into place.
/// A lock is dropped from the map once no redemption holds or awaits it.
/// The locks live in this process: two processes sharing a directory are
/// not coordinated.
#[derive(Debug, Clone)]
pub struct FsUsageTracker {
    root_dir: PathBuf,
    locks: Arc<DashMap<TokenId, Arc<Mutex<()>>>>,
}

impl FsUsageTracker {
    /// Open (creating if needed) a tracker rooted at `root_dir`.
    pub async fn new(root_dir: impl AsRef<Path>) -> Result<Self, TrackerError> {
        let root_dir = root_dir.as_ref().to_owned();
        tokio::fs::create_dir_all(&root_dir)
            .await
            .map_err(|error| TrackerError::Unavailable(format!("{error}")))?;
        Ok(Self {
            root_dir,
            locks: Arc::default(),
        })
    }

    fn make_path(&self, id: &TokenId) -> PathBuf {
        self.root_dir.join(id.to_string())
    }

    fn lock_for(&self, id: &TokenId) -> Arc<Mutex<()>> {
        self.locks.entry(*id).or_default().clone()
    }

    async fn read(&self, id: &TokenId) -> Result<Option<u32>, TrackerError> {
        let text = match tokio::fs::read_to_string(self.make_path(id)).await {
            Ok(text) => text,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(TrackerError::Unavailable(format!("{error}"))),
        };

        text.trim()
            .parse()
            .map(Some)
            .map_err(|error| TrackerError::Corrupt {
                id: id.to_string(),
                reason: format!("{error}"),
            })
    }

    async fn write(&self, id: &TokenId, remaining: u32) -> Result<(), TrackerError> {
        let path = self.make_path(id);
        let staging = path.with_extension("partial");
        tokio::fs::write(&staging, remaining.to_string())
            .await
            .map_err(|error| TrackerError::Unavailable(format!("{error}")))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|error| TrackerError::Unavailable(format!("{error}")))
    }
}

impl FsUsageTracker {
    async fn redeem_locked(
        &self,
        id: &TokenId,
        usage_limit_if_absent: u32,
    ) -> Result<Redemption, TrackerError> {
        let current = self.read(id).await?;
        let remaining = current.unwrap_or(usage_limit_if_absent);

        match remaining.checked_sub(1) {
            Some(left) => {
                self.write(id, left).await?;
                Ok(Redemption::Redeemed {
                    remaining_uses: left,
                })
            }
            None => {
                if current.is_none() {
                    self.write(id, 0).await?;
                }
                Ok(Redemption::Exhausted)
            }
        }
    }

    /// Forget the lock for `id` unless another task still holds a handle.
    fn release(&self, id: &TokenId, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.locks.remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl UsageTracker for FsUsageTracker {
    async fn try_redeem(
        &self,
        id: &TokenId,
        usage_limit_if_absent: u32,
    ) -> Result<Redemption, TrackerError> {
        let lock = self.lock_for(id);
        let outcome = {
            let _guard = lock.lock().await;
            self.redeem_locked(id, usage_limit_if_absent).await
        };
        self.release(id, lock);
        outcome
    }

    async fn remaining(&self, id: &TokenId) -> Result<Option<u32>, TrackerError> {
        let lock = self.lock_for(id);
        let remaining = {
            let _guard = lock.lock().await;
            self.read(id).await
        };
        self.release(id, lock);
        remaining
    }
}
