//! Content-addressed storage for encrypted secrets.
//!
//! The vault never looks inside a blob. It hands the bytes to a
//! [`BlobStore`] and gets back a CID (raw codec, SHA2-256) that becomes the
//! token's resource reference.

use async_trait::async_trait;
use ipld_core::cid::Cid;
use secret_share_common::ConditionalSync;
use secret_share_ucan::cid::{RAW, cid_of};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    /// The backing store failed.
    #[error("blob store error: {0}")]
    Backend(String),

    /// Stored bytes no longer hash to their CID.
    #[error("blob {0} does not match its content identifier")]
    Corrupt(Cid),
}

/// Where encrypted secrets are kept.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait BlobStore: ConditionalSync {
    /// Store `bytes` and return their content identifier. Storing the same
    /// bytes twice yields the same CID.
    async fn put(&self, bytes: Vec<u8>) -> Result<Cid, BlobStoreError>;

    /// Fetch the bytes stored under `cid`, if any.
    async fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>, BlobStoreError>;
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<B> BlobStore for Arc<B>
where
    B: BlobStore + ?Sized,
{
    async fn put(&self, bytes: Vec<u8>) -> Result<Cid, BlobStoreError> {
        (**self).put(bytes).await
    }

    async fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>, BlobStoreError> {
        (**self).get(cid).await
    }
}

/// A [`BlobStore`] backed by a [`HashMap`]; nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<HashMap<Cid, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bytes: Vec<u8>) -> Result<Cid, BlobStoreError> {
        let cid = cid_of(RAW, &bytes);
        self.blobs.write().await.insert(cid, bytes);
        Ok(cid)
    }

    async fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>, BlobStoreError> {
        Ok(self.blobs.read().await.get(cid).cloned())
    }
}

/// A file-system [`BlobStore`]. Every blob is a file in the root directory
/// named after its CID; reads are checked against the CID.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root_dir: PathBuf,
}

impl FsBlobStore {
    /// Open (creating if needed) a store rooted at `root_dir`.
    pub async fn new(root_dir: impl AsRef<Path>) -> Result<Self, BlobStoreError> {
        let root_dir = root_dir.as_ref().to_owned();
        tokio::fs::create_dir_all(&root_dir)
            .await
            .map_err(|error| BlobStoreError::Backend(format!("{error}")))?;
        Ok(Self { root_dir })
    }

    fn make_path(&self, cid: &Cid) -> PathBuf {
        self.root_dir.join(cid.to_string())
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl BlobStore for FsBlobStore {
    async fn put(&self, bytes: Vec<u8>) -> Result<Cid, BlobStoreError> {
        let cid = cid_of(RAW, &bytes);
        let path = self.make_path(&cid);
        if path.exists() {
            return Ok(cid);
        }

        let staging = path.with_extension("partial");
        tokio::fs::write(&staging, &bytes)
            .await
            .map_err(|error| BlobStoreError::Backend(format!("{error}")))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|error| BlobStoreError::Backend(format!("{error}")))?;

        tracing::debug!(%cid, size = bytes.len(), "stored blob");
        Ok(cid)
    }

    async fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>, BlobStoreError> {
        let path = self.make_path(cid);
        if !path.exists() {
            return Ok(None);
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|error| BlobStoreError::Backend(format!("{error}")))?;

        if cid_of(cid.codec(), &bytes) != *cid {
            return Err(BlobStoreError::Corrupt(*cid));
        }
        Ok(Some(bytes))
    }
}
