//! The sharing party's list of secrets it has handed out.

use async_trait::async_trait;
use secret_share_common::ConditionalSync;
use secret_share_credentials::Did;
use secret_share_ucan::{Resource, Timestamp, TokenId};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::{Mutex, RwLock};
use url::Url;

/// One shared secret, as seen by whoever shared it.
///
/// The record holds no usage counter. Remaining uses are owned by the
/// usage tracker and read from it when records are listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRecord {
    pub token_id: TokenId,
    pub resource: Resource,
    pub recipient: Did,
    pub expires_at: Timestamp,
    pub usage_limit: u32,
    pub share_link: Url,
    pub created_at: Timestamp,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record book I/O error: {0}")]
    Io(String),

    #[error("record book is unreadable: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Append-only storage of [`SecretRecord`]s.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait RecordBook: ConditionalSync {
    /// Add a record.
    async fn insert(&self, record: SecretRecord) -> Result<(), RecordError>;

    /// Every record, oldest first.
    async fn list(&self) -> Result<Vec<SecretRecord>, RecordError>;

    /// The record for `id`, if one was made.
    async fn get(&self, id: &TokenId) -> Result<Option<SecretRecord>, RecordError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|record| &record.token_id == id))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryRecordBook {
    records: Arc<RwLock<Vec<SecretRecord>>>,
}

impl MemoryRecordBook {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl RecordBook for MemoryRecordBook {
    async fn insert(&self, record: SecretRecord) -> Result<(), RecordError> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SecretRecord>, RecordError> {
        Ok(self.records.read().await.clone())
    }
}

/// A [`RecordBook`] kept as a JSON array in a single file.
///
/// Writes go to a sibling file that is then renamed over the original, so
/// a crash never leaves a half-written book. Concurrent inserts through the
/// same instance are serialized.
#[derive(Debug)]
pub struct JsonRecordBook {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonRecordBook {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonRecordBook {
            path: path.as_ref().to_owned(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<Vec<SecretRecord>, RecordError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(error) => Err(RecordError::Io(format!("{error}"))),
        }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl RecordBook for JsonRecordBook {
    async fn insert(&self, record: SecretRecord) -> Result<(), RecordError> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_all().await?;
        records.push(record);
        let json = serde_json::to_vec_pretty(&records)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| RecordError::Io(format!("{error}")))?;
        }
        let staging = self.path.with_extension("json.partial");
        tokio::fs::write(&staging, json)
            .await
            .map_err(|error| RecordError::Io(format!("{error}")))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|error| RecordError::Io(format!("{error}")))?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SecretRecord>, RecordError> {
        self.read_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    fn record(seed: &[u8]) -> TestResult<SecretRecord> {
        Ok(SecretRecord {
            token_id: TokenId::of(seed),
            resource: Resource::new("storage://bafkreiexample")?,
            recipient: "did:key:zAbc".parse()?,
            expires_at: Timestamp::from_unix(1_600),
            usage_limit: 2,
            share_link: "http://127.0.0.1:8080/s/bafkreiexample/token".parse()?,
            created_at: Timestamp::from_unix(1_000),
        })
    }

    #[tokio::test]
    async fn memory_book_keeps_insertion_order() -> TestResult {
        let book = MemoryRecordBook::new();
        book.insert(record(b"a")?).await?;
        book.insert(record(b"b")?).await?;

        let ids: Vec<TokenId> = book.list().await?.iter().map(|r| r.token_id).collect();
        assert_eq!(ids, vec![TokenId::of(b"a"), TokenId::of(b"b")]);
        assert_eq!(book.get(&TokenId::of(b"b")).await?, Some(record(b"b")?));
        assert_eq!(book.get(&TokenId::of(b"c")).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn json_book_persists() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("records.json");

        let book = JsonRecordBook::new(&path);
        assert!(book.list().await?.is_empty());
        book.insert(record(b"a")?).await?;
        book.insert(record(b"b")?).await?;

        let reopened = JsonRecordBook::new(&path);
        assert_eq!(reopened.list().await?, vec![record(b"a")?, record(b"b")?]);
        Ok(())
    }

    #[tokio::test]
    async fn json_uses_camel_case_keys() -> TestResult {
        let value = serde_json::to_value(record(b"a")?)?;
        for key in [
            "tokenId",
            "resource",
            "recipient",
            "expiresAt",
            "usageLimit",
            "shareLink",
            "createdAt",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn a_garbled_book_is_reported() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("records.json");
        std::fs::write(&path, b"{not json")?;

        assert!(matches!(
            JsonRecordBook::new(&path).list().await,
            Err(RecordError::Corrupt(_))
        ));
        Ok(())
    }
}
