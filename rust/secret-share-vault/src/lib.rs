//! Share encrypted secrets behind usage-limited delegation tokens.
//!
//! A [`Vault`] ties together a [`BlobStore`] holding the encrypted bytes, a
//! [`secret_share_ucan::DelegationIssuer`] signing tokens for them, a
//! [`secret_share_ucan::Validator`] redeeming those tokens against a usage
//! tracker, and a [`RecordBook`] remembering what was shared with whom.
//!
//! [`LocalVault::open`] puts all of it under one data directory:
//!
//! ```text
//! <data_dir>/
//!   config.toml     optional VaultConfig
//!   identity.key    issuing identity seed
//!   blobs/<cid>     encrypted secrets
//!   usage/<token>   remaining uses per redeemed token
//!   records.json    every share made from this directory
//! ```

pub mod blob;
pub mod config;
pub mod error;
pub mod identity;
pub mod record;
pub mod tracker;
pub mod vault;

pub use blob::{BlobStore, BlobStoreError, FsBlobStore, MemoryBlobStore};
pub use config::{ConfigError, VaultConfig};
pub use error::VaultError;
pub use identity::IdentityError;
pub use record::{JsonRecordBook, MemoryRecordBook, RecordBook, RecordError, SecretRecord};
pub use tracker::FsUsageTracker;
pub use vault::{
    LocalVault, RecordStatus, RedeemOutcome, ShareRequest, SharedSecret, Vault, inspect,
    parse_share_link, resource_for,
};
