//! Vault configuration, read from a TOML file.

use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

/// File name of the configuration inside a data directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// File holding the issuing identity's seed.
pub const IDENTITY_FILE_NAME: &str = "identity.key";
/// Directory of stored blobs.
pub const BLOBS_DIR_NAME: &str = "blobs";
/// Directory of usage records.
pub const USAGE_DIR_NAME: &str = "usage";
/// File listing every shared secret.
pub const RECORDS_FILE_NAME: &str = "records.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Where blobs, usage records, the record book and the identity live.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Base URL of share links. A link is `<gateway>/<blob cid>/<token>`.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: Url,

    /// Lifetime of a token when the caller does not give one.
    #[serde(default = "default_expires_in_seconds")]
    pub default_expires_in_seconds: u64,

    /// Redemptions allowed when the caller does not say.
    #[serde(default = "default_usage_limit")]
    pub default_usage_limit: u32,

    /// How long a redemption waits on the usage tracker. Zero waits forever.
    #[serde(default = "default_redeem_timeout_ms")]
    pub redeem_timeout_ms: u64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".secret-share")
}

fn default_gateway_url() -> Url {
    // Parsing a constant.
    Url::parse("http://127.0.0.1:8080/s").unwrap_or_else(|_| unreachable!())
}

fn default_expires_in_seconds() -> u64 {
    600
}

fn default_usage_limit() -> u32 {
    1
}

fn default_redeem_timeout_ms() -> u64 {
    5_000
}

impl Default for VaultConfig {
    fn default() -> Self {
        VaultConfig {
            data_dir: default_data_dir(),
            gateway_url: default_gateway_url(),
            default_expires_in_seconds: default_expires_in_seconds(),
            default_usage_limit: default_usage_limit(),
            redeem_timeout_ms: default_redeem_timeout_ms(),
        }
    }
}

impl VaultConfig {
    /// Read the configuration at `path`, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed, or names an unusable gateway.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_owned(),
                source,
            }),
        }
    }

    /// Parse a TOML document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on invalid TOML, unknown keys, or a gateway
    /// URL that cannot carry path segments.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: VaultConfig = toml::from_str(text)?;
        config.check()?;
        Ok(config)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Write`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.gateway_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidGateway(self.gateway_url.to_string()));
        }
        if self.default_expires_in_seconds == 0 {
            return Err(ConfigError::InvalidDefault("default_expires_in_seconds"));
        }
        if self.default_usage_limit == 0 {
            return Err(ConfigError::InvalidDefault("default_usage_limit"));
        }
        Ok(())
    }

    pub fn identity_path(&self) -> PathBuf {
        self.data_dir.join(IDENTITY_FILE_NAME)
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.data_dir.join(BLOBS_DIR_NAME)
    }

    pub fn usage_dir(&self) -> PathBuf {
        self.data_dir.join(USAGE_DIR_NAME)
    }

    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join(RECORDS_FILE_NAME)
    }

    /// The tracker timeout, or `None` when disabled.
    pub fn redeem_timeout(&self) -> Option<Duration> {
        (self.redeem_timeout_ms > 0).then(|| Duration::from_millis(self.redeem_timeout_ms))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML deserialization error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    Write(#[from] toml::ser::Error),

    #[error("gateway url cannot carry a path: {0}")]
    InvalidGateway(String),

    #[error("{0} must be positive")]
    InvalidDefault(&'static str),
}
