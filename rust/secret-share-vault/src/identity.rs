//! The issuing identity, kept as a base64url seed file.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use secret_share_credentials::{Ed25519KeyError, Ed25519Signer};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity file {} already exists", .0.display())]
    Exists(PathBuf),

    #[error("identity file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("identity file is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error(transparent)]
    Key(#[from] Ed25519KeyError),
}

/// Generate a fresh identity and write its seed to `path`, readable only by
/// the current user on Unix. Refuses to overwrite an existing file.
pub async fn create(path: &Path) -> Result<Ed25519Signer, IdentityError> {
    let signer = Ed25519Signer::generate()?;
    let io = |source| IdentityError::Io {
        path: path.to_owned(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io)?;
    }

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = match options.open(path).await {
        Ok(file) => file,
        Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(IdentityError::Exists(path.to_owned()));
        }
        Err(error) => return Err(io(error)),
    };

    file.write_all(URL_SAFE_NO_PAD.encode(signer.export()).as_bytes())
        .await
        .map_err(io)?;
    file.flush().await.map_err(io)?;

    tracing::info!(did = %signer, path = %path.display(), "created identity");
    Ok(signer)
}

/// Read the identity stored at `path`.
pub async fn load(path: &Path) -> Result<Ed25519Signer, IdentityError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| IdentityError::Io {
            path: path.to_owned(),
            source,
        })?;
    let seed = URL_SAFE_NO_PAD.decode(text.trim())?;
    Ok(Ed25519Signer::import(&seed)?)
}
