use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Share encrypted secrets behind usage-limited, expiring tokens.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Data directory holding the identity, blobs, usage records and record
    /// book. Overrides `data_dir` from the config file.
    #[arg(long, global = true, env = "SECRET_SHARE_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Config file (default: `<data dir>/config.toml`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace). `RUST_LOG` takes
    /// precedence.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the issuing identity and print its DID.
    Keygen,
    /// Store an encrypted secret and issue a token for it.
    Share(Share),
    /// Decode a token without redeeming it.
    Inspect(Inspect),
    /// Redeem a token and retrieve the encrypted secret.
    Redeem(Redeem),
    /// List shared secrets with their remaining uses.
    Records(Records),
}

#[derive(Args, Debug, Clone)]
pub struct Share {
    /// File with the already-encrypted secret.
    pub file: PathBuf,

    /// DID of the recipient.
    #[arg(long)]
    pub recipient: String,

    /// Token lifetime in seconds.
    #[arg(long)]
    pub expires_in: Option<u64>,

    /// How many times the token may be redeemed.
    #[arg(long)]
    pub uses: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct Inspect {
    /// Token text or share link.
    pub token: String,
}

#[derive(Args, Debug, Clone)]
pub struct Redeem {
    /// Token text or share link.
    pub token: String,

    /// CID of the secret, when redeeming bare token text.
    #[arg(long)]
    pub blob: Option<String>,

    /// Only accept tokens addressed to this DID.
    #[arg(long)]
    pub audience: Option<String>,

    /// Write the secret here instead of printing it as base64.
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct Records {
    /// Only show the secret shared under this token id.
    #[arg(long)]
    pub token: Option<String>,

    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn it_parses_a_share() {
        let cli = Cli::parse_from([
            "secret-share",
            "--data-dir",
            "/tmp/vault",
            "share",
            "secret.bin",
            "--recipient",
            "did:key:zAbc",
            "--uses",
            "3",
        ]);

        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/vault")));
        match cli.command {
            Command::Share(share) => {
                assert_eq!(share.recipient, "did:key:zAbc");
                assert_eq!(share.uses, Some(3));
                assert_eq!(share.expires_in, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
