//! One function per subcommand. Each returns the text to print.

use crate::cli::{Cli, Command, Inspect, Redeem, Records, Share};
use anyhow::{Context, Result, anyhow, bail};
use base64::{Engine, engine::general_purpose::STANDARD};
use ipld_core::cid::Cid;
use secret_share_credentials::{Ed25519Signer, Principal};
use secret_share_ucan::TokenId;
use secret_share_vault::{
    LocalVault, RedeemOutcome, ShareRequest, VaultConfig, config::CONFIG_FILE_NAME, identity,
    inspect, parse_share_link,
};
use std::fmt::Write as _;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Resolve the effective configuration from flags and the config file.
pub fn load_config(cli: &Cli) -> Result<VaultConfig> {
    let path = match (&cli.config, &cli.data_dir) {
        (Some(path), _) => path.clone(),
        (None, Some(dir)) => dir.join(CONFIG_FILE_NAME),
        (None, None) => VaultConfig::default().data_dir.join(CONFIG_FILE_NAME),
    };

    let mut config = VaultConfig::load(&path)?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

pub async fn run(cli: &Cli) -> Result<String> {
    let config = load_config(cli)?;
    match &cli.command {
        Command::Keygen => keygen(&config).await,
        Command::Share(args) => share(&config, args).await,
        Command::Inspect(args) => inspect_token(args),
        Command::Redeem(args) => redeem(&config, args).await,
        Command::Records(args) => records(&config, args).await,
    }
}

async fn open(config: &VaultConfig) -> Result<LocalVault<Ed25519Signer>> {
    let path = config.identity_path();
    let authority = identity::load(&path)
        .await
        .with_context(|| format!("no identity at {}; run `keygen` first", path.display()))?;
    Ok(LocalVault::open(authority, config).await?)
}

pub async fn keygen(config: &VaultConfig) -> Result<String> {
    let path = config.identity_path();
    let signer = identity::create(&path).await?;

    let config_path = config.data_dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        tokio::fs::write(&config_path, config.to_toml_string()?)
            .await
            .with_context(|| format!("writing {}", config_path.display()))?;
    }

    Ok(format!(
        "{}\n- identity: {}\n- config: {}",
        signer.did(),
        path.display(),
        config_path.display()
    ))
}

pub async fn share(config: &VaultConfig, args: &Share) -> Result<String> {
    let secret = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;

    let vault = open(config).await?;
    let shared = vault
        .share(ShareRequest {
            secret,
            recipient: args.recipient.clone(),
            expires_in_seconds: args.expires_in,
            usage_limit: args.uses,
        })
        .await?;

    Ok(format!(
        "{}\n- token id: {}\n- secret: {}\n- recipient: {}\n- uses: {}\n- expires at: {}\n- token: {}",
        shared.record.share_link,
        shared.record.token_id,
        shared.blob,
        shared.record.recipient,
        shared.record.usage_limit,
        shared.record.expires_at,
        shared.token,
    ))
}

pub fn inspect_token(args: &Inspect) -> Result<String> {
    let token = match Url::parse(&args.token).ok().as_ref().and_then(parse_share_link) {
        Some((_, token)) => token,
        None => args.token.clone(),
    };
    let summary = inspect(&token)?;
    Ok(serde_json::to_string_pretty(&summary)?)
}

pub async fn redeem(config: &VaultConfig, args: &Redeem) -> Result<String> {
    let (blob, token) = redemption_target(args)?;
    let audience = args
        .audience
        .as_deref()
        .map(str::parse)
        .transpose()
        .context("invalid --audience")?;

    // Fail on an unwritable destination before a use is spent.
    let out = match &args.out {
        Some(path) => Some((
            path,
            tokio::fs::File::create(path)
                .await
                .with_context(|| format!("creating {}", path.display()))?,
        )),
        None => None,
    };

    let vault = open(config).await?;
    match vault.redeem(&token, &blob, audience).await? {
        RedeemOutcome::Granted {
            secret,
            remaining_uses,
        } => match out {
            Some((path, mut file)) => {
                file.write_all(&secret)
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
                file.flush()
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
                Ok(format!(
                    "wrote {} bytes to {} ({remaining_uses} uses remaining)",
                    secret.len(),
                    path.display()
                ))
            }
            None => {
                tracing::info!(remaining_uses, "redeemed");
                Ok(STANDARD.encode(secret))
            }
        },
        RedeemOutcome::Refused(reason) => bail!("token refused: {reason}"),
    }
}

fn redemption_target(args: &Redeem) -> Result<(Cid, String)> {
    if let Some(blob) = &args.blob {
        let blob = blob.parse().context("invalid --blob")?;
        return Ok((blob, args.token.clone()));
    }

    let link = Url::parse(&args.token)
        .map_err(|_| anyhow!("pass a share link, or the token with --blob <cid>"))?;
    parse_share_link(&link).ok_or_else(|| anyhow!("{link} is not a share link"))
}

pub async fn records(config: &VaultConfig, args: &Records) -> Result<String> {
    let vault = open(config).await?;
    let statuses = match &args.token {
        Some(id) => {
            let id: TokenId = id.parse().context("invalid --token")?;
            let status = vault
                .record(&id)
                .await?
                .ok_or_else(|| anyhow!("no secret was shared under token {id}"))?;
            vec![status]
        }
        None => vault.records().await?,
    };

    if args.json {
        return Ok(serde_json::to_string_pretty(&statuses)?);
    }

    let mut out = String::new();
    for status in &statuses {
        let state = if status.expired {
            "expired"
        } else if status.remaining_uses == 0 {
            "used up"
        } else {
            "active"
        };
        writeln!(
            out,
            "{}  {}  {}/{} uses left  {}  {}",
            status.record.token_id,
            status.record.recipient,
            status.remaining_uses,
            status.record.usage_limit,
            state,
            status.record.resource,
        )?;
    }
    if statuses.is_empty() {
        out.push_str("no secrets shared yet");
    }
    Ok(out.trim_end().to_owned())
}
