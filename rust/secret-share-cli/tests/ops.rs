use clap::Parser;
use pretty_assertions::assert_eq;
use secret_share_cli::{Cli, ops};
use std::path::Path;
use testresult::TestResult;

fn cli(data_dir: &Path, args: &[&str]) -> Cli {
    let data_dir = data_dir.to_str().unwrap();
    Cli::parse_from(
        ["secret-share", "--data-dir", data_dir]
            .iter()
            .chain(args)
            .copied(),
    )
}

#[tokio::test]
async fn keygen_share_redeem_records() -> TestResult {
    let dir = tempfile::tempdir()?;
    let data = dir.path().join("vault");

    let did = ops::run(&cli(&data, &["keygen"])).await?;
    assert!(did.starts_with("did:key:z"), "{did}");
    assert!(data.join("identity.key").exists());
    assert!(data.join("config.toml").exists());

    let secret = dir.path().join("secret.bin");
    std::fs::write(&secret, b"\x00\x01ciphertext")?;
    let shared = ops::run(&cli(
        &data,
        &[
            "share",
            secret.to_str().ok_or("path")?,
            "--recipient",
            "did:key:zAbc",
            "--uses",
            "1",
        ],
    ))
    .await?;
    let link = shared.lines().next().ok_or("no link")?.to_owned();

    let summary = ops::run(&cli(&data, &["inspect", &link])).await?;
    let summary: serde_json::Value = serde_json::from_str(&summary)?;
    assert_eq!(summary["audience"], "did:key:zAbc");
    assert_eq!(summary["usageLimit"], 1);

    let out = dir.path().join("redeemed.bin");
    ops::run(&cli(
        &data,
        &["redeem", &link, "--out", out.to_str().ok_or("path")?],
    ))
    .await?;
    assert_eq!(std::fs::read(&out)?, b"\x00\x01ciphertext");

    let refused = ops::run(&cli(&data, &["redeem", &link])).await;
    let error = refused.err().ok_or("second redemption should fail")?;
    assert_eq!(error.to_string(), "token refused: exhausted");

    let records = ops::run(&cli(&data, &["records"])).await?;
    assert!(records.contains("0/1 uses left"), "{records}");
    assert!(records.contains("did:key:zAbc"), "{records}");
    Ok(())
}

#[tokio::test]
async fn sharing_needs_an_identity() -> TestResult {
    let dir = tempfile::tempdir()?;
    let secret = dir.path().join("secret.bin");
    std::fs::write(&secret, b"ciphertext")?;

    let result = ops::run(&cli(
        dir.path(),
        &[
            "share",
            secret.to_str().ok_or("path")?,
            "--recipient",
            "did:key:zAbc",
        ],
    ))
    .await;
    let error = result.err().ok_or("share without identity should fail")?;
    assert!(error.to_string().contains("keygen"), "{error}");
    Ok(())
}

#[tokio::test]
async fn bare_tokens_need_a_blob() -> TestResult {
    let dir = tempfile::tempdir()?;
    ops::run(&cli(dir.path(), &["keygen"])).await?;

    let result = ops::run(&cli(dir.path(), &["redeem", "bm90LWEtdG9rZW4"])).await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn an_unwritable_destination_costs_no_use() -> TestResult {
    let dir = tempfile::tempdir()?;
    let data = dir.path().join("vault");
    ops::run(&cli(&data, &["keygen"])).await?;

    let secret = dir.path().join("secret.bin");
    std::fs::write(&secret, b"ciphertext")?;
    let shared = ops::run(&cli(
        &data,
        &[
            "share",
            secret.to_str().ok_or("path")?,
            "--recipient",
            "did:key:zAbc",
            "--uses",
            "1",
        ],
    ))
    .await?;
    let mut lines = shared.lines();
    let link = lines.next().ok_or("no link")?.to_owned();
    let token_id = lines
        .next()
        .and_then(|line| line.strip_prefix("- token id: "))
        .ok_or("no token id")?
        .to_owned();

    let nowhere = dir.path().join("missing").join("redeemed.bin");
    let result = ops::run(&cli(
        &data,
        &["redeem", &link, "--out", nowhere.to_str().ok_or("path")?],
    ))
    .await;
    assert!(result.is_err());

    let record = ops::run(&cli(&data, &["records", "--token", &token_id])).await?;
    assert!(record.contains("1/1 uses left"), "{record}");

    let out = dir.path().join("redeemed.bin");
    ops::run(&cli(
        &data,
        &["redeem", &link, "--out", out.to_str().ok_or("path")?],
    ))
    .await?;
    assert_eq!(std::fs::read(&out)?, b"ciphertext");
    Ok(())
}

#[tokio::test]
async fn unknown_tokens_have_no_record() -> TestResult {
    let dir = tempfile::tempdir()?;
    ops::run(&cli(dir.path(), &["keygen"])).await?;

    let unknown = secret_share_ucan::TokenId::of(b"never issued").to_string();
    let result = ops::run(&cli(dir.path(), &["records", "--token", &unknown])).await;
    let error = result.err().ok_or("unknown token should have no record")?;
    assert!(error.to_string().contains("no secret was shared"), "{error}");
    Ok(())
}
