use pretty_assertions::assert_eq;
use secret_share_common::ManualClock;
use secret_share_credentials::{Ed25519Signer, Principal};
use secret_share_ucan::{MemoryUsageTracker, Reason, UsageTracker};
use secret_share_vault::{
    LocalVault, MemoryBlobStore, MemoryRecordBook, RedeemOutcome, ShareRequest, Vault,
    VaultConfig, VaultError, parse_share_link,
};
use std::time::Duration;
use testresult::TestResult;

const T0: u64 = 1_700_000_000;

type MemoryVault =
    Vault<Ed25519Signer, MemoryBlobStore, MemoryUsageTracker, MemoryRecordBook, ManualClock>;

fn memory_vault(clock: &ManualClock) -> MemoryVault {
    Vault::new(
        Ed25519Signer::import(&[0; 32]).unwrap(),
        MemoryBlobStore::new(),
        MemoryUsageTracker::new(),
        MemoryRecordBook::new(),
        &VaultConfig::default(),
    )
    .with_clock(clock.clone())
}

fn share_request(usage_limit: Option<u32>) -> ShareRequest {
    ShareRequest {
        secret: b"encrypted api key".to_vec(),
        recipient: "did:key:zAbc".into(),
        expires_in_seconds: None,
        usage_limit,
    }
}

#[test_log::test(tokio::test)]
async fn share_then_redeem_until_exhausted() -> TestResult {
    let clock = ManualClock::at(T0);
    let vault = memory_vault(&clock);

    let shared = vault.share(share_request(Some(2))).await?;
    let text = shared.token.to_text();

    for remaining_uses in [1, 0] {
        assert_eq!(
            vault.redeem(&text, &shared.blob, None).await?,
            RedeemOutcome::Granted {
                secret: b"encrypted api key".to_vec(),
                remaining_uses,
            }
        );
    }
    assert_eq!(
        vault.redeem(&text, &shared.blob, None).await?,
        RedeemOutcome::Refused(Reason::Exhausted)
    );
    Ok(())
}

#[tokio::test]
async fn defaults_come_from_config() -> TestResult {
    let clock = ManualClock::at(T0);
    let vault = memory_vault(&clock);

    let shared = vault.share(share_request(None)).await?;
    assert_eq!(shared.record.usage_limit, 1);
    assert_eq!(shared.record.expires_at.to_unix(), T0 + 600);
    assert_eq!(shared.record.created_at.to_unix(), T0);
    assert_eq!(
        shared.record.resource.as_str(),
        format!("storage://{}", shared.blob)
    );
    Ok(())
}

#[tokio::test]
async fn share_links_carry_blob_and_token() -> TestResult {
    let clock = ManualClock::at(T0);
    let vault = memory_vault(&clock);

    let shared = vault.share(share_request(None)).await?;
    let link = &shared.record.share_link;
    assert!(
        link.as_str().starts_with("http://127.0.0.1:8080/s/"),
        "{link}"
    );

    let (blob, token) = parse_share_link(link).ok_or("unparseable link")?;
    assert_eq!(blob, shared.blob);
    assert_eq!(token, shared.token.to_text());
    Ok(())
}

#[tokio::test]
async fn a_token_only_opens_its_own_secret() -> TestResult {
    let clock = ManualClock::at(T0);
    let vault = memory_vault(&clock);

    let first = vault.share(share_request(None)).await?;
    let second = vault
        .share(ShareRequest {
            secret: b"another secret".to_vec(),
            ..share_request(None)
        })
        .await?;

    assert_eq!(
        vault
            .redeem(&first.token.to_text(), &second.blob, None)
            .await?,
        RedeemOutcome::Refused(Reason::ResourceMismatch)
    );
    Ok(())
}

#[tokio::test]
async fn redemption_can_require_the_recipient() -> TestResult {
    let clock = ManualClock::at(T0);
    let vault = memory_vault(&clock);
    let shared = vault.share(share_request(None)).await?;
    let text = shared.token.to_text();

    assert_eq!(
        vault
            .redeem(&text, &shared.blob, Some("did:key:zXyz".parse()?))
            .await?,
        RedeemOutcome::Refused(Reason::AudienceMismatch)
    );
    assert!(matches!(
        vault
            .redeem(&text, &shared.blob, Some("did:key:zAbc".parse()?))
            .await?,
        RedeemOutcome::Granted { .. }
    ));
    Ok(())
}

#[tokio::test]
async fn records_show_live_usage_and_expiry() -> TestResult {
    let clock = ManualClock::at(T0);
    let vault = memory_vault(&clock);

    let shared = vault
        .share(ShareRequest {
            expires_in_seconds: Some(30),
            ..share_request(Some(3))
        })
        .await?;

    let records = vault.records().await?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].remaining_uses, 3);
    assert!(!records[0].expired);

    vault
        .redeem(&shared.token.to_text(), &shared.blob, None)
        .await?;
    clock.advance(Duration::from_secs(31));

    let records = vault.records().await?;
    assert_eq!(records[0].remaining_uses, 2);
    assert!(records[0].expired);
    assert_eq!(
        vault
            .redeem(&shared.token.to_text(), &shared.blob, None)
            .await?,
        RedeemOutcome::Refused(Reason::Expired)
    );
    Ok(())
}

#[tokio::test]
async fn inspection_consumes_nothing() -> TestResult {
    let clock = ManualClock::at(T0);
    let vault = memory_vault(&clock);
    let shared = vault.share(share_request(None)).await?;

    for _ in 0..3 {
        let summary = vault.inspect(&shared.token.to_text())?;
        assert_eq!(summary.issuer, vault.did());
        assert!(summary.signature_valid);
    }
    assert_eq!(vault.records().await?[0].remaining_uses, 1);

    assert!(matches!(
        vault.inspect("not-a-token"),
        Err(VaultError::Malformed(_))
    ));
    Ok(())
}

#[tokio::test]
async fn bad_recipients_are_refused_up_front() -> TestResult {
    let clock = ManualClock::at(T0);
    let vault = memory_vault(&clock);

    let result = vault
        .share(ShareRequest {
            recipient: "bob".into(),
            ..share_request(None)
        })
        .await;
    assert!(matches!(result, Err(VaultError::Issue(_))));
    assert!(vault.records().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn local_vault_persists_between_openings() -> TestResult {
    let dir = tempfile::tempdir()?;
    let config = VaultConfig {
        data_dir: dir.path().to_owned(),
        ..VaultConfig::default()
    };
    let identity = Ed25519Signer::import(&[7; 32])?;

    let shared = LocalVault::open(identity.clone(), &config)
        .await?
        .share(share_request(Some(1)))
        .await?;

    let reopened = LocalVault::open(identity.clone(), &config).await?;
    assert_eq!(reopened.did(), identity.did());
    assert_eq!(reopened.records().await?.len(), 1);
    assert!(matches!(
        reopened
            .redeem(&shared.token.to_text(), &shared.blob, None)
            .await?,
        RedeemOutcome::Granted { .. }
    ));

    let again = LocalVault::open(identity, &config).await?;
    assert_eq!(
        again
            .redeem(&shared.token.to_text(), &shared.blob, None)
            .await?,
        RedeemOutcome::Refused(Reason::Exhausted)
    );
    assert_eq!(again.records().await?[0].remaining_uses, 0);
    Ok(())
}

#[tokio::test]
async fn a_missing_secret_costs_no_use() -> TestResult {
    let clock = ManualClock::at(T0);
    let tracker = MemoryUsageTracker::new();
    let vault_with = |blobs: MemoryBlobStore| -> TestResult<MemoryVault> {
        Ok(Vault::new(
            Ed25519Signer::import(&[0; 32])?,
            blobs,
            tracker.clone(),
            MemoryRecordBook::new(),
            &VaultConfig::default(),
        )
        .with_clock(clock.clone()))
    };

    let sharing = vault_with(MemoryBlobStore::new())?;
    let shared = sharing.share(share_request(Some(1))).await?;

    let without_blob = vault_with(MemoryBlobStore::new())?;
    let result = without_blob
        .redeem(&shared.token.to_text(), &shared.blob, None)
        .await;
    assert!(matches!(result, Err(VaultError::MissingBlob(cid)) if cid == shared.blob));
    assert_eq!(tracker.remaining(shared.token.id()).await?, None);

    assert!(matches!(
        sharing
            .redeem(&shared.token.to_text(), &shared.blob, None)
            .await?,
        RedeemOutcome::Granted {
            remaining_uses: 0,
            ..
        }
    ));
    Ok(())
}

#[tokio::test]
async fn a_single_record_can_be_looked_up() -> TestResult {
    let clock = ManualClock::at(T0);
    let vault = memory_vault(&clock);
    let shared = vault.share(share_request(Some(2))).await?;
    vault
        .redeem(&shared.token.to_text(), &shared.blob, None)
        .await?;

    let status = vault.record(shared.token.id()).await?.ok_or("no record")?;
    assert_eq!(status.record, shared.record);
    assert_eq!(status.remaining_uses, 1);

    let other = secret_share_ucan::TokenId::of(b"never issued");
    assert_eq!(vault.record(&other).await?, None);
    Ok(())
}
