//! Sharing and redeeming secrets.

use crate::{
    blob::{BlobStore, FsBlobStore},
    config::VaultConfig,
    error::VaultError,
    record::{JsonRecordBook, RecordBook, SecretRecord},
    tracker::FsUsageTracker,
};
use ipld_core::cid::Cid;
use secret_share_common::{Clock, SystemClock};
use secret_share_credentials::{Authority, Did};
use secret_share_ucan::{
    DelegationIssuer, DelegationToken, Expectation, IssueRequest, Reason, Resource, Timestamp,
    TokenId, TokenSummary, UsageTracker, Validator, Verdict,
};
use serde::Serialize;
use url::Url;

/// Resource reference for a stored blob.
pub fn resource_for(cid: &Cid) -> Result<Resource, VaultError> {
    Resource::new(format!("storage://{cid}")).map_err(|error| VaultError::Issue(error.into()))
}

/// A request to share one already-encrypted secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    /// Encrypted secret bytes. The vault never inspects them.
    pub secret: Vec<u8>,
    /// DID of the party allowed to redeem.
    pub recipient: String,
    /// Token lifetime; the configured default when `None`.
    pub expires_in_seconds: Option<u64>,
    /// Redemptions allowed; the configured default when `None`.
    pub usage_limit: Option<u32>,
}

/// What [`Vault::share`] hands back: the token to pass on, and the record
/// kept locally.
#[derive(Debug, Clone)]
pub struct SharedSecret {
    pub token: DelegationToken,
    pub blob: Cid,
    pub record: SecretRecord,
}

/// Result of [`Vault::redeem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// The token was accepted and one use consumed.
    Granted {
        /// The encrypted secret.
        secret: Vec<u8>,
        /// Uses left after this one.
        remaining_uses: u32,
    },
    /// The token was refused; nothing was consumed.
    Refused(Reason),
}

/// A [`SecretRecord`] with its live usage state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordStatus {
    #[serde(flatten)]
    pub record: SecretRecord,
    pub remaining_uses: u32,
    pub expired: bool,
}

/// The composition of blob store, issuer, validator and record book.
///
/// All collaborators are passed in, so tests can run against in-memory
/// fakes and a pinned clock.
pub struct Vault<A, B, T, R, C = SystemClock> {
    issuer: DelegationIssuer<A, C>,
    validator: Validator<T, C>,
    blobs: B,
    records: R,
    clock: C,
    gateway: Url,
    default_expires_in_seconds: u64,
    default_usage_limit: u32,
}

/// A vault with every collaborator on the local file system.
pub type LocalVault<A> = Vault<A, FsBlobStore, FsUsageTracker, JsonRecordBook>;

impl<A, B, T, R> Vault<A, B, T, R>
where
    A: Authority,
    B: BlobStore,
    T: UsageTracker,
    R: RecordBook,
{
    pub fn new(authority: A, blobs: B, tracker: T, records: R, config: &VaultConfig) -> Self {
        let mut validator = Validator::new(tracker);
        if let Some(timeout) = config.redeem_timeout() {
            validator = validator.with_tracker_timeout(timeout);
        }

        Vault {
            issuer: DelegationIssuer::new(authority),
            validator,
            blobs,
            records,
            clock: SystemClock,
            gateway: config.gateway_url.clone(),
            default_expires_in_seconds: config.default_expires_in_seconds,
            default_usage_limit: config.default_usage_limit,
        }
    }
}

impl<A: Authority> LocalVault<A> {
    /// Open the file-backed stores under `config.data_dir`, signing as
    /// `authority`.
    pub async fn open(authority: A, config: &VaultConfig) -> Result<Self, VaultError> {
        let blobs = FsBlobStore::new(config.blobs_dir()).await?;
        let tracker = FsUsageTracker::new(config.usage_dir()).await?;
        let records = JsonRecordBook::new(config.records_path());
        Ok(Vault::new(authority, blobs, tracker, records, config))
    }
}

impl<A, B, T, R, C> Vault<A, B, T, R, C>
where
    A: Authority,
    B: BlobStore,
    T: UsageTracker,
    R: RecordBook,
    C: Clock + Clone,
{
    /// Use `clock` for issuance, validation and record status.
    pub fn with_clock<C2: Clock + Clone>(self, clock: C2) -> Vault<A, B, T, R, C2> {
        Vault {
            issuer: self.issuer.with_clock(clock.clone()),
            validator: self.validator.with_clock(clock.clone()),
            blobs: self.blobs,
            records: self.records,
            clock,
            gateway: self.gateway,
            default_expires_in_seconds: self.default_expires_in_seconds,
            default_usage_limit: self.default_usage_limit,
        }
    }

    /// DID of the identity that signs this vault's tokens.
    pub fn did(&self) -> Did {
        self.issuer.authority().did()
    }

    /// Store `request.secret`, issue a token for it and record the share.
    ///
    /// The blob is stored before the token is issued: a request the issuer
    /// refuses can leave an unreferenced blob behind.
    #[tracing::instrument(skip_all, fields(recipient = %request.recipient))]
    pub async fn share(&self, request: ShareRequest) -> Result<SharedSecret, VaultError> {
        let blob = self.blobs.put(request.secret).await?;
        let resource = resource_for(&blob)?;

        let token = self.issuer.issue(IssueRequest {
            recipient: request.recipient,
            resource: resource.as_str().to_owned(),
            expires_in_seconds: request
                .expires_in_seconds
                .unwrap_or(self.default_expires_in_seconds),
            usage_limit: request.usage_limit.unwrap_or(self.default_usage_limit),
        })?;

        let statement = token.statement();
        let record = SecretRecord {
            token_id: *token.id(),
            resource,
            recipient: statement.audience().clone(),
            expires_at: statement.constraints().expires_at(),
            usage_limit: statement.constraints().usage_limit().get(),
            share_link: self.share_link(&blob, &token)?,
            created_at: Timestamp::from_unix(self.clock.now()),
        };
        self.records.insert(record.clone()).await?;

        tracing::info!(token = %record.token_id, %blob, "shared secret");
        Ok(SharedSecret {
            token,
            blob,
            record,
        })
    }

    /// Validate `token` against the secret stored as `blob` and, if it is
    /// accepted, return the encrypted secret.
    ///
    /// The secret is read and checked before the token is validated, so a
    /// missing or damaged blob fails without consuming a use.
    pub async fn redeem(
        &self,
        token: &str,
        blob: &Cid,
        audience: Option<Did>,
    ) -> Result<RedeemOutcome, VaultError> {
        let mut expected = Expectation::new(resource_for(blob)?);
        if let Some(audience) = audience {
            expected = expected.audience(audience);
        }

        let secret = self
            .blobs
            .get(blob)
            .await?
            .ok_or(VaultError::MissingBlob(*blob))?;

        match self.validator.validate(token, &expected).await {
            Verdict::Valid { remaining_uses } => Ok(RedeemOutcome::Granted {
                secret,
                remaining_uses,
            }),
            Verdict::Invalid(reason) => Ok(RedeemOutcome::Refused(reason)),
        }
    }

    /// Decode a token for display. Consumes nothing.
    pub fn inspect(&self, token: &str) -> Result<TokenSummary, VaultError> {
        inspect(token)
    }

    /// Every shared secret with its remaining uses and expiry state.
    pub async fn records(&self) -> Result<Vec<RecordStatus>, VaultError> {
        let now = Timestamp::from_unix(self.clock.now());
        let mut statuses = Vec::new();
        for record in self.records.list().await? {
            statuses.push(self.status(record, now).await?);
        }
        Ok(statuses)
    }

    /// The share made under token `id`, if this vault issued it.
    pub async fn record(&self, id: &TokenId) -> Result<Option<RecordStatus>, VaultError> {
        let now = Timestamp::from_unix(self.clock.now());
        match self.records.get(id).await? {
            Some(record) => Ok(Some(self.status(record, now).await?)),
            None => Ok(None),
        }
    }

    async fn status(
        &self,
        record: SecretRecord,
        now: Timestamp,
    ) -> Result<RecordStatus, VaultError> {
        let remaining_uses = self
            .validator
            .tracker()
            .remaining(&record.token_id)
            .await?
            .unwrap_or(record.usage_limit);
        Ok(RecordStatus {
            expired: now > record.expires_at,
            remaining_uses,
            record,
        })
    }

    fn share_link(&self, blob: &Cid, token: &DelegationToken) -> Result<Url, VaultError> {
        let mut link = self.gateway.clone();
        link.path_segments_mut()
            .map_err(|()| VaultError::ShareLink(self.gateway.to_string()))?
            .pop_if_empty()
            .push(&blob.to_string())
            .push(&token.to_text());
        Ok(link)
    }
}

/// Decode a token for display, without any vault.
pub fn inspect(token: &str) -> Result<TokenSummary, VaultError> {
    let decoded = DelegationToken::from_text(token)?;
    Ok(TokenSummary::from(&decoded))
}

/// Split a share link back into the blob CID and the token text.
pub fn parse_share_link(link: &Url) -> Option<(Cid, String)> {
    let mut segments = link.path_segments()?.rev().filter(|s| !s.is_empty());
    let token = segments.next()?.to_owned();
    let blob = segments.next()?.parse().ok()?;
    Some((blob, token))
}
