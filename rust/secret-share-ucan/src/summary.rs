//! Read-only token inspection.

use crate::{ability::Ability, cid::TokenId, time::Timestamp, token::DecodedToken};
use secret_share_credentials::Did;
use serde::Serialize;

/// A human-facing view of a decoded token.
///
/// Building a summary never touches a usage tracker, so inspecting a token
/// does not consume a use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSummary {
    /// Content identifier of the token bytes.
    pub id: TokenId,
    /// Who signed the token.
    pub issuer: Did,
    /// Who may redeem it.
    pub audience: Did,
    /// The stored secret it grants access to.
    pub resource: String,
    /// What the audience may do.
    pub ability: Ability,
    /// Total redemptions allowed.
    pub usage_limit: u32,
    /// Last second at which the token is valid.
    pub expires_at: Timestamp,
    /// Whether the signature verified against the issuer.
    pub signature_valid: bool,
}

impl From<&DecodedToken> for TokenSummary {
    fn from(decoded: &DecodedToken) -> Self {
        let statement = decoded.statement();
        TokenSummary {
            id: *decoded.id(),
            issuer: statement.issuer().clone(),
            audience: statement.audience().clone(),
            resource: statement.resource().as_str().to_owned(),
            ability: statement.ability(),
            usage_limit: statement.constraints().usage_limit().get(),
            expires_at: statement.constraints().expires_at(),
            signature_valid: decoded.signature_valid(),
        }
    }
}
