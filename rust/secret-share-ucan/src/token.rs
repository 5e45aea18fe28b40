//! Delegation tokens: encoding, decoding and text transport.

use crate::{
    cid::TokenId,
    envelope::{Envelope, EnvelopePayload},
    error::{EncodeError, MalformedToken},
    statement::CapabilityStatement,
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use secret_share_credentials::{
    Authority, Did, Ed25519KeyResolver, Ed25519Signature, Resolver, sign,
};
use signature::Verifier;
use std::fmt;

/// A signed, content-addressed capability statement.
///
/// The bytes are the canonical DAG-CBOR encoding of the signed envelope;
/// [`DelegationToken::id`] is the CID of exactly those bytes. A token is
/// immutable: any change to the statement requires encoding a new one.
#[derive(Clone, PartialEq, Eq)]
pub struct DelegationToken {
    bytes: Vec<u8>,
    envelope: Envelope<CapabilityStatement>,
    id: TokenId,
}

impl DelegationToken {
    /// Sign `statement` as `issuer` and encode it.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::IssuerMismatch`] if the statement names
    /// someone other than `issuer`, [`EncodeError::Signing`] if signing
    /// fails, or [`EncodeError::Cbor`] if encoding fails.
    pub fn encode<A>(statement: CapabilityStatement, issuer: &A) -> Result<Self, EncodeError>
    where
        A: Authority + ?Sized,
    {
        let signer = issuer.did();
        if statement.issuer() != &signer {
            return Err(EncodeError::IssuerMismatch {
                statement: statement.issuer().clone(),
                signer,
            });
        }

        let payload = EnvelopePayload::from(statement);
        let signature = sign(issuer, &payload.encode()?).map_err(EncodeError::Signing)?;
        let envelope = Envelope(signature, payload);

        let bytes =
            serde_ipld_dagcbor::to_vec(&envelope).map_err(|e| EncodeError::Cbor(e.to_string()))?;
        let id = TokenId::of(&bytes);

        Ok(DelegationToken {
            bytes,
            envelope,
            id,
        })
    }

    /// Parse token bytes and check the issuer's signature, resolving the
    /// issuer as an Ed25519 `did:key`.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedToken`] if the bytes are not the canonical
    /// encoding of a token. An invalid signature is not an error.
    pub fn decode(bytes: &[u8]) -> Result<DecodedToken, MalformedToken> {
        Self::decode_with(bytes, &Ed25519KeyResolver)
    }

    /// Like [`Self::decode`], resolving the issuer through `resolver`.
    ///
    /// An issuer the resolver cannot turn into a verifier yields
    /// `signature_valid: false`.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedToken`] if the bytes are not the canonical
    /// encoding of a token.
    pub fn decode_with<R: Resolver>(
        bytes: &[u8],
        resolver: &R,
    ) -> Result<DecodedToken, MalformedToken> {
        let envelope: Envelope<CapabilityStatement> = serde_ipld_dagcbor::from_slice(bytes)
            .map_err(|e| MalformedToken::Structure(e.to_string()))?;

        let signed = envelope
            .1
            .encode()
            .map_err(|e| MalformedToken::Structure(e.to_string()))?;
        let canonical = serde_ipld_dagcbor::to_vec(&envelope)
            .map_err(|e| MalformedToken::Structure(e.to_string()))?;
        if canonical != bytes {
            return Err(MalformedToken::NonCanonical);
        }

        let issuer = envelope.1.payload.issuer();
        let signature_valid = match resolver.resolve(issuer) {
            Ok(verifier) => verifier.verify(&signed, &envelope.0).is_ok(),
            Err(error) => {
                tracing::debug!(%issuer, %error, "unable to resolve token issuer");
                false
            }
        };

        let token = DelegationToken {
            id: TokenId::of(bytes),
            bytes: canonical,
            envelope,
        };

        Ok(DecodedToken {
            token,
            signature_valid,
        })
    }

    /// Decode the base64url text form produced by [`Self::to_text`].
    ///
    /// # Errors
    ///
    /// Returns [`MalformedToken::Text`] if the text is not base64url, or any
    /// other [`MalformedToken`] from [`Self::decode`].
    pub fn from_text(text: &str) -> Result<DecodedToken, MalformedToken> {
        Self::decode(&Self::text_to_bytes(text)?)
    }

    /// Decode base64url text into raw token bytes without parsing them.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedToken::Text`] if the text is not base64url.
    pub fn text_to_bytes(text: &str) -> Result<Vec<u8>, MalformedToken> {
        URL_SAFE_NO_PAD
            .decode(text.trim())
            .map_err(|e| MalformedToken::Text(e.to_string()))
    }

    /// The token as unpadded base64url, safe to embed in a URL path segment.
    #[must_use]
    pub fn to_text(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.bytes)
    }

    /// The canonical encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The token's content identifier.
    #[must_use]
    pub const fn id(&self) -> &TokenId {
        &self.id
    }

    /// The signed statement.
    #[must_use]
    pub const fn statement(&self) -> &CapabilityStatement {
        &self.envelope.1.payload
    }

    /// The issuer's signature over the statement.
    #[must_use]
    pub const fn signature(&self) -> &Ed25519Signature {
        &self.envelope.0
    }
}

impl fmt::Debug for DelegationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegationToken")
            .field("id", &self.id)
            .field("statement", self.statement())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for DelegationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// The result of decoding a token: the token itself and whether its
/// signature checked out against the issuer it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    token: DelegationToken,
    signature_valid: bool,
}

impl DecodedToken {
    /// The decoded token.
    #[must_use]
    pub const fn token(&self) -> &DelegationToken {
        &self.token
    }

    /// The signed statement.
    #[must_use]
    pub const fn statement(&self) -> &CapabilityStatement {
        self.token.statement()
    }

    /// The identity that claims to have issued the token.
    #[must_use]
    pub const fn issuer(&self) -> &Did {
        self.token.statement().issuer()
    }

    /// Whether the signature verified against [`Self::issuer`].
    #[must_use]
    pub const fn signature_valid(&self) -> bool {
        self.signature_valid
    }

    /// The token's content identifier.
    #[must_use]
    pub const fn id(&self) -> &TokenId {
        self.token.id()
    }

    /// Take the token, discarding the verification result.
    #[must_use]
    pub fn into_token(self) -> DelegationToken {
        self.token
    }
}
