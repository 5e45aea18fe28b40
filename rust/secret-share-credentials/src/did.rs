//! Decentralized identifiers.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A [Decentralized Identifier][did-core] naming a token party.
///
/// Only the generic `did:<method>:<identifier>` shape is enforced. A token's
/// audience may be any DID the recipient controls; the issuer additionally
/// has to be a resolvable `did:key` for its signature to verify, but that is
/// checked by a [`Resolver`](crate::Resolver), not here.
///
/// [did-core]: https://www.w3.org/TR/did-core/
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Did(String);

impl Did {
    /// Wrap a string already known to be a well-formed DID.
    pub(crate) fn from_trusted(did: String) -> Self {
        Did(did)
    }

    /// The raw DID string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The DID method, e.g. `"key"` for `did:key:z6Mk...`.
    #[must_use]
    pub fn method(&self) -> &str {
        self.0
            .strip_prefix("did:")
            .and_then(|rest| rest.split(':').next())
            .unwrap_or_default()
    }

    /// Everything after `did:<method>:`.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.0
            .strip_prefix("did:")
            .and_then(|rest| rest.split_once(':'))
            .map(|(_, identifier)| identifier)
            .unwrap_or_default()
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error when parsing a DID string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid DID: {0}")]
pub struct DidParseError(pub String);

impl FromStr for Did {
    type Err = DidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("did:")
            .ok_or_else(|| DidParseError(format!("expected did: prefix, got: {s}")))?;

        let (method, identifier) = rest.split_once(':').ok_or_else(|| {
            DidParseError(format!("expected did:method:identifier, got: {s}"))
        })?;

        if method.is_empty()
            || !method
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        {
            return Err(DidParseError(format!("invalid DID method in: {s}")));
        }

        if identifier.is_empty() || identifier.chars().any(char::is_whitespace) {
            return Err(DidParseError(format!("invalid DID identifier in: {s}")));
        }

        Ok(Did(s.to_string()))
    }
}

impl TryFrom<String> for Did {
    type Error = DidParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Serialize for Did {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Did {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    #[test]
    fn it_accepts_did_key_with_opaque_identifier() -> TestResult {
        let did: Did = "did:key:zAbc".parse()?;
        assert_eq!(did.method(), "key");
        assert_eq!(did.identifier(), "zAbc");
        Ok(())
    }

    #[test]
    fn it_keeps_colons_inside_the_identifier() -> TestResult {
        let did: Did = "did:web:example.com:users:alice".parse()?;
        assert_eq!(did.method(), "web");
        assert_eq!(did.identifier(), "example.com:users:alice");
        Ok(())
    }

    #[test]
    fn it_rejects_non_dids() {
        for input in [
            "",
            "not-a-did",
            "did:",
            "did:key",
            "did:key:",
            "did::zAbc",
            "did:KEY:zAbc",
            "did:key:z Abc",
        ] {
            assert!(input.parse::<Did>().is_err(), "{input:?} should not parse");
        }
    }

    #[test]
    fn it_serializes_as_a_plain_string() -> TestResult {
        let did: Did = "did:key:zAbc".parse()?;
        let json = serde_json::to_string(&did)?;
        assert_eq!(json, r#""did:key:zAbc""#);

        let back: Did = serde_json::from_str(&json)?;
        assert_eq!(back, did);

        assert!(serde_json::from_str::<Did>(r#""mailto:someone""#).is_err());
        Ok(())
    }
}
