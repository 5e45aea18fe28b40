//! Varsig header describing how an envelope was signed.
//!
//! The header is a byte string of LEB128 varints:
//!
//! ```text
//! 0x34        varsig prefix
//! 0x01        varsig version
//! 0xed        EdDSA
//! 0xed        curve: edwards25519
//! 0x13        hash: sha2-512
//! 0x71        payload encoding: DAG-CBOR
//! ```
//!
//! Only this one configuration is produced or accepted.

use serde::{Deserialize, Serialize};

const VARSIG_PREFIX: u64 = 0x34;
const VARSIG_VERSION: u64 = 0x01;

/// Signature algorithm named by a varsig header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignatureAlgorithm {
    /// EdDSA over edwards25519 with SHA2-512.
    #[default]
    Ed25519,
}

impl SignatureAlgorithm {
    const fn prefix(self) -> u64 {
        match self {
            SignatureAlgorithm::Ed25519 => 0xed,
        }
    }

    const fn config_tags(self) -> [u64; 2] {
        match self {
            SignatureAlgorithm::Ed25519 => [0xed, 0x13],
        }
    }

    fn try_from_tags(tags: &[u64]) -> Option<(Self, &[u64])> {
        match tags {
            [0xed, 0xed, 0x13, rest @ ..] => Some((SignatureAlgorithm::Ed25519, rest)),
            _ => None,
        }
    }
}

/// Payload encoding named by a varsig header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PayloadEncoding {
    /// DAG-CBOR, multicodec `0x71`.
    #[default]
    DagCbor,
}

impl PayloadEncoding {
    const fn multicodec_code(self) -> u64 {
        match self {
            PayloadEncoding::DagCbor => 0x71,
        }
    }

    fn try_from_tags(tags: &[u64]) -> Option<Self> {
        match tags {
            [0x71] => Some(PayloadEncoding::DagCbor),
            _ => None,
        }
    }
}

/// A [varsig] header: which algorithm signed the envelope and how the
/// payload was encoded before signing.
///
/// [varsig]: https://github.com/ChainAgnostic/varsig/blob/main/README.md
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VarsigHeader {
    algorithm: SignatureAlgorithm,
    encoding: PayloadEncoding,
}

impl VarsigHeader {
    /// Getter for the signature algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// Getter for the payload encoding.
    #[must_use]
    pub const fn encoding(&self) -> PayloadEncoding {
        self.encoding
    }

    /// The header as raw bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let tags = [
            VARSIG_PREFIX,
            VARSIG_VERSION,
            self.algorithm.prefix(),
            self.algorithm.config_tags()[0],
            self.algorithm.config_tags()[1],
            self.encoding.multicodec_code(),
        ];

        let mut bytes = Vec::with_capacity(8);
        for tag in tags {
            // Writing into a Vec cannot fail.
            let _ = leb128::write::unsigned(&mut bytes, tag);
        }
        bytes
    }

    /// Parse a header from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError`] when the bytes are not a supported varsig
    /// header.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HeaderError> {
        let mut cursor = std::io::Cursor::new(bytes);
        let len = bytes.len() as u64;

        let mut tags = Vec::new();
        while cursor.position() < len {
            let tag = leb128::read::unsigned(&mut cursor)
                .map_err(|e| HeaderError::Varint(e.to_string()))?;
            tags.push(tag);
        }

        match tags.as_slice() {
            [VARSIG_PREFIX, VARSIG_VERSION, rest @ ..] => {
                let (algorithm, rest) = SignatureAlgorithm::try_from_tags(rest)
                    .ok_or(HeaderError::UnsupportedAlgorithm)?;
                let encoding = PayloadEncoding::try_from_tags(rest)
                    .ok_or(HeaderError::UnsupportedEncoding)?;
                let header = VarsigHeader {
                    algorithm,
                    encoding,
                };

                // Reject overlong varints: only the canonical spelling is accepted.
                if header.to_bytes() != bytes {
                    return Err(HeaderError::NonCanonical);
                }
                Ok(header)
            }
            [VARSIG_PREFIX, version, ..] => Err(HeaderError::UnsupportedVersion(*version)),
            _ => Err(HeaderError::MissingPrefix),
        }
    }
}

/// Why a varsig header could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    /// A tag is not a valid LEB128 varint.
    #[error("unable to read leb128 unsigned: {0}")]
    Varint(String),

    /// The header does not start with the varsig prefix `0x34`.
    #[error("expected varsig tag 0x34")]
    MissingPrefix,

    /// The varsig version is not `0x01`.
    #[error("expected varsig version tag 0x01, found {0:#x}")]
    UnsupportedVersion(u64),

    /// The signature algorithm tags are not Ed25519.
    #[error("unsupported signature algorithm")]
    UnsupportedAlgorithm,

    /// The payload encoding is not DAG-CBOR.
    #[error("unsupported payload encoding")]
    UnsupportedEncoding,

    /// The header uses a non-minimal varint spelling.
    #[error("varsig header is not canonically encoded")]
    NonCanonical,
}

impl Serialize for VarsigHeader {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.to_bytes())
    }
}

impl<'de> Deserialize<'de> for VarsigHeader {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bytes = serde_bytes::ByteBuf::deserialize(deserializer).map_err(|e| {
            serde::de::Error::custom(format!("unable to deserialize varsig header: {e}"))
        })?;
        VarsigHeader::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    #[test]
    fn it_encodes_ed25519_dag_cbor() {
        assert_eq!(
            VarsigHeader::default().to_bytes(),
            vec![0x34, 0x01, 0xed, 0x01, 0xed, 0x01, 0x13, 0x71]
        );
    }

    #[test]
    fn it_parses_its_own_encoding() -> TestResult {
        let header = VarsigHeader::default();
        assert_eq!(VarsigHeader::from_bytes(&header.to_bytes())?, header);
        Ok(())
    }

    #[test]
    fn it_rejects_other_configurations() {
        // secp256k1 prefix
        assert_eq!(
            VarsigHeader::from_bytes(&[0x34, 0x01, 0xe7, 0x01, 0x1b, 0x71]),
            Err(HeaderError::UnsupportedAlgorithm)
        );
        // dag-json payload
        assert_eq!(
            VarsigHeader::from_bytes(&[0x34, 0x01, 0xed, 0x01, 0xed, 0x01, 0x13, 0xa9, 0x02]),
            Err(HeaderError::UnsupportedEncoding)
        );
        assert_eq!(
            VarsigHeader::from_bytes(&[0x34, 0x02]),
            Err(HeaderError::UnsupportedVersion(2))
        );
        assert_eq!(
            VarsigHeader::from_bytes(&[0x35, 0x01]),
            Err(HeaderError::MissingPrefix)
        );
    }

    #[test]
    fn it_rejects_overlong_varints() {
        assert_eq!(
            VarsigHeader::from_bytes(&[0xb4, 0x00, 0x01, 0xed, 0x01, 0xed, 0x01, 0x13, 0x71]),
            Err(HeaderError::NonCanonical)
        );
    }
}
