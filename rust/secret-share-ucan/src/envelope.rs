//! Top-level Varsig envelope.
//!
//! A token is the DAG-CBOR encoding of
//!
//! ```text
//! [ signature, { "h": varsig-header, "ucan/secret@1.0.0": statement } ]
//! ```
//!
//! where the signature covers the DAG-CBOR bytes of the inner map.

pub mod header;

use crate::error::EncodeError;
use header::VarsigHeader;
use secret_share_credentials::Ed25519Signature;
use serde::{
    Deserialize, Serialize,
    de::{self, Deserializer, MapAccess, SeqAccess, Visitor},
    ser::{SerializeMap, SerializeTuple},
};
use std::{fmt, marker::PhantomData};

/// Names the payload type inside an envelope.
pub trait PayloadTag {
    /// Short identifier of the payload kind.
    fn spec_id() -> &'static str;

    /// Payload format version.
    fn version() -> &'static str;

    /// The map key under which the payload is stored.
    #[must_use]
    fn tag() -> String {
        format!("ucan/{}@{}", Self::spec_id(), Self::version())
    }
}

/// A signed envelope around a payload `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope<T>(
    /// Envelope signature.
    pub Ed25519Signature,
    /// The signed part.
    pub EnvelopePayload<T>,
);

impl<T: Serialize + PayloadTag> Serialize for Envelope<T> {
    fn serialize<Ser: serde::Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        let mut seq = serializer.serialize_tuple(2)?;
        seq.serialize_element(&self.0)?;
        seq.serialize_element(&self.1)?;
        seq.end()
    }
}

impl<'de, T> Deserialize<'de> for Envelope<T>
where
    T: PayloadTag + for<'any> Deserialize<'any>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EnvelopeVisitor<T>(PhantomData<T>);

        impl<'de, T> Visitor<'de> for EnvelopeVisitor<T>
        where
            T: PayloadTag + for<'any> Deserialize<'any>,
        {
            type Value = Envelope<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 2-element sequence [signature, payload]")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let signature: Ed25519Signature = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;

                let payload: EnvelopePayload<T> = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;

                if seq.next_element::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(3, &self));
                }

                Ok(Envelope(signature, payload))
            }
        }

        deserializer.deserialize_tuple(2, EnvelopeVisitor(PhantomData))
    }
}

/// The signed part of an [`Envelope`]: a Varsig header and the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopePayload<T> {
    /// Varsig header.
    pub header: VarsigHeader,

    /// Payload data.
    pub payload: T,
}

impl<T> From<T> for EnvelopePayload<T> {
    fn from(payload: T) -> Self {
        EnvelopePayload {
            header: VarsigHeader::default(),
            payload,
        }
    }
}

impl<T: Serialize + PayloadTag> EnvelopePayload<T> {
    /// The bytes that get signed: the DAG-CBOR encoding of this map.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::Cbor`] if the payload cannot be encoded.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        serde_ipld_dagcbor::to_vec(self).map_err(|e| EncodeError::Cbor(e.to_string()))
    }
}

impl<T: Serialize + PayloadTag> Serialize for EnvelopePayload<T> {
    fn serialize<Ser: serde::Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("h", &self.header)?;
        map.serialize_entry(&T::tag(), &self.payload)?;
        map.end()
    }
}

impl<'de, T> Deserialize<'de> for EnvelopePayload<T>
where
    T: PayloadTag + for<'any> Deserialize<'any>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct InnerVisitor<T>(PhantomData<T>);

        impl<'vde, T> Visitor<'vde> for InnerVisitor<T>
        where
            T: PayloadTag + for<'any> Deserialize<'any>,
        {
            type Value = EnvelopePayload<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, r#"a map with "h" and "{}""#, T::tag())
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'vde>,
            {
                let tag = T::tag();
                let mut header: Option<VarsigHeader> = None;
                let mut payload: Option<T> = None;

                while let Some(key) = map.next_key::<String>()? {
                    if key == "h" {
                        if header.is_some() {
                            return Err(de::Error::duplicate_field("h"));
                        }
                        header = Some(map.next_value()?);
                    } else if key == tag {
                        if payload.is_some() {
                            return Err(de::Error::custom(format!("duplicate field `{tag}`")));
                        }
                        let value: serde_value::Value = map.next_value()?;
                        payload = Some(T::deserialize(value).map_err(de::Error::custom)?);
                    } else {
                        return Err(de::Error::custom(format!(
                            "unexpected payload tag `{key}`, expected `{tag}`"
                        )));
                    }
                }

                let header = header.ok_or_else(|| de::Error::missing_field("h"))?;
                let payload =
                    payload.ok_or_else(|| de::Error::custom(format!("missing `{tag}`")))?;

                Ok(EnvelopePayload { header, payload })
            }
        }

        deserializer.deserialize_map(InnerVisitor::<T>(PhantomData))
    }
}
