//! The unsigned capability statement carried inside a delegation token.

use crate::{
    ability::Ability, constraints::Constraints, envelope::PayloadTag, nonce::Nonce,
    resource::Resource,
};
use secret_share_credentials::Did;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, MapAccess, Visitor},
};
use std::borrow::Cow;

/// A grant of one [`Ability`] over one [`Resource`], from an issuer to an
/// audience, under a set of [`Constraints`].
///
/// On the wire the fields are `iss`, `aud`, `with`, `can`, `nb` and `nonce`.
/// Decoding rejects unknown, duplicate or missing fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityStatement {
    #[serde(rename = "iss")]
    pub(crate) issuer: Did,

    #[serde(rename = "aud")]
    pub(crate) audience: Did,

    #[serde(rename = "with")]
    pub(crate) resource: Resource,

    #[serde(rename = "can")]
    pub(crate) ability: Ability,

    #[serde(rename = "nb")]
    pub(crate) constraints: Constraints,

    pub(crate) nonce: Nonce,
}

impl CapabilityStatement {
    /// Start building a statement.
    #[must_use]
    pub fn builder() -> StatementBuilder {
        StatementBuilder::default()
    }

    /// Getter for the `issuer` field.
    #[must_use]
    pub const fn issuer(&self) -> &Did {
        &self.issuer
    }

    /// Getter for the `audience` field.
    #[must_use]
    pub const fn audience(&self) -> &Did {
        &self.audience
    }

    /// Getter for the `resource` field.
    #[must_use]
    pub const fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Getter for the `ability` field.
    #[must_use]
    pub const fn ability(&self) -> Ability {
        self.ability
    }

    /// Getter for the `constraints` field.
    #[must_use]
    pub const fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Getter for the `nonce` field.
    #[must_use]
    pub const fn nonce(&self) -> &Nonce {
        &self.nonce
    }
}

impl PayloadTag for CapabilityStatement {
    fn spec_id() -> &'static str {
        "secret"
    }

    fn version() -> &'static str {
        "1.0.0"
    }
}

impl<'de> Deserialize<'de> for CapabilityStatement {
    fn deserialize<T>(deserializer: T) -> Result<Self, T::Error>
    where
        T: Deserializer<'de>,
    {
        const FIELDS: &[&str] = &["iss", "aud", "with", "can", "nb", "nonce"];

        struct StatementVisitor;

        impl<'de> Visitor<'de> for StatementVisitor {
            type Value = CapabilityStatement;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map with keys iss,aud,with,can,nb,nonce")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut issuer: Option<Did> = None;
                let mut audience: Option<Did> = None;
                let mut resource: Option<Resource> = None;
                let mut ability: Option<Ability> = None;
                let mut constraints: Option<Constraints> = None;
                let mut nonce: Option<Nonce> = None;

                while let Some(key) = map.next_key::<Cow<'de, str>>()? {
                    match key.as_ref() {
                        "iss" => {
                            if issuer.is_some() {
                                return Err(de::Error::duplicate_field("iss"));
                            }
                            issuer = Some(map.next_value()?);
                        }
                        "aud" => {
                            if audience.is_some() {
                                return Err(de::Error::duplicate_field("aud"));
                            }
                            audience = Some(map.next_value()?);
                        }
                        "with" => {
                            if resource.is_some() {
                                return Err(de::Error::duplicate_field("with"));
                            }
                            resource = Some(map.next_value()?);
                        }
                        "can" => {
                            if ability.is_some() {
                                return Err(de::Error::duplicate_field("can"));
                            }
                            ability = Some(map.next_value()?);
                        }
                        "nb" => {
                            if constraints.is_some() {
                                return Err(de::Error::duplicate_field("nb"));
                            }
                            constraints = Some(map.next_value()?);
                        }
                        "nonce" => {
                            if nonce.is_some() {
                                return Err(de::Error::duplicate_field("nonce"));
                            }
                            nonce = Some(map.next_value()?);
                        }
                        other => {
                            return Err(de::Error::unknown_field(other, FIELDS));
                        }
                    }
                }

                Ok(CapabilityStatement {
                    issuer: issuer.ok_or_else(|| de::Error::missing_field("iss"))?,
                    audience: audience.ok_or_else(|| de::Error::missing_field("aud"))?,
                    resource: resource.ok_or_else(|| de::Error::missing_field("with"))?,
                    ability: ability.ok_or_else(|| de::Error::missing_field("can"))?,
                    constraints: constraints.ok_or_else(|| de::Error::missing_field("nb"))?,
                    nonce: nonce.ok_or_else(|| de::Error::missing_field("nonce"))?,
                })
            }
        }

        deserializer.deserialize_map(StatementVisitor)
    }
}

/// Errors from [`StatementBuilder::try_build`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum StatementBuilderError {
    /// A required field was never set.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// No nonce was given and none could be generated.
    #[error("unable to generate nonce: {0}")]
    Nonce(getrandom::Error),
}

/// Builder for [`CapabilityStatement`].
///
/// The ability defaults to [`Ability::AccessSecret`] and the nonce to a
/// fresh random value.
#[derive(Debug, Clone, Default)]
pub struct StatementBuilder {
    issuer: Option<Did>,
    audience: Option<Did>,
    resource: Option<Resource>,
    ability: Ability,
    constraints: Option<Constraints>,
    nonce: Option<Nonce>,
}

impl StatementBuilder {
    /// Set the issuer.
    #[must_use]
    pub fn issuer(mut self, issuer: Did) -> Self {
        self.issuer = Some(issuer);
        self
    }

    /// Set the audience.
    #[must_use]
    pub fn audience(mut self, audience: Did) -> Self {
        self.audience = Some(audience);
        self
    }

    /// Set the resource.
    #[must_use]
    pub fn resource(mut self, resource: Resource) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Set the ability.
    #[must_use]
    pub fn ability(mut self, ability: Ability) -> Self {
        self.ability = ability;
        self
    }

    /// Set the constraints.
    #[must_use]
    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// Pin the nonce instead of drawing a random one.
    #[must_use]
    pub fn nonce(mut self, nonce: Nonce) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Finish the statement.
    ///
    /// # Errors
    ///
    /// Returns [`StatementBuilderError::MissingField`] if the issuer,
    /// audience, resource or constraints were not set, or
    /// [`StatementBuilderError::Nonce`] if a nonce had to be generated and the
    /// RNG failed.
    pub fn try_build(self) -> Result<CapabilityStatement, StatementBuilderError> {
        let nonce = match self.nonce {
            Some(nonce) => nonce,
            None => Nonce::generate().map_err(StatementBuilderError::Nonce)?,
        };

        Ok(CapabilityStatement {
            issuer: self
                .issuer
                .ok_or(StatementBuilderError::MissingField("issuer"))?,
            audience: self
                .audience
                .ok_or(StatementBuilderError::MissingField("audience"))?,
            resource: self
                .resource
                .ok_or(StatementBuilderError::MissingField("resource"))?,
            ability: self.ability,
            constraints: self
                .constraints
                .ok_or(StatementBuilderError::MissingField("constraints"))?,
            nonce,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Timestamp;
    use pretty_assertions::assert_eq;
    use std::num::NonZeroU32;
    use testresult::TestResult;

    fn test_statement() -> TestResult<CapabilityStatement> {
        Ok(CapabilityStatement::builder()
            .issuer("did:key:z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp".parse()?)
            .audience("did:key:zAbc".parse()?)
            .resource(Resource::new("bag123")?)
            .constraints(Constraints::new(
                NonZeroU32::MIN,
                Timestamp::from_unix(1_700_000_600),
            ))
            .nonce(Nonce::from([7; 16]))
            .try_build()?)
    }

    #[test]
    fn it_round_trips_through_dag_cbor() -> TestResult {
        let statement = test_statement()?;
        let bytes = serde_ipld_dagcbor::to_vec(&statement)?;
        let back: CapabilityStatement = serde_ipld_dagcbor::from_slice(&bytes)?;
        assert_eq!(back, statement);
        Ok(())
    }

    #[test]
    fn it_uses_the_wire_field_names() -> TestResult {
        let value = serde_json::to_value(test_statement()?)?;
        let keys: Vec<&str> = value
            .as_object()
            .ok_or("not an object")?
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys.len(), 6);
        for key in ["iss", "aud", "with", "can", "nb", "nonce"] {
            assert!(keys.contains(&key), "missing {key}");
        }
        assert_eq!(value["can"], "access/secret");
        assert_eq!(value["nb"]["usage"], 1);
        Ok(())
    }

    #[test]
    fn it_rejects_unknown_fields() -> TestResult {
        let mut value = serde_json::to_value(test_statement()?)?;
        value["sub"] = serde_json::Value::Null;
        let error = serde_json::from_value::<CapabilityStatement>(value)
            .err()
            .ok_or("should fail")?;
        assert!(error.to_string().contains("unknown field `sub`"), "{error}");
        Ok(())
    }

    #[test]
    fn it_rejects_missing_fields() -> TestResult {
        let mut value = serde_json::to_value(test_statement()?)?;
        value.as_object_mut().ok_or("not an object")?.remove("aud");
        let error = serde_json::from_value::<CapabilityStatement>(value)
            .err()
            .ok_or("should fail")?;
        assert!(error.to_string().contains("missing field `aud`"), "{error}");
        Ok(())
    }

    #[test]
    fn it_rejects_other_abilities() -> TestResult {
        let mut value = serde_json::to_value(test_statement()?)?;
        value["can"] = "store/add".into();
        assert!(serde_json::from_value::<CapabilityStatement>(value).is_err());
        Ok(())
    }

    #[test]
    fn builder_requires_resource() -> TestResult {
        let result = CapabilityStatement::builder()
            .issuer("did:key:zIssuer".parse()?)
            .audience("did:key:zAbc".parse()?)
            .constraints(Constraints::new(NonZeroU32::MIN, 1.into()))
            .try_build();
        assert!(matches!(
            result,
            Err(StatementBuilderError::MissingField("resource"))
        ));
        Ok(())
    }

    #[test]
    fn builder_draws_distinct_nonces() -> TestResult {
        let build = || -> TestResult<CapabilityStatement> {
            Ok(CapabilityStatement::builder()
                .issuer("did:key:zIssuer".parse()?)
                .audience("did:key:zAbc".parse()?)
                .resource(Resource::new("bag123")?)
                .constraints(Constraints::new(NonZeroU32::MIN, 1.into()))
                .try_build()?)
        };
        assert_ne!(build()?.nonce(), build()?.nonce());
        Ok(())
    }
}
