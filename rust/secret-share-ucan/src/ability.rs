//! Abilities a delegation can grant.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// What a delegation lets its audience do with the resource.
///
/// The set is closed: a token naming any other ability is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ability {
    /// Retrieve and decrypt one stored secret.
    #[default]
    AccessSecret,
}

impl Ability {
    /// The wire tag, e.g. `"access/secret"`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Ability::AccessSecret => "access/secret",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The ability tag is not one this crate understands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ability: {0}")]
pub struct UnknownAbility(pub String);

impl FromStr for Ability {
    type Err = UnknownAbility;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access/secret" => Ok(Ability::AccessSecret),
            other => Err(UnknownAbility(other.to_string())),
        }
    }
}

impl Serialize for Ability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Ability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_only_knows_access_secret() {
        assert_eq!("access/secret".parse(), Ok(Ability::AccessSecret));
        assert!("access/*".parse::<Ability>().is_err());
        assert!("/".parse::<Ability>().is_err());
    }
}
