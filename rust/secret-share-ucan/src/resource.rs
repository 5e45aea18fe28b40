//! Resources a delegation refers to.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Opaque reference to the protected object, typically a storage address
/// like `storage://bafkrei...`.
///
/// The only rule is that it is not empty; the validator compares it
/// byte-for-byte against what the redeeming party expects.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Resource(String);

/// A resource reference was empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("resource reference must not be empty")]
pub struct EmptyResource;

impl Resource {
    /// Wrap a non-empty reference.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyResource`] for an empty string.
    pub fn new(reference: impl Into<String>) -> Result<Self, EmptyResource> {
        let reference = reference.into();
        if reference.is_empty() {
            return Err(EmptyResource);
        }
        Ok(Resource(reference))
    }

    /// The reference as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resource({})", self.0)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Resource {
    type Err = EmptyResource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::new(s)
    }
}

impl AsRef<str> for Resource {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Resource::new(String::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }
}
