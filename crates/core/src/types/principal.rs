//! Principal types.
//!
//! The identity provider runs two separate user pools: one for consumers who
//! browse and favorite bentos, and one for store owners who manage inventory.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a principal type string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown principal type: {0}")]
pub struct PrincipalTypeError(pub String);

/// The kind of account a session belongs to.
///
/// Serialized as `"store"` or `"consumer"`, matching the `type` tag written
/// into the persisted identity claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalType {
    /// A shopper.
    #[default]
    Consumer,
    /// A store owner with console access.
    Store,
}

impl PrincipalType {
    /// Stable string form, used in URLs and the claims tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Consumer => "consumer",
            Self::Store => "store",
        }
    }

    /// Whether this principal may use the store console.
    #[must_use]
    pub const fn is_store(self) -> bool {
        matches!(self, Self::Store)
    }
}

impl fmt::Display for PrincipalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PrincipalType {
    type Err = PrincipalTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consumer" | "user" => Ok(Self::Consumer),
            "store" => Ok(Self::Store),
            other => Err(PrincipalTypeError(other.to_owned())),
        }
    }
}
