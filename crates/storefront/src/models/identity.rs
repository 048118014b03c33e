//! Identity claims decoded from an ID token.

use serde::{Deserialize, Serialize};

use bento_core::{PrincipalType, StoreId, SubjectId};

/// Claims of interest from the identity provider's ID token.
///
/// Claims are decoded without signature verification; the token arrives
/// directly from the token endpoint over TLS. The `type` tag is not issued by
/// the provider, it is written by the storefront after decoding so the
/// session remembers which user pool the visitor logged in through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject identifier, unique within the user pool.
    pub sub: SubjectId,
    /// Which user pool the visitor authenticated against.
    #[serde(rename = "type", default)]
    pub principal: PrincipalType,
    /// Username assigned by the user pool.
    #[serde(
        rename = "cognito:username",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub username: Option<String>,
    /// Full name, when the pool collects one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl IdentityClaims {
    /// Name shown in the navigation bar.
    ///
    /// Falls back from username to full name to email to the subject.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .or(self.name.as_deref())
            .or(self.email.as_deref())
            .unwrap_or_else(|| self.sub.as_str())
    }

    /// The store a store owner manages.
    ///
    /// A store account's subject doubles as its store ID. Consumers have none.
    #[must_use]
    pub fn store_id(&self) -> Option<StoreId> {
        if !self.principal.is_store() {
            return None;
        }
        StoreId::parse(self.sub.as_str()).ok()
    }
}
