//! Newtype IDs for type-safe backend references.
//!
//! The catalog backend identifies stores, items and users with opaque strings.
//! Use the `define_id!` macro to create wrappers that prevent accidentally
//! passing a store ID where an item ID is expected.

/// Error returned when an identifier is empty or blank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} cannot be empty")]
pub struct IdError {
    /// Name of the identifier type that failed to parse.
    pub kind: &'static str,
}

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `parse()` rejecting empty or whitespace-only input
/// - `as_str()`, `Display` and `FromStr`
///
/// # Example
///
/// ```rust
/// # use bento_core::define_id;
/// define_id!(TableId);
/// define_id!(WaiterId);
///
/// let table = TableId::parse("t-1").unwrap();
/// assert_eq!(table.as_str(), "t-1");
/// assert!(WaiterId::parse("  ").is_err());
///
/// // These are different types, so this won't compile:
/// // let _: WaiterId = table;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parse an ID, trimming surrounding whitespace.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is empty after trimming.
            pub fn parse(value: &str) -> ::core::result::Result<Self, $crate::IdError> {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err($crate::IdError {
                        kind: stringify!($name),
                    });
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(StoreId);
define_id!(ItemId);
define_id!(SubjectId);
