//! Core types for the bento storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod principal;
pub mod quantity;

pub use id::*;
pub use principal::{PrincipalType, PrincipalTypeError};
pub use quantity::Quantity;
