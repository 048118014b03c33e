//! Bento Core - Shared types library.
//!
//! This crate provides the domain types used by the bento storefront:
//! - `storefront` - Public catalog, favorites, chat and the store-owner console
//! - `integration-tests` - End-to-end tests against a fake backend
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no session
//! handling. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for backend identifiers, principal types and
//!   stock quantities

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
