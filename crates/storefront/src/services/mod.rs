//! Business logic services for storefront.
//!
//! # Services
//!
//! - `identity` - Hosted-UI login, code exchange and logout for both user pools
//! - `catalog` - Read-only catalog sync with image resolution
//! - `console` - Store owner writes, each followed by a re-sync
//! - `favorites` - Consumer favorite flags
//! - `chat` - Bounded chat transcripts backed by a remote bot

pub mod catalog;
pub mod chat;
pub mod console;
pub mod favorites;
pub mod identity;

pub use catalog::{Catalog, CatalogSync, DisplayBento};
pub use chat::{ChatError, ChatService};
pub use console::{BentoInput, Confirmation, Console, ConsoleError};
pub use favorites::Favorites;
pub use identity::{IdentityClient, IdentityError};
