//! Domain models for the storefront.

pub mod alert;
pub mod catalog;
pub mod chat;
pub mod identity;
pub mod session;

pub use alert::{Alert, AlertQuery};
pub use catalog::{Bento, BentoDraft, ImageRef, ImageUpload, StoreProfile};
pub use chat::{ChatMessage, ChatRole, ChatTranscript};
pub use identity::IdentityClaims;
pub use session::{
    BearerCredential, PendingLogin, SessionContext, SessionTokens, keys as session_keys,
};
