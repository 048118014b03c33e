//! Cache types for backend responses.

use crate::models::StoreProfile;

/// Cache key for backend reads.
///
/// Only the public store directory is cached; item lists must always reflect
/// the latest console writes.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    StoreDirectory,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Stores(Vec<StoreProfile>),
}
