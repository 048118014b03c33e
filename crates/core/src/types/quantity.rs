//! Stock quantity.
//!
//! Availability of a bento is derived from its stock count; there is no
//! separate availability flag.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Number of portions a store currently has on hand.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// Sold out.
    pub const ZERO: Self = Self(0);

    /// Create a quantity from a raw count.
    #[must_use]
    pub const fn new(count: u32) -> Self {
        Self(count)
    }

    /// Map a legacy on/off availability flag onto a quantity.
    ///
    /// `true` becomes one portion so that `is_available` holds.
    #[must_use]
    pub const fn from_available(available: bool) -> Self {
        if available { Self(1) } else { Self(0) }
    }

    /// Get the raw count.
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0
    }

    /// Whether at least one portion is in stock.
    #[must_use]
    pub const fn is_available(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Quantity {
    fn from(count: u32) -> Self {
        Self(count)
    }
}
