//! User-facing alerts.
//!
//! Alerts travel across a redirect as `?alert=<code>` and render as a banner.
//! Unknown codes are ignored so a hand-edited URL cannot inject text.

use serde::Deserialize;

/// A banner shown at the top of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    LoginFailed,
    LoginRequired,
    ConsumerOnly,
    IdentityNotConfigured,
    SaveFailed,
    DeleteFailed,
    FavoriteFailed,
    InvalidInput,
    NoSelection,
    Saved,
    Deleted,
    LoggedOut,
}

impl Alert {
    /// Query-string code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::LoginFailed => "login_failed",
            Self::LoginRequired => "login_required",
            Self::ConsumerOnly => "consumer_only",
            Self::IdentityNotConfigured => "identity_not_configured",
            Self::SaveFailed => "save_failed",
            Self::DeleteFailed => "delete_failed",
            Self::FavoriteFailed => "favorite_failed",
            Self::InvalidInput => "invalid_input",
            Self::NoSelection => "no_selection",
            Self::Saved => "saved",
            Self::Deleted => "deleted",
            Self::LoggedOut => "logged_out",
        }
    }

    /// Parse a query-string code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        [
            Self::LoginFailed,
            Self::LoginRequired,
            Self::ConsumerOnly,
            Self::IdentityNotConfigured,
            Self::SaveFailed,
            Self::DeleteFailed,
            Self::FavoriteFailed,
            Self::InvalidInput,
            Self::NoSelection,
            Self::Saved,
            Self::Deleted,
            Self::LoggedOut,
        ]
        .into_iter()
        .find(|alert| alert.code() == code)
    }

    /// Text shown in the banner.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::LoginFailed => "Login failed. Please try again.",
            Self::LoginRequired => "Please log in to continue.",
            Self::ConsumerOnly => "Please log in as a customer to save favorites.",
            Self::IdentityNotConfigured => "Login is not available right now.",
            Self::SaveFailed => "Saving failed. Nothing was changed.",
            Self::DeleteFailed => "Deleting failed. Nothing was changed.",
            Self::FavoriteFailed => "Could not update your favorites.",
            Self::InvalidInput => "Please check the form and try again.",
            Self::NoSelection => "Select a bento before saving.",
            Self::Saved => "Saved.",
            Self::Deleted => "Deleted.",
            Self::LoggedOut => "You have been logged out.",
        }
    }

    /// Whether the banner reports a failure.
    #[must_use]
    pub const fn is_error(self) -> bool {
        !matches!(self, Self::Saved | Self::Deleted | Self::LoggedOut)
    }

    /// Append this alert to a local path.
    #[must_use]
    pub fn redirect_to(self, path: &str) -> String {
        let separator = if path.contains('?') { '&' } else { '?' };
        format!("{path}{separator}alert={}", self.code())
    }
}

/// Query parameters carrying an alert.
#[derive(Debug, Default, Deserialize)]
pub struct AlertQuery {
    pub alert: Option<String>,
}

impl AlertQuery {
    #[must_use]
    pub fn alert(&self) -> Option<Alert> {
        self.alert.as_deref().and_then(Alert::from_code)
    }
}
