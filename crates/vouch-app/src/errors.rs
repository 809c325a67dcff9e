//! Categorized errors
//!
//! Every failure the user can see is classified so the session can pick a
//! toast level for it without knowing where it came from.

use std::fmt;

use crate::address::AddressError;
use crate::toast::ToastLevel;

// ============================================================================
// Error Categories
// ============================================================================

/// High-level error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed user input, rejected before anything is attempted
    Input,
    /// Connect or send failures
    Network,
    /// A connection attempt ran out of time
    Timeout,
    /// The peer sent something that matches nothing we asked for
    Protocol,
    /// The local key/value store failed
    Storage,
}

impl ErrorCategory {
    /// Toast level used when this category is surfaced.
    #[must_use]
    pub fn toast_level(&self) -> ToastLevel {
        match self {
            Self::Input => ToastLevel::Warning,
            Self::Network => ToastLevel::Error,
            Self::Timeout => ToastLevel::Warning,
            Self::Protocol => ToastLevel::Warning,
            Self::Storage => ToastLevel::Error,
        }
    }

    /// Short label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Network => "Network",
            Self::Timeout => "Timeout",
            Self::Protocol => "Protocol",
            Self::Storage => "Storage",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Errors that know their category.
pub trait Categorized {
    /// Category of this error.
    fn category(&self) -> ErrorCategory;
}

impl Categorized for AddressError {
    fn category(&self) -> ErrorCategory {
        ErrorCategory::Input
    }
}

impl Categorized for crate::store::StoreError {
    fn category(&self) -> ErrorCategory {
        ErrorCategory::Storage
    }
}
