//! Runtime errors

use std::time::Duration;

use thiserror::Error;
use vouch_app::{AddressError, Categorized, ErrorCategory, StoreError};

use crate::account::BridgeError;
use crate::config::ConfigError;

/// Errors surfaced by the client runtime and CLI.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The preferences store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The identity SDK failed
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// An address argument was malformed
    #[error("invalid address: {0}")]
    Address(#[from] AddressError),

    /// No event arrived while waiting for the session to progress
    #[error("session idle on {screen} for {waited:?}")]
    Idle {
        /// Screen the session was stuck on
        screen: String,
        /// How long we waited
        waited: Duration,
    },
}

impl Categorized for ClientError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) | Self::Address(_) => ErrorCategory::Input,
            Self::Store(e) => e.category(),
            Self::Bridge(e) => e.category(),
            Self::Idle { .. } => ErrorCategory::Timeout,
        }
    }
}
