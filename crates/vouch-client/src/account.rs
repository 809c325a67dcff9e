//! # Identity Account Bridge
//!
//! The seam between the session runtime and the identity SDK. The runtime
//! only talks to `dyn IdentityAccount`; the SDK talks back through a
//! [`MessageDelegate`] it was handed at construction.
//!
//! [`SimulatedAccount`](crate::sim::SimulatedAccount) implements the trait
//! for the demo and tests.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use vouch_app::state_machine::FlowKind;
use vouch_app::{Categorized, ErrorCategory, InboundMessage, MessageId, OutboundMessage, ServerAddress};

use crate::config::Environment;

/// Errors reported by the identity SDK.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// Account setup failed
    #[error("account setup failed: {0}")]
    Setup(String),

    /// Connecting to a server failed
    #[error("connect failed: {0}")]
    Connect(String),

    /// Sending a message failed
    #[error("send failed: {0}")]
    Send(String),

    /// An SDK flow ended in failure
    #[error("{flow} failed: {reason}")]
    Flow {
        /// Flow label
        flow: &'static str,
        /// Failure reason
        reason: String,
    },

    /// The SDK is not ready for this call
    #[error("identity SDK unavailable: {0}")]
    Unavailable(String),
}

impl Categorized for BridgeError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Unavailable(_) => ErrorCategory::Protocol,
            _ => ErrorCategory::Network,
        }
    }
}

/// Settings the SDK is started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountConfig {
    /// Durable storage directory
    pub storage_path: PathBuf,
    /// Network environment
    pub environment: Environment,
}

/// Receives everything the SDK reports asynchronously.
///
/// Implementations must not block; they are called from SDK tasks.
pub trait MessageDelegate: Send + Sync {
    /// A peer message arrived
    fn on_message(&self, message: InboundMessage);

    /// The SDK connected to a server
    fn on_connect(&self, _server: &ServerAddress) {}

    /// The SDK lost a server
    fn on_disconnect(&self, _server: &ServerAddress) {}

    /// The SDK hit an error outside any call
    fn on_error(&self, _error: &BridgeError) {}

    /// A sent message was acknowledged
    fn on_acknowledgement(&self, _message_id: &MessageId) {}
}

/// Identity account operations the session runtime needs.
#[async_trait]
pub trait IdentityAccount: Send + Sync {
    // =========================================================================
    // Account
    // =========================================================================

    /// Set up the account against `application_address`
    async fn setup(&self, application_address: &ServerAddress) -> Result<(), BridgeError>;

    /// Whether registration has completed
    async fn is_registered(&self) -> Result<bool, BridgeError>;

    /// Create a fresh application address
    fn generate_address(&self) -> ServerAddress;

    /// Install the delegate; replaces any previous one
    fn set_delegate(&self, delegate: Arc<dyn MessageDelegate>);

    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to a typed address
    async fn connect_with_address(
        &self,
        server: &ServerAddress,
    ) -> Result<ServerAddress, BridgeError>;

    /// Connect with a scanned QR payload
    async fn connect_with_qr_code(&self, payload: &[u8]) -> Result<ServerAddress, BridgeError>;

    // =========================================================================
    // Messaging and flows
    // =========================================================================

    /// Send `message` to `to`, returning the SDK message id
    async fn send(
        &self,
        to: &ServerAddress,
        message: OutboundMessage,
    ) -> Result<MessageId, BridgeError>;

    /// Run an SDK-owned flow to completion
    async fn run_flow(&self, flow: FlowKind) -> Result<(), BridgeError>;
}
