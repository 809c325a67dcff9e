//! Session commands
//!
//! Commands produced by transitions to be executed by the runtime.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::address::ServerAddress;
use crate::request::{MessageId, RequestId, ServerRequestKind};

/// Id of one connection attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AttemptId(pub u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt-{}", self.0)
    }
}

/// What a connection attempt connects with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectTarget {
    /// A typed server address
    Address(ServerAddress),
    /// Raw QR code payload; the SDK discovers the address
    QrCode(Vec<u8>),
}

/// SDK-owned flows that run to completion and report one result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FlowKind {
    /// Liveness registration
    Registration,
    /// Email credential verification
    EmailVerification,
    /// Identity document capture and verification
    DocumentVerification,
    /// Account backup
    Backup,
    /// Account restore
    Restore,
}

impl FlowKind {
    /// Human label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::EmailVerification => "email verification",
            Self::DocumentVerification => "document verification",
            Self::Backup => "backup",
            Self::Restore => "restore",
        }
    }
}

/// Command representing a side effect.
///
/// Everything that touches the SDK, the store or a timer is a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Set up the account with the application address
    SetupAccount {
        /// Address to set up with
        application_address: ServerAddress,
        /// Resolve the session afterwards (cold start path)
        resolve_session: bool,
    },

    /// Persist the application address
    SaveApplicationAddress(ServerAddress),

    /// Read registration and connection state and report `SessionResolved`
    ResolveSession,

    /// Start connecting
    Connect {
        /// Attempt the result belongs to
        attempt: AttemptId,
        /// What to connect with
        target: ConnectTarget,
    },

    /// Report `ConnectTimedOut` for `attempt` after `after`
    ArmConnectTimeout {
        /// Attempt to time out
        attempt: AttemptId,
        /// Delay
        after: Duration,
    },

    /// Persist `{connected: true, address}`
    PersistConnection(ServerAddress),

    /// Reset the connection store
    ResetConnection,

    /// Send a tagged request to the server
    SendServerRequest {
        /// Local request id
        request: RequestId,
        /// Request kind, sent as its tag
        kind: ServerRequestKind,
        /// Server
        to: ServerAddress,
    },

    /// Answer a signing request
    RespondToSigningRequest {
        /// Peer that asked
        to: ServerAddress,
        /// The signing request being answered
        request_id: MessageId,
        /// Whether we signed
        accepted: bool,
    },

    /// Launch an SDK flow
    LaunchFlow(FlowKind),

    /// Report `ToastExpired { id }` after `after`
    ScheduleToastExpiry {
        /// Toast to expire
        id: u64,
        /// Delay
        after: Duration,
    },
}
