//! Session events
//!
//! Every input to the state machine. User actions, SDK callbacks and
//! completions of commands all arrive as an [`Event`] on the control thread.

use crate::address::ServerAddress;
use crate::message::{ExchangeOutcome, InboundMessage};
use crate::request::{MessageId, RequestId};
use crate::store::ConnectionRecord;

use super::commands::{AttemptId, FlowKind};

/// How the user wants to reach a server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionMethod {
    /// Type the address
    Manual,
    /// Scan a QR code
    ScanQr,
}

/// Choices on the action selection hub.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    /// Authenticate with a credential
    Authenticate,
    /// Verify a credential of ours
    VerifyCredentials,
    /// Share a credential with the server
    ProvideCredentials,
    /// Sign a document
    SignDocuments,
    /// Back up the account
    Backup,
}

/// Credential picked on a verify or share selection screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialChoice {
    /// Email address
    Email,
    /// Identity document
    Document,
    /// Custom credential
    Custom,
}

/// Something the user did on the current screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserAction {
    /// Primary button
    Continue,
    /// Navigate back
    Back,
    /// Restore an existing account instead of registering
    Restore,
    /// Submit a typed address
    SubmitAddress(String),
    /// Pick a connection method
    ChooseConnection(ConnectionMethod),
    /// The camera decoded a QR code
    QrScanned(Vec<u8>),
    /// The camera failed
    QrScanFailed(String),
    /// Retry a failed or timed out connection
    RetryConnection,
    /// Pick an action on the hub
    SelectAction(ActionKind),
    /// Pick a credential on a selection screen
    SelectCredential(CredentialChoice),
}

/// Input to [`transition`](super::transition).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The SDK finished starting; carries the durable application address
    SdkInitialized {
        /// Stored application address, if any
        application_address: Option<ServerAddress>,
    },

    /// `SetupAccount` completed
    AccountSetupFinished {
        /// Copied from the command
        resolve_session: bool,
        /// Outcome
        result: Result<(), String>,
    },

    /// `ResolveSession` completed
    SessionResolved {
        /// Whether the account is registered
        registered: bool,
        /// Validated connection record
        connection: ConnectionRecord,
    },

    /// User input
    User(UserAction),

    /// The SDK delivered a message from the peer
    Inbound(InboundMessage),

    /// An interactive exchange screen reported its status
    Exchange(ExchangeOutcome),

    /// `Connect` completed
    ConnectFinished {
        /// Attempt this result belongs to
        attempt: AttemptId,
        /// Connected server, or the failure reason
        result: Result<ServerAddress, String>,
    },

    /// The connect timer for `attempt` fired
    ConnectTimedOut {
        /// Attempt that timed out
        attempt: AttemptId,
    },

    /// `SendServerRequest` completed
    RequestSent {
        /// Request this result belongs to
        request: RequestId,
        /// SDK message id, or the failure reason
        result: Result<MessageId, String>,
    },

    /// An SDK flow finished
    FlowFinished {
        /// Which flow
        flow: FlowKind,
        /// Outcome
        result: Result<(), String>,
    },

    /// A toast's display time ran out
    ToastExpired {
        /// Toast to dismiss
        id: u64,
    },
}

impl From<UserAction> for Event {
    fn from(action: UserAction) -> Self {
        Self::User(action)
    }
}

impl From<InboundMessage> for Event {
    fn from(message: InboundMessage) -> Self {
        Self::Inbound(message)
    }
}

impl From<ExchangeOutcome> for Event {
    fn from(outcome: ExchangeOutcome) -> Self {
        Self::Exchange(outcome)
    }
}
