//! Screens
//!
//! Exactly one [`Screen`] is current; it is what the user sees and it only
//! changes through the transition function.

use serde::Serialize;

use crate::address::ServerAddress;

/// Every screen of the client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Screen {
    /// SDK is starting up
    #[default]
    Initialization,
    /// First-run welcome with register and restore options
    RegistrationIntro,
    /// Enter the application address
    ApplicationAddress,
    /// Liveness registration
    RegisterAccount,
    /// Choose manual or QR connection
    ConnectionSelection,
    /// Scan a server QR code
    QrCodeReader,
    /// Type a server address
    ManualConnection,
    /// Waiting for a connection attempt
    ServerConnectionProcessing {
        /// Server being connected to
        server_address: ServerAddress,
    },
    /// Hub of every flow
    ActionSelection,
    /// Choose what to verify
    VerifyCredential,
    /// Email verification intro
    VerifyEmailStart,
    /// Email verification running in the SDK
    EmailFlow,
    /// Email verification finished
    VerifyEmailResult {
        /// Outcome
        success: bool,
    },
    /// Document verification intro
    VerifyDocumentStart,
    /// Document capture running in the SDK
    DocumentFlow,
    /// Document verification finished
    VerifyDocumentResult {
        /// Outcome
        success: bool,
    },
    /// Custom credential intro
    GetCustomCredentialStart,
    /// Custom credential issued or not
    GetCustomCredentialResult {
        /// Outcome
        success: bool,
    },
    /// Choose what to share
    ShareCredential,
    /// Accept or reject sharing the email credential
    ShareEmailStart,
    /// Email sharing finished
    ShareEmailResult {
        /// Outcome
        success: bool,
    },
    /// Accept or reject sharing the document credential
    ShareDocumentStart,
    /// Document sharing finished
    ShareDocumentResult {
        /// Outcome
        success: bool,
    },
    /// Accept or reject sharing custom credentials
    ShareCustomStart,
    /// Custom sharing finished
    ShareCustomResult {
        /// Outcome
        success: bool,
    },
    /// Accept or reject an authentication request
    AuthStart,
    /// Authentication finished
    AuthResult {
        /// Outcome
        success: bool,
        /// Reason shown on failure
        error_message: Option<String>,
    },
    /// Accept or reject signing a document
    DocSignStart,
    /// Signing finished
    DocSignResult {
        /// Outcome
        success: bool,
    },
    /// Backup intro
    BackupStart,
    /// Backup running in the SDK
    BackupFlow,
    /// Backup finished
    BackupResult {
        /// Outcome
        success: bool,
    },
    /// Restore intro
    RestoreStart,
    /// Restore running in the SDK
    RestoreFlow,
    /// Restore finished
    RestoreResult {
        /// Outcome
        success: bool,
    },
}

/// Flow family a screen belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FlowFamily {
    /// Initialization through account registration
    Onboarding,
    /// Connection selection through connecting
    ServerConnection,
    /// The hub
    ActionSelection,
    /// Authenticate
    Authenticate,
    /// Verify email, document or custom credential
    VerifyCredential,
    /// Share email, document or custom credential
    ShareCredential,
    /// Sign a document
    SignDocument,
    /// Backup and restore
    BackupRestore,
}

impl Screen {
    /// Flow family of this screen.
    pub fn family(&self) -> FlowFamily {
        match self {
            Self::Initialization
            | Self::RegistrationIntro
            | Self::ApplicationAddress
            | Self::RegisterAccount => FlowFamily::Onboarding,
            Self::ConnectionSelection
            | Self::QrCodeReader
            | Self::ManualConnection
            | Self::ServerConnectionProcessing { .. } => FlowFamily::ServerConnection,
            Self::ActionSelection => FlowFamily::ActionSelection,
            Self::AuthStart | Self::AuthResult { .. } => FlowFamily::Authenticate,
            Self::VerifyCredential
            | Self::VerifyEmailStart
            | Self::EmailFlow
            | Self::VerifyEmailResult { .. }
            | Self::VerifyDocumentStart
            | Self::DocumentFlow
            | Self::VerifyDocumentResult { .. }
            | Self::GetCustomCredentialStart
            | Self::GetCustomCredentialResult { .. } => FlowFamily::VerifyCredential,
            Self::ShareCredential
            | Self::ShareEmailStart
            | Self::ShareEmailResult { .. }
            | Self::ShareDocumentStart
            | Self::ShareDocumentResult { .. }
            | Self::ShareCustomStart
            | Self::ShareCustomResult { .. } => FlowFamily::ShareCredential,
            Self::DocSignStart | Self::DocSignResult { .. } => FlowFamily::SignDocument,
            Self::BackupStart
            | Self::BackupFlow
            | Self::BackupResult { .. }
            | Self::RestoreStart
            | Self::RestoreFlow
            | Self::RestoreResult { .. } => FlowFamily::BackupRestore,
        }
    }

    /// Terminal result screens of a flow.
    pub fn is_result(&self) -> bool {
        matches!(
            self,
            Self::VerifyEmailResult { .. }
                | Self::VerifyDocumentResult { .. }
                | Self::GetCustomCredentialResult { .. }
                | Self::ShareEmailResult { .. }
                | Self::ShareDocumentResult { .. }
                | Self::ShareCustomResult { .. }
                | Self::AuthResult { .. }
                | Self::DocSignResult { .. }
                | Self::BackupResult { .. }
                | Self::RestoreResult { .. }
        )
    }

    /// Stable name for logs and the demo trace.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialization => "Initialization",
            Self::RegistrationIntro => "RegistrationIntro",
            Self::ApplicationAddress => "ApplicationAddress",
            Self::RegisterAccount => "RegisterAccount",
            Self::ConnectionSelection => "ConnectionSelection",
            Self::QrCodeReader => "QrCodeReader",
            Self::ManualConnection => "ManualConnection",
            Self::ServerConnectionProcessing { .. } => "ServerConnectionProcessing",
            Self::ActionSelection => "ActionSelection",
            Self::VerifyCredential => "VerifyCredential",
            Self::VerifyEmailStart => "VerifyEmailStart",
            Self::EmailFlow => "EmailFlow",
            Self::VerifyEmailResult { .. } => "VerifyEmailResult",
            Self::VerifyDocumentStart => "VerifyDocumentStart",
            Self::DocumentFlow => "DocumentFlow",
            Self::VerifyDocumentResult { .. } => "VerifyDocumentResult",
            Self::GetCustomCredentialStart => "GetCustomCredentialStart",
            Self::GetCustomCredentialResult { .. } => "GetCustomCredentialResult",
            Self::ShareCredential => "ShareCredential",
            Self::ShareEmailStart => "ShareEmailStart",
            Self::ShareEmailResult { .. } => "ShareEmailResult",
            Self::ShareDocumentStart => "ShareDocumentStart",
            Self::ShareDocumentResult { .. } => "ShareDocumentResult",
            Self::ShareCustomStart => "ShareCustomStart",
            Self::ShareCustomResult { .. } => "ShareCustomResult",
            Self::AuthStart => "AuthStart",
            Self::AuthResult { .. } => "AuthResult",
            Self::DocSignStart => "DocSignStart",
            Self::DocSignResult { .. } => "DocSignResult",
            Self::BackupStart => "BackupStart",
            Self::BackupFlow => "BackupFlow",
            Self::BackupResult { .. } => "BackupResult",
            Self::RestoreStart => "RestoreStart",
            Self::RestoreFlow => "RestoreFlow",
            Self::RestoreResult { .. } => "RestoreResult",
        }
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthResult {
                success,
                error_message: Some(reason),
            } => write!(f, "AuthResult(success={success}, error={reason:?})"),
            Self::AuthResult { success, .. }
            | Self::VerifyEmailResult { success }
            | Self::VerifyDocumentResult { success }
            | Self::GetCustomCredentialResult { success }
            | Self::ShareEmailResult { success }
            | Self::ShareDocumentResult { success }
            | Self::ShareCustomResult { success }
            | Self::DocSignResult { success }
            | Self::BackupResult { success }
            | Self::RestoreResult { success } => {
                write!(f, "{}(success={success})", self.name())
            }
            Self::ServerConnectionProcessing { server_address } => {
                write!(f, "{}({})", self.name(), server_address.abbreviated())
            }
            _ => f.write_str(self.name()),
        }
    }
}
