//! Messages exchanged with the server peer.
//!
//! The SDK delivers every inbound message through one delegate callback. Each
//! kind is a distinct variant of [`InboundMessage`] so dispatch is an
//! exhaustive match.

use serde::{Deserialize, Serialize};

use crate::address::ServerAddress;
use crate::request::MessageId;

/// The peer asks for one or more credentials.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRequest {
    /// SDK message id
    pub id: MessageId,
    /// Sender
    pub from: ServerAddress,
    /// Requested credential types
    pub types: Vec<String>,
    /// Message this one answers, when the peer sets it
    pub in_reply_to: Option<MessageId>,
}

/// The peer asks for verification (presented as a document to sign).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    /// SDK message id
    pub id: MessageId,
    /// Sender
    pub from: ServerAddress,
    /// Requested credential types
    pub types: Vec<String>,
    /// Message this one answers, when the peer sets it
    pub in_reply_to: Option<MessageId>,
}

/// The peer asks for a signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningRequest {
    /// SDK message id
    pub id: MessageId,
    /// Sender
    pub from: ServerAddress,
    /// Message this one answers, when the peer sets it
    pub in_reply_to: Option<MessageId>,
}

/// The peer answered one of our credential requests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialResponse {
    /// SDK message id
    pub id: MessageId,
    /// Sender
    pub from: ServerAddress,
    /// Request being answered
    pub request_id: MessageId,
}

/// Free text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// SDK message id
    pub id: MessageId,
    /// Sender
    pub from: ServerAddress,
    /// Message text
    pub body: String,
}

/// The peer issued us a credential.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialMessage {
    /// SDK message id
    pub id: MessageId,
    /// Sender
    pub from: ServerAddress,
    /// Issued claims as `(name, value)` pairs
    pub claims: Vec<(String, String)>,
}

/// Delivery receipt for one of our messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Id of the acknowledged message
    pub id: MessageId,
    /// Sender
    pub from: ServerAddress,
}

/// Every message kind the SDK can hand to the delegate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboundMessage {
    /// Peer wants credentials from us
    CredentialRequest(CredentialRequest),
    /// Peer wants us to verify
    VerificationRequest(VerificationRequest),
    /// Peer wants a signature
    SigningRequest(SigningRequest),
    /// Peer answered a credential request
    CredentialResponse(CredentialResponse),
    /// Free text
    Chat(ChatMessage),
    /// Peer issued a credential
    CredentialDelivery(CredentialMessage),
    /// Delivery receipt
    Receipt(Receipt),
    /// Anything the client does not understand
    Unknown {
        /// Kind name reported by the SDK
        kind: String,
    },
}

impl InboundMessage {
    /// Short kind name for logs.
    pub fn kind(&self) -> &str {
        match self {
            Self::CredentialRequest(_) => "credential-request",
            Self::VerificationRequest(_) => "verification-request",
            Self::SigningRequest(_) => "signing-request",
            Self::CredentialResponse(_) => "credential-response",
            Self::Chat(_) => "chat",
            Self::CredentialDelivery(_) => "credential-delivery",
            Self::Receipt(_) => "receipt",
            Self::Unknown { kind } => kind,
        }
    }
}

/// Status reported by an interactive exchange screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeOutcome {
    /// The user accepted and the response was delivered
    Accepted,
    /// The user rejected the request
    Rejected,
    /// Delivering the response failed
    Failed(String),
}

/// Messages the client sends through the SDK.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundMessage {
    /// Text message; server requests are chat messages carrying a tag
    Chat {
        /// Our application address
        from: Option<ServerAddress>,
        /// Message text
        body: String,
    },
    /// Answer to a signing request
    SigningResponse {
        /// The signing request being answered
        request_id: MessageId,
        /// Whether we signed
        accepted: bool,
    },
}

/// Peer-initiated requests awaiting a local accept or reject.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingInboundRequests {
    /// Most recent credential request
    pub credential: Option<CredentialRequest>,
    /// Most recent verification request
    pub verification: Option<VerificationRequest>,
    /// Most recent signing request
    pub signing: Option<SigningRequest>,
}

impl PendingInboundRequests {
    /// Drop everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.credential.is_none() && self.verification.is_none() && self.signing.is_none()
    }
}
