//! Outbound server requests and their correlation state.
//!
//! At most one locally initiated request waits for a reply at any time. The
//! reply arrives later, unordered, through the inbound message path and is
//! matched against [`OutstandingServerRequest`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// The server-bound actions the client can ask for.
///
/// The wire tag of each kind is the text body of the chat message sent to the
/// server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerRequestKind {
    /// Ask the server to request an authentication credential
    Authenticate,
    /// Offer to share an email credential
    ShareEmail,
    /// Offer to share an identity document credential
    ShareDocument,
    /// Offer to share a custom credential
    ShareCustom,
    /// Ask the server for a document to sign
    DocumentSigning,
    /// Ask the server to issue a custom credential
    CustomCredential,
}

impl ServerRequestKind {
    /// Wire tag sent to the server.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Authenticate => "REQUEST_CREDENTIAL_AUTH",
            Self::ShareEmail => "PROVIDE_CREDENTIAL_EMAIL",
            Self::ShareDocument => "PROVIDE_CREDENTIAL_DOCUMENT",
            Self::ShareCustom => "PROVIDE_CREDENTIAL_CUSTOM",
            Self::DocumentSigning => "REQUEST_DOCUMENT_SIGNING",
            Self::CustomCredential => "REQUEST_GET_CUSTOM_CREDENTIAL",
        }
    }

    /// Parse a wire tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::all().iter().copied().find(|kind| kind.tag() == tag)
    }

    /// Human label used in overlay and toast text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Authenticate => "authentication",
            Self::ShareEmail => "email credential",
            Self::ShareDocument => "document credential",
            Self::ShareCustom => "custom credentials",
            Self::DocumentSigning => "document signing",
            Self::CustomCredential => "custom credential",
        }
    }

    /// All request kinds.
    pub fn all() -> &'static [ServerRequestKind] {
        &[
            Self::Authenticate,
            Self::ShareEmail,
            Self::ShareDocument,
            Self::ShareCustom,
            Self::DocumentSigning,
            Self::CustomCredential,
        ]
    }
}

impl fmt::Display for ServerRequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Locally generated id for one outbound request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Message id assigned by the identity SDK.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Wrap an SDK message id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bookkeeping for a request that has been handed to the SDK.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestTicket {
    /// Local id, used to match the send completion
    pub id: RequestId,
    /// SDK message id, known once the send completes
    pub message_id: Option<MessageId>,
}

impl RequestTicket {
    /// A ticket whose send has not completed yet.
    pub fn new(id: RequestId) -> Self {
        Self {
            id,
            message_id: None,
        }
    }
}

/// Which server-bound action is currently awaiting an inbound reply.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutstandingServerRequest {
    /// Nothing is awaiting a reply
    #[default]
    None,
    /// `REQUEST_CREDENTIAL_AUTH` sent
    Auth(RequestTicket),
    /// `PROVIDE_CREDENTIAL_EMAIL` sent
    ShareEmail(RequestTicket),
    /// `PROVIDE_CREDENTIAL_DOCUMENT` sent
    ShareDocument(RequestTicket),
    /// `PROVIDE_CREDENTIAL_CUSTOM` sent
    ShareCustom(RequestTicket),
    /// `REQUEST_DOCUMENT_SIGNING` sent
    Signing(RequestTicket),
    /// `REQUEST_GET_CUSTOM_CREDENTIAL` sent
    CustomCredential(RequestTicket),
}

impl OutstandingServerRequest {
    /// Build the variant for `kind`.
    pub fn new(kind: ServerRequestKind, ticket: RequestTicket) -> Self {
        match kind {
            ServerRequestKind::Authenticate => Self::Auth(ticket),
            ServerRequestKind::ShareEmail => Self::ShareEmail(ticket),
            ServerRequestKind::ShareDocument => Self::ShareDocument(ticket),
            ServerRequestKind::ShareCustom => Self::ShareCustom(ticket),
            ServerRequestKind::DocumentSigning => Self::Signing(ticket),
            ServerRequestKind::CustomCredential => Self::CustomCredential(ticket),
        }
    }

    /// Kind of the outstanding request, if any.
    pub fn kind(&self) -> Option<ServerRequestKind> {
        match self {
            Self::None => None,
            Self::Auth(_) => Some(ServerRequestKind::Authenticate),
            Self::ShareEmail(_) => Some(ServerRequestKind::ShareEmail),
            Self::ShareDocument(_) => Some(ServerRequestKind::ShareDocument),
            Self::ShareCustom(_) => Some(ServerRequestKind::ShareCustom),
            Self::Signing(_) => Some(ServerRequestKind::DocumentSigning),
            Self::CustomCredential(_) => Some(ServerRequestKind::CustomCredential),
        }
    }

    /// Ticket of the outstanding request, if any.
    pub fn ticket(&self) -> Option<&RequestTicket> {
        match self {
            Self::None => None,
            Self::Auth(t)
            | Self::ShareEmail(t)
            | Self::ShareDocument(t)
            | Self::ShareCustom(t)
            | Self::Signing(t)
            | Self::CustomCredential(t) => Some(t),
        }
    }

    fn ticket_mut(&mut self) -> Option<&mut RequestTicket> {
        match self {
            Self::None => None,
            Self::Auth(t)
            | Self::ShareEmail(t)
            | Self::ShareDocument(t)
            | Self::ShareCustom(t)
            | Self::Signing(t)
            | Self::CustomCredential(t) => Some(t),
        }
    }

    /// True when nothing is outstanding.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// True when the outstanding request has local id `id`.
    pub fn is_request(&self, id: RequestId) -> bool {
        self.ticket().is_some_and(|t| t.id == id)
    }

    /// Record the SDK message id once the send completes.
    ///
    /// Returns false when `id` is not the outstanding request.
    pub fn acknowledge(&mut self, id: RequestId, message_id: MessageId) -> bool {
        match self.ticket_mut() {
            Some(ticket) if ticket.id == id => {
                ticket.message_id = Some(message_id);
                true
            }
            _ => false,
        }
    }

    /// Match an inbound reply against the outstanding request.
    ///
    /// A reply without `in_reply_to` matches on kind alone. A reply that
    /// names a message must name the outstanding one; while the send is still
    /// in flight the id is unknown and the reply is accepted.
    pub fn correlate(&self, in_reply_to: Option<&MessageId>) -> Correlation {
        let Some(ticket) = self.ticket() else {
            return Correlation::NoOutstandingRequest;
        };
        let Some(kind) = self.kind() else {
            return Correlation::NoOutstandingRequest;
        };
        match (in_reply_to, ticket.message_id.as_ref()) {
            (Some(reply), Some(sent)) if reply != sent => Correlation::Mismatch {
                expected: sent.clone(),
                received: reply.clone(),
            },
            _ => Correlation::Matched(kind),
        }
    }

    /// Take the request out, leaving `None`.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

/// Result of matching an inbound reply to the outstanding request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Correlation {
    /// The reply belongs to the outstanding request of this kind
    Matched(ServerRequestKind),
    /// Nothing was outstanding
    NoOutstandingRequest,
    /// The reply names a different message than the one we sent
    Mismatch {
        /// Message id of the outstanding request
        expected: MessageId,
        /// Message id the reply refers to
        received: MessageId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for kind in ServerRequestKind::all() {
            assert_eq!(ServerRequestKind::from_tag(kind.tag()), Some(*kind));
        }
        assert_eq!(ServerRequestKind::from_tag("HELLO"), None);
    }

    #[test]
    fn wire_tags_match_server_protocol() {
        assert_eq!(ServerRequestKind::ShareEmail.tag(), "PROVIDE_CREDENTIAL_EMAIL");
        assert_eq!(
            ServerRequestKind::CustomCredential.tag(),
            "REQUEST_GET_CUSTOM_CREDENTIAL"
        );
    }

    #[test]
    fn correlate_without_outstanding_request() {
        let none = OutstandingServerRequest::None;
        assert_eq!(none.correlate(None), Correlation::NoOutstandingRequest);
    }

    #[test]
    fn correlate_by_kind_and_message_id() {
        let mut outstanding = OutstandingServerRequest::new(
            ServerRequestKind::ShareEmail,
            RequestTicket::new(RequestId(7)),
        );
        let reply = MessageId::new("m-1");

        // Send still in flight: accepted on kind.
        assert_eq!(
            outstanding.correlate(Some(&reply)),
            Correlation::Matched(ServerRequestKind::ShareEmail)
        );

        assert!(outstanding.acknowledge(RequestId(7), MessageId::new("m-1")));
        assert_eq!(
            outstanding.correlate(Some(&reply)),
            Correlation::Matched(ServerRequestKind::ShareEmail)
        );

        let other = MessageId::new("m-2");
        assert!(matches!(
            outstanding.correlate(Some(&other)),
            Correlation::Mismatch { .. }
        ));
        assert_eq!(
            outstanding.correlate(None),
            Correlation::Matched(ServerRequestKind::ShareEmail)
        );
    }

    #[test]
    fn acknowledge_ignores_replaced_request() {
        let mut outstanding = OutstandingServerRequest::new(
            ServerRequestKind::Authenticate,
            RequestTicket::new(RequestId(2)),
        );
        assert!(!outstanding.acknowledge(RequestId(1), MessageId::new("late")));
        assert_eq!(outstanding.ticket().and_then(|t| t.message_id.clone()), None);
    }
}
