//! Inbound peer messages
//!
//! Messages arrive at any time, unordered relative to user actions. Each
//! kind has exactly one rule. A request that cannot be matched to what we
//! asked for is logged and dropped without a screen change.

use tracing::{debug, info, warn};

use super::super::{Command, SessionState};
use crate::errors::ErrorCategory;
use crate::message::{
    CredentialMessage, CredentialRequest, InboundMessage, SigningRequest, VerificationRequest,
};
use crate::request::{Correlation, OutstandingServerRequest, ServerRequestKind};
use crate::screen::Screen;

/// Toast raised when a signing request is turned down.
pub const SIGNING_UNSUPPORTED: &str = "Signing request not supported";

pub fn handle_inbound_message(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    message: InboundMessage,
) {
    debug!(kind = message.kind(), "inbound message");
    match message {
        InboundMessage::CredentialRequest(request) => {
            handle_credential_request(state, request);
        }
        InboundMessage::VerificationRequest(request) => {
            handle_verification_request(state, request);
        }
        InboundMessage::SigningRequest(request) => {
            handle_signing_request(state, commands, request);
        }
        InboundMessage::CredentialResponse(response) => {
            warn!(
                id = %response.id,
                request = %response.request_id,
                "credential response without a pending request, ignoring"
            );
        }
        InboundMessage::Chat(chat) => {
            debug!(id = %chat.id, body = %chat.body, "chat message");
        }
        InboundMessage::CredentialDelivery(credential) => {
            handle_credential_delivery(state, credential);
        }
        InboundMessage::Receipt(receipt) => {
            debug!(id = %receipt.id, "delivery receipt");
        }
        InboundMessage::Unknown { kind } => {
            warn!(%kind, "unknown inbound message kind, ignoring");
        }
    }
}

fn handle_credential_request(state: &mut SessionState, request: CredentialRequest) {
    let correlation = state.outstanding.correlate(request.in_reply_to.as_ref());
    if let Correlation::Mismatch { expected, received } = &correlation {
        warn!(%expected, %received, "credential request answers another message, ignoring");
        return;
    }

    state.pending.credential = Some(request);

    let kind = match correlation {
        Correlation::Matched(kind) => kind,
        _ => {
            warn!("credential request without an outstanding request, ignoring");
            return;
        }
    };

    let screen = match kind {
        ServerRequestKind::Authenticate => Screen::AuthStart,
        ServerRequestKind::ShareEmail => Screen::ShareEmailStart,
        ServerRequestKind::ShareDocument => Screen::ShareDocumentStart,
        ServerRequestKind::ShareCustom => Screen::ShareCustomStart,
        ServerRequestKind::DocumentSigning | ServerRequestKind::CustomCredential => {
            warn!(%kind, "credential request does not answer the outstanding request, ignoring");
            return;
        }
    };

    info!(%kind, "credential request matched outstanding request");
    state.outstanding = OutstandingServerRequest::None;
    state.overlay = None;
    state.navigate(screen);
}

fn handle_verification_request(state: &mut SessionState, request: VerificationRequest) {
    let correlation = state.outstanding.correlate(request.in_reply_to.as_ref());
    if let Correlation::Mismatch { expected, received } = &correlation {
        warn!(%expected, %received, "verification request answers another message, ignoring");
        return;
    }

    state.pending.verification = Some(request);
    if correlation == Correlation::Matched(ServerRequestKind::DocumentSigning) {
        state.outstanding = OutstandingServerRequest::None;
    }
    state.overlay = None;
    state.navigate(Screen::DocSignStart);
}

fn handle_signing_request(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    request: SigningRequest,
) {
    let correlation = state.outstanding.correlate(request.in_reply_to.as_ref());
    if correlation == Correlation::Matched(ServerRequestKind::DocumentSigning) {
        state.pending.signing = Some(request);
        state.outstanding = OutstandingServerRequest::None;
        state.overlay = None;
        state.navigate(Screen::DocSignStart);
        return;
    }

    warn!(id = %request.id, "unsolicited signing request, declining");
    commands.push(Command::RespondToSigningRequest {
        to: request.from,
        request_id: request.id,
        accepted: false,
    });
    state.raise_toast(
        commands,
        SIGNING_UNSUPPORTED,
        ErrorCategory::Protocol.toast_level(),
    );
}

fn handle_credential_delivery(state: &mut SessionState, credential: CredentialMessage) {
    info!(id = %credential.id, claims = credential.claims.len(), "credential issued");
    if state.outstanding.kind() == Some(ServerRequestKind::CustomCredential) {
        state.outstanding = OutstandingServerRequest::None;
    }
    state.overlay = None;
    state.navigate(Screen::GetCustomCredentialResult { success: true });
}
