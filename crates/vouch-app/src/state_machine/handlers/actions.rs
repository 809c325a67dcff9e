//! Action selection hub and the verify/share selection screens

use tracing::{debug, error, info};

use super::super::{ActionKind, Command, CredentialChoice, SessionState, UserAction};
use super::{begin_request, enter_action_selection, ignore};
use crate::errors::ErrorCategory;
use crate::request::{MessageId, RequestId, ServerRequestKind};
use crate::screen::Screen;

pub fn handle_action_selection(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    action: UserAction,
) {
    match action {
        UserAction::SelectAction(kind) => {
            // The success toast never outlives the first pick.
            state.connection_success_pending = false;
            info!(?kind, "action selected");
            match kind {
                ActionKind::Authenticate => {
                    begin_request(state, commands, ServerRequestKind::Authenticate);
                }
                ActionKind::VerifyCredentials => state.navigate(Screen::VerifyCredential),
                ActionKind::ProvideCredentials => state.navigate(Screen::ShareCredential),
                ActionKind::SignDocuments => {
                    if begin_request(state, commands, ServerRequestKind::DocumentSigning) {
                        state.navigate(Screen::DocSignStart);
                    }
                }
                ActionKind::Backup => state.navigate(Screen::BackupStart),
            }
        }
        UserAction::Back => {
            info!("disconnecting from server");
            state.abandon_exchange();
            state.server_address = None;
            state.connection_success_pending = false;
            commands.push(Command::ResetConnection);
            state.navigate(Screen::ConnectionSelection);
        }
        other => ignore(&Screen::ActionSelection, &other),
    }
}

pub fn handle_verify_selection(state: &mut SessionState, action: UserAction) {
    match action {
        UserAction::SelectCredential(CredentialChoice::Email) => {
            state.navigate(Screen::VerifyEmailStart);
        }
        UserAction::SelectCredential(CredentialChoice::Document) => {
            state.navigate(Screen::VerifyDocumentStart);
        }
        UserAction::SelectCredential(CredentialChoice::Custom) => {
            state.navigate(Screen::GetCustomCredentialStart);
        }
        UserAction::Back => state.navigate(Screen::ActionSelection),
        other => ignore(&Screen::VerifyCredential, &other),
    }
}

/// Share requests are deferred until the credential type is picked.
pub fn handle_share_selection(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    action: UserAction,
) {
    match action {
        UserAction::SelectCredential(choice) => {
            let kind = match choice {
                CredentialChoice::Email => ServerRequestKind::ShareEmail,
                CredentialChoice::Document => ServerRequestKind::ShareDocument,
                CredentialChoice::Custom => ServerRequestKind::ShareCustom,
            };
            begin_request(state, commands, kind);
        }
        UserAction::Back => {
            state.abandon_exchange();
            enter_action_selection(state, commands);
        }
        other => ignore(&Screen::ShareCredential, &other),
    }
}

/// A `SendServerRequest` completed.
pub fn handle_request_sent(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    request: RequestId,
    result: Result<MessageId, String>,
) {
    if !state.outstanding.is_request(request) {
        debug!(%request, "ignoring send completion of a replaced request");
        return;
    }

    match result {
        Ok(message_id) => {
            debug!(%request, %message_id, "server request sent");
            state.outstanding.acknowledge(request, message_id);
            state.overlay = None;
        }
        Err(reason) => {
            let label = state
                .outstanding
                .take()
                .kind()
                .map_or("server", |kind| kind.label());
            error!(%request, %reason, "failed to send server request");
            state.overlay = None;
            state.raise_toast(
                commands,
                format!("Failed to send {label} request: {reason}"),
                ErrorCategory::Network.toast_level(),
            );
        }
    }
}
