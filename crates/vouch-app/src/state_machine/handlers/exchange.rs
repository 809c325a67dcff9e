//! Interactive exchange screens
//!
//! The accept/reject UI of authenticate, share and sign reports one
//! [`ExchangeOutcome`]. Acceptance leads to the flow's result screen,
//! rejection returns to the hub with a toast.

use tracing::{error, info, warn};

use super::super::{Command, SessionState, UserAction};
use super::{enter_action_selection, ignore};
use crate::message::ExchangeOutcome;
use crate::screen::Screen;
use crate::toast::ToastLevel;

/// Reason shown when the user rejects an authentication request.
pub const AUTH_REJECTED: &str = "User rejected the credential request.";

pub fn handle_exchange_outcome(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    outcome: ExchangeOutcome,
) {
    let screen = state.screen().clone();
    let has_pending = match screen {
        Screen::AuthStart
        | Screen::ShareEmailStart
        | Screen::ShareDocumentStart
        | Screen::ShareCustomStart => state.pending.credential.is_some(),
        Screen::DocSignStart => {
            state.pending.verification.is_some() || state.pending.signing.is_some()
        }
        _ => {
            warn!(%screen, ?outcome, "exchange outcome outside an exchange screen, ignoring");
            return;
        }
    };
    if !has_pending {
        warn!(%screen, ?outcome, "exchange outcome without a pending request, ignoring");
        return;
    }

    info!(%screen, ?outcome, "exchange finished");
    match (screen, outcome) {
        (Screen::AuthStart, ExchangeOutcome::Accepted) => state.navigate(Screen::AuthResult {
            success: true,
            error_message: None,
        }),
        (Screen::AuthStart, ExchangeOutcome::Rejected) => state.navigate(Screen::AuthResult {
            success: false,
            error_message: Some(AUTH_REJECTED.to_string()),
        }),
        (Screen::ShareEmailStart, ExchangeOutcome::Accepted) => {
            state.navigate(Screen::ShareEmailResult { success: true });
        }
        (Screen::ShareEmailStart, ExchangeOutcome::Rejected) => {
            reject(state, commands, "Share email credential rejected!");
        }
        (Screen::ShareDocumentStart, ExchangeOutcome::Accepted) => {
            state.navigate(Screen::ShareDocumentResult { success: true });
        }
        (Screen::ShareDocumentStart, ExchangeOutcome::Rejected) => {
            reject(state, commands, "Share document number rejected!");
        }
        (Screen::ShareCustomStart, ExchangeOutcome::Accepted) => {
            state.navigate(Screen::ShareCustomResult { success: true });
        }
        (Screen::ShareCustomStart, ExchangeOutcome::Rejected) => {
            reject(state, commands, "Share custom credentials rejected!");
        }
        (Screen::DocSignStart, ExchangeOutcome::Accepted) => {
            state.navigate(Screen::DocSignResult { success: true });
        }
        (Screen::DocSignStart, ExchangeOutcome::Rejected) => {
            reject(state, commands, "Document signing rejected!");
        }
        (Screen::DocSignStart, ExchangeOutcome::Failed(reason)) => {
            error!(%reason, "document signing failed");
            state.navigate(Screen::DocSignResult { success: false });
        }
        (screen, ExchangeOutcome::Failed(reason)) => {
            error!(%screen, %reason, "failed to deliver exchange response");
        }
        (screen, outcome) => {
            warn!(%screen, ?outcome, "unhandled exchange outcome");
        }
    }
}

fn reject(state: &mut SessionState, commands: &mut Vec<Command>, message: &str) {
    state.pending.clear();
    enter_action_selection(state, commands);
    state.raise_toast(commands, message, ToastLevel::Warning);
}

/// Back out of an exchange screen, abandoning the request.
pub fn handle_exchange_screen(state: &mut SessionState, action: UserAction) {
    let screen = state.screen().clone();
    let target = match (&screen, &action) {
        (
            Screen::ShareEmailStart | Screen::ShareDocumentStart | Screen::ShareCustomStart,
            UserAction::Back,
        ) => Screen::ShareCredential,
        (Screen::AuthStart | Screen::DocSignStart, UserAction::Back) => Screen::ActionSelection,
        _ => {
            ignore(&screen, &action);
            return;
        }
    };
    state.abandon_exchange();
    state.navigate(target);
}
