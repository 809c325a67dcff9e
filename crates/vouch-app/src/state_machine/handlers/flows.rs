//! SDK flows and result screens

use tracing::{debug, info, warn};

use super::super::{Command, FlowKind, SessionState, UserAction};
use super::{begin_request, enter_action_selection, ignore};
use crate::errors::ErrorCategory;
use crate::request::{OutstandingServerRequest, ServerRequestKind};
use crate::screen::Screen;

/// Continue or Back on an intro screen of a flow.
pub fn handle_flow_start(state: &mut SessionState, commands: &mut Vec<Command>, action: UserAction) {
    let screen = state.screen().clone();
    match (&screen, action) {
        (Screen::VerifyEmailStart, UserAction::Continue) => {
            launch(state, commands, Screen::EmailFlow, FlowKind::EmailVerification);
        }
        (Screen::VerifyDocumentStart, UserAction::Continue) => {
            launch(state, commands, Screen::DocumentFlow, FlowKind::DocumentVerification);
        }
        (Screen::GetCustomCredentialStart, UserAction::Continue) => {
            begin_request(state, commands, ServerRequestKind::CustomCredential);
        }
        (Screen::BackupStart, UserAction::Continue) => {
            launch(state, commands, Screen::BackupFlow, FlowKind::Backup);
        }
        (Screen::RestoreStart, UserAction::Continue) => {
            launch(state, commands, Screen::RestoreFlow, FlowKind::Restore);
        }
        (Screen::VerifyEmailStart | Screen::VerifyDocumentStart, UserAction::Back) => {
            state.navigate(Screen::VerifyCredential);
        }
        (Screen::GetCustomCredentialStart, UserAction::Back) => {
            if state.outstanding.kind() == Some(ServerRequestKind::CustomCredential) {
                state.outstanding = OutstandingServerRequest::None;
                state.overlay = None;
            }
            state.navigate(Screen::VerifyCredential);
        }
        (Screen::BackupStart, UserAction::Back) => enter_action_selection(state, commands),
        (Screen::RestoreStart, UserAction::Back) => {
            state.restoring = false;
            state.navigate(Screen::RegistrationIntro);
        }
        (_, other) => ignore(&screen, &other),
    }
}

fn launch(state: &mut SessionState, commands: &mut Vec<Command>, screen: Screen, flow: FlowKind) {
    info!(flow = flow.label(), "launching flow");
    state.navigate(screen);
    commands.push(Command::LaunchFlow(flow));
}

/// Screen a flow runs on while the SDK owns it.
fn flow_screen(flow: FlowKind) -> Screen {
    match flow {
        FlowKind::Registration => Screen::RegisterAccount,
        FlowKind::EmailVerification => Screen::EmailFlow,
        FlowKind::DocumentVerification => Screen::DocumentFlow,
        FlowKind::Backup => Screen::BackupFlow,
        FlowKind::Restore => Screen::RestoreFlow,
    }
}

pub fn handle_flow_finished(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    flow: FlowKind,
    result: Result<(), String>,
) {
    if *state.screen() != flow_screen(flow) {
        debug!(
            flow = flow.label(),
            screen = %state.screen(),
            "ignoring result of a flow that is no longer shown"
        );
        return;
    }

    if let Err(reason) = &result {
        warn!(flow = flow.label(), %reason, "flow failed");
    }
    let success = result.is_ok();

    match flow {
        FlowKind::Registration => match result {
            Ok(()) => state.navigate(Screen::ConnectionSelection),
            Err(reason) => state.raise_toast(
                commands,
                format!("Registration failed: {reason}"),
                ErrorCategory::Network.toast_level(),
            ),
        },
        FlowKind::EmailVerification => state.navigate(Screen::VerifyEmailResult { success }),
        FlowKind::DocumentVerification => {
            state.navigate(Screen::VerifyDocumentResult { success });
        }
        FlowKind::Backup => state.navigate(Screen::BackupResult { success }),
        FlowKind::Restore => {
            state.restoring = false;
            state.navigate(Screen::RestoreResult { success });
        }
    }
}

/// Leave a result screen.
pub fn handle_result_screen(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    action: UserAction,
) {
    if !matches!(action, UserAction::Continue | UserAction::Back) {
        ignore(state.screen(), &action);
        return;
    }

    let screen = state.screen().clone();
    match screen {
        // A restored account resumes wherever its state says.
        Screen::RestoreResult { success: true } => commands.push(Command::ResolveSession),
        Screen::RestoreResult { success: false } => state.navigate(Screen::RegistrationIntro),
        _ => {
            state.pending.clear();
            enter_action_selection(state, commands);
        }
    }
}
