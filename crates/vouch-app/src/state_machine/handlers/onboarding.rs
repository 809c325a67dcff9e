//! Onboarding and cold start
//!
//! Initialization, registration intro, application address and account
//! registration, plus the cold start decision of where a session resumes.

use tracing::{info, warn};

use super::super::{Command, FlowKind, SessionState, UserAction};
use super::{enter_action_selection, ignore};
use crate::address::ServerAddress;
use crate::errors::{Categorized, ErrorCategory};
use crate::screen::Screen;
use crate::store::ConnectionRecord;

pub fn handle_sdk_initialized(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    application_address: Option<ServerAddress>,
) {
    state.application_address = application_address;
    setup_or_ask_for_address(state, commands);
}

/// With a durable address, set the account up and resolve the session;
/// without one, ask for it.
fn setup_or_ask_for_address(state: &mut SessionState, commands: &mut Vec<Command>) {
    match state.application_address.clone() {
        Some(application_address) => {
            commands.push(Command::SetupAccount {
                application_address,
                resolve_session: true,
            });
        }
        None => state.navigate(Screen::ApplicationAddress),
    }
}

pub fn handle_account_setup_finished(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    resolve_session: bool,
    result: Result<(), String>,
) {
    match result {
        Ok(()) if resolve_session => commands.push(Command::ResolveSession),
        Ok(()) => {
            // Registration starts once the account exists.
            if *state.screen() == Screen::RegisterAccount {
                commands.push(Command::LaunchFlow(FlowKind::Registration));
            }
        }
        Err(reason) => {
            warn!(%reason, "account setup failed");
            state.application_address = None;
            state.navigate(Screen::ApplicationAddress);
            state.raise_toast(
                commands,
                format!("Account setup failed: {reason}"),
                ErrorCategory::Network.toast_level(),
            );
        }
    }
}

/// Cold start recovery: decide where a resumed session lands.
///
/// `connection` has already been validated (and repaired) by the store.
pub fn determine_next_screen(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    registered: bool,
    connection: ConnectionRecord,
) {
    info!(registered, connected = connection.is_connected(), "resolving session");
    match (registered, connection) {
        (true, ConnectionRecord::Connected { server_address }) => {
            state.server_address = Some(server_address);
            // A resumed session is not a fresh connection.
            state.connection_success_pending = false;
            enter_action_selection(state, commands);
        }
        (true, ConnectionRecord::Disconnected) => {
            state.server_address = None;
            state.navigate(Screen::ConnectionSelection);
        }
        (false, _) => {
            state.server_address = None;
            state.navigate(Screen::RegistrationIntro);
        }
    }
}

pub fn handle_registration_intro(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    action: UserAction,
) {
    match action {
        UserAction::Continue => {
            state.restoring = false;
            // This screen is only reached unregistered, so resolving again
            // would land right back here.
            match state.application_address.clone() {
                Some(application_address) => {
                    state.navigate(Screen::RegisterAccount);
                    commands.push(Command::SetupAccount {
                        application_address,
                        resolve_session: false,
                    });
                }
                None => state.navigate(Screen::ApplicationAddress),
            }
        }
        UserAction::Restore => {
            state.restoring = true;
            state.navigate(Screen::ApplicationAddress);
        }
        other => ignore(&Screen::RegistrationIntro, &other),
    }
}

pub fn handle_application_address(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    action: UserAction,
) {
    match action {
        UserAction::SubmitAddress(input) => match ServerAddress::parse(&input) {
            Ok(address) => {
                state.application_address = Some(address.clone());
                commands.push(Command::SaveApplicationAddress(address.clone()));
                commands.push(Command::SetupAccount {
                    application_address: address,
                    resolve_session: false,
                });
                if state.restoring {
                    state.navigate(Screen::RestoreStart);
                } else {
                    state.navigate(Screen::RegisterAccount);
                }
            }
            Err(e) => {
                warn!(error = %e, "rejected application address");
                state.raise_toast(commands, e.to_string(), e.category().toast_level());
                state.validation_error = Some(e);
            }
        },
        UserAction::Back => {
            state.restoring = false;
            state.navigate(Screen::RegistrationIntro);
        }
        other => ignore(&Screen::ApplicationAddress, &other),
    }
}

pub fn handle_register_account(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    action: UserAction,
) {
    match action {
        // Retry after a failed registration.
        UserAction::Continue => commands.push(Command::LaunchFlow(FlowKind::Registration)),
        other => ignore(state.screen(), &other),
    }
}
