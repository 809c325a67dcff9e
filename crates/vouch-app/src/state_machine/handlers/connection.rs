//! Server connection
//!
//! Every attempt carries an id. Completions and timeouts for an attempt
//! apply only while that attempt is still connecting, so a late success
//! after a timeout or a cancel is a no-op.

use tracing::{debug, error, info, warn};

use super::super::{
    AttemptId, Command, ConnectTarget, ConnectionAttempt, ConnectionMethod, SessionState,
    UserAction,
};
use super::{enter_action_selection, ignore};
use crate::address::ServerAddress;
use crate::errors::{Categorized, ErrorCategory};
use crate::screen::Screen;

/// Text shown when an attempt runs out of time.
pub const TIMEOUT_MESSAGE: &str = "Connection timed out";

pub fn handle_connection_selection(state: &mut SessionState, action: UserAction) {
    match action {
        UserAction::ChooseConnection(ConnectionMethod::Manual) => {
            state.navigate(Screen::ManualConnection);
        }
        UserAction::ChooseConnection(ConnectionMethod::ScanQr) => {
            state.navigate(Screen::QrCodeReader);
        }
        other => ignore(&Screen::ConnectionSelection, &other),
    }
}

pub fn handle_manual_connection(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    action: UserAction,
) {
    match action {
        UserAction::SubmitAddress(input) => match ServerAddress::parse(&input) {
            Ok(server_address) => {
                state.navigate(Screen::ServerConnectionProcessing {
                    server_address: server_address.clone(),
                });
                start_attempt(state, commands, ConnectTarget::Address(server_address));
            }
            Err(e) => {
                warn!(error = %e, "rejected server address");
                state.raise_toast(commands, e.to_string(), e.category().toast_level());
                state.validation_error = Some(e);
            }
        },
        UserAction::Back => state.navigate(Screen::ConnectionSelection),
        other => ignore(&Screen::ManualConnection, &other),
    }
}

pub fn handle_qr_code_reader(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    action: UserAction,
) {
    match action {
        UserAction::QrScanned(payload) => {
            if state.is_connecting() {
                debug!("already connecting, ignoring scanned code");
                return;
            }
            start_attempt(state, commands, ConnectTarget::QrCode(payload));
        }
        UserAction::QrScanFailed(reason) => {
            warn!(%reason, "QR scan failed");
            state.raise_toast(
                commands,
                format!("QR scan failed: {reason}"),
                ErrorCategory::Input.toast_level(),
            );
        }
        UserAction::Back => {
            cancel_attempt(state);
            state.navigate(Screen::ConnectionSelection);
        }
        other => ignore(&Screen::QrCodeReader, &other),
    }
}

pub fn handle_connection_processing(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    action: UserAction,
    server_address: ServerAddress,
) {
    match action {
        UserAction::RetryConnection if !state.is_connecting() => {
            start_attempt(state, commands, ConnectTarget::Address(server_address));
        }
        UserAction::Back => {
            // No going back past a connection without disconnecting.
            cancel_attempt(state);
            state.server_address = None;
            commands.push(Command::ResetConnection);
            state.navigate(Screen::ConnectionSelection);
        }
        other => ignore(state.screen(), &other),
    }
}

fn start_attempt(state: &mut SessionState, commands: &mut Vec<Command>, target: ConnectTarget) {
    let id = state.next_attempt_id();
    info!(attempt = %id, "connecting to server");
    state.attempt = Some(ConnectionAttempt {
        id,
        target: target.clone(),
        is_connecting: true,
        has_timed_out: false,
        error: None,
    });
    commands.push(Command::Connect {
        attempt: id,
        target,
    });
    commands.push(Command::ArmConnectTimeout {
        attempt: id,
        after: state.settings.connect_timeout,
    });
}

fn cancel_attempt(state: &mut SessionState) {
    if let Some(attempt) = state.attempt.take() {
        if attempt.is_connecting {
            info!(attempt = %attempt.id, "connection attempt cancelled");
        }
    }
}

/// The live attempt with id `id`, if its completions still apply.
fn live_attempt(state: &mut SessionState, id: AttemptId) -> Option<&mut ConnectionAttempt> {
    state
        .attempt
        .as_mut()
        .filter(|attempt| attempt.id == id && attempt.is_connecting)
}

pub fn handle_connect_finished(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    id: AttemptId,
    result: Result<ServerAddress, String>,
) {
    let Some(attempt) = live_attempt(state, id) else {
        debug!(attempt = %id, "ignoring completion of a stale connection attempt");
        return;
    };
    attempt.is_connecting = false;

    match result {
        Ok(server_address) => {
            info!(attempt = %id, server = %server_address.abbreviated(), "connected");
            state.attempt = None;
            state.server_address = Some(server_address.clone());
            commands.push(Command::PersistConnection(server_address));
            state.connection_success_pending = true;
            enter_action_selection(state, commands);
        }
        Err(reason) => {
            error!(attempt = %id, %reason, "connection failed");
            let message = format!("Failed to connect: {reason}");
            attempt.error = Some(message.clone());
            state.raise_toast(commands, message, ErrorCategory::Network.toast_level());
        }
    }
}

pub fn handle_connect_timed_out(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    id: AttemptId,
) {
    let Some(attempt) = live_attempt(state, id) else {
        debug!(attempt = %id, "ignoring timeout of a finished connection attempt");
        return;
    };
    warn!(attempt = %id, "connection attempt timed out");
    attempt.is_connecting = false;
    attempt.has_timed_out = true;
    attempt.error = Some(TIMEOUT_MESSAGE.to_string());
    state.raise_toast(commands, TIMEOUT_MESSAGE, ErrorCategory::Timeout.toast_level());
}
