//! Transition handlers, one module per flow family.
//!
//! Handlers mutate the cloned state in place and append commands.

pub(super) mod actions;
pub(super) mod connection;
pub(super) mod exchange;
pub(super) mod flows;
pub(super) mod inbound;
pub(super) mod onboarding;

use tracing::{debug, warn};

use super::{Command, SessionState, UserAction};
use crate::request::{OutstandingServerRequest, RequestTicket, ServerRequestKind};
use crate::screen::Screen;
use crate::toast::ToastLevel;

/// Text of the one-shot toast after a fresh connection.
pub const CONNECTED_TOAST: &str = "Connected to server";

/// Text of the toast when a request is picked with no bound server.
pub const NOT_CONNECTED: &str = "Not connected to a server";

pub(super) fn ignore(screen: &Screen, action: &UserAction) {
    debug!(%screen, ?action, "action has no effect on this screen");
}

/// Enter the hub, consuming the connection success flag.
pub(super) fn enter_action_selection(state: &mut SessionState, commands: &mut Vec<Command>) {
    state.navigate(Screen::ActionSelection);
    if std::mem::take(&mut state.connection_success_pending) {
        state.raise_toast(commands, CONNECTED_TOAST, ToastLevel::Success);
    }
}

/// Send a tagged request to the bound server and wait for its reply.
///
/// A request already outstanding is replaced; its completions are ignored
/// from here on. Returns false when no server is bound.
pub(super) fn begin_request(
    state: &mut SessionState,
    commands: &mut Vec<Command>,
    kind: ServerRequestKind,
) -> bool {
    let Some(to) = state.server_address.clone() else {
        warn!(%kind, "cannot send request without a connected server");
        state.raise_toast(commands, NOT_CONNECTED, ToastLevel::Error);
        return false;
    };

    if let Some(previous) = state.outstanding.kind() {
        warn!(%previous, next = %kind, "replacing outstanding request");
    }

    let request = state.next_request_id();
    state.outstanding = OutstandingServerRequest::new(kind, RequestTicket::new(request));
    state.overlay = Some(format!("Sending {} request...", kind.label()));
    commands.push(Command::SendServerRequest { request, kind, to });
    true
}
