//! # Session State Machine
//!
//! Pure model of the client session:
//!
//! ```text
//! SessionState × Event → (SessionState, Vec<Command>)
//! ```
//!
//! The transition never performs I/O. Network calls, store writes, flows and
//! timers are returned as [`Command`]s; the runtime executes them and feeds
//! their results back as new [`Event`]s. Replaying the same events from the
//! same state always yields the same screens and commands.

mod commands;
mod events;
mod handlers;

use std::time::Duration;

use tracing::{debug, info};

pub use commands::{AttemptId, Command, ConnectTarget, FlowKind};
pub use events::{ActionKind, ConnectionMethod, CredentialChoice, Event, UserAction};
pub use handlers::connection::TIMEOUT_MESSAGE;
pub use handlers::exchange::AUTH_REJECTED;
pub use handlers::inbound::SIGNING_UNSUPPORTED;
pub use handlers::{CONNECTED_TOAST, NOT_CONNECTED};

use crate::address::{AddressError, ServerAddress};
use crate::message::PendingInboundRequests;
use crate::request::{OutstandingServerRequest, RequestId};
use crate::screen::Screen;
use crate::toast::{ToastLevel, ToastQueue};

/// Default time a connection attempt may take.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default toast display time.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);

/// Tunables the transitions put into commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    /// Delay of `ArmConnectTimeout`
    pub connect_timeout: Duration,
    /// Delay of `ScheduleToastExpiry`
    pub toast_duration: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            toast_duration: DEFAULT_TOAST_DURATION,
        }
    }
}

/// One connection attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionAttempt {
    /// Id carried by the attempt's completions
    pub id: AttemptId,
    /// What is being connected
    pub target: ConnectTarget,
    /// Completions are applied only while this is set
    pub is_connecting: bool,
    /// The timer fired before a completion
    pub has_timed_out: bool,
    /// Failure text shown on the connecting screen
    pub error: Option<String>,
}

/// Complete session state.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    screen: Screen,
    /// Request awaiting an inbound reply
    pub outstanding: OutstandingServerRequest,
    /// Peer requests awaiting accept or reject
    pub pending: PendingInboundRequests,
    /// Current or last connection attempt
    pub attempt: Option<ConnectionAttempt>,
    /// Server we are bound to
    pub server_address: Option<ServerAddress>,
    /// Durable application address
    pub application_address: Option<ServerAddress>,
    /// Onboarding is restoring an existing account
    pub restoring: bool,
    /// Show "Connected to server" on the next entry to the hub
    pub connection_success_pending: bool,
    /// Waiting overlay text
    pub overlay: Option<String>,
    /// Visible toasts
    pub toasts: ToastQueue,
    /// Last rejected address input
    pub validation_error: Option<AddressError>,
    /// Tunables
    pub settings: SessionSettings,
    next_request_id: u64,
    next_attempt_id: u64,
}

impl SessionState {
    /// Fresh state on the initialization screen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh state with custom settings.
    pub fn with_settings(settings: SessionSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Current screen.
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Whether a connection attempt is in flight.
    pub fn is_connecting(&self) -> bool {
        self.attempt.as_ref().is_some_and(|a| a.is_connecting)
    }

    pub(crate) fn navigate(&mut self, to: Screen) {
        if self.screen != to {
            info!(from = %self.screen, to = %to, "screen transition");
        }
        self.validation_error = None;
        self.screen = to;
    }

    pub(crate) fn raise_toast(
        &mut self,
        commands: &mut Vec<Command>,
        message: impl Into<String>,
        level: ToastLevel,
    ) {
        let id = self.toasts.push(message, level);
        commands.push(Command::ScheduleToastExpiry {
            id,
            after: self.settings.toast_duration,
        });
    }

    pub(crate) fn next_request_id(&mut self) -> RequestId {
        self.next_request_id += 1;
        RequestId(self.next_request_id)
    }

    pub(crate) fn next_attempt_id(&mut self) -> AttemptId {
        self.next_attempt_id += 1;
        AttemptId(self.next_attempt_id)
    }

    /// Drop the outstanding request, pending peer requests and the overlay.
    pub(crate) fn abandon_exchange(&mut self) {
        if let Some(kind) = self.outstanding.kind() {
            debug!(%kind, "abandoning outstanding request");
        }
        self.outstanding = OutstandingServerRequest::None;
        self.pending.clear();
        self.overlay = None;
    }
}

/// Pure state transition.
pub fn transition(state: &SessionState, event: Event) -> (SessionState, Vec<Command>) {
    let mut next = state.clone();
    let mut commands = Vec::new();

    match event {
        Event::SdkInitialized {
            application_address,
        } => {
            handlers::onboarding::handle_sdk_initialized(
                &mut next,
                &mut commands,
                application_address,
            );
        }
        Event::AccountSetupFinished {
            resolve_session,
            result,
        } => {
            handlers::onboarding::handle_account_setup_finished(
                &mut next,
                &mut commands,
                resolve_session,
                result,
            );
        }
        Event::SessionResolved {
            registered,
            connection,
        } => {
            handlers::onboarding::determine_next_screen(
                &mut next,
                &mut commands,
                registered,
                connection,
            );
        }
        Event::User(action) => {
            handle_user_action(&mut next, &mut commands, action);
        }
        Event::Inbound(message) => {
            handlers::inbound::handle_inbound_message(&mut next, &mut commands, message);
        }
        Event::Exchange(outcome) => {
            handlers::exchange::handle_exchange_outcome(&mut next, &mut commands, outcome);
        }
        Event::ConnectFinished { attempt, result } => {
            handlers::connection::handle_connect_finished(&mut next, &mut commands, attempt, result);
        }
        Event::ConnectTimedOut { attempt } => {
            handlers::connection::handle_connect_timed_out(&mut next, &mut commands, attempt);
        }
        Event::RequestSent { request, result } => {
            handlers::actions::handle_request_sent(&mut next, &mut commands, request, result);
        }
        Event::FlowFinished { flow, result } => {
            handlers::flows::handle_flow_finished(&mut next, &mut commands, flow, result);
        }
        Event::ToastExpired { id } => {
            next.toasts.dismiss(id);
        }
    }

    (next, commands)
}

/// Route a user action to the handler of the current screen.
fn handle_user_action(state: &mut SessionState, commands: &mut Vec<Command>, action: UserAction) {
    let screen = state.screen().clone();
    match screen {
        Screen::Initialization => handlers::ignore(&screen, &action),
        Screen::RegistrationIntro => {
            handlers::onboarding::handle_registration_intro(state, commands, action);
        }
        Screen::ApplicationAddress => {
            handlers::onboarding::handle_application_address(state, commands, action);
        }
        Screen::RegisterAccount => {
            handlers::onboarding::handle_register_account(state, commands, action);
        }
        Screen::ConnectionSelection => {
            handlers::connection::handle_connection_selection(state, action);
        }
        Screen::ManualConnection => {
            handlers::connection::handle_manual_connection(state, commands, action);
        }
        Screen::QrCodeReader => {
            handlers::connection::handle_qr_code_reader(state, commands, action);
        }
        Screen::ServerConnectionProcessing { server_address } => {
            handlers::connection::handle_connection_processing(
                state,
                commands,
                action,
                server_address,
            );
        }
        Screen::ActionSelection => {
            handlers::actions::handle_action_selection(state, commands, action);
        }
        Screen::VerifyCredential => {
            handlers::actions::handle_verify_selection(state, action);
        }
        Screen::ShareCredential => {
            handlers::actions::handle_share_selection(state, commands, action);
        }
        Screen::VerifyEmailStart
        | Screen::VerifyDocumentStart
        | Screen::GetCustomCredentialStart
        | Screen::BackupStart
        | Screen::RestoreStart => {
            handlers::flows::handle_flow_start(state, commands, action);
        }
        Screen::AuthStart
        | Screen::ShareEmailStart
        | Screen::ShareDocumentStart
        | Screen::ShareCustomStart
        | Screen::DocSignStart => {
            handlers::exchange::handle_exchange_screen(state, action);
        }
        Screen::EmailFlow | Screen::DocumentFlow | Screen::BackupFlow | Screen::RestoreFlow => {
            // The SDK owns these screens until it reports FlowFinished.
            handlers::ignore(&screen, &action);
        }
        Screen::VerifyEmailResult { .. }
        | Screen::VerifyDocumentResult { .. }
        | Screen::GetCustomCredentialResult { .. }
        | Screen::ShareEmailResult { .. }
        | Screen::ShareDocumentResult { .. }
        | Screen::ShareCustomResult { .. }
        | Screen::AuthResult { .. }
        | Screen::DocSignResult { .. }
        | Screen::BackupResult { .. }
        | Screen::RestoreResult { .. } => {
            handlers::flows::handle_result_screen(state, commands, action);
        }
    }
}
