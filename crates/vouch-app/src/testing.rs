//! # Session Test Utilities
//!
//! Deterministic harness over the pure transition function. Tests drive a
//! [`TestSession`] with events and assert on the resulting screen, toasts
//! and commands; nothing is executed.
//!
//! ```rust,ignore
//! use vouch_app::testing::{server_address, TestSession};
//!
//! let mut session = TestSession::connected_to(server_address(1));
//! session.send_user(UserAction::SelectAction(ActionKind::VerifyCredentials));
//! session.assert_screen(Screen::VerifyCredential);
//! ```

use crate::address::ServerAddress;
use crate::message::{CredentialRequest, InboundMessage, VerificationRequest};
use crate::request::{MessageId, RequestId};
use crate::screen::Screen;
use crate::state_machine::{transition, Command, Event, SessionState, UserAction};
use crate::store::ConnectionRecord;

/// A valid address whose bytes are all `byte`.
pub fn server_address(byte: u8) -> ServerAddress {
    let hex: String = std::iter::repeat(format!("{byte:02x}")).take(33).collect();
    match ServerAddress::parse(&hex) {
        Ok(address) => address,
        Err(e) => panic!("generated address is invalid: {e}"),
    }
}

/// Inbound credential request from `from`.
pub fn credential_request(from: &ServerAddress, in_reply_to: Option<MessageId>) -> InboundMessage {
    InboundMessage::CredentialRequest(CredentialRequest {
        id: MessageId::new("cred-req"),
        from: from.clone(),
        types: vec!["EmailCredential".to_string()],
        in_reply_to,
    })
}

/// Inbound verification request from `from`.
pub fn verification_request(
    from: &ServerAddress,
    in_reply_to: Option<MessageId>,
) -> InboundMessage {
    InboundMessage::VerificationRequest(VerificationRequest {
        id: MessageId::new("verify-req"),
        from: from.clone(),
        types: vec!["DocumentSignature".to_string()],
        in_reply_to,
    })
}

/// Test-focused session wrapper with assertion helpers.
pub struct TestSession {
    state: SessionState,
    /// Every command produced so far
    commands: Vec<Command>,
}

impl Default for TestSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSession {
    /// Fresh session on the initialization screen.
    pub fn new() -> Self {
        Self::with_state(SessionState::new())
    }

    /// Session starting from `state`.
    pub fn with_state(state: SessionState) -> Self {
        Self {
            state,
            commands: Vec::new(),
        }
    }

    /// Cold start with a stored application address, resolved as given.
    pub fn resolved(registered: bool, connection: ConnectionRecord) -> Self {
        let mut session = Self::new();
        session.send_event(Event::SdkInitialized {
            application_address: Some(server_address(0xaa)),
        });
        session.send_event(Event::AccountSetupFinished {
            resolve_session: true,
            result: Ok(()),
        });
        session.send_event(Event::SessionResolved {
            registered,
            connection,
        });
        session.clear_commands();
        session
    }

    /// Registered session resumed on the hub, bound to `server`.
    pub fn connected_to(server: ServerAddress) -> Self {
        Self::resolved(
            true,
            ConnectionRecord::Connected {
                server_address: server,
            },
        )
    }

    /// Get current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Get mutable state (for setup).
    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    /// Current screen.
    pub fn screen(&self) -> &Screen {
        self.state.screen()
    }

    /// All captured commands.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Forget captured commands.
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Apply one event and return the commands it produced.
    pub fn send_event(&mut self, event: Event) -> Vec<Command> {
        let (next, commands) = transition(&self.state, event);
        self.state = next;
        self.commands.extend(commands.iter().cloned());
        commands
    }

    /// Apply several events in order.
    pub fn send_events(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.send_event(event);
        }
    }

    /// Apply a user action.
    pub fn send_user(&mut self, action: UserAction) -> Vec<Command> {
        self.send_event(Event::User(action))
    }

    /// Deliver an inbound message.
    pub fn deliver(&mut self, message: InboundMessage) -> Vec<Command> {
        self.send_event(Event::Inbound(message))
    }

    /// Assert current screen.
    pub fn assert_screen(&self, expected: Screen) {
        assert_eq!(
            self.state.screen(),
            &expected,
            "Expected screen {:?}, got {:?}",
            expected,
            self.state.screen()
        );
    }

    /// Visible toast texts.
    pub fn toasts(&self) -> Vec<&str> {
        self.state.toasts.messages()
    }

    /// Assert a visible toast contains `text`.
    pub fn assert_toast_shown(&self, text: &str) {
        assert!(
            self.toasts().iter().any(|m| m.contains(text)),
            "Expected toast containing '{}', got {:?}",
            text,
            self.toasts()
        );
    }

    /// Whether any captured command satisfies `check`.
    pub fn has_command(&self, check: impl Fn(&Command) -> bool) -> bool {
        self.commands.iter().any(check)
    }

    /// Id of the most recent `SendServerRequest`.
    pub fn last_request(&self) -> Option<RequestId> {
        self.commands.iter().rev().find_map(|c| match c {
            Command::SendServerRequest { request, .. } => Some(*request),
            _ => None,
        })
    }
}
