#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
//! # Deterministic Session Tests
//!
//! Drive the pure transition function through whole flows and check the
//! screens, toasts and commands it produces. No runtime, no timers.

use assert_matches::assert_matches;
use proptest::prelude::*;
use vouch_app::message::{
    ChatMessage, CredentialMessage, CredentialResponse, ExchangeOutcome, InboundMessage, Receipt,
    SigningRequest,
};
use vouch_app::request::{MessageId, OutstandingServerRequest, ServerRequestKind};
use vouch_app::screen::Screen;
use vouch_app::state_machine::{
    ActionKind, AttemptId, Command, ConnectTarget, ConnectionMethod, CredentialChoice, Event,
    FlowKind, UserAction, AUTH_REJECTED, CONNECTED_TOAST, NOT_CONNECTED, SIGNING_UNSUPPORTED,
    TIMEOUT_MESSAGE,
};
use vouch_app::store::{
    ConnectionRecord, ConnectionStateStore, LocalStore, MemoryKeyValueStore, StoredValue,
    KEY_CONNECTED_SERVER_ADDRESS, KEY_SERVER_CONNECTED,
};
use vouch_app::testing::{credential_request, server_address, verification_request, TestSession};

fn connect_manually(session: &mut TestSession, input: &str) -> AttemptId {
    session.send_user(UserAction::ChooseConnection(ConnectionMethod::Manual));
    session.assert_screen(Screen::ManualConnection);
    let commands = session.send_user(UserAction::SubmitAddress(input.to_string()));
    commands
        .iter()
        .find_map(|c| match c {
            Command::Connect { attempt, .. } => Some(*attempt),
            _ => None,
        })
        .expect("submit should start a connection attempt")
}

fn count_connected_toasts(session: &TestSession) -> usize {
    session
        .toasts()
        .iter()
        .filter(|m| **m == CONNECTED_TOAST)
        .count()
}

// ============================================================================
// Cold start
// ============================================================================

#[test]
fn cold_start_without_application_address_asks_for_it() {
    let mut session = TestSession::new();
    session.assert_screen(Screen::Initialization);
    let commands = session.send_event(Event::SdkInitialized {
        application_address: None,
    });
    assert!(commands.is_empty());
    session.assert_screen(Screen::ApplicationAddress);
}

#[test]
fn cold_start_with_application_address_sets_up_then_resolves() {
    let mut session = TestSession::new();
    let app = server_address(0xaa);
    let commands = session.send_event(Event::SdkInitialized {
        application_address: Some(app.clone()),
    });
    assert_eq!(
        commands,
        vec![Command::SetupAccount {
            application_address: app,
            resolve_session: true
        }]
    );
    session.assert_screen(Screen::Initialization);

    let commands = session.send_event(Event::AccountSetupFinished {
        resolve_session: true,
        result: Ok(()),
    });
    assert_eq!(commands, vec![Command::ResolveSession]);
}

#[test]
fn resumed_session_lands_on_hub_without_success_toast() {
    let server = server_address(1);
    let session = TestSession::connected_to(server.clone());
    session.assert_screen(Screen::ActionSelection);
    assert!(!session.state().connection_success_pending);
    assert_eq!(count_connected_toasts(&session), 0);
    assert_eq!(session.state().server_address, Some(server));
}

#[test]
fn registered_but_disconnected_goes_to_connection_selection() {
    let session = TestSession::resolved(true, ConnectionRecord::Disconnected);
    session.assert_screen(Screen::ConnectionSelection);
}

#[test]
fn unregistered_goes_to_registration_intro() {
    let session = TestSession::resolved(
        false,
        ConnectionRecord::Connected {
            server_address: server_address(1),
        },
    );
    session.assert_screen(Screen::RegistrationIntro);
    assert_eq!(session.state().server_address, None);
}

#[test]
fn intro_continue_with_stored_address_starts_registration() {
    let mut session = TestSession::resolved(false, ConnectionRecord::Disconnected);

    let commands = session.send_user(UserAction::Continue);
    session.assert_screen(Screen::RegisterAccount);
    assert_eq!(
        commands,
        vec![Command::SetupAccount {
            application_address: server_address(0xaa),
            resolve_session: false,
        }]
    );

    let commands = session.send_event(Event::AccountSetupFinished {
        resolve_session: false,
        result: Ok(()),
    });
    assert_eq!(commands, vec![Command::LaunchFlow(FlowKind::Registration)]);
}

#[test]
fn corrupt_connection_record_is_repaired_and_never_reaches_hub() {
    let store = LocalStore::new(MemoryKeyValueStore::with_values([(
        KEY_SERVER_CONNECTED,
        StoredValue::Bool(true),
    )]));

    // The runtime resolves the session from a validated read.
    let record = store.read().unwrap();
    assert_eq!(record, ConnectionRecord::Disconnected);
    let raw = store.backend().snapshot();
    assert_eq!(raw.get(KEY_SERVER_CONNECTED), Some(&StoredValue::Bool(false)));
    assert!(!raw.contains_key(KEY_CONNECTED_SERVER_ADDRESS));

    let unregistered = TestSession::resolved(false, record.clone());
    unregistered.assert_screen(Screen::RegistrationIntro);

    let registered = TestSession::resolved(true, record);
    assert_ne!(registered.screen(), &Screen::ActionSelection);
}

#[test]
fn account_setup_failure_returns_to_address_entry() {
    let mut session = TestSession::new();
    session.send_event(Event::SdkInitialized {
        application_address: Some(server_address(0xaa)),
    });
    session.send_event(Event::AccountSetupFinished {
        resolve_session: true,
        result: Err("sdk offline".into()),
    });
    session.assert_screen(Screen::ApplicationAddress);
    session.assert_toast_shown("Account setup failed: sdk offline");
    assert_eq!(session.state().application_address, None);
}

// ============================================================================
// Onboarding
// ============================================================================

#[test]
fn registration_flow_reaches_connection_selection() {
    let mut session = TestSession::new();
    session.send_event(Event::SdkInitialized {
        application_address: None,
    });

    let app = server_address(0x0b);
    let commands = session.send_user(UserAction::SubmitAddress(app.to_string()));
    session.assert_screen(Screen::RegisterAccount);
    assert!(commands.contains(&Command::SaveApplicationAddress(app.clone())));
    assert!(commands.contains(&Command::SetupAccount {
        application_address: app,
        resolve_session: false,
    }));

    let commands = session.send_event(Event::AccountSetupFinished {
        resolve_session: false,
        result: Ok(()),
    });
    assert_eq!(commands, vec![Command::LaunchFlow(FlowKind::Registration)]);

    session.send_event(Event::FlowFinished {
        flow: FlowKind::Registration,
        result: Err("liveness failed".into()),
    });
    session.assert_screen(Screen::RegisterAccount);
    session.assert_toast_shown("Registration failed");

    let commands = session.send_user(UserAction::Continue);
    assert_eq!(commands, vec![Command::LaunchFlow(FlowKind::Registration)]);

    session.send_event(Event::FlowFinished {
        flow: FlowKind::Registration,
        result: Ok(()),
    });
    session.assert_screen(Screen::ConnectionSelection);
}

#[test]
fn invalid_application_address_is_rejected_without_screen_change() {
    let mut session = TestSession::new();
    session.send_event(Event::SdkInitialized {
        application_address: None,
    });
    let commands = session.send_user(UserAction::SubmitAddress("1234".into()));
    session.assert_screen(Screen::ApplicationAddress);
    assert!(session.state().validation_error.is_some());
    assert!(!commands
        .iter()
        .any(|c| matches!(c, Command::SetupAccount { .. })));
}

#[test]
fn restore_path_runs_restore_flow_and_resolves() {
    let mut session = TestSession::resolved(false, ConnectionRecord::Disconnected);
    session.send_user(UserAction::Restore);
    session.assert_screen(Screen::ApplicationAddress);
    assert!(session.state().restoring);

    session.send_user(UserAction::SubmitAddress(server_address(2).to_string()));
    session.assert_screen(Screen::RestoreStart);

    let commands = session.send_user(UserAction::Continue);
    session.assert_screen(Screen::RestoreFlow);
    assert_eq!(commands, vec![Command::LaunchFlow(FlowKind::Restore)]);

    session.send_event(Event::FlowFinished {
        flow: FlowKind::Restore,
        result: Ok(()),
    });
    session.assert_screen(Screen::RestoreResult { success: true });
    assert!(!session.state().restoring);

    let commands = session.send_user(UserAction::Continue);
    assert_eq!(commands, vec![Command::ResolveSession]);
}

#[test]
fn failed_restore_returns_to_intro() {
    let mut session = TestSession::resolved(false, ConnectionRecord::Disconnected);
    session.send_user(UserAction::Restore);
    session.send_user(UserAction::SubmitAddress(server_address(2).to_string()));
    session.send_user(UserAction::Continue);
    session.send_event(Event::FlowFinished {
        flow: FlowKind::Restore,
        result: Err("no backup".into()),
    });
    session.assert_screen(Screen::RestoreResult { success: false });
    session.send_user(UserAction::Continue);
    session.assert_screen(Screen::RegistrationIntro);
}

#[test]
fn back_from_address_entry_cancels_restore() {
    let mut session = TestSession::resolved(false, ConnectionRecord::Disconnected);
    session.send_user(UserAction::Restore);
    session.send_user(UserAction::Back);
    session.assert_screen(Screen::RegistrationIntro);
    assert!(!session.state().restoring);
}

// ============================================================================
// Server connection
// ============================================================================

#[test]
fn manual_connect_persists_and_toasts_exactly_once() {
    let mut session = TestSession::resolved(true, ConnectionRecord::Disconnected);
    let server = server_address(0x42);
    let attempt = connect_manually(&mut session, server.as_str());
    session.assert_screen(Screen::ServerConnectionProcessing {
        server_address: server.clone(),
    });
    assert!(session.state().is_connecting());
    assert!(session.has_command(|c| matches!(c, Command::ArmConnectTimeout { attempt: a, .. } if *a == attempt)));

    let commands = session.send_event(Event::ConnectFinished {
        attempt,
        result: Ok(server.clone()),
    });
    assert!(commands.contains(&Command::PersistConnection(server.clone())));
    session.assert_screen(Screen::ActionSelection);
    assert_eq!(count_connected_toasts(&session), 1);
    assert!(!session.state().connection_success_pending);

    // Round trip through a flow: no second toast.
    session.send_user(UserAction::SelectAction(ActionKind::VerifyCredentials));
    session.send_user(UserAction::Back);
    session.assert_screen(Screen::ActionSelection);
    assert_eq!(count_connected_toasts(&session), 1);

    // Once expired it never comes back.
    let toast_id = session.state().toasts.current().map(|t| t.id).unwrap();
    session.send_event(Event::ToastExpired { id: toast_id });
    session.send_user(UserAction::SelectAction(ActionKind::Backup));
    session.send_user(UserAction::Back);
    assert_eq!(count_connected_toasts(&session), 0);
}

#[test]
fn manual_connect_then_store_reads_back_the_address() {
    let store = LocalStore::new(MemoryKeyValueStore::new());
    let mut session = TestSession::resolved(true, ConnectionRecord::Disconnected);
    let server = server_address(0x42);
    let attempt = connect_manually(&mut session, server.as_str());
    let commands = session.send_event(Event::ConnectFinished {
        attempt,
        result: Ok(server.clone()),
    });

    // Execute the persistence command the way the runtime does.
    for command in commands {
        if let Command::PersistConnection(address) = command {
            store
                .save(&ConnectionRecord::Connected {
                    server_address: address,
                })
                .unwrap();
        }
    }
    assert_eq!(
        store.read().unwrap(),
        ConnectionRecord::Connected {
            server_address: server
        }
    );
}

#[test]
fn invalid_server_address_never_starts_an_attempt() {
    let mut session = TestSession::resolved(true, ConnectionRecord::Disconnected);
    session.send_user(UserAction::ChooseConnection(ConnectionMethod::Manual));
    let commands = session.send_user(UserAction::SubmitAddress("zz".repeat(33)));
    session.assert_screen(Screen::ManualConnection);
    assert!(!commands.iter().any(|c| matches!(c, Command::Connect { .. })));
    assert_matches!(
        session.state().validation_error,
        Some(vouch_app::AddressError::InvalidCharacter { position: 0, .. })
    );
}

#[test]
fn timeout_then_stale_success_stays_in_timeout_state() {
    let mut session = TestSession::resolved(true, ConnectionRecord::Disconnected);
    let server = server_address(0x42);
    let attempt = connect_manually(&mut session, server.as_str());

    session.send_event(Event::ConnectTimedOut { attempt });
    let processing = Screen::ServerConnectionProcessing {
        server_address: server.clone(),
    };
    session.assert_screen(processing.clone());
    session.assert_toast_shown(TIMEOUT_MESSAGE);

    let commands = session.send_event(Event::ConnectFinished {
        attempt,
        result: Ok(server),
    });
    assert!(commands.is_empty());
    session.assert_screen(processing);
    let current = session.state().attempt.as_ref().unwrap();
    assert!(current.has_timed_out);
    assert!(!current.is_connecting);
    assert_eq!(current.error.as_deref(), Some(TIMEOUT_MESSAGE));
}

#[test]
fn success_then_late_timeout_is_ignored() {
    let mut session = TestSession::resolved(true, ConnectionRecord::Disconnected);
    let server = server_address(0x42);
    let attempt = connect_manually(&mut session, server.as_str());
    session.send_event(Event::ConnectFinished {
        attempt,
        result: Ok(server),
    });
    let commands = session.send_event(Event::ConnectTimedOut { attempt });
    assert!(commands.is_empty());
    session.assert_screen(Screen::ActionSelection);
}

#[test]
fn connect_failure_then_retry_starts_a_fresh_attempt() {
    let mut session = TestSession::resolved(true, ConnectionRecord::Disconnected);
    let server = server_address(0x42);
    let first = connect_manually(&mut session, server.as_str());

    session.send_event(Event::ConnectFinished {
        attempt: first,
        result: Err("unreachable".into()),
    });
    session.assert_toast_shown("Failed to connect: unreachable");
    assert!(!session.state().is_connecting());

    let commands = session.send_user(UserAction::RetryConnection);
    let second = commands
        .iter()
        .find_map(|c| match c {
            Command::Connect { attempt, .. } => Some(*attempt),
            _ => None,
        })
        .unwrap();
    assert_ne!(first, second);

    // The old attempt's timer is stale now.
    session.send_event(Event::ConnectTimedOut { attempt: first });
    assert!(session.state().is_connecting());
}

#[test]
fn retry_while_connecting_is_ignored() {
    let mut session = TestSession::resolved(true, ConnectionRecord::Disconnected);
    connect_manually(&mut session, server_address(1).as_str());
    let commands = session.send_user(UserAction::RetryConnection);
    assert!(commands.is_empty());
}

#[test]
fn back_from_connecting_cancels_and_resets() {
    let mut session = TestSession::resolved(true, ConnectionRecord::Disconnected);
    let server = server_address(0x42);
    let attempt = connect_manually(&mut session, server.as_str());

    let commands = session.send_user(UserAction::Back);
    assert!(commands.contains(&Command::ResetConnection));
    session.assert_screen(Screen::ConnectionSelection);

    let commands = session.send_event(Event::ConnectFinished {
        attempt,
        result: Ok(server),
    });
    assert!(commands.is_empty());
    session.assert_screen(Screen::ConnectionSelection);
}

#[test]
fn qr_connect_learns_address_from_sdk() {
    let mut session = TestSession::resolved(true, ConnectionRecord::Disconnected);
    session.send_user(UserAction::ChooseConnection(ConnectionMethod::ScanQr));
    session.assert_screen(Screen::QrCodeReader);

    session.send_user(UserAction::QrScanFailed("camera denied".into()));
    session.assert_toast_shown("QR scan failed: camera denied");

    let commands = session.send_user(UserAction::QrScanned(b"qr-payload".to_vec()));
    let attempt = commands
        .iter()
        .find_map(|c| match c {
            Command::Connect {
                attempt,
                target: ConnectTarget::QrCode(payload),
            } if payload.as_slice() == b"qr-payload" => Some(*attempt),
            _ => None,
        })
        .unwrap();
    session.assert_screen(Screen::QrCodeReader);

    // A second scan while connecting does nothing.
    assert!(session.send_user(UserAction::QrScanned(vec![1])).is_empty());

    let server = server_address(7);
    session.send_event(Event::ConnectFinished {
        attempt,
        result: Ok(server.clone()),
    });
    session.assert_screen(Screen::ActionSelection);
    assert_eq!(session.state().server_address, Some(server));
    assert_eq!(count_connected_toasts(&session), 1);
}

#[test]
fn back_from_hub_disconnects() {
    let mut session = TestSession::connected_to(server_address(1));
    let commands = session.send_user(UserAction::Back);
    assert_eq!(commands, vec![Command::ResetConnection]);
    session.assert_screen(Screen::ConnectionSelection);
    assert_eq!(session.state().server_address, None);
}

// ============================================================================
// Requests and inbound correlation
// ============================================================================

#[test]
fn share_email_request_routes_matching_credential_request() {
    let server = server_address(1);
    let mut session = TestSession::connected_to(server.clone());
    session.send_user(UserAction::SelectAction(ActionKind::ProvideCredentials));
    session.assert_screen(Screen::ShareCredential);

    let commands = session.send_user(UserAction::SelectCredential(CredentialChoice::Email));
    assert_matches!(
        commands.as_slice(),
        [Command::SendServerRequest { kind: ServerRequestKind::ShareEmail, to, .. }] if *to == server
    );
    assert!(session.state().overlay.is_some());
    assert_matches!(
        session.state().outstanding,
        OutstandingServerRequest::ShareEmail(_)
    );

    session.deliver(credential_request(&server, None));
    session.assert_screen(Screen::ShareEmailStart);
    assert!(session.state().outstanding.is_none());
    assert!(session.state().overlay.is_none());
    assert!(session.state().pending.credential.is_some());
}

#[test]
fn credential_request_without_outstanding_request_is_dropped() {
    let server = server_address(1);
    let mut session = TestSession::connected_to(server.clone());
    let commands = session.deliver(credential_request(&server, None));
    assert!(commands.is_empty());
    session.assert_screen(Screen::ActionSelection);
}

#[test]
fn each_request_kind_routes_to_its_screen() {
    let server = server_address(1);
    let cases = [
        (CredentialChoice::Email, Screen::ShareEmailStart),
        (CredentialChoice::Document, Screen::ShareDocumentStart),
        (CredentialChoice::Custom, Screen::ShareCustomStart),
    ];
    for (choice, expected) in cases {
        let mut session = TestSession::connected_to(server.clone());
        session.send_user(UserAction::SelectAction(ActionKind::ProvideCredentials));
        session.send_user(UserAction::SelectCredential(choice));
        session.deliver(credential_request(&server, None));
        session.assert_screen(expected);
    }

    let mut session = TestSession::connected_to(server.clone());
    session.send_user(UserAction::SelectAction(ActionKind::Authenticate));
    session.assert_screen(Screen::ActionSelection);
    session.deliver(credential_request(&server, None));
    session.assert_screen(Screen::AuthStart);
}

#[test]
fn reply_to_another_message_is_dropped() {
    let server = server_address(1);
    let mut session = TestSession::connected_to(server.clone());
    session.send_user(UserAction::SelectAction(ActionKind::Authenticate));
    let request = session.last_request().unwrap();
    session.send_event(Event::RequestSent {
        request,
        result: Ok(MessageId::new("sent-1")),
    });
    assert!(session.state().overlay.is_none());

    session.deliver(credential_request(&server, Some(MessageId::new("other"))));
    session.assert_screen(Screen::ActionSelection);
    assert!(session.state().pending.credential.is_none());
    assert_matches!(session.state().outstanding, OutstandingServerRequest::Auth(_));

    session.deliver(credential_request(&server, Some(MessageId::new("sent-1"))));
    session.assert_screen(Screen::AuthStart);
}

#[test]
fn replaced_request_completions_are_ignored() {
    let server = server_address(1);
    let mut session = TestSession::connected_to(server.clone());
    session.send_user(UserAction::SelectAction(ActionKind::ProvideCredentials));
    session.send_user(UserAction::SelectCredential(CredentialChoice::Email));
    let first = session.last_request().unwrap();
    session.send_user(UserAction::SelectCredential(CredentialChoice::Document));
    let second = session.last_request().unwrap();
    assert_ne!(first, second);

    let commands = session.send_event(Event::RequestSent {
        request: first,
        result: Err("late failure".into()),
    });
    assert!(commands.is_empty());
    assert_matches!(
        session.state().outstanding,
        OutstandingServerRequest::ShareDocument(_)
    );

    session.deliver(credential_request(&server, None));
    session.assert_screen(Screen::ShareDocumentStart);
}

#[test]
fn send_failure_clears_request_and_overlay() {
    let mut session = TestSession::connected_to(server_address(1));
    session.send_user(UserAction::SelectAction(ActionKind::Authenticate));
    let request = session.last_request().unwrap();
    session.send_event(Event::RequestSent {
        request,
        result: Err("network down".into()),
    });
    assert!(session.state().outstanding.is_none());
    assert!(session.state().overlay.is_none());
    session.assert_toast_shown("Failed to send authentication request: network down");
    session.assert_screen(Screen::ActionSelection);
}

#[test]
fn picking_an_action_clears_the_success_flag() {
    let mut session = TestSession::connected_to(server_address(1));
    session.state_mut().connection_success_pending = true;
    session.send_user(UserAction::SelectAction(ActionKind::VerifyCredentials));
    assert!(!session.state().connection_success_pending);
    session.send_user(UserAction::Back);
    assert_eq!(count_connected_toasts(&session), 0);
}

#[test]
fn unrelated_inbound_messages_never_change_the_screen() {
    let server = server_address(1);
    let mut session = TestSession::connected_to(server.clone());
    let messages = vec![
        InboundMessage::Chat(ChatMessage {
            id: MessageId::new("c"),
            from: server.clone(),
            body: "hello".into(),
        }),
        InboundMessage::Receipt(Receipt {
            id: MessageId::new("r"),
            from: server.clone(),
        }),
        InboundMessage::CredentialResponse(CredentialResponse {
            id: MessageId::new("x"),
            from: server.clone(),
            request_id: MessageId::new("y"),
        }),
        InboundMessage::Unknown {
            kind: "presence".into(),
        },
    ];
    for message in messages {
        assert!(session.deliver(message).is_empty());
        session.assert_screen(Screen::ActionSelection);
    }
}

#[test]
fn credential_delivery_shows_custom_credential_result() {
    let server = server_address(1);
    let mut session = TestSession::connected_to(server.clone());
    session.send_user(UserAction::SelectAction(ActionKind::VerifyCredentials));
    session.send_user(UserAction::SelectCredential(CredentialChoice::Custom));
    session.assert_screen(Screen::GetCustomCredentialStart);

    let commands = session.send_user(UserAction::Continue);
    assert_matches!(
        commands.as_slice(),
        [Command::SendServerRequest {
            kind: ServerRequestKind::CustomCredential,
            ..
        }]
    );

    session.deliver(InboundMessage::CredentialDelivery(CredentialMessage {
        id: MessageId::new("cred"),
        from: server,
        claims: vec![("membership".into(), "gold".into())],
    }));
    session.assert_screen(Screen::GetCustomCredentialResult { success: true });
    assert!(session.state().outstanding.is_none());

    session.send_user(UserAction::Continue);
    session.assert_screen(Screen::ActionSelection);
}

// ============================================================================
// Signing
// ============================================================================

fn at_doc_sign(server: &vouch_app::ServerAddress) -> TestSession {
    let mut session = TestSession::connected_to(server.clone());
    let commands = session.send_user(UserAction::SelectAction(ActionKind::SignDocuments));
    assert_matches!(
        commands.as_slice(),
        [Command::SendServerRequest {
            kind: ServerRequestKind::DocumentSigning,
            ..
        }]
    );
    session.assert_screen(Screen::DocSignStart);
    session.deliver(verification_request(server, None));
    session.assert_screen(Screen::DocSignStart);
    assert!(session.state().outstanding.is_none());
    session
}

#[test]
fn doc_sign_accept_shows_success() {
    let server = server_address(1);
    let mut session = at_doc_sign(&server);
    session.send_event(Event::Exchange(ExchangeOutcome::Accepted));
    session.assert_screen(Screen::DocSignResult { success: true });
    session.send_user(UserAction::Continue);
    session.assert_screen(Screen::ActionSelection);
    assert!(session.state().pending.is_empty());
}

#[test]
fn doc_sign_reject_returns_to_hub_and_clears_verification() {
    let server = server_address(1);
    let mut session = at_doc_sign(&server);
    assert!(session.state().pending.verification.is_some());
    session.send_event(Event::Exchange(ExchangeOutcome::Rejected));
    session.assert_screen(Screen::ActionSelection);
    session.assert_toast_shown("rejected");
    assert!(session.state().pending.verification.is_none());
}

#[test]
fn doc_sign_delivery_error_forces_failure_result() {
    let server = server_address(1);
    let mut session = at_doc_sign(&server);
    session.send_event(Event::Exchange(ExchangeOutcome::Failed("peer gone".into())));
    session.assert_screen(Screen::DocSignResult { success: false });
}

#[test]
fn verification_request_routes_to_doc_sign_unconditionally() {
    let server = server_address(1);
    let mut session = TestSession::connected_to(server.clone());
    session.deliver(verification_request(&server, None));
    session.assert_screen(Screen::DocSignStart);
}

#[test]
fn unsolicited_signing_request_is_declined() {
    let server = server_address(1);
    let mut session = TestSession::connected_to(server.clone());
    let commands = session.deliver(InboundMessage::SigningRequest(SigningRequest {
        id: MessageId::new("sign-1"),
        from: server.clone(),
        in_reply_to: None,
    }));
    assert!(commands.contains(&Command::RespondToSigningRequest {
        to: server,
        request_id: MessageId::new("sign-1"),
        accepted: false,
    }));
    session.assert_screen(Screen::ActionSelection);
    session.assert_toast_shown(SIGNING_UNSUPPORTED);
    assert!(session.state().pending.signing.is_none());
}

#[test]
fn declined_signing_request_keeps_the_pending_one() {
    let server = server_address(1);
    let mut session = TestSession::connected_to(server.clone());
    session.send_user(UserAction::SelectAction(ActionKind::SignDocuments));
    let request = session.last_request().unwrap();
    session.send_event(Event::RequestSent {
        request,
        result: Ok(MessageId::new("m1")),
    });
    session.deliver(InboundMessage::SigningRequest(SigningRequest {
        id: MessageId::new("sign-1"),
        from: server.clone(),
        in_reply_to: Some(MessageId::new("m1")),
    }));
    session.assert_screen(Screen::DocSignStart);

    let commands = session.deliver(InboundMessage::SigningRequest(SigningRequest {
        id: MessageId::new("sign-2"),
        from: server.clone(),
        in_reply_to: None,
    }));
    assert!(commands.contains(&Command::RespondToSigningRequest {
        to: server,
        request_id: MessageId::new("sign-2"),
        accepted: false,
    }));
    assert_eq!(
        session.state().pending.signing.as_ref().map(|r| r.id.clone()),
        Some(MessageId::new("sign-1"))
    );

    session.send_event(Event::Exchange(ExchangeOutcome::Accepted));
    session.assert_screen(Screen::DocSignResult { success: true });
}

#[test]
fn sign_documents_without_server_stays_on_hub() {
    let mut session = TestSession::connected_to(server_address(1));
    session.state_mut().server_address = None;

    let commands = session.send_user(UserAction::SelectAction(ActionKind::SignDocuments));

    session.assert_screen(Screen::ActionSelection);
    session.assert_toast_shown(NOT_CONNECTED);
    assert!(session.state().outstanding.is_none());
    assert!(!commands
        .iter()
        .any(|c| matches!(c, Command::SendServerRequest { .. })));
}

#[test]
fn solicited_signing_request_routes_to_doc_sign() {
    let server = server_address(1);
    let mut session = TestSession::connected_to(server.clone());
    session.send_user(UserAction::SelectAction(ActionKind::SignDocuments));
    session.deliver(InboundMessage::SigningRequest(SigningRequest {
        id: MessageId::new("sign-1"),
        from: server,
        in_reply_to: None,
    }));
    session.assert_screen(Screen::DocSignStart);
    assert!(session.state().pending.signing.is_some());
    session.send_event(Event::Exchange(ExchangeOutcome::Accepted));
    session.assert_screen(Screen::DocSignResult { success: true });
}

// ============================================================================
// Exchange outcomes
// ============================================================================

#[test]
fn auth_reject_shows_failure_reason() {
    let server = server_address(1);
    let mut session = TestSession::connected_to(server.clone());
    session.send_user(UserAction::SelectAction(ActionKind::Authenticate));
    session.deliver(credential_request(&server, None));
    session.send_event(Event::Exchange(ExchangeOutcome::Rejected));
    session.assert_screen(Screen::AuthResult {
        success: false,
        error_message: Some(AUTH_REJECTED.to_string()),
    });
}

#[test]
fn share_rejections_toast_and_return_to_hub() {
    let server = server_address(1);
    let cases = [
        (CredentialChoice::Email, "Share email credential rejected!"),
        (CredentialChoice::Document, "Share document number rejected!"),
        (CredentialChoice::Custom, "Share custom credentials rejected!"),
    ];
    for (choice, toast) in cases {
        let mut session = TestSession::connected_to(server.clone());
        session.send_user(UserAction::SelectAction(ActionKind::ProvideCredentials));
        session.send_user(UserAction::SelectCredential(choice));
        session.deliver(credential_request(&server, None));
        session.send_event(Event::Exchange(ExchangeOutcome::Rejected));
        session.assert_screen(Screen::ActionSelection);
        session.assert_toast_shown(toast);
        assert!(session.state().pending.credential.is_none());
    }
}

#[test]
fn share_accept_shows_result_then_returns_to_hub() {
    let server = server_address(1);
    let mut session = TestSession::connected_to(server.clone());
    session.send_user(UserAction::SelectAction(ActionKind::ProvideCredentials));
    session.send_user(UserAction::SelectCredential(CredentialChoice::Document));
    session.deliver(credential_request(&server, None));
    session.send_event(Event::Exchange(ExchangeOutcome::Accepted));
    session.assert_screen(Screen::ShareDocumentResult { success: true });
    session.send_user(UserAction::Back);
    session.assert_screen(Screen::ActionSelection);
    assert!(session.state().pending.is_empty());
}

#[test]
fn share_delivery_error_is_logged_only() {
    let server = server_address(1);
    let mut session = TestSession::connected_to(server.clone());
    session.send_user(UserAction::SelectAction(ActionKind::ProvideCredentials));
    session.send_user(UserAction::SelectCredential(CredentialChoice::Email));
    session.deliver(credential_request(&server, None));
    session.send_event(Event::Exchange(ExchangeOutcome::Failed("io".into())));
    session.assert_screen(Screen::ShareEmailStart);
}

#[test]
fn outcome_without_pending_request_is_dropped() {
    let mut session = TestSession::connected_to(server_address(1));
    session.send_user(UserAction::SelectAction(ActionKind::SignDocuments));
    session.assert_screen(Screen::DocSignStart);
    let commands = session.send_event(Event::Exchange(ExchangeOutcome::Accepted));
    assert!(commands.is_empty());
    session.assert_screen(Screen::DocSignStart);

    let mut hub = TestSession::connected_to(server_address(1));
    hub.send_event(Event::Exchange(ExchangeOutcome::Rejected));
    hub.assert_screen(Screen::ActionSelection);
}

// ============================================================================
// Back navigation and flows
// ============================================================================

#[test]
fn back_from_share_start_returns_to_share_selection() {
    let server = server_address(1);
    let mut session = TestSession::connected_to(server.clone());
    session.send_user(UserAction::SelectAction(ActionKind::ProvideCredentials));
    session.send_user(UserAction::SelectCredential(CredentialChoice::Custom));
    session.deliver(credential_request(&server, None));
    session.assert_screen(Screen::ShareCustomStart);
    session.send_user(UserAction::Back);
    session.assert_screen(Screen::ShareCredential);
    assert!(session.state().pending.is_empty());
}

#[test]
fn back_from_doc_sign_abandons_the_request() {
    let mut session = TestSession::connected_to(server_address(1));
    session.send_user(UserAction::SelectAction(ActionKind::SignDocuments));
    assert!(!session.state().outstanding.is_none());
    session.send_user(UserAction::Back);
    session.assert_screen(Screen::ActionSelection);
    assert!(session.state().outstanding.is_none());
    assert!(session.state().overlay.is_none());
}

#[test]
fn email_verification_flow() {
    let mut session = TestSession::connected_to(server_address(1));
    session.send_user(UserAction::SelectAction(ActionKind::VerifyCredentials));
    session.send_user(UserAction::SelectCredential(CredentialChoice::Email));
    session.assert_screen(Screen::VerifyEmailStart);
    let commands = session.send_user(UserAction::Continue);
    assert_eq!(commands, vec![Command::LaunchFlow(FlowKind::EmailVerification)]);
    session.assert_screen(Screen::EmailFlow);

    // Input on an SDK-owned screen is ignored.
    assert!(session.send_user(UserAction::Back).is_empty());
    session.assert_screen(Screen::EmailFlow);

    session.send_event(Event::FlowFinished {
        flow: FlowKind::EmailVerification,
        result: Ok(()),
    });
    session.assert_screen(Screen::VerifyEmailResult { success: true });
}

#[test]
fn document_verification_back_and_forth() {
    let mut session = TestSession::connected_to(server_address(1));
    session.send_user(UserAction::SelectAction(ActionKind::VerifyCredentials));
    session.send_user(UserAction::SelectCredential(CredentialChoice::Document));
    session.send_user(UserAction::Back);
    session.assert_screen(Screen::VerifyCredential);
    session.send_user(UserAction::SelectCredential(CredentialChoice::Document));
    session.send_user(UserAction::Continue);
    session.assert_screen(Screen::DocumentFlow);
    session.send_event(Event::FlowFinished {
        flow: FlowKind::DocumentVerification,
        result: Err("blurry".into()),
    });
    session.assert_screen(Screen::VerifyDocumentResult { success: false });
}

#[test]
fn backup_flow_and_stale_flow_results() {
    let mut session = TestSession::connected_to(server_address(1));
    session.send_user(UserAction::SelectAction(ActionKind::Backup));
    session.assert_screen(Screen::BackupStart);

    // A result for a flow not on screen is ignored.
    session.send_event(Event::FlowFinished {
        flow: FlowKind::Backup,
        result: Ok(()),
    });
    session.assert_screen(Screen::BackupStart);

    session.send_user(UserAction::Continue);
    session.assert_screen(Screen::BackupFlow);
    session.send_event(Event::FlowFinished {
        flow: FlowKind::Backup,
        result: Ok(()),
    });
    session.assert_screen(Screen::BackupResult { success: true });
    session.send_user(UserAction::Continue);
    session.assert_screen(Screen::ActionSelection);
}

#[test]
fn toasts_schedule_their_own_expiry() {
    let mut session = TestSession::connected_to(server_address(1));
    session.send_user(UserAction::SelectAction(ActionKind::Authenticate));
    let request = session.last_request().unwrap();
    let commands = session.send_event(Event::RequestSent {
        request,
        result: Err("down".into()),
    });
    let id = commands
        .iter()
        .find_map(|c| match c {
            Command::ScheduleToastExpiry { id, after } => {
                assert_eq!(*after, session.state().settings.toast_duration);
                Some(*id)
            }
            _ => None,
        })
        .unwrap();
    session.send_event(Event::ToastExpired { id });
    assert!(session.toasts().is_empty());
}

// ============================================================================
// Properties
// ============================================================================

fn arb_action() -> impl Strategy<Value = UserAction> {
    prop_oneof![
        Just(UserAction::Continue),
        Just(UserAction::Back),
        Just(UserAction::Restore),
        Just(UserAction::RetryConnection),
        Just(UserAction::SelectAction(ActionKind::Authenticate)),
        Just(UserAction::SelectAction(ActionKind::ProvideCredentials)),
        Just(UserAction::SelectAction(ActionKind::SignDocuments)),
        Just(UserAction::SelectAction(ActionKind::VerifyCredentials)),
        Just(UserAction::SelectAction(ActionKind::Backup)),
        Just(UserAction::SelectCredential(CredentialChoice::Email)),
        Just(UserAction::SelectCredential(CredentialChoice::Custom)),
        Just(UserAction::ChooseConnection(ConnectionMethod::Manual)),
        "[0-9a-f]{0,70}".prop_map(UserAction::SubmitAddress),
    ]
}

proptest! {
    /// A credential request with nothing outstanding never moves the screen,
    /// whatever the user did before.
    #[test]
    fn unmatched_credential_request_never_transitions(actions in prop::collection::vec(arb_action(), 0..12)) {
        let server = server_address(1);
        let mut session = TestSession::connected_to(server.clone());
        for action in actions {
            session.send_user(action);
        }
        session.state_mut().outstanding = OutstandingServerRequest::None;
        let before = session.screen().clone();
        session.deliver(credential_request(&server, None));
        prop_assert_eq!(session.screen(), &before);
    }

    /// The success toast is raised at most once per connection.
    #[test]
    fn success_toast_fires_at_most_once(actions in prop::collection::vec(arb_action(), 0..16)) {
        let mut session = TestSession::resolved(true, ConnectionRecord::Disconnected);
        let server = server_address(9);
        let attempt = connect_manually(&mut session, server.as_str());
        session.send_event(Event::ConnectFinished { attempt, result: Ok(server) });
        for action in actions {
            session.send_user(action);
        }
        let raised = session
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::ScheduleToastExpiry { .. }))
            .count();
        prop_assert!(raised >= count_connected_toasts(&session));
        prop_assert!(count_connected_toasts(&session) <= 1);
    }
}
