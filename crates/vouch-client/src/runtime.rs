//! # Session Runtime
//!
//! Drives the pure session state machine with real effects.
//!
//! ## Architecture
//!
//! - **State**: held by `SessionState` (pure)
//! - **Transitions**: computed by `vouch_app::transition` (pure)
//! - **Effects**: executed here, against the identity SDK, the stores and
//!   tokio timers
//!
//! Every effect that completes later is spawned as a task that posts its
//! result back through the [`SessionHandle`]. Events are applied one at a
//! time on whichever task owns the runtime, so transitions never race.
//!
//! ```rust,ignore
//! let account = Arc::new(SimulatedAccount::new());
//! let store = Arc::new(LocalStore::new(MemoryKeyValueStore::new()));
//! let mut runtime = SessionRuntime::with_store(account, store, SessionSettings::default());
//!
//! runtime.start();
//! runtime
//!     .run_until(|s| *s.screen() == Screen::ApplicationAddress, IDLE)
//!     .await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, warn};
use vouch_app::state_machine::ConnectTarget;
use vouch_app::{
    transition, ApplicationAddressStore, Command, ConnectionRecord, ConnectionStateStore, Event,
    OutboundMessage, Screen, SessionSettings, SessionState, UserAction,
};

use crate::account::IdentityAccount;
use crate::error::ClientError;
use crate::handle::SessionHandle;

/// Runtime that owns the session state and executes its commands.
pub struct SessionRuntime {
    account: Arc<dyn IdentityAccount>,
    connection_store: Arc<dyn ConnectionStateStore>,
    address_store: Arc<dyn ApplicationAddressStore>,
    state: SessionState,
    handle: SessionHandle,
    inbox: mpsc::UnboundedReceiver<Event>,
    /// Every screen entered, in order
    trace: Vec<Screen>,
}

impl SessionRuntime {
    /// Create a runtime and register it as the account's delegate.
    pub fn new(
        account: Arc<dyn IdentityAccount>,
        connection_store: Arc<dyn ConnectionStateStore>,
        address_store: Arc<dyn ApplicationAddressStore>,
        settings: SessionSettings,
    ) -> Self {
        let (tx, inbox) = mpsc::unbounded_channel();
        let handle = SessionHandle::new(tx);
        account.set_delegate(Arc::new(handle.clone()));

        let state = SessionState::with_settings(settings);
        let trace = vec![state.screen().clone()];
        Self {
            account,
            connection_store,
            address_store,
            state,
            handle,
            inbox,
            trace,
        }
    }

    /// Create a runtime over one store that keeps both records.
    pub fn with_store<S>(
        account: Arc<dyn IdentityAccount>,
        store: Arc<S>,
        settings: SessionSettings,
    ) -> Self
    where
        S: ConnectionStateStore + ApplicationAddressStore + 'static,
    {
        let connection_store: Arc<dyn ConnectionStateStore> = store.clone();
        let address_store: Arc<dyn ApplicationAddressStore> = store;
        Self::new(account, connection_store, address_store, settings)
    }

    /// Current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current screen.
    pub fn screen(&self) -> &Screen {
        self.state.screen()
    }

    /// Screens entered so far, starting with the initial one.
    pub fn trace(&self) -> &[Screen] {
        &self.trace
    }

    /// Handle for posting events from elsewhere.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Report SDK initialization with the stored application address.
    pub fn start(&mut self) {
        let application_address = match self.address_store.load_application_address() {
            Ok(address) => address,
            Err(error) => {
                warn!(%error, "failed to load application address");
                None
            }
        };
        self.handle_event(Event::SdkInitialized {
            application_address,
        });
    }

    /// Apply one event and return the commands it produced.
    pub fn process_event(&mut self, event: Event) -> Vec<Command> {
        let (next, commands) = transition(&self.state, event);
        if next.screen() != self.state.screen() {
            self.trace.push(next.screen().clone());
        }
        self.state = next;
        commands
    }

    /// Apply one event and execute its commands.
    pub fn handle_event(&mut self, event: Event) {
        for command in self.process_event(event) {
            self.execute_command(command);
        }
    }

    /// Apply a user action immediately.
    pub fn send_user(&mut self, action: UserAction) {
        self.handle_event(Event::User(action));
    }

    /// Execute a command.
    ///
    /// Store commands run inline. SDK calls and timers are spawned and
    /// report back through the event channel. Must be called inside a
    /// tokio runtime.
    pub fn execute_command(&mut self, command: Command) {
        debug!(?command, "executing");
        match command {
            Command::SetupAccount {
                application_address,
                resolve_session,
            } => {
                let account = self.account.clone();
                let handle = self.handle.clone();
                tokio::spawn(async move {
                    let result = account
                        .setup(&application_address)
                        .await
                        .map_err(|e| e.to_string());
                    handle.post(Event::AccountSetupFinished {
                        resolve_session,
                        result,
                    });
                });
            }
            Command::SaveApplicationAddress(address) => {
                if let Err(error) = self.address_store.save_application_address(&address) {
                    warn!(%error, "failed to save application address");
                }
            }
            Command::ResolveSession => {
                let connection = match self.connection_store.read() {
                    Ok(record) => record,
                    Err(error) => {
                        warn!(%error, "failed to read connection state");
                        ConnectionRecord::Disconnected
                    }
                };
                let account = self.account.clone();
                let handle = self.handle.clone();
                tokio::spawn(async move {
                    let registered = match account.is_registered().await {
                        Ok(registered) => registered,
                        Err(error) => {
                            warn!(%error, "registration check failed");
                            false
                        }
                    };
                    handle.post(Event::SessionResolved {
                        registered,
                        connection,
                    });
                });
            }
            Command::Connect { attempt, target } => {
                let account = self.account.clone();
                let handle = self.handle.clone();
                tokio::spawn(async move {
                    let result = match &target {
                        ConnectTarget::Address(address) => {
                            account.connect_with_address(address).await
                        }
                        ConnectTarget::QrCode(payload) => account.connect_with_qr_code(payload).await,
                    };
                    handle.post(Event::ConnectFinished {
                        attempt,
                        result: result.map_err(|e| e.to_string()),
                    });
                });
            }
            Command::ArmConnectTimeout { attempt, after } => {
                let handle = self.handle.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    handle.post(Event::ConnectTimedOut { attempt });
                });
            }
            Command::PersistConnection(server_address) => {
                let record = ConnectionRecord::Connected { server_address };
                if let Err(error) = self.connection_store.save(&record) {
                    warn!(%error, "failed to persist connection");
                }
            }
            Command::ResetConnection => {
                if let Err(error) = self.connection_store.reset() {
                    warn!(%error, "failed to reset connection");
                }
            }
            Command::SendServerRequest { request, kind, to } => {
                let message = OutboundMessage::Chat {
                    from: self.state.application_address.clone(),
                    body: kind.tag().to_string(),
                };
                let account = self.account.clone();
                let handle = self.handle.clone();
                tokio::spawn(async move {
                    let result = account.send(&to, message).await.map_err(|e| e.to_string());
                    handle.post(Event::RequestSent { request, result });
                });
            }
            Command::RespondToSigningRequest {
                to,
                request_id,
                accepted,
            } => {
                let account = self.account.clone();
                tokio::spawn(async move {
                    let message = OutboundMessage::SigningResponse {
                        request_id,
                        accepted,
                    };
                    if let Err(error) = account.send(&to, message).await {
                        warn!(%error, "failed to answer signing request");
                    }
                });
            }
            Command::LaunchFlow(flow) => {
                let account = self.account.clone();
                let handle = self.handle.clone();
                tokio::spawn(async move {
                    let result = account.run_flow(flow).await.map_err(|e| e.to_string());
                    handle.post(Event::FlowFinished { flow, result });
                });
            }
            Command::ScheduleToastExpiry { id, after } => {
                let handle = self.handle.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    handle.post(Event::ToastExpired { id });
                });
            }
        }
    }

    /// Wait for the next event and apply it.
    ///
    /// The runtime holds a sender of its own, so the inbox never closes.
    pub async fn step(&mut self) {
        if let Some(event) = self.inbox.recv().await {
            self.handle_event(event);
        }
    }

    /// Apply events until `done` holds.
    ///
    /// Fails with [`ClientError::Idle`] when no event arrives for `idle`.
    pub async fn run_until<F>(&mut self, mut done: F, idle: Duration) -> Result<(), ClientError>
    where
        F: FnMut(&SessionState) -> bool,
    {
        while !done(&self.state) {
            match timeout(idle, self.inbox.recv()).await {
                Ok(Some(event)) => self.handle_event(event),
                Ok(None) | Err(_) => {
                    return Err(ClientError::Idle {
                        screen: self.state.screen().to_string(),
                        waited: idle,
                    })
                }
            }
        }
        Ok(())
    }

    /// Apply every event that arrives within `window`.
    pub async fn run_for(&mut self, window: Duration) -> Result<(), ClientError> {
        let deadline = Instant::now() + window;
        loop {
            match timeout_at(deadline, self.inbox.recv()).await {
                Ok(Some(event)) => self.handle_event(event),
                Ok(None) | Err(_) => return Ok(()),
            }
        }
    }
}
