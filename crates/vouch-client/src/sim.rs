//! # Simulated Identity Account
//!
//! In-process stand-in for the identity SDK and the server peer behind it.
//! Each tagged request sent to the server is answered through the delegate
//! after a configurable latency, with `in_reply_to` set to the id of the
//! request it answers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;
use vouch_app::message::{ChatMessage, CredentialMessage, CredentialRequest, VerificationRequest};
use vouch_app::state_machine::FlowKind;
use vouch_app::{
    InboundMessage, MessageId, OutboundMessage, ServerAddress, ServerRequestKind,
    SERVER_ADDRESS_BYTES,
};

use crate::account::{AccountConfig, BridgeError, IdentityAccount, MessageDelegate};

/// A message the simulated SDK sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMessage {
    /// Id assigned on send
    pub id: MessageId,
    /// Recipient
    pub to: ServerAddress,
    /// Payload
    pub message: OutboundMessage,
}

#[derive(Default)]
struct SimState {
    registered: bool,
    application_address: Option<ServerAddress>,
    delegate: Option<Arc<dyn MessageDelegate>>,
    sent: Vec<SentMessage>,
}

/// Identity SDK simulation.
pub struct SimulatedAccount {
    state: Mutex<SimState>,
    config: Option<AccountConfig>,
    latency: Duration,
    connect_delay: Duration,
    connect_failure: Option<String>,
    send_failure: Option<String>,
    flow_results: HashMap<FlowKind, Result<(), String>>,
}

impl Default for SimulatedAccount {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedAccount {
    /// Unregistered account with a 50ms peer latency.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState::default()),
            config: None,
            latency: Duration::from_millis(50),
            connect_delay: Duration::from_millis(50),
            connect_failure: None,
            send_failure: None,
            flow_results: HashMap::new(),
        }
    }

    /// Record the settings a real SDK would be started with.
    pub fn with_account_config(mut self, config: AccountConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Settings passed to [`with_account_config`](Self::with_account_config).
    pub fn account_config(&self) -> Option<&AccountConfig> {
        self.config.as_ref()
    }

    /// Start registered or not.
    pub fn with_registered(self, registered: bool) -> Self {
        self.state.lock().registered = registered;
        self
    }

    /// Delay before the peer answers and before setup and flows finish.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Time a connect takes.
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Make every connect fail with `reason`.
    pub fn failing_connect(mut self, reason: impl Into<String>) -> Self {
        self.connect_failure = Some(reason.into());
        self
    }

    /// Make every send fail with `reason`.
    pub fn failing_send(mut self, reason: impl Into<String>) -> Self {
        self.send_failure = Some(reason.into());
        self
    }

    /// Outcome of `flow`; flows succeed unless set here.
    pub fn with_flow_result(mut self, flow: FlowKind, result: Result<(), String>) -> Self {
        self.flow_results.insert(flow, result);
        self
    }

    /// Every message sent so far.
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.state.lock().sent.clone()
    }

    /// Application address passed to the last setup.
    pub fn application_address(&self) -> Option<ServerAddress> {
        self.state.lock().application_address.clone()
    }

    fn delegate(&self) -> Option<Arc<dyn MessageDelegate>> {
        self.state.lock().delegate.clone()
    }

    async fn finish_connect(&self, server: ServerAddress) -> Result<ServerAddress, BridgeError> {
        tokio::time::sleep(self.connect_delay).await;
        if let Some(reason) = &self.connect_failure {
            return Err(BridgeError::Connect(reason.clone()));
        }
        if let Some(delegate) = self.delegate() {
            delegate.on_connect(&server);
        }
        Ok(server)
    }
}

fn credential_request(
    id: MessageId,
    server: &ServerAddress,
    credential_type: &str,
    in_reply_to: Option<MessageId>,
) -> InboundMessage {
    InboundMessage::CredentialRequest(CredentialRequest {
        id,
        from: server.clone(),
        types: vec![credential_type.to_string()],
        in_reply_to,
    })
}

/// What the peer answers to a tagged chat message.
fn peer_reply(server: &ServerAddress, body: &str, reply_to: &MessageId) -> InboundMessage {
    let id = MessageId::new(Uuid::new_v4().to_string());
    let in_reply_to = Some(reply_to.clone());

    match ServerRequestKind::from_tag(body) {
        Some(ServerRequestKind::Authenticate) => {
            credential_request(id, server, "AuthenticationCredential", in_reply_to)
        }
        Some(ServerRequestKind::ShareEmail) => {
            credential_request(id, server, "EmailCredential", in_reply_to)
        }
        Some(ServerRequestKind::ShareDocument) => {
            credential_request(id, server, "DocumentCredential", in_reply_to)
        }
        Some(ServerRequestKind::ShareCustom) => {
            credential_request(id, server, "CustomCredential", in_reply_to)
        }
        Some(ServerRequestKind::DocumentSigning) => {
            InboundMessage::VerificationRequest(VerificationRequest {
                id,
                from: server.clone(),
                types: vec!["DocumentSignature".to_string()],
                in_reply_to,
            })
        }
        Some(ServerRequestKind::CustomCredential) => {
            InboundMessage::CredentialDelivery(CredentialMessage {
                id,
                from: server.clone(),
                claims: vec![("membership".to_string(), "gold".to_string())],
            })
        }
        None => InboundMessage::Chat(ChatMessage {
            id,
            from: server.clone(),
            body: format!("unrecognised request: {body}"),
        }),
    }
}

#[async_trait]
impl IdentityAccount for SimulatedAccount {
    async fn setup(&self, application_address: &ServerAddress) -> Result<(), BridgeError> {
        tokio::time::sleep(self.latency).await;
        if let Some(config) = &self.config {
            debug!(environment = %config.environment, storage = %config.storage_path.display(), "account setup");
        }
        self.state.lock().application_address = Some(application_address.clone());
        Ok(())
    }

    async fn is_registered(&self) -> Result<bool, BridgeError> {
        Ok(self.state.lock().registered)
    }

    fn generate_address(&self) -> ServerAddress {
        let mut bytes = [0u8; SERVER_ADDRESS_BYTES];
        bytes[0] = 0x02;
        bytes[1..17].copy_from_slice(Uuid::new_v4().as_bytes());
        bytes[17..].copy_from_slice(Uuid::new_v4().as_bytes());
        ServerAddress::from_key_bytes(&bytes)
    }

    fn set_delegate(&self, delegate: Arc<dyn MessageDelegate>) {
        self.state.lock().delegate = Some(delegate);
    }

    async fn connect_with_address(
        &self,
        server: &ServerAddress,
    ) -> Result<ServerAddress, BridgeError> {
        self.finish_connect(server.clone()).await
    }

    async fn connect_with_qr_code(&self, payload: &[u8]) -> Result<ServerAddress, BridgeError> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| BridgeError::Connect("QR code is not text".into()))?;
        let server = ServerAddress::parse(text)
            .map_err(|e| BridgeError::Connect(format!("QR code holds no server address: {e}")))?;
        self.finish_connect(server).await
    }

    async fn send(
        &self,
        to: &ServerAddress,
        message: OutboundMessage,
    ) -> Result<MessageId, BridgeError> {
        if let Some(reason) = &self.send_failure {
            return Err(BridgeError::Send(reason.clone()));
        }

        let id = MessageId::new(Uuid::new_v4().to_string());
        let (reply, delegate) = {
            let mut state = self.state.lock();
            state.sent.push(SentMessage {
                id: id.clone(),
                to: to.clone(),
                message: message.clone(),
            });
            let reply = match &message {
                OutboundMessage::Chat { body, .. } => Some(peer_reply(to, body, &id)),
                OutboundMessage::SigningResponse { .. } => None,
            };
            (reply, state.delegate.clone())
        };

        if let (Some(reply), Some(delegate)) = (reply, delegate) {
            let latency = self.latency;
            tokio::spawn(async move {
                tokio::time::sleep(latency).await;
                debug!(kind = reply.kind(), "peer reply");
                delegate.on_message(reply);
            });
        }

        Ok(id)
    }

    async fn run_flow(&self, flow: FlowKind) -> Result<(), BridgeError> {
        tokio::time::sleep(self.latency).await;
        match self.flow_results.get(&flow).cloned().unwrap_or(Ok(())) {
            Ok(()) => {
                if flow == FlowKind::Registration {
                    self.state.lock().registered = true;
                }
                Ok(())
            }
            Err(reason) => Err(BridgeError::Flow {
                flow: flow.label(),
                reason,
            }),
        }
    }
}
