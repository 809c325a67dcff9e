//! Cloneable handle that posts events onto the session control thread.

use tokio::sync::mpsc;
use tracing::{debug, warn};
use vouch_app::{Event, ExchangeOutcome, InboundMessage, MessageId, ServerAddress, UserAction};

use crate::account::{BridgeError, MessageDelegate};

/// Sender side of the session event channel.
///
/// Every producer (UI, SDK callbacks, timers, command completions) posts
/// through one of these, so the runtime sees a single ordered stream.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Event>,
}

impl SessionHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { tx }
    }

    /// Post an event. Returns false once the runtime is gone.
    pub fn post(&self, event: Event) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(mpsc::error::SendError(event)) => {
                debug!(?event, "session closed; dropping event");
                false
            }
        }
    }

    /// Post a user action.
    pub fn dispatch(&self, action: UserAction) -> bool {
        self.post(action.into())
    }

    /// Post a peer message.
    pub fn deliver(&self, message: InboundMessage) -> bool {
        self.post(message.into())
    }

    /// Post the status of an interactive exchange screen.
    pub fn report_exchange(&self, outcome: ExchangeOutcome) -> bool {
        self.post(outcome.into())
    }
}

impl MessageDelegate for SessionHandle {
    fn on_message(&self, message: InboundMessage) {
        self.deliver(message);
    }

    fn on_connect(&self, server: &ServerAddress) {
        debug!(server = %server.abbreviated(), "sdk connected");
    }

    fn on_disconnect(&self, server: &ServerAddress) {
        warn!(server = %server.abbreviated(), "sdk disconnected");
    }

    fn on_error(&self, error: &BridgeError) {
        warn!(%error, "sdk error");
    }

    fn on_acknowledgement(&self, message_id: &MessageId) {
        debug!(%message_id, "message acknowledged");
    }
}
