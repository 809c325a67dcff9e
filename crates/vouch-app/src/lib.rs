//! # vouch-app
//!
//! Pure core of the vouch client: the request-correlated screen state
//! machine and the connection state store it repairs on cold start.
//!
//! ## Architecture
//!
//! - **state_machine**: `SessionState × Event → (SessionState, Vec<Command>)`
//! - **store**: persisted `{connected, server address}` with validation on read
//! - **request**: the one outstanding server request and reply correlation
//! - **message**: inbound and outbound peer messages
//! - **testing**: deterministic session harness
//!
//! Nothing here performs network I/O. The runtime in `vouch-client` executes
//! commands and feeds their results back as events.

pub mod address;
pub mod errors;
pub mod message;
pub mod request;
pub mod screen;
pub mod state_machine;
pub mod store;
// Deterministic session harness
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod toast;

pub use address::{AddressError, ServerAddress, SERVER_ADDRESS_BYTES, SERVER_ADDRESS_LEN};
pub use errors::{Categorized, ErrorCategory};
pub use message::{ExchangeOutcome, InboundMessage, OutboundMessage, PendingInboundRequests};
pub use request::{MessageId, OutstandingServerRequest, RequestId, ServerRequestKind};
pub use screen::{FlowFamily, Screen};
pub use state_machine::{transition, Command, Event, SessionSettings, SessionState, UserAction};
pub use store::{
    ApplicationAddressStore, ConnectionRecord, ConnectionStateStore, KeyValueStore, StoreError,
};
pub use toast::{Toast, ToastLevel};
