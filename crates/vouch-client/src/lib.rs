//! # vouch-client
//!
//! Runs the vouch session state machine against an identity SDK.
//!
//! - **account**: the SDK seam (`IdentityAccount`, `MessageDelegate`)
//! - **runtime**: executes session commands and feeds results back as events
//! - **handle**: posts events onto the session from anywhere
//! - **sim**: simulated SDK and server peer
//! - **config** / **logging**: ambient setup for the `vouch` binary

pub mod account;
pub mod config;
pub mod demo;
pub mod error;
pub mod handle;
pub mod logging;
pub mod runtime;
pub mod sim;

pub use account::{AccountConfig, BridgeError, IdentityAccount, MessageDelegate};
pub use config::{ClientConfig, ConfigError, Environment};
pub use error::ClientError;
pub use handle::SessionHandle;
pub use runtime::SessionRuntime;
pub use sim::SimulatedAccount;
