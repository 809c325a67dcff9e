//! Scripted walk through the main flows against the simulated SDK.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use vouch_app::state_machine::{ActionKind, ConnectionMethod, CredentialChoice};
use vouch_app::store::{LocalStore, MemoryKeyValueStore};
use vouch_app::{ExchangeOutcome, Screen, ServerAddress, SessionState, UserAction};

use crate::account::IdentityAccount;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::runtime::SessionRuntime;
use crate::sim::SimulatedAccount;

/// Longest the demo waits for the session to move.
const IDLE: Duration = Duration::from_secs(5);

/// Run the demo script and return every screen visited.
///
/// The script onboards a fresh account, connects to `server` (a generated
/// peer when `None`), authenticates, shares an email credential and signs
/// a document. Preferences live in memory so nothing on disk is touched.
pub async fn run_demo(
    config: &ClientConfig,
    server: Option<ServerAddress>,
) -> Result<Vec<Screen>, ClientError> {
    let account = Arc::new(SimulatedAccount::new().with_account_config(config.account_config()));
    let server = server.unwrap_or_else(|| account.generate_address());
    let application_address = account.generate_address();
    let store = Arc::new(LocalStore::new(MemoryKeyValueStore::new()));
    let mut runtime = SessionRuntime::with_store(account, store, config.session_settings());

    info!(server = %server.abbreviated(), "starting demo");
    runtime.start();
    wait_for(&mut runtime, |s| *s.screen() == Screen::ApplicationAddress).await?;

    runtime.send_user(UserAction::SubmitAddress(application_address.to_string()));
    wait_for(&mut runtime, |s| *s.screen() == Screen::ConnectionSelection).await?;

    runtime.send_user(UserAction::ChooseConnection(ConnectionMethod::Manual));
    runtime.send_user(UserAction::SubmitAddress(server.to_string()));
    wait_for(&mut runtime, |s| *s.screen() == Screen::ActionSelection).await?;

    runtime.send_user(UserAction::SelectAction(ActionKind::Authenticate));
    wait_for(&mut runtime, |s| *s.screen() == Screen::AuthStart).await?;
    accept_and_return(&mut runtime).await?;

    runtime.send_user(UserAction::SelectAction(ActionKind::ProvideCredentials));
    runtime.send_user(UserAction::SelectCredential(CredentialChoice::Email));
    wait_for(&mut runtime, |s| *s.screen() == Screen::ShareEmailStart).await?;
    accept_and_return(&mut runtime).await?;

    runtime.send_user(UserAction::SelectAction(ActionKind::SignDocuments));
    wait_for(&mut runtime, |s| s.pending.verification.is_some()).await?;
    accept_and_return(&mut runtime).await?;

    info!(screens = runtime.trace().len(), "demo finished");
    Ok(runtime.trace().to_vec())
}

async fn wait_for<F>(runtime: &mut SessionRuntime, done: F) -> Result<(), ClientError>
where
    F: FnMut(&SessionState) -> bool,
{
    runtime.run_until(done, IDLE).await
}

/// Accept the exchange on screen, then leave its result screen.
async fn accept_and_return(runtime: &mut SessionRuntime) -> Result<(), ClientError> {
    runtime.handle().report_exchange(ExchangeOutcome::Accepted);
    wait_for(runtime, |s| s.screen().is_result()).await?;
    runtime.send_user(UserAction::Continue);
    wait_for(runtime, |s| *s.screen() == Screen::ActionSelection).await
}
