//! Command-line entry point for the vouch client.
//!
//! Inspects and resets the persisted connection state, and runs a scripted
//! demo session against the simulated identity SDK.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use vouch_app::store::{FileKeyValueStore, LocalStore};
use vouch_app::{ApplicationAddressStore, ConnectionRecord, ConnectionStateStore, ServerAddress};
use vouch_client::config::ClientConfig;
use vouch_client::demo::run_demo;
use vouch_client::logging::init_logging;

#[derive(Parser)]
#[command(name = "vouch")]
#[command(about = "Vouch - verifiable credential client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the persisted application address and server binding
    Status,

    /// Forget the persisted server binding
    Reset,

    /// Walk through onboarding, connect and the exchange flows
    Demo {
        /// Server address to connect to; generated when omitted
        #[arg(short, long)]
        server: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ClientConfig::load(cli.config.as_deref()).context("loading configuration")?;
    init_logging(&config.log_level, cli.verbose);

    match cli.command {
        Commands::Status => {
            let store = open_store(&config)?;
            match store.load_application_address()? {
                Some(address) => println!("application address: {address}"),
                None => println!("application address: <none>"),
            }
            match store.read()? {
                ConnectionRecord::Connected { server_address } => {
                    println!("server: connected to {server_address}");
                }
                ConnectionRecord::Disconnected => println!("server: disconnected"),
            }
        }

        Commands::Reset => {
            let store = open_store(&config)?;
            store.reset()?;
            println!("server binding cleared");
        }

        Commands::Demo { server } => {
            let server = server
                .as_deref()
                .map(ServerAddress::parse)
                .transpose()
                .context("parsing --server")?;
            let screens = run_demo(&config, server).await?;
            for (step, screen) in screens.iter().enumerate() {
                println!("{step:>3}  {screen}");
            }
        }
    }

    Ok(())
}

fn open_store(config: &ClientConfig) -> Result<LocalStore<FileKeyValueStore>> {
    let path = config.preferences_path();
    let kv = FileKeyValueStore::open(&path)
        .with_context(|| format!("opening preferences at {}", path.display()))?;
    Ok(LocalStore::new(kv))
}
