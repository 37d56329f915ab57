//! Solocast broadcaster console — entry point.
//!
//! Connects to the relay as the *broadcaster* role and runs the interactive
//! console: stdin lines are sent to the viewer, relayed payloads are printed
//! to stdout. The media half of a real broadcast (capture, encoding, peer
//! connection) lives in whatever drives this tool; here only the signaling
//! messages flow.
//!
//! # Usage
//!
//! ```text
//! solocast-broadcaster [--server ws://host:port/signal]
//! ```
//!
//! `--server` can also be set via `SOLOCAST_SERVER`; the default targets a
//! relay on the local machine.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use solocast_client::console::relay_console;
use solocast_client::RelayClient;
use solocast_core::Role;

/// Solocast broadcaster console.
///
/// Dials the relay, claims the broadcaster role, then pipes stdin lines to
/// the viewer and prints relayed payloads to stdout.
#[derive(Debug, Parser)]
#[command(
    name = "solocast-broadcaster",
    about = "Console broadcaster for the Solocast signaling relay",
    version
)]
struct Cli {
    /// WebSocket URL of the relay's signaling endpoint.
    #[arg(
        long,
        default_value = "ws://127.0.0.1:8080/signal",
        env = "SOLOCAST_SERVER"
    )]
    server: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!("connecting to {} as broadcaster", cli.server);

    let client = RelayClient::connect(&cli.server, Role::Broadcaster).await?;
    relay_console(client).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
