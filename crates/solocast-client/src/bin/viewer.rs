//! Solocast viewer console — entry point.
//!
//! Connects to the relay as the *viewer* role and runs the interactive
//! console: stdin lines are sent to the broadcaster, relayed payloads are
//! printed to stdout.
//!
//! # Usage
//!
//! ```text
//! solocast-viewer [--server ws://host:port/signal]
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

/// Solocast viewer console.
///
/// Dials the relay, claims the viewer role, then pipes stdin lines to the
/// broadcaster and prints relayed payloads to stdout.
#[derive(Debug, Parser)]
#[command(
    name = "solocast-viewer",
    about = "Console viewer for the Solocast signaling relay",
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
    info!("connecting to {} as viewer", cli.server);

    let client = RelayClient::connect(&cli.server, Role::Viewer).await?;
    relay_console(client).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_server_targets_localhost() {
        let cli = Cli::parse_from(["solocast-viewer"]);
        assert_eq!(cli.server, "ws://127.0.0.1:8080/signal");
    }

    #[test]
    fn test_cli_server_override() {
        let cli = Cli::parse_from(["solocast-viewer", "--server", "ws://10.0.0.5:8080/signal"]);
        assert_eq!(cli.server, "ws://10.0.0.5:8080/signal");
    }
}
