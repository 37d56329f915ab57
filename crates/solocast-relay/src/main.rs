//! Solocast signaling relay — entry point.
//!
//! This binary pairs exactly one broadcaster WebSocket connection with
//! exactly one viewer connection and forwards opaque signaling payloads
//! between them. Clients connect to `ws://host:port/signal` and send the
//! literal text `broadcaster` or `viewer` as their first message.
//!
//! # Usage
//!
//! ```text
//! solocast-relay [OPTIONS]
//!
//! Options:
//!   --bind <IP>                 Listener IP address [default: 0.0.0.0]
//!   --port <PORT>               Listener TCP port [default: 8080]
//!   --signal-path <PATH>        WebSocket upgrade path [default: /signal]
//!   --allowed-origin <ORIGIN>   Origin allow-list entry (repeatable);
//!                               no entries = any origin is accepted
//!   --handshake-timeout <SECS>  Seconds allowed before the role message;
//!                               0 disables [default: 10]
//!   --idle-timeout <SECS>       Seconds of silence tolerated after
//!                               assignment; 0 disables [default: 0]
//!   --config <PATH>             Optional TOML config file
//! ```
//!
//! # Environment variable overrides
//!
//! Each flag can also be set via an environment variable; an explicit CLI
//! flag takes precedence when both are present.
//!
//! | Variable                     | Flag                  |
//! |------------------------------|-----------------------|
//! | `SOLOCAST_BIND`              | `--bind`              |
//! | `SOLOCAST_PORT`              | `--port`              |
//! | `SOLOCAST_SIGNAL_PATH`       | `--signal-path`       |
//! | `SOLOCAST_ALLOWED_ORIGINS`   | `--allowed-origin` (comma-separated) |
//! | `SOLOCAST_HANDSHAKE_TIMEOUT` | `--handshake-timeout` |
//! | `SOLOCAST_IDLE_TIMEOUT`      | `--idle-timeout`      |
//! | `SOLOCAST_CONFIG`            | `--config`            |
//!
//! # Configuration precedence
//!
//! CLI flag (or its environment variable) > config-file value > built-in
//! default. An explicitly passed flag always wins; the file fills gaps; the
//! defaults fill the rest. Passing `--config` with a missing file is an
//! error; passing no `--config` means no file is read.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use solocast_relay::domain::{
    RelayConfig, DEFAULT_HANDSHAKE_TIMEOUT_SECS, DEFAULT_PORT, DEFAULT_SIGNAL_PATH,
};
use solocast_relay::infrastructure::{load_file_config, run_server, FileConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Solocast signaling relay.
///
/// Pairs one broadcaster with one viewer over WebSocket and forwards their
/// signaling payloads verbatim.
#[derive(Debug, Parser)]
#[command(
    name = "solocast-relay",
    about = "One-to-one WebRTC signaling relay",
    version
)]
struct Cli {
    /// IP address to bind the WebSocket listener to.
    ///
    /// Use `0.0.0.0` to accept connections from any network interface, or
    /// `127.0.0.1` to accept only local connections (e.g. behind a reverse
    /// proxy).
    #[arg(long, env = "SOLOCAST_BIND")]
    bind: Option<String>,

    /// TCP port for the WebSocket listener.
    #[arg(long, env = "SOLOCAST_PORT")]
    port: Option<u16>,

    /// HTTP path that upgrades to the signaling WebSocket.
    #[arg(long, env = "SOLOCAST_SIGNAL_PATH")]
    signal_path: Option<String>,

    /// Origin allowed to open a signaling connection (repeatable).
    ///
    /// With no entries, any `Origin` header — or none at all — is accepted.
    /// This permissive default suits native clients and same-host pages;
    /// set an allow-list when browsers from other sites must be kept out.
    #[arg(long = "allowed-origin", env = "SOLOCAST_ALLOWED_ORIGINS", value_delimiter = ',')]
    allowed_origins: Vec<String>,

    /// Seconds a fresh connection gets to declare its role; 0 disables.
    #[arg(long, env = "SOLOCAST_HANDSHAKE_TIMEOUT")]
    handshake_timeout: Option<u64>,

    /// Seconds of receive silence tolerated after assignment; 0 disables.
    #[arg(long, env = "SOLOCAST_IDLE_TIMEOUT")]
    idle_timeout: Option<u64>,

    /// Path to a TOML config file (see the `[server]`/`[policy]` schema).
    #[arg(long, env = "SOLOCAST_CONFIG")]
    config: Option<PathBuf>,
}

/// Merges CLI values over file values over defaults into a [`RelayConfig`].
///
/// `0` for either timeout means "disabled" and maps to `None`.
///
/// # Errors
///
/// Returns an error if the resolved bind IP and port do not form a valid
/// socket address.
fn resolve_config(cli: Cli, file: FileConfig) -> anyhow::Result<RelayConfig> {
    let bind = cli
        .bind
        .or(file.server.bind)
        .unwrap_or_else(|| "0.0.0.0".to_owned());
    let port = cli.port.or(file.server.port).unwrap_or(DEFAULT_PORT);
    let bind_addr = format!("{bind}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address: '{bind}:{port}'"))?;

    let signal_path = cli
        .signal_path
        .or(file.server.signal_path)
        .unwrap_or_else(|| DEFAULT_SIGNAL_PATH.to_owned());

    let allowed_origins = if cli.allowed_origins.is_empty() {
        file.policy.allowed_origins.unwrap_or_default()
    } else {
        cli.allowed_origins
    };

    let handshake_secs = cli
        .handshake_timeout
        .or(file.policy.handshake_timeout_secs)
        .unwrap_or(DEFAULT_HANDSHAKE_TIMEOUT_SECS);
    let idle_secs = cli
        .idle_timeout
        .or(file.policy.idle_timeout_secs)
        .unwrap_or(0);

    Ok(RelayConfig {
        bind_addr,
        signal_path,
        allowed_origins,
        handshake_timeout: seconds_to_deadline(handshake_secs),
        idle_timeout: seconds_to_deadline(idle_secs),
    })
}

/// `0` disables a deadline; anything else is a duration in seconds.
fn seconds_to_deadline(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. `tracing_subscriber` is initialised; the log level is controlled by
///    the `RUST_LOG` environment variable, falling back to `info`.
/// 2. CLI arguments are parsed with `clap`; the optional config file is
///    loaded; both are merged over the defaults into a [`RelayConfig`].
/// 3. A Ctrl+C handler is spawned that clears a shared `AtomicBool`.
/// 4. [`run_server`] binds the listener and accepts connections until the
///    shutdown flag is cleared.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Only read a file the operator explicitly asked for.
    let file = match &cli.config {
        Some(path) => load_file_config(path)
            .with_context(|| format!("failed to load config file {}", path.display()))?,
        None => FileConfig::default(),
    };

    let config = resolve_config(cli, file)?;

    info!(
        "solocast relay starting — bind={}, path={}, origins={}",
        config.bind_addr,
        config.signal_path,
        if config.allowed_origins.is_empty() {
            "any".to_owned()
        } else {
            config.allowed_origins.join(",")
        }
    );

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    //
    // The accept loop checks this flag every 200 ms and exits cleanly once
    // it is cleared. `Relaxed` ordering is enough: the value only needs to
    // eventually propagate.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C — initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config, running).await?;

    info!("solocast relay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
