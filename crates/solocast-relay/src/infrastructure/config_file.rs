//! Optional TOML configuration file for the relay.
//!
//! Every field is optional: the file only *fills gaps* left by CLI flags,
//! and built-in defaults fill whatever the file leaves out (see
//! `resolve_config` in `main.rs` for the precedence rules). Example:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1"
//! port = 9000
//! signal_path = "/signal"
//!
//! [policy]
//! # Empty or absent list = any origin is accepted (the permissive default).
//! allowed_origins = ["https://cam.example"]
//! handshake_timeout_secs = 10
//! # 0 disables a timeout.
//! idle_timeout_secs = 0
//! ```
//!
//! `serde` + `toml` turn this text into [`FileConfig`]; `#[serde(default)]`
//! on the sections means a file containing only `[server]`, or nothing at
//! all, still parses.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// A file system I/O error occurred (missing file, permissions, ...).
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level shape of the relay's TOML config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FileConfig {
    /// `[server]` — where the relay listens.
    #[serde(default)]
    pub server: ServerSection,
    /// `[policy]` — who may connect and how patient the relay is.
    #[serde(default)]
    pub policy: PolicySection,
}

/// Listener settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServerSection {
    /// IP address to bind to. `"0.0.0.0"` binds all interfaces.
    pub bind: Option<String>,
    /// TCP port for the WebSocket listener.
    pub port: Option<u16>,
    /// HTTP path that upgrades to the signaling WebSocket.
    pub signal_path: Option<String>,
}

/// Admission policy and deadline settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PolicySection {
    /// Origin allow-list; empty or absent accepts any origin.
    pub allowed_origins: Option<Vec<String>>,
    /// Seconds a fresh connection gets to declare its role; `0` disables.
    pub handshake_timeout_secs: Option<u64>,
    /// Seconds of receive silence tolerated after assignment; `0` disables.
    pub idle_timeout_secs: Option<u64>,
}

/// Reads and parses the TOML config file at `path`.
///
/// A missing file is an error here: the caller only invokes this when the
/// operator explicitly passed `--config`, and silently ignoring a typo'd
/// path would hide a misconfiguration.
///
/// # Errors
///
/// Returns [`ConfigFileError::Io`] when the file cannot be read and
/// [`ConfigFileError::Parse`] when it is not valid TOML for this schema.
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigFileError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&text)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
