//! Interactive console loop: stdin lines go to the relay, relayed payloads
//! go to stdout.
//!
//! This is the whole user interface of the `solocast-broadcaster` and
//! `solocast-viewer` binaries: enough to drive, observe, and debug a relay
//! by hand or from a script. Typical use pipes a session description in and
//! captures the peer's answer:
//!
//! ```text
//! $ echo '{"type":"offer","sdp":"..."}' | solocast-broadcaster
//! {"type":"answer","sdp":"..."}
//! ```
//!
//! Line-oriented on purpose: each stdin line becomes one text payload, and
//! each relayed text payload is printed as one line. Binary payloads (which
//! scripted peers normally never send) are summarised rather than dumped
//! raw into the terminal.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use solocast_core::RelayPayload;

use crate::client::{ClientError, RelayClient};

/// Runs the stdin ⇄ relay loop until either side ends.
///
/// Returns normally when stdin closes (end of script input) or the relay
/// closes the connection; a handshake rejection or transport failure is
/// reported as an error.
///
/// # Errors
///
/// Returns the underlying [`ClientError`] for rejections and transport
/// failures, wrapped with context.
pub async fn relay_console(mut client: RelayClient) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(text) => client.send(RelayPayload::Text(text)).await?,
                    None => {
                        info!("stdin closed; ending session");
                        return Ok(());
                    }
                }
            }
            received = client.recv() => {
                match received {
                    Ok(RelayPayload::Text(text)) => println!("{text}"),
                    Ok(RelayPayload::Binary(bytes)) => {
                        println!("[binary payload, {} bytes]", bytes.len());
                    }
                    Err(ClientError::Closed) => {
                        info!("relay closed the connection");
                        return Ok(());
                    }
                    Err(e @ ClientError::Rejected(_)) => {
                        warn!("{e}");
                        return Err(e.into());
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }
}
