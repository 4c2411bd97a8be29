//! JSON-lines event handler.
//!
//! Writes every event as one JSON object per line, for scripts that consume
//! `netprobe --json`.

use std::io::Write;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::events::AppEvent;

/// Start the JSON-lines handler.
///
/// The task ends when the bus is dropped.
pub fn start_handler<W>(mut receiver: broadcast::Receiver<AppEvent>, mut out: W) -> JoinHandle<()>
where
    W: Write + Send + 'static,
{
    tracing::debug!("Starting JSON-lines event handler");

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = write_event(&mut out, &event) {
                        tracing::error!("JSON-lines handler error: {}", e);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("JSON-lines handler lagged {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!("Event bus closed, stopping JSON-lines handler");
                    break;
                }
            }
        }
    })
}

fn write_event<W: Write>(out: &mut W, event: &AppEvent) -> crate::error::Result<()> {
    serde_json::to_writer(&mut *out, event)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}
