//! HTTP client shared by the web and download probes.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use reqwest::Client;

use crate::error::{NetprobeError, Result};

const USER_AGENT: &str = concat!("netprobe/", env!("CARGO_PKG_VERSION"));

/// Per-run HTTP client.
///
/// Built in `prepare_test` with the run's timeout, dropped in
/// `cleanup_tests` so pooled connections do not outlive the run.
#[derive(Default)]
pub struct HttpClientSlot {
    client: Mutex<Option<Client>>,
}

impl HttpClientSlot {
    pub fn prepare(&self, timeout: Duration) {
        let client = match build_client(timeout) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!("Failed to build HTTP client: {}", e);
                None
            }
        };
        *self.lock() = client;
    }

    /// A handle on the run's client. `Client` is reference counted.
    pub fn client(&self) -> Option<Client> {
        self.lock().clone()
    }

    pub fn release(&self) {
        self.lock().take();
    }

    fn lock(&self) -> MutexGuard<'_, Option<Client>> {
        self.client.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(NetprobeError::Http)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_lifecycle() {
        let slot = HttpClientSlot::default();
        assert!(slot.client().is_none());

        slot.prepare(Duration::from_secs(1));
        assert!(slot.client().is_some());

        slot.release();
        assert!(slot.client().is_none());
    }
}
