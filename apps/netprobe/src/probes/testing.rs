//! Test doubles for probes and a one-shot HTTP server.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::{Probe, ProbeId, ProbeInfo, ProbeReport, ProbeState, RunContext};

/// Serve exactly one HTTP/1.1 response on a fresh local port.
pub(crate) async fn serve_http_once(status: &'static str, body: Vec<u8>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let head = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            body.len()
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&body).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    addr
}

/// Shared record of probe calls, e.g. `["prepare:a", "perform:a", "cleanup:a"]`.
#[derive(Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn push(&self, call: &str, id: ProbeId) {
        self.0.lock().unwrap().push(format!("{}:{}", call, id));
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Ids of the probes that saw `call`, in call order.
    pub(crate) fn calls(&self, call: &str) -> Vec<String> {
        let prefix = format!("{}:", call);
        self.entries()
            .iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(String::from))
            .collect()
    }
}

pub(crate) enum Behavior {
    Pass,
    Fail,
    Panic,
    /// Wait for the notify, then pass.
    WaitFor(Arc<Notify>),
}

pub(crate) struct MockProbe {
    id: ProbeId,
    state: ProbeState,
    behavior: Behavior,
    log: CallLog,
    hook: Option<Box<dyn Fn() + Send + Sync>>,
}

impl MockProbe {
    pub(crate) fn new(id: &'static str, active: bool, behavior: Behavior, log: &CallLog) -> Self {
        Self {
            id: ProbeId::new(id),
            state: ProbeState::new(active),
            behavior,
            log: log.clone(),
            hook: None,
        }
    }

    /// Run `hook` at the end of `perform_test`.
    pub(crate) fn with_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }
}

#[async_trait]
impl Probe for MockProbe {
    fn info(&self) -> ProbeInfo {
        ProbeInfo {
            id: self.id,
            name: self.id.as_str(),
            description: "mock",
        }
    }

    fn is_active(&self) -> bool {
        self.state.is_active()
    }

    fn set_active(&self, active: bool) {
        self.state.set_active(active);
    }

    fn prepare_test(&self, ctx: &RunContext) {
        self.log.push("prepare", self.id);
        self.state.prepare(ctx.timeout(1_000));
    }

    async fn perform_test(&self) -> bool {
        self.log.push("perform", self.id);
        let passed = match &self.behavior {
            Behavior::Pass => true,
            Behavior::Fail => false,
            Behavior::Panic => panic!("probe {} blew up", self.id),
            Behavior::WaitFor(notify) => {
                notify.notified().await;
                true
            }
        };
        if let Some(hook) = &self.hook {
            hook();
        }
        let elapsed = std::time::Duration::from_millis(1);
        self.state.record(if passed {
            ProbeReport::passed(elapsed, "ok")
        } else {
            ProbeReport::failed(elapsed, "failed")
        })
    }

    fn cleanup_tests(&self) {
        self.log.push("cleanup", self.id);
    }

    fn on_pause(&self) {
        self.log.push("pause", self.id);
    }

    fn report(&self) -> Option<ProbeReport> {
        self.state.report()
    }
}
