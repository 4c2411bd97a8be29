//! Event bus system for decoupled communication between app components.
//!
//! The controller emits events without knowing about the consumers. The
//! terminal front-end subscribes a JSON-lines handler when `--json` is
//! given; tests subscribe directly.
//!
//! # Example
//!
//! ```rust,ignore
//! let bus = Arc::new(EventBus::new());
//! handlers::json_lines::start_handler(bus.subscribe(), std::io::stdout());
//! bus.emit(AppEvent::ActiveStateSaved { saved: 6 });
//! ```

pub mod handlers;
pub mod types;

pub use types::AppEvent;

use tokio::sync::broadcast;

/// Capacity of the event channel.
/// Events beyond this will cause receivers to lag.
const CHANNEL_CAPACITY: usize = 256;

/// The central event bus for application-wide event distribution.
///
/// Uses a broadcast channel to allow multiple subscribers to receive
/// all events. Events are fire-and-forget - emitting never blocks.
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a new event bus.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Emit an event to all subscribers.
    ///
    /// This is non-blocking and will not fail even if there are no subscribers.
    pub fn emit(&self, event: AppEvent) {
        tracing::trace!(session = ?event.session_id(), "Event emitted: {}", event.description());
        // Ignore send errors - it's fine if no one is listening
        let _ = self.sender.send(event);
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }
}
