//! # Player Event Bus
//!
//! Event-driven notification channel between the engine and its UI consumers,
//! built on `tokio::sync::broadcast`. Multiple UI surfaces subscribe
//! independently; slow subscribers lag rather than blocking the engine.
//!
//! ## Usage
//!
//! ```rust
//! use core_playback::events::{EventBus, PlayerEvent};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus = EventBus::new(100);
//! let mut sub = bus.subscribe();
//!
//! bus.emit(PlayerEvent::InterruptionDetected).ok();
//! assert_eq!(sub.recv().await.unwrap(), PlayerEvent::InterruptionDetected);
//! # }
//! ```

use crate::state::PlaybackState;
use crate::stations::Track;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Events published by the playback engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum PlayerEvent {
    /// A different track was loaded.
    TrackChanged { track: Track },
    /// The unified playback state changed. Carries a full snapshot so
    /// subscribers never need to query back.
    StateChanged { state: PlaybackState },
    /// Playback position advanced without any other state change.
    Progress {
        position_secs: f64,
        duration_secs: Option<f64>,
    },
    /// Playback was paused by the platform; recovery is armed.
    InterruptionDetected,
    /// Playback resumed (automatically or by the user) after an interruption.
    InterruptionCleared,
    /// Automatic resume attempts were exhausted; the engine is waiting for an
    /// explicit user action.
    ResumeExhausted,
    /// A playback error surfaced to the UI.
    PlaybackError { message: String, recoverable: bool },
}

/// Broadcast channel carrying [`PlayerEvent`]s to all subscribers.
///
/// Clone the bus to publish from multiple tasks; each `subscribe()` creates an
/// independent receiver. Past events are not replayed.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlayerEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per
    /// subscriber. Subscribers that fall further behind receive
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// when there are none. Publishing with no subscribers is normal during
    /// startup; callers discard the result.
    pub fn emit(&self, event: PlayerEvent) -> Result<usize, SendError<PlayerEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber receiving all future events.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
