//! Platform "now playing" surface and wake-lock bridges.
//!
//! The media session is the OS-level transport UI: lock-screen controls,
//! hardware media keys, notification-shade players. The core pushes metadata
//! and playback status out and receives transport commands back through a
//! single normalized channel.

use crate::error::Result;
use crate::platform::PlatformSendSync;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

/// Track metadata displayed by the platform transport UI.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NowPlayingMetadata {
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub artwork_url: Option<String>,
}

/// Coarse playback status mirrored to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Playing,
    Paused,
    None,
}

/// Timeline state for platforms that render a seek bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionState {
    pub position: Duration,
    /// `None` for live streams; hosts hide the seek bar.
    pub duration: Option<Duration>,
    pub playback_rate: f64,
}

/// Transport commands originating from the platform UI or hardware keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaCommand {
    Play,
    Pause,
    NextTrack,
    PreviousTrack,
    SeekTo(Duration),
    SeekForward(Duration),
    SeekBackward(Duration),
}

/// Bridge to the platform's media-session surface.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait MediaSessionBridge: PlatformSendSync {
    /// Publish track metadata to the transport UI.
    async fn set_metadata(&self, metadata: NowPlayingMetadata) -> Result<()>;

    /// Mirror the coarse playback status.
    async fn set_playback_status(&self, status: PlaybackStatus) -> Result<()>;

    /// Update the timeline, when the platform renders one.
    async fn set_position_state(&self, state: PositionState) -> Result<()>;

    /// Take the command stream. Yields `None` once; subsequent calls return a
    /// channel that never produces.
    fn commands(&self) -> mpsc::UnboundedReceiver<MediaCommand>;
}

/// Keeps the device awake while playback runs.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait WakeLock: PlatformSendSync {
    async fn acquire(&self) -> Result<()>;

    async fn release(&self) -> Result<()>;
}
