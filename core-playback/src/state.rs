//! # Playback State
//!
//! The unified state snapshot shared with UI consumers.

use crate::stations::Track;
use serde::{Deserialize, Serialize};

/// Attribution of the most recent pause.
///
/// Interruption recovery only auto-resumes `System` pauses; a `User` pause is
/// respected until the user acts again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseSource {
    /// The user paused through one of our surfaces (UI, media keys).
    User,
    /// The platform paused us (interruption, audio focus loss).
    System,
}

/// Complete snapshot of playback state.
///
/// Every field changes only through engine operations; UI consumers receive
/// snapshots through state-change events and never mutate them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Track currently loaded into the engine, if any.
    pub current_track: Option<Track>,
    /// Audio is actually running.
    pub is_playing: bool,
    /// A track is loaded but paused. Distinct from "stopped with nothing
    /// loaded", where both flags are false and `current_track` is `None`.
    pub is_paused: bool,
    /// Who caused the current pause. `None` while playing or stopped.
    pub paused_by: Option<PauseSource>,
    /// Current playback position in seconds.
    pub current_time: f64,
    /// Total duration in seconds; `None` for live streams.
    pub duration: Option<f64>,
    /// Output volume, normalized to `0.0..=1.0`.
    pub volume: f32,
    /// A load or play request is in flight.
    pub loading: bool,
    /// Last playback error message, cleared on the next successful operation.
    pub error: Option<String>,
}

impl PlaybackState {
    /// Initial state before anything is loaded.
    pub fn initial(volume: f32) -> Self {
        Self {
            current_track: None,
            is_playing: false,
            is_paused: false,
            paused_by: None,
            current_time: 0.0,
            duration: None,
            volume,
            loading: false,
            error: None,
        }
    }

    /// `true` when the loaded stream reports no fixed duration.
    pub fn is_live(&self) -> bool {
        self.current_track.is_some() && self.duration.is_none()
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::initial(0.7)
    }
}
