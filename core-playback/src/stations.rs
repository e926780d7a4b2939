//! # Stations
//!
//! The track model and the directory/sequencing/analytics seams the engine
//! consumes. Hosts supply implementations backed by whatever storage or
//! catalog service they use.

use crate::error::Result;
use bridge_traits::platform::PlatformSendSync;
use serde::{Deserialize, Serialize};

/// A playable radio station or stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Directory-assigned identifier; `None` for ad-hoc streams.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Stream URL.
    pub url: String,
    /// Broadcast language, when known.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    /// Accumulated listening time in seconds.
    #[serde(default)]
    pub play_time: u64,
}

impl Track {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            url: url.into(),
            language: None,
            is_favorite: false,
            play_time: 0,
        }
    }
}

/// Partial update applied to a stored track. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub is_favorite: Option<bool>,
}

/// Catalog of stations the user can browse and edit.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait StationDirectory: PlatformSendSync {
    async fn list(&self) -> Result<Vec<Track>>;

    async fn add(&self, track: Track) -> Result<Track>;

    async fn update(&self, id: &str, patch: TrackPatch) -> Result<Track>;

    async fn remove(&self, id: &str) -> Result<()>;

    async fn toggle_favorite(&self, id: &str) -> Result<Track>;
}

/// Supplies the next/previous track relative to the one currently loaded.
///
/// The engine does not own playlist ordering; the host decides what "next"
/// means (favorites only, language filter, shuffle).
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait TrackSequencer: PlatformSendSync {
    async fn next(&self, current: Option<&Track>) -> Result<Option<Track>>;

    async fn previous(&self, current: Option<&Track>) -> Result<Option<Track>>;

    /// Number of tracks currently in rotation. Auto-advance on stream end is
    /// skipped when there is at most one.
    async fn len(&self) -> usize;
}

/// Receives listening-time reports.
///
/// Reports are fire-and-forget; a failed report never affects playback.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait PlaybackAnalytics: PlatformSendSync {
    /// Called periodically while playing with the seconds elapsed since the
    /// previous report.
    async fn notify_played(&self, url: &str, elapsed_secs: u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_construction() {
        let track = Track::new("Jazz FM", "https://example.com/jazz");
        assert!(track.id.is_none());
        assert!(!track.is_favorite);
        assert_eq!(track.play_time, 0);
    }

    #[test]
    fn patch_defaults_to_no_changes() {
        let patch: TrackPatch = serde_json::from_str("{}").unwrap();
        assert_eq!(patch, TrackPatch::default());
    }

    #[test]
    fn track_deserializes_with_minimal_fields() {
        let track: Track =
            serde_json::from_str(r#"{"name":"Jazz FM","url":"https://example.com/jazz"}"#)
                .unwrap();
        assert_eq!(track.name, "Jazz FM");
        assert!(track.language.is_none());
    }
}
