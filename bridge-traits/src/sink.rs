//! Media sink bridge trait and supporting types.
//!
//! The sink is the host platform's single shared audio output (an audio
//! element, a native audio session, ...). Exactly one sink exists per process;
//! the playback core binds sources to it, controls transport, and consumes its
//! normalized event stream. The sink is created lazily by the host and is never
//! recreated while the process lives.

use crate::error::Result;
use crate::platform::PlatformSendSync;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;

/// Cross-origin fetch mode for a bound source.
///
/// `Disabled` means the cross-origin attribute is *removed*, not merely set to
/// false: forcing anonymous mode onto a same-origin or blob source breaks
/// playback on several platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossOriginMode {
    Anonymous,
    Disabled,
}

/// Preload hint applied when binding a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreloadPolicy {
    None,
    Auto,
}

/// Resource configuration for binding a URL directly to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkBinding {
    /// Source URL to assign.
    pub url: String,
    /// Cross-origin mode the source requires.
    pub cross_origin: CrossOriginMode,
    /// Preload hint.
    pub preload: PreloadPolicy,
}

impl SinkBinding {
    pub fn new(url: impl Into<String>, cross_origin: CrossOriginMode, preload: PreloadPolicy) -> Self {
        Self {
            url: url.into(),
            cross_origin,
            preload,
        }
    }
}

/// Normalized playback events emitted by the sink.
///
/// The surface is identical for direct and segmented backends: a segmented
/// runtime drives the same sink, so transport-level events (progress, pause,
/// ended) arrive through this one stream regardless of how the source was
/// attached.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    /// A new source started loading.
    LoadStarted,
    /// Stream metadata became known. `duration` is `None` for live or
    /// non-seekable content.
    MetadataKnown { duration: Option<Duration> },
    /// Enough data is buffered for playback to start.
    CanPlay,
    /// Playback position advanced.
    Progress {
        position: Duration,
        duration: Option<Duration>,
    },
    /// Playback is running.
    Playing,
    /// Playback is paused (by whatever cause; the core attributes intent).
    Paused,
    /// The stream ended naturally.
    Ended,
    /// The sink failed to load or decode the bound source.
    Failed { message: String },
}

/// Trait for the host's shared media output.
///
/// Implementations wrap the platform audio element/engine. Control methods
/// must be fast and non-blocking; state flows back through [`SinkEvent`]s.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait MediaSink: PlatformSendSync {
    /// Assign a source to the sink, replacing any previous source.
    ///
    /// Implementations must apply `cross_origin` exactly as specified:
    /// `Disabled` removes the attribute rather than setting it false.
    async fn bind(&self, binding: SinkBinding) -> Result<()>;

    /// Detach the current source without destroying the sink.
    async fn detach_source(&self) -> Result<()>;

    /// Begin or resume playback.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BridgeError::AutoplayBlocked`] when the platform
    /// refuses an autonomous start; callers surface this as "needs a user
    /// gesture" and never retry it automatically.
    async fn play(&self) -> Result<()>;

    /// Pause playback, keeping the source bound.
    async fn pause(&self) -> Result<()>;

    /// Seek to an absolute position.
    async fn seek(&self, position: Duration) -> Result<()>;

    /// Set output volume, normalized to `0.0..=1.0`.
    async fn set_volume(&self, volume: f32) -> Result<()>;

    /// Current playback position.
    async fn position(&self) -> Result<Duration>;

    /// Total duration of the bound source; `None` for live/unknown streams.
    async fn duration(&self) -> Result<Option<Duration>>;

    /// Subscribe to the sink's event stream.
    fn events(&self) -> broadcast::Receiver<SinkEvent>;
}
