//! Segmented-streaming (HLS) bridge traits.
//!
//! Direct URLs are bound straight onto the [`crate::sink::MediaSink`]; URLs
//! carrying a playlist-manifest suffix instead go through an [`HlsRuntime`],
//! the host-provided wrapper around its segmented-streaming library. The
//! runtime attaches a session to the shared sink, parses the manifest, and
//! reports progress and failures through [`HlsEvent`]s so the core can apply
//! its recovery policy.

use crate::error::Result;
use crate::platform::PlatformSendSync;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// One encoded quality level offered by a parsed manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityLevel {
    /// Index of this level within the manifest, used for selection.
    pub index: usize,
    /// Average bitrate in bits per second.
    pub bitrate: u32,
    /// `true` when the level carries no video track.
    pub audio_only: bool,
    /// Codec string when reported by the manifest.
    pub codec: Option<String>,
}

/// Classification of a session error, mirroring the error types segmented
/// streaming libraries report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HlsErrorKind {
    /// Manifest/fragment loading failed at the network layer.
    Network,
    /// The decode pipeline choked on received media.
    Media,
    /// Anything else (mux errors, key errors, internal failures).
    Other(String),
}

/// Events emitted by an [`HlsSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum HlsEvent {
    /// The session attached itself to the shared sink.
    MediaAttached,
    /// The manifest was parsed; quality levels are known.
    ManifestParsed { levels: Vec<QualityLevel> },
    /// The session switched to a different quality level.
    LevelSwitched { level: usize },
    /// An error occurred. Non-fatal errors are informational; fatal errors
    /// require the recovery policy to act.
    Error {
        kind: HlsErrorKind,
        fatal: bool,
        detail: String,
    },
}

/// Tuning applied when creating a session.
///
/// Buffers are bounded to avoid unbounded memory growth on long-lived live
/// streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HlsTuning {
    /// Prefer low-latency behavior over deep buffering.
    #[serde(default = "default_low_latency")]
    pub low_latency: bool,
    /// Maximum forward buffer, in seconds of media.
    #[serde(default = "default_max_buffer_seconds")]
    pub max_buffer_seconds: u32,
    /// Hard cap on buffered bytes.
    #[serde(default = "default_max_buffer_bytes")]
    pub max_buffer_bytes: u64,
    /// Retry budget for manifest and fragment loaders inside the library.
    #[serde(default = "default_loader_max_retries")]
    pub loader_max_retries: u32,
}

impl Default for HlsTuning {
    fn default() -> Self {
        Self {
            low_latency: default_low_latency(),
            max_buffer_seconds: default_max_buffer_seconds(),
            max_buffer_bytes: default_max_buffer_bytes(),
            loader_max_retries: default_loader_max_retries(),
        }
    }
}

fn default_low_latency() -> bool {
    true
}

fn default_max_buffer_seconds() -> u32 {
    60
}

fn default_max_buffer_bytes() -> u64 {
    100 * 1000 * 1000 // 100 MB
}

fn default_loader_max_retries() -> u32 {
    8
}

/// A live segmented-streaming session bound to the shared sink.
///
/// At most one session exists at a time; the core enforces detach-before-attach
/// ordering.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait HlsSession: PlatformSendSync {
    /// (Re)start loading from the network. Used both for initial load and for
    /// network-error recovery.
    async fn start_load(&self) -> Result<()>;

    /// Stop network activity without destroying the session.
    async fn stop_load(&self) -> Result<()>;

    /// Soft-reset the decode pipeline after a media error.
    async fn recover_media_error(&self) -> Result<()>;

    /// Pin playback to a specific quality level.
    async fn select_level(&self, index: usize) -> Result<()>;

    /// Tear the session down, cancelling in-flight network activity and
    /// releasing its hold on the sink.
    async fn destroy(&self) -> Result<()>;

    /// Subscribe to session events.
    fn events(&self) -> broadcast::Receiver<HlsEvent>;
}

/// Factory for segmented-streaming sessions.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait HlsRuntime: PlatformSendSync {
    /// Whether segmented playback is available on this platform at all.
    fn is_supported(&self) -> bool;

    /// Create a session for `url`, attach it to the process sink, and begin
    /// loading the manifest.
    async fn attach(&self, url: &str, tuning: HlsTuning) -> Result<Box<dyn HlsSession>>;
}
