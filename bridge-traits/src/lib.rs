//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that must be implemented differently per platform
//! (web view, iOS, Android, desktop).
//!
//! ## Traits
//!
//! ### Audio Output
//! - [`MediaSink`](sink::MediaSink) - The single shared audio output
//! - [`HlsRuntime`](hls::HlsRuntime) / [`HlsSession`](hls::HlsSession) -
//!   Segmented-manifest streaming sessions driving the shared sink
//!
//! ### Platform Integration
//! - [`SignalSource`](lifecycle::SignalSource) - Normalized lifecycle and
//!   audio-focus signals (visibility, focus, audio-session, external
//!   play/pause)
//! - [`MediaSessionBridge`](media_session::MediaSessionBridge) - OS transport
//!   UI (lock screen, media keys)
//! - [`WakeLock`](media_session::WakeLock) - Keep the device awake during
//!   playback
//!
//! ### Storage
//! - [`SettingsStore`](storage::SettingsStore) - Key-value preferences storage
//!
//! ## Capability Probing
//!
//! Hosts probe their platform once at startup and hand the core a
//! [`PlatformCapabilities`](platform::PlatformCapabilities) value. The core
//! consumes that typed configuration instead of feature-detecting on its own.
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Platform implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Map autoplay-policy rejections to [`BridgeError::AutoplayBlocked`]
//!   specifically, since the core treats that case differently from stream
//!   failures
//! - Provide actionable error messages
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds on native targets to support
//! safe concurrent usage across async tasks. On `wasm32` the bounds relax to
//! match the single-threaded browser environment; see [`platform`].
//!
//! ## Examples
//!
//! ### Implementing MediaSink
//!
//! ```ignore
//! use bridge_traits::sink::{MediaSink, SinkBinding, SinkEvent};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//! use tokio::sync::broadcast;
//!
//! pub struct WebAudioSink {
//!     events: broadcast::Sender<SinkEvent>,
//!     // handle to the host audio element
//! }
//!
//! #[async_trait]
//! impl MediaSink for WebAudioSink {
//!     async fn bind(&self, binding: SinkBinding) -> Result<()> {
//!         // assign src, apply cross-origin and preload attributes
//!         todo!()
//!     }
//!     // ...
//! #   async fn detach_source(&self) -> Result<()> { todo!() }
//! #   async fn play(&self) -> Result<()> { todo!() }
//! #   async fn pause(&self) -> Result<()> { todo!() }
//! #   async fn seek(&self, _: std::time::Duration) -> Result<()> { todo!() }
//! #   async fn set_volume(&self, _: f32) -> Result<()> { todo!() }
//! #   async fn position(&self) -> Result<std::time::Duration> { todo!() }
//! #   async fn duration(&self) -> Result<Option<std::time::Duration>> { todo!() }
//! #   fn events(&self) -> broadcast::Receiver<SinkEvent> { self.events.subscribe() }
//! }
//! ```

pub mod error;
pub mod hls;
pub mod lifecycle;
pub mod media_session;
pub mod platform;
pub mod sink;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use hls::{HlsErrorKind, HlsEvent, HlsRuntime, HlsSession, HlsTuning, QualityLevel};
pub use lifecycle::{InterruptionSignal, PlatformSignal, RecoverySignal, SignalSource};
pub use media_session::{
    MediaCommand, MediaSessionBridge, NowPlayingMetadata, PlaybackStatus, PositionState, WakeLock,
};
pub use platform::{PlatformCapabilities, PlatformSend, PlatformSendSync};
pub use sink::{CrossOriginMode, MediaSink, PreloadPolicy, SinkBinding, SinkEvent};
pub use storage::SettingsStore;
