//! # Radio Playback Core
//!
//! Platform-independent playback engine for a personal internet-radio player.
//!
//! ## Overview
//!
//! Exactly one engine exists per process, shared by every UI surface. The
//! engine classifies stream URLs (segmented manifests versus direct streams),
//! binds them to the host's single [`MediaSink`](bridge_traits::sink::MediaSink),
//! supervises segmented sessions with an in-place recovery policy, survives
//! platform interruptions with a bounded automatic-resume state machine, and
//! mirrors state to the OS media session.
//!
//! ## Modules
//!
//! - [`engine`] - [`PlayerEngine`](engine::PlayerEngine) and per-surface
//!   [`PlayerSession`](engine::PlayerSession) handles
//! - [`resolver`] - URL classification into a playback plan
//! - [`resource`] - exclusive owner of the sink's source binding
//! - [`adapter`] - segmented-session supervision and quality selection
//! - [`interruption`] - interruption/recovery state machine
//! - [`arbiter`] - last-interaction-wins session ownership
//! - [`events`] - broadcast event bus for UI subscribers
//! - [`stations`] - track model plus directory/sequencer/analytics seams
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::engine::{EngineDeps, PlayerEngine};
//! use core_playback::config::PlayerConfig;
//! use core_playback::stations::Track;
//!
//! # async fn run(deps: EngineDeps) -> core_playback::error::Result<()> {
//! let engine = PlayerEngine::new(deps, PlayerConfig::default()).await?;
//! let session = engine.session();
//!
//! session
//!     .load_and_play(Track::new("Jazz FM", "https://radio.example/jazz.m3u8"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod arbiter;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod interruption;
pub mod resolver;
pub mod resource;
pub mod state;
pub mod stations;

pub use arbiter::{SessionArbiter, SessionToken};
pub use config::{PlayerConfig, SettleDelays};
pub use engine::{EngineDeps, PlayerEngine, PlayerSession};
pub use error::{PlayerError, Result};
pub use events::{EventBus, PlayerEvent};
pub use resolver::{StreamKind, StreamPlan};
pub use state::{PauseSource, PlaybackState};
pub use stations::{PlaybackAnalytics, StationDirectory, Track, TrackPatch, TrackSequencer};
