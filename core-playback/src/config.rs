//! # Player Configuration
//!
//! Configuration types for the playback engine.

use bridge_traits::hls::HlsTuning;
use bridge_traits::lifecycle::RecoverySignal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback engine configuration.
///
/// Controls interruption recovery budgets, settle delays, stream recovery
/// limits, and persistence keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Maximum automatic resume attempts after an interruption before the
    /// engine gives up and waits for an explicit user action.
    ///
    /// Default: 3.
    #[serde(default = "default_max_resume_attempts")]
    pub max_resume_attempts: u32,

    /// Per-source delays applied before probing playback after a recovery
    /// signal.
    #[serde(default)]
    pub settle: SettleDelays,

    /// Delay before the one-shot full reload after a fatal segmented-stream
    /// error.
    ///
    /// Default: 2 seconds.
    #[serde(default = "default_fatal_reload_delay")]
    pub fatal_reload_delay: Duration,

    /// Maximum in-place recovery attempts (loader restarts, media-error
    /// recovery) per segmented session before the error is treated as fatal.
    ///
    /// Default: 8.
    #[serde(default = "default_adapter_recovery_cap")]
    pub adapter_recovery_cap: u32,

    /// Interval between listening-time reports while playing.
    ///
    /// Default: 30 seconds.
    #[serde(default = "default_analytics_interval")]
    pub analytics_interval: Duration,

    /// Volume applied when no persisted value exists.
    ///
    /// Default: 0.7.
    #[serde(default = "default_volume")]
    pub default_volume: f32,

    /// Settings key under which volume is persisted.
    #[serde(default = "default_volume_key")]
    pub volume_key: String,

    /// Buffer size of the engine's event channel. Slow subscribers lag past
    /// this many events.
    ///
    /// Default: 100.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Tuning handed to the segmented-streaming runtime.
    #[serde(default)]
    pub hls: HlsTuning,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_resume_attempts: default_max_resume_attempts(),
            settle: SettleDelays::default(),
            fatal_reload_delay: default_fatal_reload_delay(),
            adapter_recovery_cap: default_adapter_recovery_cap(),
            analytics_interval: default_analytics_interval(),
            default_volume: default_volume(),
            volume_key: default_volume_key(),
            event_buffer: default_event_buffer(),
            hls: HlsTuning::default(),
        }
    }
}

impl PlayerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_resume_attempts == 0 {
            return Err("max_resume_attempts must be > 0".to_string());
        }

        if !(0.0..=1.0).contains(&self.default_volume) {
            return Err("default_volume must be between 0.0 and 1.0".to_string());
        }

        if self.volume_key.is_empty() {
            return Err("volume_key must not be empty".to_string());
        }

        if self.event_buffer == 0 {
            return Err("event_buffer must be > 0".to_string());
        }

        Ok(())
    }
}

/// Per-source settle delays applied before a resume probe.
///
/// Recovery signals do not mean the platform is ready for playback; each
/// source needs a different amount of time before a `play()` call has a
/// realistic chance of succeeding. External-play signals settle fastest
/// because the platform itself initiated playback; returning from a frozen
/// page or a suspended audio session needs the longest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleDelays {
    /// After playback restarted from outside our surface. Default: 500ms.
    #[serde(default = "default_external_play")]
    pub external_play: Duration,

    /// After the window regained focus. Default: 800ms.
    #[serde(default = "default_window_focus")]
    pub window_focus: Duration,

    /// After the platform thawed a frozen page. Default: 1000ms.
    #[serde(default = "default_page_resume")]
    pub page_resume: Duration,

    /// After the page became visible again. Default: 1200ms.
    #[serde(default = "default_visibility")]
    pub visibility: Duration,

    /// After the platform audio session resumed. Default: 1500ms.
    #[serde(default = "default_audio_session")]
    pub audio_session: Duration,
}

impl SettleDelays {
    /// Delay to wait before probing playback for a given recovery signal.
    pub fn for_recovery(&self, signal: RecoverySignal) -> Duration {
        match signal {
            RecoverySignal::ExternalPlay => self.external_play,
            RecoverySignal::WindowFocus => self.window_focus,
            RecoverySignal::PageResumed => self.page_resume,
            RecoverySignal::PageVisible => self.visibility,
            RecoverySignal::AudioSessionResumed => self.audio_session,
        }
    }
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            external_play: default_external_play(),
            window_focus: default_window_focus(),
            page_resume: default_page_resume(),
            visibility: default_visibility(),
            audio_session: default_audio_session(),
        }
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_max_resume_attempts() -> u32 {
    3
}

fn default_fatal_reload_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_adapter_recovery_cap() -> u32 {
    8
}

fn default_analytics_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_volume() -> f32 {
    0.7
}

fn default_volume_key() -> String {
    "player.volume".to_string()
}

fn default_event_buffer() -> usize {
    100
}

fn default_external_play() -> Duration {
    Duration::from_millis(500)
}

fn default_window_focus() -> Duration {
    Duration::from_millis(800)
}

fn default_page_resume() -> Duration {
    Duration::from_millis(1000)
}

fn default_visibility() -> Duration {
    Duration::from_millis(1200)
}

fn default_audio_session() -> Duration {
    Duration::from_millis(1500)
}
