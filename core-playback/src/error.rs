//! # Player Error Types
//!
//! Error types for playback operations.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlayerError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// Stream URL is missing, empty, or malformed.
    #[error("Invalid stream URL: {0}")]
    InvalidUrl(String),

    /// Attempted operation when no track is loaded.
    #[error("No track loaded")]
    NoTrackLoaded,

    // ========================================================================
    // Playback Control Errors
    // ========================================================================
    /// Seeking is not available (live stream or unknown duration).
    #[error("Seeking not available for this stream")]
    SeekUnavailable,

    /// Invalid volume value (must be in range [0.0, 1.0]).
    #[error("Invalid volume: {0} (must be between 0.0 and 1.0)")]
    InvalidVolume(f32),

    /// The platform refused to start playback without a user gesture.
    ///
    /// Surfaced as "needs explicit user interaction" and never retried
    /// automatically.
    #[error("Playback start blocked by autoplay policy")]
    AutoplayBlocked,

    // ========================================================================
    // Streaming Errors
    // ========================================================================
    /// The stream failed in a way recovery may fix (network hiccup,
    /// transient decode stall).
    #[error("Recoverable stream error: {0}")]
    RecoverableStream(String),

    /// The stream failed fatally; recovery attempts were exhausted or
    /// the failure class does not support recovery.
    #[error("Fatal stream error: {0}")]
    FatalStream(String),

    /// Interrupted playback could not be resumed within the attempt budget.
    #[error("Resume attempts exhausted after interruption")]
    InterruptionExhausted,

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Error from a platform bridge.
    #[error("Bridge error: {0}")]
    Bridge(BridgeError),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlayerError {
    /// Returns `true` if this error is transient and the operation can be
    /// retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlayerError::RecoverableStream(_))
    }
}

// Autoplay rejections get their own variant so callers can distinguish
// "needs a user gesture" from real failures.
impl From<BridgeError> for PlayerError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::AutoplayBlocked => PlayerError::AutoplayBlocked,
            other => PlayerError::Bridge(other),
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlayerError>;
