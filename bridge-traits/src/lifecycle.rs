//! App-lifecycle and audio-focus signal bridge.
//!
//! Hosts translate their raw lifecycle surface (visibility changes, window
//! focus, audio-session notifications, page freeze/resume) into a single
//! normalized stream of [`PlatformSignal`]s. The playback core never listens to
//! platform events directly; interruption detection and recovery are driven
//! entirely by this stream.

use crate::platform::PlatformSendSync;
use tokio::sync::mpsc;

/// A signal suggesting playback was (or is about to be) interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterruptionSignal {
    /// The page or app moved to the background.
    PageHidden,
    /// The window lost focus.
    WindowBlur,
    /// The platform audio session was suspended (call, Siri, another app
    /// taking exclusive audio).
    AudioSessionSuspended,
    /// Playback stopped without a user command through our surface
    /// (headphones unplugged, another tab grabbed the output).
    ExternalPause,
    /// The platform froze the page/process.
    PageFrozen,
}

/// A signal suggesting the interruption may be over.
///
/// Each source settles at a different rate after returning; the core applies a
/// per-source delay before probing playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoverySignal {
    /// The page or app became visible again.
    PageVisible,
    /// The window regained focus.
    WindowFocus,
    /// The platform audio session resumed.
    AudioSessionResumed,
    /// Playback restarted from outside our surface (hardware keys, transport
    /// UI of the OS).
    ExternalPlay,
    /// The platform thawed a frozen page/process.
    PageResumed,
}

/// Normalized lifecycle signal delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformSignal {
    Interruption(InterruptionSignal),
    Recovery(RecoverySignal),
}

/// Source of normalized lifecycle signals.
pub trait SignalSource: PlatformSendSync {
    /// Take the signal stream. Yields `None` once; subsequent calls return a
    /// channel that never produces.
    fn signals(&self) -> mpsc::UnboundedReceiver<PlatformSignal>;
}
