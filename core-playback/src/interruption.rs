//! # Interruption Coordinator
//!
//! Pure state machine deciding how playback reacts to platform interruptions
//! and recovery signals. The coordinator holds no timers and touches no
//! resources; it consumes signals and emits [`CoordinatorAction`]s the engine
//! executes. Keeping it synchronous makes every transition directly testable.
//!
//! ## Phases
//!
//! ```text
//!            interruption                recovery signal
//!  Normal ────────────────> Interrupted ────────────────> ResumePending
//!    ^                          ^  ^                           │
//!    │  probe succeeded         │  │   probe failed            │ settle
//!    └──────────────────────────┼──┴───(attempts left)         │ timer
//!                               │                              v
//!                               │      attempts exhausted   AttemptPlay
//!                               └────── or autoplay block ──> AwaitingUser
//! ```
//!
//! A user action in any phase returns to `Normal` and cancels any pending
//! probe; automatic recovery never overrides explicit user intent.

use crate::config::SettleDelays;
use bridge_traits::lifecycle::{InterruptionSignal, RecoverySignal};
use std::time::Duration;

/// Phase of the interruption state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No interruption outstanding.
    Normal,
    /// Playback was paused by the platform; waiting for a recovery signal.
    Interrupted,
    /// A recovery signal arrived; a settle timer is running before the probe.
    ResumePending,
    /// Automatic recovery gave up (attempt budget spent or autoplay block);
    /// only a user action leaves this phase.
    AwaitingUser,
}

/// What the engine should do in response to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorAction {
    /// Pause playback, attributing the pause to the platform.
    Pause,
    /// Start (or restart, replacing any running timer) the settle timer.
    ScheduleResume { delay: Duration },
    /// The settle timer fired; probe playback now.
    AttemptPlay,
    /// Cancel any pending settle timer.
    CancelPending,
    /// Automatic recovery is over; surface it and wait for the user.
    Exhausted,
    /// Nothing to do.
    Ignore,
}

/// Result of a resume probe, reported back by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// Playback restarted.
    Success,
    /// The platform demanded a user gesture. Never retried automatically.
    AutoplayBlocked,
    /// The probe failed for any other reason.
    Failed,
}

/// Interruption-recovery state machine.
#[derive(Debug)]
pub struct InterruptionCoordinator {
    phase: Phase,
    attempts: u32,
    max_attempts: u32,
    settle: SettleDelays,
}

impl InterruptionCoordinator {
    pub fn new(max_attempts: u32, settle: SettleDelays) -> Self {
        Self {
            phase: Phase::Normal,
            attempts: 0,
            max_attempts,
            settle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Resume attempts consumed since the current interruption began.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// An interruption signal arrived. `was_playing` tells the coordinator
    /// whether there is anything to recover; interruptions while already
    /// paused or stopped are ignored. While an interruption is outstanding
    /// playback is already paused, so `was_playing` only gates entry from
    /// `Normal`.
    pub fn on_interruption(
        &mut self,
        signal: InterruptionSignal,
        was_playing: bool,
    ) -> CoordinatorAction {
        match self.phase {
            Phase::Normal => {
                if !was_playing {
                    return CoordinatorAction::Ignore;
                }
                tracing::info!(?signal, "playback interrupted");
                self.phase = Phase::Interrupted;
                self.attempts = 0;
                CoordinatorAction::Pause
            }
            // A second interruption while one is outstanding abandons any
            // pending probe and waits for a fresh recovery signal.
            Phase::ResumePending => {
                self.phase = Phase::Interrupted;
                CoordinatorAction::CancelPending
            }
            Phase::Interrupted | Phase::AwaitingUser => CoordinatorAction::Ignore,
        }
    }

    /// A recovery signal arrived. Schedules (or reschedules) the settle timer
    /// when an interruption is outstanding.
    pub fn on_recovery(&mut self, signal: RecoverySignal) -> CoordinatorAction {
        match self.phase {
            Phase::Interrupted | Phase::ResumePending => {
                let delay = self.settle.for_recovery(signal);
                tracing::debug!(?signal, ?delay, "scheduling resume probe");
                self.phase = Phase::ResumePending;
                CoordinatorAction::ScheduleResume { delay }
            }
            Phase::Normal | Phase::AwaitingUser => CoordinatorAction::Ignore,
        }
    }

    /// The settle timer fired.
    pub fn on_timer_fired(&mut self) -> CoordinatorAction {
        match self.phase {
            Phase::ResumePending => CoordinatorAction::AttemptPlay,
            // Timer raced a user action or a new interruption; stale.
            _ => CoordinatorAction::Ignore,
        }
    }

    /// The engine reports how the probe went.
    pub fn on_resume_result(&mut self, outcome: ResumeOutcome) -> CoordinatorAction {
        if self.phase != Phase::ResumePending {
            return CoordinatorAction::Ignore;
        }
        match outcome {
            ResumeOutcome::Success => {
                tracing::info!(attempts = self.attempts, "interruption recovered");
                self.reset();
                CoordinatorAction::Ignore
            }
            ResumeOutcome::AutoplayBlocked => {
                tracing::warn!("resume blocked by autoplay policy, awaiting user action");
                self.phase = Phase::AwaitingUser;
                CoordinatorAction::Exhausted
            }
            ResumeOutcome::Failed => {
                self.attempts += 1;
                if self.attempts >= self.max_attempts {
                    tracing::warn!(
                        attempts = self.attempts,
                        "resume attempts exhausted, awaiting user action"
                    );
                    self.phase = Phase::AwaitingUser;
                    CoordinatorAction::Exhausted
                } else {
                    // Wait for the next recovery signal rather than looping.
                    self.phase = Phase::Interrupted;
                    CoordinatorAction::Ignore
                }
            }
        }
    }

    /// The user acted (play, pause, load, seek). Clears all recovery state;
    /// any pending probe must be cancelled.
    pub fn on_user_intent(&mut self) -> CoordinatorAction {
        let had_pending = self.phase == Phase::ResumePending;
        self.reset();
        if had_pending {
            CoordinatorAction::CancelPending
        } else {
            CoordinatorAction::Ignore
        }
    }

    fn reset(&mut self) {
        self.phase = Phase::Normal;
        self.attempts = 0;
    }
}
