//! # Active Session Arbiter
//!
//! Decides which UI session currently owns the shared playback engine.
//!
//! Multiple UI surfaces (main screen, mini player, settings page) each hold a
//! [`crate::engine::PlayerSession`]; only one drives playback at a time.
//! Ownership follows the most recent user interaction: claiming is
//! unconditional and synchronous, so by the time any asynchronous playback
//! work begins, ownership has already transferred.

use parking_lot::Mutex;
use std::fmt;
use uuid::Uuid;

/// Opaque identity of one UI session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(Uuid);

impl SessionToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tracks which session token currently owns playback.
#[derive(Debug, Default)]
pub struct SessionArbiter {
    active: Mutex<Option<SessionToken>>,
}

impl SessionArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transfer ownership to `token`. Never fails and never blocks on
    /// asynchronous work; the previous owner is simply displaced.
    pub fn claim(&self, token: SessionToken) {
        let mut active = self.active.lock();
        if *active != Some(token) {
            tracing::debug!(new_owner = %token, "playback ownership transferred");
        }
        *active = Some(token);
    }

    /// `true` when `token` is the current owner.
    pub fn is_owner(&self, token: SessionToken) -> bool {
        *self.active.lock() == Some(token)
    }

    /// Release ownership if `token` currently holds it. Releasing a
    /// non-owning token does nothing.
    pub fn release(&self, token: SessionToken) {
        let mut active = self.active.lock();
        if *active == Some(token) {
            *active = None;
        }
    }

    /// The current owner, if any.
    pub fn owner(&self) -> Option<SessionToken> {
        *self.active.lock()
    }
}
