//! Platform-specific helper abstractions used to keep trait bounds aligned with
//! the threading guarantees of each target.
//!
//! Native targets require `Send + Sync` to allow bridge implementations to be
//! shared freely across async tasks. WebAssembly builds, however, run entirely
//! on a single thread and cannot satisfy those bounds because browser-provided
//! objects are not thread-safe. The helper traits below make the required
//! bounds conditional without duplicating every trait definition.

use serde::{Deserialize, Serialize};

/// Marker trait that applies `Send + Sync` on native targets while becoming a
/// no-op on `wasm32`.
#[cfg(not(target_arch = "wasm32"))]
pub trait PlatformSendSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<T> PlatformSendSync for T where T: Send + Sync {}

#[cfg(target_arch = "wasm32")]
pub trait PlatformSendSync {}

#[cfg(target_arch = "wasm32")]
impl<T> PlatformSendSync for T {}

/// Marker trait equivalent to `Send` on native targets.
#[cfg(not(target_arch = "wasm32"))]
pub trait PlatformSend: Send {}

#[cfg(not(target_arch = "wasm32"))]
impl<T> PlatformSend for T where T: Send {}

#[cfg(target_arch = "wasm32")]
pub trait PlatformSend {}

#[cfg(target_arch = "wasm32")]
impl<T> PlatformSend for T {}

/// Result of the one-time capability probe performed by the host at startup.
///
/// The playback core never feature-detects on its own; it consumes this typed
/// configuration instead of scattering runtime checks through playback logic.
/// Hosts should probe once (e.g., `Hls.isSupported()`, `navigator.mediaSession`
/// presence, wake-lock API presence on web-like platforms) and hand the result
/// to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    /// Segmented-manifest (HLS) playback is available through an [`crate::hls::HlsRuntime`].
    pub supports_hls: bool,
    /// The platform exposes a "now playing" media session surface.
    pub supports_media_session: bool,
    /// The platform can hold a wake lock while audio plays.
    pub supports_wake_lock: bool,
}

impl PlatformCapabilities {
    /// Capabilities with every optional surface available. Useful for desktop
    /// shims and tests.
    pub fn all() -> Self {
        Self {
            supports_hls: true,
            supports_media_session: true,
            supports_wake_lock: true,
        }
    }

    /// Capabilities with every optional surface unavailable.
    pub fn none() -> Self {
        Self {
            supports_hls: false,
            supports_media_session: false,
            supports_wake_lock: false,
        }
    }
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_presets() {
        assert!(PlatformCapabilities::all().supports_hls);
        assert!(!PlatformCapabilities::none().supports_hls);
        assert_eq!(PlatformCapabilities::default(), PlatformCapabilities::all());
    }
}
