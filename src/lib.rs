//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-playback`, `bridge-traits`). Host applications
//! can depend on `radio-core` and enable the documented features without
//! needing to wire each crate individually.

#[cfg(feature = "playback")]
pub use core_playback as playback;
