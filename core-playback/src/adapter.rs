//! # Segmented Stream Adapter
//!
//! Owns one segmented-streaming session and supervises it: selects the best
//! audio quality once the manifest parses, applies the in-place recovery
//! policy on fatal errors, and reports outcomes upward through a channel the
//! resource layer consumes.

use bridge_traits::hls::{HlsErrorKind, HlsEvent, HlsRuntime, HlsSession, HlsTuning, QualityLevel};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{PlayerError, Result};

/// Outcomes the adapter reports to the resource layer.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterEvent {
    /// Manifest parsed and quality selected; the stream is ready to play.
    Ready {
        levels: usize,
        selected: Option<usize>,
    },
    /// A fatal session error was absorbed by an in-place recovery attempt.
    Recovering { detail: String },
    /// The session is beyond in-place recovery. The resource layer decides
    /// what to do next (full reload, direct fallback, surface the error).
    Fatal { detail: String },
}

/// A live segmented session plus its supervisor task.
pub struct SegmentedStreamAdapter {
    session: Arc<dyn HlsSession>,
    cancel: CancellationToken,
}

impl SegmentedStreamAdapter {
    /// Create a session for `url` and start supervising it.
    ///
    /// Outcomes flow through `notify`; the caller keeps the receiving half
    /// for the lifetime of the resource, across adapter replacements.
    pub async fn attach(
        runtime: &dyn HlsRuntime,
        url: &str,
        tuning: HlsTuning,
        recovery_cap: u32,
        notify: mpsc::UnboundedSender<AdapterEvent>,
    ) -> Result<Self> {
        if !runtime.is_supported() {
            return Err(PlayerError::FatalStream(
                "segmented playback not supported on this platform".to_string(),
            ));
        }

        let session: Arc<dyn HlsSession> = Arc::from(runtime.attach(url, tuning).await?);
        let cancel = CancellationToken::new();

        spawn_supervisor(Arc::clone(&session), cancel.clone(), recovery_cap, notify);

        Ok(Self { session, cancel })
    }

    /// Stop supervising and destroy the session, cancelling in-flight network
    /// activity. Must complete before another source is attached.
    pub async fn detach(self) -> Result<()> {
        self.cancel.cancel();
        self.session.destroy().await?;
        Ok(())
    }
}

impl Drop for SegmentedStreamAdapter {
    fn drop(&mut self) {
        // Stops the supervisor even if detach() was never awaited. Session
        // destruction still requires an explicit detach.
        self.cancel.cancel();
    }
}

fn spawn_supervisor(
    session: Arc<dyn HlsSession>,
    cancel: CancellationToken,
    recovery_cap: u32,
    notify: mpsc::UnboundedSender<AdapterEvent>,
) {
    let mut events = session.events();
    tokio::spawn(async move {
        let mut recoveries: u32 = 0;
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Ok(event) => event,
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(missed = n, "segmented session events lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };

            match event {
                HlsEvent::MediaAttached => {
                    tracing::debug!("segmented session attached to sink");
                }
                HlsEvent::ManifestParsed { levels } => {
                    let selected = select_audio_level(&levels);
                    if let Some(index) = selected {
                        if let Err(err) = session.select_level(index).await {
                            tracing::warn!(%err, index, "quality selection failed");
                        }
                    }
                    let _ = notify.send(AdapterEvent::Ready {
                        levels: levels.len(),
                        selected,
                    });
                }
                HlsEvent::LevelSwitched { level } => {
                    tracing::trace!(level, "quality level switched");
                }
                HlsEvent::Error { fatal: false, kind, detail } => {
                    tracing::debug!(?kind, %detail, "non-fatal segmented stream error");
                }
                HlsEvent::Error { fatal: true, kind, detail } => {
                    if recoveries >= recovery_cap {
                        tracing::error!(%detail, "recovery budget spent, giving up on session");
                        let _ = notify.send(AdapterEvent::Fatal { detail });
                        break;
                    }
                    let recovery = match kind {
                        HlsErrorKind::Network => {
                            tracing::warn!(%detail, "fatal network error, restarting load");
                            session.start_load().await
                        }
                        HlsErrorKind::Media => {
                            tracing::warn!(%detail, "fatal media error, recovering pipeline");
                            session.recover_media_error().await
                        }
                        HlsErrorKind::Other(ref reason) => {
                            tracing::error!(%reason, %detail, "unrecoverable session error");
                            let _ = notify.send(AdapterEvent::Fatal { detail });
                            break;
                        }
                    };
                    match recovery {
                        Ok(()) => {
                            recoveries += 1;
                            let _ = notify.send(AdapterEvent::Recovering { detail });
                        }
                        Err(err) => {
                            let _ = notify.send(AdapterEvent::Fatal {
                                detail: format!("{detail}; recovery failed: {err}"),
                            });
                            break;
                        }
                    }
                }
            }
        }
    });
}

/// Pick the quality level to pin for audio playback.
///
/// Prefers the highest-bitrate audio-only level; falls back to the
/// highest-bitrate muxed level. Ties keep the first-encountered level.
/// Returns `None` for an empty manifest, leaving the library's own selection
/// in place.
pub fn select_audio_level(levels: &[QualityLevel]) -> Option<usize> {
    let best_audio = levels
        .iter()
        .filter(|l| l.audio_only)
        .fold(None::<&QualityLevel>, |best, l| match best {
            Some(b) if l.bitrate <= b.bitrate => best,
            _ => Some(l),
        });
    if let Some(level) = best_audio {
        return Some(level.index);
    }

    levels
        .iter()
        .fold(None::<&QualityLevel>, |best, l| match best {
            Some(b) if l.bitrate <= b.bitrate => best,
            _ => Some(l),
        })
        .map(|l| l.index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(index: usize, bitrate: u32, audio_only: bool) -> QualityLevel {
        QualityLevel {
            index,
            bitrate,
            audio_only,
            codec: None,
        }
    }

    #[test]
    fn prefers_best_audio_only_level() {
        let levels = vec![
            level(0, 320_000, false),
            level(1, 96_000, true),
            level(2, 128_000, true),
        ];
        assert_eq!(select_audio_level(&levels), Some(2));
    }

    #[test]
    fn falls_back_to_best_muxed_level() {
        let levels = vec![
            level(0, 128_000, false),
            level(1, 320_000, false),
            level(2, 64_000, false),
        ];
        assert_eq!(select_audio_level(&levels), Some(1));
    }

    #[test]
    fn empty_manifest_selects_nothing() {
        assert_eq!(select_audio_level(&[]), None);
    }

    #[test]
    fn ties_keep_first_level() {
        let levels = vec![level(0, 128_000, true), level(1, 128_000, true)];
        assert_eq!(select_audio_level(&levels), Some(0));
    }
}
