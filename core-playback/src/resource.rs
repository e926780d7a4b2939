//! # Playback Resource
//!
//! Owns the binding between stream URLs and the single shared sink. All
//! source changes funnel through here, serialized by an async mutex so two
//! overlapping loads can never interleave their detach/attach steps.

use bridge_traits::hls::HlsRuntime;
use bridge_traits::platform::PlatformCapabilities;
use bridge_traits::sink::{CrossOriginMode, MediaSink, PreloadPolicy, SinkBinding};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

use crate::adapter::{AdapterEvent, SegmentedStreamAdapter};
use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use crate::resolver::{self, StreamKind, StreamPlan};

/// Result of a load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The source was (re)bound.
    Loaded(StreamKind),
    /// The requested URL is already bound; nothing was touched.
    AlreadyBound,
}

struct ResourceInner {
    /// Canonical form of the currently bound URL.
    current_url: Option<String>,
    plan: Option<StreamPlan>,
    adapter: Option<SegmentedStreamAdapter>,
}

/// Exclusive owner of the sink's source binding.
pub struct PlaybackResource {
    sink: Arc<dyn MediaSink>,
    hls: Arc<dyn HlsRuntime>,
    caps: PlatformCapabilities,
    config: PlayerConfig,
    adapter_tx: mpsc::UnboundedSender<AdapterEvent>,
    inner: Mutex<ResourceInner>,
}

impl PlaybackResource {
    /// Create the resource and the channel on which adapter outcomes arrive.
    /// The receiver outlives individual adapters; replacements keep sending
    /// into the same channel.
    pub fn new(
        sink: Arc<dyn MediaSink>,
        hls: Arc<dyn HlsRuntime>,
        caps: PlatformCapabilities,
        config: PlayerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<AdapterEvent>) {
        let (adapter_tx, adapter_rx) = mpsc::unbounded_channel();
        (
            Self {
                sink,
                hls,
                caps,
                config,
                adapter_tx,
                inner: Mutex::new(ResourceInner {
                    current_url: None,
                    plan: None,
                    adapter: None,
                }),
            },
            adapter_rx,
        )
    }

    /// Bind `url` to the sink, classifying it first.
    ///
    /// Idempotent: loading the URL that is already bound returns
    /// [`LoadOutcome::AlreadyBound`] without touching the sink, so repeated
    /// play requests for the same station never restart the stream.
    pub async fn load(&self, url: &str) -> Result<LoadOutcome> {
        let plan = resolver::classify(url, &self.caps)?;
        let canonical = resolver::canonical_url(url);

        let mut inner = self.inner.lock().await;
        if inner.current_url.as_deref() == Some(canonical.as_str()) {
            tracing::debug!(url, "source already bound, skipping load");
            return Ok(LoadOutcome::AlreadyBound);
        }

        self.detach_current(&mut inner).await?;
        self.attach(&mut inner, url, plan).await?;
        inner.current_url = Some(canonical);
        Ok(LoadOutcome::Loaded(plan.kind))
    }

    /// Tear down the current binding entirely.
    pub async fn unload(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        self.detach_current(&mut inner).await?;
        inner.current_url = None;
        Ok(())
    }

    /// Rebuild the current segmented binding from scratch. Used as the
    /// one-shot full reload after a fatal session failure.
    pub async fn reload(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let (url, plan) = match (inner.current_url.clone(), inner.plan) {
            (Some(url), Some(plan)) => (url, plan),
            _ => return Err(PlayerError::NoTrackLoaded),
        };
        tracing::info!(%url, "reloading stream after fatal failure");
        self.detach_current(&mut inner).await?;
        self.attach(&mut inner, &url, plan).await?;
        Ok(())
    }

    /// Rebind the current URL directly with an explicit cross-origin mode.
    ///
    /// Covers two last resorts: flipping the cross-origin attribute when a
    /// direct bind fails to fetch, and abandoning a segmented session whose
    /// reload also failed in favor of handing the raw URL to the sink.
    pub async fn rebind_direct(&self, cross_origin: CrossOriginMode) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let url = inner.current_url.clone().ok_or(PlayerError::NoTrackLoaded)?;
        let plan = StreamPlan {
            kind: StreamKind::Direct,
            cross_origin,
            preload: PreloadPolicy::Auto,
        };
        tracing::info!(%url, ?cross_origin, "rebinding stream directly");
        self.detach_current(&mut inner).await?;
        self.attach(&mut inner, &url, plan).await?;
        Ok(())
    }

    /// Plan of the currently bound source, if any.
    pub async fn current_plan(&self) -> Option<StreamPlan> {
        self.inner.lock().await.plan
    }

    /// Canonical URL of the currently bound source, if any. Lets delayed
    /// escalation steps detect that the source they were armed for is gone.
    pub async fn current_url(&self) -> Option<String> {
        self.inner.lock().await.current_url.clone()
    }

    // ========================================================================
    // Transport passthroughs
    // ========================================================================

    pub async fn play(&self) -> Result<()> {
        self.sink.play().await?;
        Ok(())
    }

    pub async fn pause(&self) -> Result<()> {
        self.sink.pause().await?;
        Ok(())
    }

    /// Seek to an absolute position. Live streams (no known duration) reject
    /// seeks instead of silently ignoring them.
    pub async fn seek(&self, position: Duration) -> Result<()> {
        if self.sink.duration().await?.is_none() {
            return Err(PlayerError::SeekUnavailable);
        }
        self.sink.seek(position).await?;
        Ok(())
    }

    /// Set output volume, clamped into `0.0..=1.0`.
    pub async fn set_volume(&self, volume: f32) -> Result<f32> {
        let clamped = volume.clamp(0.0, 1.0);
        self.sink.set_volume(clamped).await?;
        Ok(clamped)
    }

    pub async fn position(&self) -> Result<Duration> {
        Ok(self.sink.position().await?)
    }

    pub async fn duration(&self) -> Result<Option<Duration>> {
        Ok(self.sink.duration().await?)
    }

    // ========================================================================
    // Internal binding steps (inner lock held by caller)
    // ========================================================================

    /// Detach whatever is bound. Always completes before a new attach starts.
    async fn detach_current(&self, inner: &mut ResourceInner) -> Result<()> {
        if let Some(adapter) = inner.adapter.take() {
            adapter.detach().await?;
        }
        self.sink.detach_source().await?;
        inner.current_url = None;
        inner.plan = None;
        Ok(())
    }

    async fn attach(&self, inner: &mut ResourceInner, url: &str, plan: StreamPlan) -> Result<()> {
        match plan.kind {
            StreamKind::Segmented => {
                let adapter = SegmentedStreamAdapter::attach(
                    self.hls.as_ref(),
                    url,
                    self.config.hls.clone(),
                    self.config.adapter_recovery_cap,
                    self.adapter_tx.clone(),
                )
                .await?;
                inner.adapter = Some(adapter);
            }
            StreamKind::Direct => {
                self.sink
                    .bind(SinkBinding::new(url, plan.cross_origin, plan.preload))
                    .await?;
            }
        }
        inner.current_url = Some(resolver::canonical_url(url));
        inner.plan = Some(plan);
        Ok(())
    }
}
