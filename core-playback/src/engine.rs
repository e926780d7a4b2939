//! # Playback Engine
//!
//! The single shared engine every UI surface drives. One engine exists per
//! process; each surface holds a [`PlayerSession`] and the [`SessionArbiter`]
//! decides which session's commands currently matter. The engine owns the
//! playback resource, runs the interruption coordinator, mirrors state to the
//! platform media session, and publishes [`PlayerEvent`]s to subscribers.
//!
//! ## Wiring
//!
//! ```text
//!  PlayerSession ──claim──> SessionArbiter
//!        │ commands
//!        v
//!  PlayerEngine ──────> PlaybackResource ──> MediaSink / HlsRuntime
//!        │  ^                                     │
//!        │  └── SignalSource, MediaCommands       │ SinkEvents / AdapterEvents
//!        v                                        v
//!     EventBus <──────────── event loops ─────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::hls::HlsRuntime;
use bridge_traits::lifecycle::{PlatformSignal, SignalSource};
use bridge_traits::media_session::{
    MediaCommand, MediaSessionBridge, NowPlayingMetadata, PlaybackStatus, PositionState, WakeLock,
};
use bridge_traits::platform::PlatformCapabilities;
use bridge_traits::sink::{CrossOriginMode, MediaSink, SinkEvent};
use bridge_traits::storage::SettingsStore;
use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::adapter::AdapterEvent;
use crate::arbiter::{SessionArbiter, SessionToken};
use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use crate::events::{EventBus, PlayerEvent};
use crate::interruption::{CoordinatorAction, InterruptionCoordinator, ResumeOutcome};
use crate::resolver::StreamKind;
use crate::resource::{LoadOutcome, PlaybackResource};
use crate::state::{PauseSource, PlaybackState};
use crate::stations::{PlaybackAnalytics, Track, TrackSequencer};

/// Everything the host injects to construct the engine.
pub struct EngineDeps {
    pub sink: Arc<dyn MediaSink>,
    pub hls: Arc<dyn HlsRuntime>,
    pub signals: Arc<dyn SignalSource>,
    pub media_session: Option<Arc<dyn MediaSessionBridge>>,
    pub wake_lock: Option<Arc<dyn WakeLock>>,
    pub settings: Arc<dyn SettingsStore>,
    pub sequencer: Arc<dyn TrackSequencer>,
    pub analytics: Option<Arc<dyn PlaybackAnalytics>>,
    pub capabilities: PlatformCapabilities,
}

/// One-shot stream fallbacks, re-armed on every successful load.
#[derive(Debug, Default)]
struct FallbackFlags {
    /// Direct bind failed once; cross-origin mode was flipped.
    cors_flipped: bool,
    /// A fatal segmented failure triggered the delayed full reload.
    reloaded: bool,
    /// The reload also failed; the raw URL was handed to the sink directly.
    direct: bool,
}

struct EngineInner {
    config: PlayerConfig,
    resource: PlaybackResource,
    media_session: Option<Arc<dyn MediaSessionBridge>>,
    wake_lock: Option<Arc<dyn WakeLock>>,
    settings: Arc<dyn SettingsStore>,
    sequencer: Arc<dyn TrackSequencer>,
    state: Mutex<PlaybackState>,
    coordinator: Mutex<InterruptionCoordinator>,
    resume_timer: Mutex<Option<CancellationToken>>,
    fallback: Mutex<FallbackFlags>,
    arbiter: SessionArbiter,
    events: EventBus,
    shutdown: CancellationToken,
}

/// Shared playback engine. Cheap to clone; all clones drive the same state.
#[derive(Clone)]
pub struct PlayerEngine {
    inner: Arc<EngineInner>,
}

impl PlayerEngine {
    /// Construct the engine, restore persisted volume, and start the event
    /// loops. The loops run until [`PlayerEngine::shutdown`] is called.
    pub async fn new(deps: EngineDeps, config: PlayerConfig) -> Result<Self> {
        config.validate().map_err(PlayerError::Internal)?;

        let volume = match deps.settings.get_f64(&config.volume_key).await {
            Ok(Some(v)) => (v as f32).clamp(0.0, 1.0),
            Ok(None) => config.default_volume,
            Err(err) => {
                tracing::warn!(%err, "volume restore failed, using default");
                config.default_volume
            }
        };
        if let Err(err) = deps.sink.set_volume(volume).await {
            tracing::warn!(%err, "initial volume apply failed");
        }

        let (resource, adapter_rx) = PlaybackResource::new(
            Arc::clone(&deps.sink),
            Arc::clone(&deps.hls),
            deps.capabilities,
            config.clone(),
        );

        let inner = Arc::new(EngineInner {
            coordinator: Mutex::new(InterruptionCoordinator::new(
                config.max_resume_attempts,
                config.settle.clone(),
            )),
            events: EventBus::new(config.event_buffer),
            state: Mutex::new(PlaybackState::initial(volume)),
            resume_timer: Mutex::new(None),
            fallback: Mutex::new(FallbackFlags::default()),
            arbiter: SessionArbiter::new(),
            shutdown: CancellationToken::new(),
            media_session: deps.media_session.clone(),
            wake_lock: deps.wake_lock.clone(),
            settings: Arc::clone(&deps.settings),
            sequencer: Arc::clone(&deps.sequencer),
            resource,
            config,
        });

        tokio::spawn(run_sink_loop(Arc::clone(&inner), deps.sink.events()));
        tokio::spawn(run_adapter_loop(Arc::clone(&inner), adapter_rx));
        tokio::spawn(run_signal_loop(Arc::clone(&inner), deps.signals.signals()));
        if let Some(media_session) = &deps.media_session {
            tokio::spawn(run_command_loop(Arc::clone(&inner), media_session.commands()));
        }
        if let Some(analytics) = deps.analytics {
            tokio::spawn(run_analytics_loop(Arc::clone(&inner), analytics));
        }

        Ok(Self { inner })
    }

    /// Create a session handle for one UI surface.
    pub fn session(&self) -> PlayerSession {
        let snapshot = self.inner.state.lock().clone();
        PlayerSession {
            inner: Arc::clone(&self.inner),
            token: SessionToken::new(),
            cache: Mutex::new(snapshot),
        }
    }

    /// Subscribe to engine events.
    pub fn events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.inner.events.subscribe()
    }

    /// Current state snapshot, regardless of session ownership.
    pub fn state(&self) -> PlaybackState {
        self.inner.state.lock().clone()
    }

    /// Stop all event loops. Irreversible.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }
}

/// Handle held by one UI surface.
///
/// Mutating operations claim ownership synchronously before any asynchronous
/// work starts, so the most recent user interaction always wins. Non-owning
/// sessions keep serving the state snapshot frozen at the moment they lost
/// ownership.
pub struct PlayerSession {
    inner: Arc<EngineInner>,
    token: SessionToken,
    cache: Mutex<PlaybackState>,
}

impl PlayerSession {
    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn is_owner(&self) -> bool {
        self.inner.arbiter.is_owner(self.token)
    }

    /// Current state as seen by this session. Owners (and everyone, while no
    /// owner exists) see live state; displaced sessions see their frozen
    /// snapshot.
    pub fn state(&self) -> PlaybackState {
        if self.inner.arbiter.is_owner(self.token) || self.inner.arbiter.owner().is_none() {
            let fresh = self.inner.state.lock().clone();
            *self.cache.lock() = fresh.clone();
            fresh
        } else {
            self.cache.lock().clone()
        }
    }

    /// Subscribe to engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.inner.events.subscribe()
    }

    /// Load `track` and start playing it.
    pub async fn load_and_play(&self, track: Track) -> Result<()> {
        self.claim();
        self.inner.load_track(track, true).await
    }

    /// Start or resume playback of the loaded track.
    pub async fn play(&self) -> Result<()> {
        self.claim();
        self.inner.note_user_intent();
        self.inner.play_current().await
    }

    /// Pause playback, attributed to the user.
    pub async fn pause(&self) -> Result<()> {
        self.claim();
        self.inner.pause_by(PauseSource::User).await
    }

    /// Toggle between playing and paused.
    pub async fn toggle(&self) -> Result<()> {
        self.claim();
        let playing = self.inner.state.lock().is_playing;
        if playing {
            self.inner.pause_by(PauseSource::User).await
        } else {
            self.inner.note_user_intent();
            self.inner.play_current().await
        }
    }

    /// Advance to the sequencer's next track.
    pub async fn next(&self) -> Result<()> {
        self.claim();
        self.inner.advance(true, true).await
    }

    /// Go back to the sequencer's previous track.
    pub async fn previous(&self) -> Result<()> {
        self.claim();
        self.inner.advance(false, true).await
    }

    /// Seek to an absolute position in seconds.
    pub async fn seek(&self, position_secs: f64) -> Result<()> {
        self.claim();
        self.inner.seek_to(position_secs).await
    }

    /// Set output volume; the clamped value is returned and persisted.
    pub async fn set_volume(&self, volume: f32) -> Result<f32> {
        self.claim();
        self.inner.apply_volume(volume).await
    }

    fn claim(&self) {
        self.inner.arbiter.claim(self.token);
    }
}

impl Drop for PlayerSession {
    fn drop(&mut self) {
        self.inner.arbiter.release(self.token);
    }
}

// ============================================================================
// Engine operations
// ============================================================================

impl EngineInner {
    /// Mutate state under the lock and publish the resulting snapshot.
    fn mutate_state<F: FnOnce(&mut PlaybackState)>(&self, f: F) -> PlaybackState {
        let snapshot = {
            let mut state = self.state.lock();
            f(&mut state);
            state.clone()
        };
        let _ = self.events.emit(PlayerEvent::StateChanged {
            state: snapshot.clone(),
        });
        snapshot
    }

    /// Record an explicit user action: clears interruption-recovery state and
    /// cancels any pending resume probe.
    fn note_user_intent(&self) {
        if self.coordinator.lock().on_user_intent() == CoordinatorAction::CancelPending {
            self.cancel_resume_timer();
        }
    }

    fn cancel_resume_timer(&self) {
        if let Some(token) = self.resume_timer.lock().take() {
            token.cancel();
        }
    }

    async fn load_track(&self, track: Track, user: bool) -> Result<()> {
        if user {
            self.note_user_intent();
        }
        self.mutate_state(|s| {
            s.loading = true;
            s.error = None;
        });

        match self.resource.load(&track.url).await {
            Ok(LoadOutcome::AlreadyBound) => {
                // Nothing was rebound, so no sink event will arrive to clear
                // the loading flag.
                self.mutate_state(|s| s.loading = false);
            }
            Ok(LoadOutcome::Loaded(kind)) => {
                *self.fallback.lock() = FallbackFlags::default();
                self.mutate_state(|s| {
                    s.current_track = Some(track.clone());
                    s.current_time = 0.0;
                    s.duration = None;
                    s.is_playing = false;
                    s.is_paused = false;
                    s.paused_by = None;
                });
                let _ = self.events.emit(PlayerEvent::TrackChanged {
                    track: track.clone(),
                });
                self.publish_metadata(&track).await;
                tracing::info!(name = %track.name, ?kind, "track loaded");
            }
            Err(err) => {
                let message = err.to_string();
                self.mutate_state(|s| {
                    s.loading = false;
                    s.error = Some(message.clone());
                });
                let _ = self.events.emit(PlayerEvent::PlaybackError {
                    message,
                    recoverable: err.is_transient(),
                });
                return Err(err);
            }
        }

        self.play_current().await
    }

    async fn play_current(&self) -> Result<()> {
        if self.state.lock().current_track.is_none() {
            return Err(PlayerError::NoTrackLoaded);
        }
        match self.resource.play().await {
            Ok(()) => Ok(()),
            Err(err) => {
                let message = err.to_string();
                self.mutate_state(|s| {
                    s.loading = false;
                    s.error = Some(message.clone());
                });
                let _ = self.events.emit(PlayerEvent::PlaybackError {
                    message,
                    recoverable: err.is_transient(),
                });
                Err(err)
            }
        }
    }

    async fn pause_by(&self, source: PauseSource) -> Result<()> {
        if source == PauseSource::User {
            self.note_user_intent();
        }
        // Attribution is set before the pause so the sink's Paused event
        // already sees it.
        self.state.lock().paused_by = Some(source);
        self.resource.pause().await
    }

    async fn advance(&self, forward: bool, user: bool) -> Result<()> {
        let current = self.state.lock().current_track.clone();
        let next = if forward {
            self.sequencer.next(current.as_ref()).await?
        } else {
            self.sequencer.previous(current.as_ref()).await?
        };
        match next {
            Some(track) => self.load_track(track, user).await,
            None => Ok(()),
        }
    }

    async fn seek_to(&self, position_secs: f64) -> Result<()> {
        self.note_user_intent();
        let position = position_secs.max(0.0);
        self.resource.seek(Duration::from_secs_f64(position)).await?;
        self.mutate_state(|s| s.current_time = position);
        self.publish_position_state().await;
        Ok(())
    }

    async fn apply_volume(&self, volume: f32) -> Result<f32> {
        let clamped = self.resource.set_volume(volume).await?;
        self.mutate_state(|s| s.volume = clamped);
        if let Err(err) = self
            .settings
            .set_f64(&self.config.volume_key, clamped as f64)
            .await
        {
            tracing::warn!(%err, "volume persistence failed");
        }
        Ok(clamped)
    }

    // ========================================================================
    // Interruption recovery
    // ========================================================================

    fn schedule_resume(self: &Arc<Self>, delay: Duration) {
        let token = CancellationToken::new();
        if let Some(old) = self.resume_timer.lock().replace(token.clone()) {
            old.cancel();
        }
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = inner.shutdown.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            if inner.coordinator.lock().on_timer_fired() == CoordinatorAction::AttemptPlay {
                inner.run_resume_probe().await;
            }
        });
    }

    async fn run_resume_probe(&self) {
        let outcome = match self.resource.play().await {
            Ok(()) => ResumeOutcome::Success,
            Err(PlayerError::AutoplayBlocked) => ResumeOutcome::AutoplayBlocked,
            Err(err) => {
                tracing::warn!(%err, "resume probe failed");
                ResumeOutcome::Failed
            }
        };
        let action = self.coordinator.lock().on_resume_result(outcome);

        if outcome == ResumeOutcome::Success {
            let _ = self.events.emit(PlayerEvent::InterruptionCleared);
        }
        if action == CoordinatorAction::Exhausted {
            let message = match outcome {
                ResumeOutcome::AutoplayBlocked => {
                    PlayerError::AutoplayBlocked.to_string()
                }
                _ => PlayerError::InterruptionExhausted.to_string(),
            };
            self.mutate_state(|s| s.error = Some(message));
            let _ = self.events.emit(PlayerEvent::ResumeExhausted);
        }
    }

    async fn handle_signal(self: &Arc<Self>, signal: PlatformSignal) {
        match signal {
            PlatformSignal::Interruption(sig) => {
                let was_playing = self.state.lock().is_playing;
                // The coordinator guard must not be held across the awaits
                // below.
                let action = self.coordinator.lock().on_interruption(sig, was_playing);
                match action {
                    CoordinatorAction::Pause => {
                        let _ = self.events.emit(PlayerEvent::InterruptionDetected);
                        self.state.lock().paused_by = Some(PauseSource::System);
                        if let Err(err) = self.resource.pause().await {
                            tracing::warn!(%err, "interruption pause failed");
                        }
                    }
                    CoordinatorAction::CancelPending => self.cancel_resume_timer(),
                    _ => {}
                }
            }
            PlatformSignal::Recovery(sig) => {
                let action = self.coordinator.lock().on_recovery(sig);
                if let CoordinatorAction::ScheduleResume { delay } = action {
                    self.schedule_resume(delay);
                }
            }
        }
    }

    // ========================================================================
    // Sink events
    // ========================================================================

    async fn handle_sink_event(self: &Arc<Self>, event: SinkEvent) {
        match event {
            SinkEvent::LoadStarted => {
                self.mutate_state(|s| s.loading = true);
            }
            SinkEvent::MetadataKnown { duration } => {
                self.mutate_state(|s| s.duration = duration.map(|d| d.as_secs_f64()));
                self.publish_position_state().await;
            }
            SinkEvent::CanPlay => {
                self.mutate_state(|s| s.loading = false);
            }
            SinkEvent::Progress { position, duration } => {
                let (position_secs, duration_secs) = {
                    let mut state = self.state.lock();
                    state.current_time = position.as_secs_f64();
                    state.duration = duration.map(|d| d.as_secs_f64());
                    (state.current_time, state.duration)
                };
                let _ = self.events.emit(PlayerEvent::Progress {
                    position_secs,
                    duration_secs,
                });
            }
            SinkEvent::Playing => {
                self.mutate_state(|s| {
                    s.is_playing = true;
                    s.is_paused = false;
                    s.paused_by = None;
                    s.loading = false;
                    s.error = None;
                });
                self.set_transport_status(PlaybackStatus::Playing).await;
                if let Some(lock) = &self.wake_lock {
                    if let Err(err) = lock.acquire().await {
                        tracing::debug!(%err, "wake lock acquire failed");
                    }
                }
            }
            SinkEvent::Paused => {
                self.mutate_state(|s| {
                    s.is_playing = false;
                    s.is_paused = true;
                    // A pause nobody attributed came from the user side of
                    // our surface (e.g. direct sink control).
                    s.paused_by.get_or_insert(PauseSource::User);
                });
                self.set_transport_status(PlaybackStatus::Paused).await;
                if let Some(lock) = &self.wake_lock {
                    let _ = lock.release().await;
                }
            }
            SinkEvent::Ended => {
                self.mutate_state(|s| {
                    s.is_playing = false;
                    s.is_paused = false;
                    s.paused_by = None;
                });
                self.set_transport_status(PlaybackStatus::None).await;
                if let Some(lock) = &self.wake_lock {
                    let _ = lock.release().await;
                }
                // Live radio rarely ends; when it does and there is somewhere
                // to go, move on.
                if self.sequencer.len().await > 1 {
                    if let Err(err) = self.advance(true, false).await {
                        tracing::warn!(%err, "auto-advance failed");
                    }
                }
            }
            SinkEvent::Failed { message } => self.handle_sink_failure(message).await,
        }
    }

    async fn handle_sink_failure(&self, message: String) {
        // Direct streams get one retry with the opposite cross-origin mode;
        // some hosts reject anonymous fetches and some require them.
        if let Some(plan) = self.resource.current_plan().await {
            let flip = plan.kind == StreamKind::Direct && {
                let mut fallback = self.fallback.lock();
                let first = !fallback.cors_flipped;
                fallback.cors_flipped = true;
                first
            };
            if flip {
                let flipped = match plan.cross_origin {
                    CrossOriginMode::Anonymous => CrossOriginMode::Disabled,
                    CrossOriginMode::Disabled => CrossOriginMode::Anonymous,
                };
                tracing::warn!(%message, ?flipped, "direct bind failed, retrying with flipped cross-origin mode");
                if self.resource.rebind_direct(flipped).await.is_ok()
                    && self.resource.play().await.is_ok()
                {
                    return;
                }
            }
        }

        self.mutate_state(|s| {
            s.loading = false;
            s.is_playing = false;
            s.error = Some(message.clone());
        });
        let _ = self.events.emit(PlayerEvent::PlaybackError {
            message,
            recoverable: false,
        });
    }

    // ========================================================================
    // Adapter events
    // ========================================================================

    async fn handle_adapter_event(self: &Arc<Self>, event: AdapterEvent) {
        match event {
            AdapterEvent::Ready { levels, selected } => {
                tracing::debug!(levels, ?selected, "segmented stream ready");
                self.mutate_state(|s| s.loading = false);
            }
            AdapterEvent::Recovering { detail } => {
                let _ = self.events.emit(PlayerEvent::PlaybackError {
                    message: detail,
                    recoverable: true,
                });
            }
            AdapterEvent::Fatal { detail } => self.handle_adapter_fatal(detail).await,
        }
    }

    /// Escalation ladder for a session beyond in-place recovery: one delayed
    /// full reload, then one direct binding of the raw URL, then give up.
    ///
    /// Each step re-checks that the source it was armed for is still bound;
    /// a load issued in the meantime owns the resource and makes the
    /// escalation stale.
    async fn handle_adapter_fatal(&self, detail: String) {
        let failed_url = self.resource.current_url().await;
        let reload = {
            let mut fallback = self.fallback.lock();
            let first = !fallback.reloaded;
            fallback.reloaded = true;
            first
        };
        if reload {
            let _ = self.events.emit(PlayerEvent::PlaybackError {
                message: detail.clone(),
                recoverable: true,
            });
            tokio::select! {
                _ = self.shutdown.cancelled() => return,
                _ = tokio::time::sleep(self.config.fatal_reload_delay) => {}
            }
            if self.resource.current_url().await != failed_url {
                tracing::debug!(%detail, "source changed during reload delay, dropping stale escalation");
                return;
            }
            if self.resource.reload().await.is_ok() {
                let _ = self.resource.play().await;
                return;
            }
            tracing::warn!("full reload failed, falling through to direct binding");
        }

        let direct = {
            let mut fallback = self.fallback.lock();
            let first = !fallback.direct;
            fallback.direct = true;
            first
        };
        if direct {
            if self.resource.current_url().await != failed_url {
                return;
            }
            tracing::warn!(%detail, "handing manifest URL to the sink directly");
            if self.resource.rebind_direct(CrossOriginMode::Anonymous).await.is_ok()
                && self.resource.play().await.is_ok()
            {
                return;
            }
        }

        self.mutate_state(|s| {
            s.loading = false;
            s.is_playing = false;
            s.error = Some(detail.clone());
        });
        let _ = self.events.emit(PlayerEvent::PlaybackError {
            message: detail,
            recoverable: false,
        });
    }

    // ========================================================================
    // Media session commands
    // ========================================================================

    /// Transport commands from the OS surface act at engine level; they carry
    /// no session identity and do not shift ownership.
    async fn handle_media_command(self: &Arc<Self>, command: MediaCommand) {
        let result = match command {
            MediaCommand::Play => {
                self.note_user_intent();
                self.play_current().await
            }
            MediaCommand::Pause => self.pause_by(PauseSource::User).await,
            MediaCommand::NextTrack => self.advance(true, true).await,
            MediaCommand::PreviousTrack => self.advance(false, true).await,
            MediaCommand::SeekTo(position) => self.seek_to(position.as_secs_f64()).await,
            MediaCommand::SeekForward(delta) => {
                let current = self.state.lock().current_time;
                self.seek_to(current + delta.as_secs_f64()).await
            }
            MediaCommand::SeekBackward(delta) => {
                let current = self.state.lock().current_time;
                self.seek_to((current - delta.as_secs_f64()).max(0.0)).await
            }
        };
        if let Err(err) = result {
            tracing::debug!(%err, ?command, "media command failed");
        }
    }

    // ========================================================================
    // Platform mirroring
    // ========================================================================

    async fn publish_metadata(&self, track: &Track) {
        let Some(media_session) = &self.media_session else {
            return;
        };
        let metadata = NowPlayingMetadata {
            title: track.name.clone(),
            artist: track.language.clone(),
            album: None,
            artwork_url: None,
        };
        if let Err(err) = media_session.set_metadata(metadata).await {
            tracing::debug!(%err, "media session metadata update failed");
        }
    }

    async fn set_transport_status(&self, status: PlaybackStatus) {
        let Some(media_session) = &self.media_session else {
            return;
        };
        if let Err(err) = media_session.set_playback_status(status).await {
            tracing::debug!(%err, "media session status update failed");
        }
    }

    async fn publish_position_state(&self) {
        let Some(media_session) = &self.media_session else {
            return;
        };
        let (position, duration) = {
            let state = self.state.lock();
            (state.current_time.max(0.0), state.duration)
        };
        let position_state = PositionState {
            position: Duration::from_secs_f64(position),
            duration: duration.map(Duration::from_secs_f64),
            playback_rate: 1.0,
        };
        if let Err(err) = media_session.set_position_state(position_state).await {
            tracing::trace!(%err, "media session position update failed");
        }
    }
}

// ============================================================================
// Event loops
// ============================================================================

async fn run_sink_loop(inner: Arc<EngineInner>, mut events: broadcast::Receiver<SinkEvent>) {
    loop {
        let event = tokio::select! {
            _ = inner.shutdown.cancelled() => break,
            event = events.recv() => match event {
                Ok(event) => event,
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(missed = n, "sink events lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
        };
        inner.handle_sink_event(event).await;
    }
}

async fn run_adapter_loop(
    inner: Arc<EngineInner>,
    mut events: mpsc::UnboundedReceiver<AdapterEvent>,
) {
    loop {
        let event = tokio::select! {
            _ = inner.shutdown.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };
        inner.handle_adapter_event(event).await;
    }
}

async fn run_signal_loop(
    inner: Arc<EngineInner>,
    mut signals: mpsc::UnboundedReceiver<PlatformSignal>,
) {
    loop {
        let signal = tokio::select! {
            _ = inner.shutdown.cancelled() => break,
            signal = signals.recv() => match signal {
                Some(signal) => signal,
                None => break,
            },
        };
        inner.handle_signal(signal).await;
    }
}

async fn run_command_loop(
    inner: Arc<EngineInner>,
    mut commands: mpsc::UnboundedReceiver<MediaCommand>,
) {
    loop {
        let command = tokio::select! {
            _ = inner.shutdown.cancelled() => break,
            command = commands.recv() => match command {
                Some(command) => command,
                None => break,
            },
        };
        inner.handle_media_command(command).await;
    }
}

async fn run_analytics_loop(inner: Arc<EngineInner>, analytics: Arc<dyn PlaybackAnalytics>) {
    let mut ticker = tokio::time::interval(inner.config.analytics_interval);
    ticker.tick().await; // the first tick completes immediately
    loop {
        tokio::select! {
            _ = inner.shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let (playing, url) = {
            let state = inner.state.lock();
            (
                state.is_playing,
                state.current_track.as_ref().map(|t| t.url.clone()),
            )
        };
        if let (true, Some(url)) = (playing, url) {
            let analytics = Arc::clone(&analytics);
            let elapsed = inner.config.analytics_interval.as_secs();
            // Fire and forget; a slow or failing report never stalls the
            // ticker.
            tokio::spawn(async move {
                analytics.notify_played(&url, elapsed).await;
            });
        }
    }
}
