//! End-to-end engine tests against fake platform bridges.
//!
//! Timers run on tokio's paused clock, so settle delays and reload delays are
//! exercised without real waiting.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};

use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::hls::{HlsErrorKind, HlsEvent, HlsRuntime, HlsSession, HlsTuning};
use bridge_traits::lifecycle::{
    InterruptionSignal, PlatformSignal, RecoverySignal, SignalSource,
};
use bridge_traits::media_session::{
    MediaCommand, MediaSessionBridge, NowPlayingMetadata, PlaybackStatus, PositionState,
};
use bridge_traits::platform::PlatformCapabilities;
use bridge_traits::sink::{CrossOriginMode, MediaSink, SinkBinding, SinkEvent};
use bridge_traits::storage::SettingsStore;

use core_playback::config::PlayerConfig;
use core_playback::engine::{EngineDeps, PlayerEngine};
use core_playback::error::PlayerError;
use core_playback::events::PlayerEvent;
use core_playback::state::PauseSource;
use core_playback::stations::{PlaybackAnalytics, Track, TrackSequencer};

// ============================================================================
// Fakes
// ============================================================================

struct FakeSink {
    events: broadcast::Sender<SinkEvent>,
    bindings: Mutex<Vec<SinkBinding>>,
    play_results: Mutex<VecDeque<BridgeResult<()>>>,
    play_calls: Mutex<u32>,
    pause_calls: Mutex<u32>,
    detaches: Mutex<u32>,
    duration: Mutex<Option<Duration>>,
    volume: Mutex<f32>,
    playing: Mutex<bool>,
}

impl FakeSink {
    fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            events,
            bindings: Mutex::new(Vec::new()),
            play_results: Mutex::new(VecDeque::new()),
            play_calls: Mutex::new(0),
            pause_calls: Mutex::new(0),
            detaches: Mutex::new(0),
            duration: Mutex::new(None),
            volume: Mutex::new(1.0),
            playing: Mutex::new(false),
        })
    }

    /// Queue results for upcoming play() calls; unqueued calls succeed.
    fn script_play(&self, results: Vec<BridgeResult<()>>) {
        *self.play_results.lock() = results.into();
    }

    fn emit(&self, event: SinkEvent) {
        match event {
            SinkEvent::Playing => *self.playing.lock() = true,
            SinkEvent::Paused | SinkEvent::Ended => *self.playing.lock() = false,
            _ => {}
        }
        let _ = self.events.send(event);
    }

    fn play_calls(&self) -> u32 {
        *self.play_calls.lock()
    }
}

#[async_trait]
impl MediaSink for FakeSink {
    async fn bind(&self, binding: SinkBinding) -> BridgeResult<()> {
        self.bindings.lock().push(binding);
        Ok(())
    }

    async fn detach_source(&self) -> BridgeResult<()> {
        *self.detaches.lock() += 1;
        *self.playing.lock() = false;
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        *self.play_calls.lock() += 1;
        let result = self.play_results.lock().pop_front().unwrap_or(Ok(()));
        // Like a real sink: a play() while already playing emits nothing.
        if result.is_ok() && !*self.playing.lock() {
            self.emit(SinkEvent::Playing);
        }
        result
    }

    async fn pause(&self) -> BridgeResult<()> {
        *self.pause_calls.lock() += 1;
        self.emit(SinkEvent::Paused);
        Ok(())
    }

    async fn seek(&self, _position: Duration) -> BridgeResult<()> {
        Ok(())
    }

    async fn set_volume(&self, volume: f32) -> BridgeResult<()> {
        *self.volume.lock() = volume;
        Ok(())
    }

    async fn position(&self) -> BridgeResult<Duration> {
        Ok(Duration::ZERO)
    }

    async fn duration(&self) -> BridgeResult<Option<Duration>> {
        Ok(*self.duration.lock())
    }

    fn events(&self) -> broadcast::Receiver<SinkEvent> {
        self.events.subscribe()
    }
}

#[derive(Default)]
struct SessionProbe {
    start_loads: Mutex<u32>,
    media_recoveries: Mutex<u32>,
    selected_levels: Mutex<Vec<usize>>,
    destroyed: Mutex<bool>,
}

struct FakeHlsSession {
    events: broadcast::Sender<HlsEvent>,
    probe: Arc<SessionProbe>,
}

#[async_trait]
impl HlsSession for FakeHlsSession {
    async fn start_load(&self) -> BridgeResult<()> {
        *self.probe.start_loads.lock() += 1;
        Ok(())
    }

    async fn stop_load(&self) -> BridgeResult<()> {
        Ok(())
    }

    async fn recover_media_error(&self) -> BridgeResult<()> {
        *self.probe.media_recoveries.lock() += 1;
        Ok(())
    }

    async fn select_level(&self, index: usize) -> BridgeResult<()> {
        self.probe.selected_levels.lock().push(index);
        Ok(())
    }

    async fn destroy(&self) -> BridgeResult<()> {
        *self.probe.destroyed.lock() = true;
        Ok(())
    }

    fn events(&self) -> broadcast::Receiver<HlsEvent> {
        self.events.subscribe()
    }
}

#[derive(Default)]
struct FakeHlsRuntime {
    attached: Mutex<Vec<String>>,
    sessions: Mutex<Vec<(broadcast::Sender<HlsEvent>, Arc<SessionProbe>)>>,
}

impl FakeHlsRuntime {
    fn session(&self, index: usize) -> (broadcast::Sender<HlsEvent>, Arc<SessionProbe>) {
        let sessions = self.sessions.lock();
        let (tx, probe) = &sessions[index];
        (tx.clone(), Arc::clone(probe))
    }

    fn attach_count(&self) -> usize {
        self.attached.lock().len()
    }
}

#[async_trait]
impl HlsRuntime for FakeHlsRuntime {
    fn is_supported(&self) -> bool {
        true
    }

    async fn attach(&self, url: &str, _tuning: HlsTuning) -> BridgeResult<Box<dyn HlsSession>> {
        self.attached.lock().push(url.to_string());
        let (events, _) = broadcast::channel(16);
        let probe = Arc::new(SessionProbe::default());
        self.sessions.lock().push((events.clone(), Arc::clone(&probe)));
        Ok(Box::new(FakeHlsSession { events, probe }))
    }
}

struct FakeSignalSource {
    rx: Mutex<Option<mpsc::UnboundedReceiver<PlatformSignal>>>,
}

impl SignalSource for FakeSignalSource {
    fn signals(&self) -> mpsc::UnboundedReceiver<PlatformSignal> {
        self.rx.lock().take().unwrap_or_else(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            std::mem::forget(tx);
            rx
        })
    }
}

struct FakeMediaSession {
    statuses: Mutex<Vec<PlaybackStatus>>,
    metadata: Mutex<Vec<NowPlayingMetadata>>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<MediaCommand>>>,
}

#[async_trait]
impl MediaSessionBridge for FakeMediaSession {
    async fn set_metadata(&self, metadata: NowPlayingMetadata) -> BridgeResult<()> {
        self.metadata.lock().push(metadata);
        Ok(())
    }

    async fn set_playback_status(&self, status: PlaybackStatus) -> BridgeResult<()> {
        self.statuses.lock().push(status);
        Ok(())
    }

    async fn set_position_state(&self, _state: PositionState) -> BridgeResult<()> {
        Ok(())
    }

    fn commands(&self) -> mpsc::UnboundedReceiver<MediaCommand> {
        self.rx.lock().take().unwrap_or_else(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            std::mem::forget(tx);
            rx
        })
    }
}

#[derive(Default)]
struct MemorySettings {
    floats: Mutex<HashMap<String, f64>>,
    strings: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.strings.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.strings.lock().get(key).cloned())
    }

    async fn set_f64(&self, key: &str, value: f64) -> BridgeResult<()> {
        self.floats.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn get_f64(&self, key: &str) -> BridgeResult<Option<f64>> {
        Ok(self.floats.lock().get(key).copied())
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.floats.lock().remove(key);
        self.strings.lock().remove(key);
        Ok(())
    }

    async fn has_key(&self, key: &str) -> BridgeResult<bool> {
        Ok(self.floats.lock().contains_key(key) || self.strings.lock().contains_key(key))
    }
}

struct VecSequencer {
    tracks: Mutex<Vec<Track>>,
}

#[async_trait]
impl TrackSequencer for VecSequencer {
    async fn next(&self, current: Option<&Track>) -> core_playback::error::Result<Option<Track>> {
        let tracks = self.tracks.lock();
        if tracks.is_empty() {
            return Ok(None);
        }
        let index = current
            .and_then(|c| tracks.iter().position(|t| t.url == c.url))
            .map(|i| (i + 1) % tracks.len())
            .unwrap_or(0);
        Ok(Some(tracks[index].clone()))
    }

    async fn previous(
        &self,
        current: Option<&Track>,
    ) -> core_playback::error::Result<Option<Track>> {
        let tracks = self.tracks.lock();
        if tracks.is_empty() {
            return Ok(None);
        }
        let index = current
            .and_then(|c| tracks.iter().position(|t| t.url == c.url))
            .map(|i| (i + tracks.len() - 1) % tracks.len())
            .unwrap_or(0);
        Ok(Some(tracks[index].clone()))
    }

    async fn len(&self) -> usize {
        self.tracks.lock().len()
    }
}

#[derive(Default)]
struct CountingAnalytics {
    reports: Mutex<Vec<(String, u64)>>,
}

#[async_trait]
impl PlaybackAnalytics for CountingAnalytics {
    async fn notify_played(&self, url: &str, elapsed_secs: u64) {
        self.reports.lock().push((url.to_string(), elapsed_secs));
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    engine: PlayerEngine,
    sink: Arc<FakeSink>,
    hls: Arc<FakeHlsRuntime>,
    signals: mpsc::UnboundedSender<PlatformSignal>,
    commands: mpsc::UnboundedSender<MediaCommand>,
    media: Arc<FakeMediaSession>,
    settings: Arc<MemorySettings>,
    analytics: Arc<CountingAnalytics>,
}

async fn build_harness(tracks: Vec<Track>) -> Harness {
    build_harness_with(tracks, PlayerConfig::default(), Arc::new(MemorySettings::default()))
        .await
}

async fn build_harness_with(
    tracks: Vec<Track>,
    config: PlayerConfig,
    settings: Arc<MemorySettings>,
) -> Harness {
    let sink = FakeSink::new();
    let hls = Arc::new(FakeHlsRuntime::default());
    let (signal_tx, signal_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let media = Arc::new(FakeMediaSession {
        statuses: Mutex::new(Vec::new()),
        metadata: Mutex::new(Vec::new()),
        rx: Mutex::new(Some(command_rx)),
    });
    let analytics = Arc::new(CountingAnalytics::default());

    let deps = EngineDeps {
        sink: Arc::clone(&sink) as Arc<dyn MediaSink>,
        hls: Arc::clone(&hls) as Arc<dyn HlsRuntime>,
        signals: Arc::new(FakeSignalSource {
            rx: Mutex::new(Some(signal_rx)),
        }),
        media_session: Some(Arc::clone(&media) as Arc<dyn MediaSessionBridge>),
        wake_lock: None,
        settings: Arc::clone(&settings) as Arc<dyn SettingsStore>,
        sequencer: Arc::new(VecSequencer {
            tracks: Mutex::new(tracks),
        }),
        analytics: Some(Arc::clone(&analytics) as Arc<dyn PlaybackAnalytics>),
        capabilities: PlatformCapabilities::all(),
    };

    let engine = PlayerEngine::new(deps, config).await.unwrap();
    Harness {
        engine,
        sink,
        hls,
        signals: signal_tx,
        commands: command_tx,
        media,
        settings,
        analytics,
    }
}

fn direct_track() -> Track {
    Track::new("Jazz FM", "https://radio.example.com/jazz")
}

fn segmented_track() -> Track {
    Track::new("News Live", "https://radio.example.com/news/live.m3u8")
}

/// Let spawned event loops drain their channels.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

fn drain(rx: &mut broadcast::Receiver<PlayerEvent>) -> Vec<PlayerEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

// ============================================================================
// Loading and transport
// ============================================================================

#[tokio::test(start_paused = true)]
async fn direct_stream_loads_and_plays() {
    let h = build_harness(vec![direct_track()]).await;
    let session = h.engine.session();
    let mut events = session.subscribe();

    session.load_and_play(direct_track()).await.unwrap();
    settle().await;

    let bindings = h.sink.bindings.lock().clone();
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].url, direct_track().url);
    assert_eq!(bindings[0].cross_origin, CrossOriginMode::Disabled);

    let state = session.state();
    assert!(state.is_playing);
    assert!(!state.loading);
    assert_eq!(state.current_track.as_ref().unwrap().name, "Jazz FM");

    let emitted = drain(&mut events);
    assert!(emitted
        .iter()
        .any(|e| matches!(e, PlayerEvent::TrackChanged { track } if track.name == "Jazz FM")));

    // The OS transport surface was brought up to date.
    assert_eq!(h.media.metadata.lock().last().unwrap().title, "Jazz FM");
    assert_eq!(*h.media.statuses.lock().last().unwrap(), PlaybackStatus::Playing);
}

#[tokio::test(start_paused = true)]
async fn repeated_load_of_same_url_is_idempotent() {
    let h = build_harness(vec![direct_track()]).await;
    let session = h.engine.session();

    session.load_and_play(direct_track()).await.unwrap();
    settle().await;
    session.load_and_play(direct_track()).await.unwrap();
    settle().await;

    // Same canonical URL: one bind, zero restarts of the stream.
    assert_eq!(h.sink.bindings.lock().len(), 1);
    assert!(h.engine.state().is_playing);
}

#[tokio::test(start_paused = true)]
async fn idempotent_reload_clears_loading_flag() {
    let h = build_harness(vec![direct_track()]).await;
    let session = h.engine.session();

    session.load_and_play(direct_track()).await.unwrap();
    settle().await;
    assert!(h.engine.state().is_playing);

    // Same URL again: nothing rebinds and the already-playing sink emits no
    // event, so the engine itself must drop the loading flag.
    session.load_and_play(direct_track()).await.unwrap();
    settle().await;

    let state = h.engine.state();
    assert!(!state.loading);
    assert!(state.is_playing);
}

#[tokio::test(start_paused = true)]
async fn segmented_stream_attaches_runtime_and_pins_best_audio_level() {
    use bridge_traits::hls::QualityLevel;

    let h = build_harness(vec![segmented_track()]).await;
    let session = h.engine.session();

    session.load_and_play(segmented_track()).await.unwrap();
    settle().await;

    // Segmented sources go through the runtime, never a direct bind.
    assert_eq!(h.hls.attach_count(), 1);
    assert!(h.sink.bindings.lock().is_empty());

    let (events, probe) = h.hls.session(0);
    let _ = events.send(HlsEvent::ManifestParsed {
        levels: vec![
            QualityLevel { index: 0, bitrate: 320_000, audio_only: false, codec: None },
            QualityLevel { index: 1, bitrate: 96_000, audio_only: true, codec: None },
            QualityLevel { index: 2, bitrate: 128_000, audio_only: true, codec: None },
        ],
    });
    settle().await;

    assert_eq!(probe.selected_levels.lock().clone(), vec![2]);
    assert!(!h.engine.state().loading);
}

#[tokio::test(start_paused = true)]
async fn seek_is_rejected_for_live_streams() {
    let h = build_harness(vec![direct_track()]).await;
    let session = h.engine.session();
    session.load_and_play(direct_track()).await.unwrap();
    settle().await;

    // FakeSink reports no duration, i.e. a live stream.
    let err = session.seek(42.0).await.unwrap_err();
    assert!(matches!(err, PlayerError::SeekUnavailable));
}

#[tokio::test(start_paused = true)]
async fn volume_is_clamped_persisted_and_restored() {
    let settings = Arc::new(MemorySettings::default());
    let h = build_harness_with(
        vec![direct_track()],
        PlayerConfig::default(),
        Arc::clone(&settings),
    )
    .await;
    let session = h.engine.session();

    let applied = session.set_volume(1.4).await.unwrap();
    assert_eq!(applied, 1.0);
    assert_eq!(
        h.settings.get_f64("player.volume").await.unwrap(),
        Some(1.0)
    );

    // A fresh engine over the same settings starts from the persisted value.
    let h2 = build_harness_with(Vec::new(), PlayerConfig::default(), settings).await;
    assert_eq!(h2.engine.state().volume, 1.0);
    assert_eq!(*h2.sink.volume.lock(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn ended_stream_auto_advances_when_rotation_has_multiple_tracks() {
    let second = Track::new("Second", "https://radio.example.com/second");
    let h = build_harness(vec![direct_track(), second.clone()]).await;
    let session = h.engine.session();

    session.load_and_play(direct_track()).await.unwrap();
    settle().await;

    h.sink.emit(SinkEvent::Ended);
    settle().await;

    let state = h.engine.state();
    assert_eq!(state.current_track.as_ref().unwrap().url, second.url);
    assert!(state.is_playing);
}

#[tokio::test(start_paused = true)]
async fn ended_stream_stays_stopped_with_single_track() {
    let h = build_harness(vec![direct_track()]).await;
    let session = h.engine.session();
    session.load_and_play(direct_track()).await.unwrap();
    settle().await;

    h.sink.emit(SinkEvent::Ended);
    settle().await;

    let state = h.engine.state();
    assert!(!state.is_playing);
    assert_eq!(h.sink.play_calls(), 1);
}

// ============================================================================
// Interruption and recovery
// ============================================================================

#[tokio::test(start_paused = true)]
async fn interruption_pauses_and_recovery_resumes_after_settle_delay() {
    let h = build_harness(vec![direct_track()]).await;
    let session = h.engine.session();
    let mut events = session.subscribe();

    session.load_and_play(direct_track()).await.unwrap();
    settle().await;

    h.signals
        .send(PlatformSignal::Interruption(InterruptionSignal::PageHidden))
        .unwrap();
    settle().await;

    let state = h.engine.state();
    assert!(!state.is_playing);
    assert!(state.is_paused);
    assert_eq!(state.paused_by, Some(PauseSource::System));

    h.signals
        .send(PlatformSignal::Recovery(RecoverySignal::PageVisible))
        .unwrap();
    settle().await;
    // Not yet: the visibility settle delay is 1200ms.
    assert!(!h.engine.state().is_playing);

    tokio::time::sleep(Duration::from_millis(1300)).await;
    assert!(h.engine.state().is_playing);

    let emitted = drain(&mut events);
    assert!(emitted.contains(&PlayerEvent::InterruptionDetected));
    assert!(emitted.contains(&PlayerEvent::InterruptionCleared));
}

#[tokio::test(start_paused = true)]
async fn user_pause_is_never_auto_resumed() {
    let h = build_harness(vec![direct_track()]).await;
    let session = h.engine.session();
    session.load_and_play(direct_track()).await.unwrap();
    settle().await;

    session.pause().await.unwrap();
    settle().await;
    assert_eq!(h.engine.state().paused_by, Some(PauseSource::User));
    let plays_before = h.sink.play_calls();

    h.signals
        .send(PlatformSignal::Interruption(InterruptionSignal::PageHidden))
        .unwrap();
    h.signals
        .send(PlatformSignal::Recovery(RecoverySignal::PageVisible))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(h.sink.play_calls(), plays_before);
    assert!(!h.engine.state().is_playing);
}

#[tokio::test(start_paused = true)]
async fn resume_attempts_exhaust_and_surface_event() {
    let h = build_harness(vec![direct_track()]).await;
    let session = h.engine.session();
    let mut events = session.subscribe();

    session.load_and_play(direct_track()).await.unwrap();
    settle().await;

    // Every probe from now on fails.
    h.sink.script_play(vec![
        Err(BridgeError::OperationFailed("busy".into())),
        Err(BridgeError::OperationFailed("busy".into())),
        Err(BridgeError::OperationFailed("busy".into())),
        Err(BridgeError::OperationFailed("busy".into())),
    ]);

    h.signals
        .send(PlatformSignal::Interruption(InterruptionSignal::AudioSessionSuspended))
        .unwrap();
    settle().await;

    for _ in 0..3 {
        h.signals
            .send(PlatformSignal::Recovery(RecoverySignal::WindowFocus))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(900)).await;
    }

    let emitted = drain(&mut events);
    assert!(emitted.contains(&PlayerEvent::ResumeExhausted));
    assert_eq!(h.sink.play_calls(), 4); // initial play + 3 probes

    // Further recovery signals are dead until the user acts.
    h.signals
        .send(PlatformSignal::Recovery(RecoverySignal::WindowFocus))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.sink.play_calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn autoplay_block_ends_recovery_immediately() {
    let h = build_harness(vec![direct_track()]).await;
    let session = h.engine.session();
    let mut events = session.subscribe();

    session.load_and_play(direct_track()).await.unwrap();
    settle().await;

    h.sink.script_play(vec![Err(BridgeError::AutoplayBlocked)]);

    h.signals
        .send(PlatformSignal::Interruption(InterruptionSignal::PageHidden))
        .unwrap();
    settle().await;
    h.signals
        .send(PlatformSignal::Recovery(RecoverySignal::ExternalPlay))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    let emitted = drain(&mut events);
    assert!(emitted.contains(&PlayerEvent::ResumeExhausted));
    assert_eq!(h.sink.play_calls(), 2); // initial play + the single blocked probe

    // No second probe even with more recovery signals.
    h.signals
        .send(PlatformSignal::Recovery(RecoverySignal::WindowFocus))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.sink.play_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn user_action_cancels_pending_resume_probe() {
    let h = build_harness(vec![direct_track()]).await;
    let session = h.engine.session();

    session.load_and_play(direct_track()).await.unwrap();
    settle().await;

    h.signals
        .send(PlatformSignal::Interruption(InterruptionSignal::PageHidden))
        .unwrap();
    settle().await;
    h.signals
        .send(PlatformSignal::Recovery(RecoverySignal::PageVisible))
        .unwrap();
    settle().await;

    // User pauses before the settle timer fires; the probe must die.
    session.pause().await.unwrap();
    let plays_before = h.sink.play_calls();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.sink.play_calls(), plays_before);
}

// ============================================================================
// Stream failure fallbacks
// ============================================================================

#[tokio::test(start_paused = true)]
async fn fatal_network_error_restarts_loader_in_place() {
    let h = build_harness(vec![segmented_track()]).await;
    let session = h.engine.session();
    let mut events = session.subscribe();

    session.load_and_play(segmented_track()).await.unwrap();
    settle().await;

    let (hls_events, probe) = h.hls.session(0);
    let _ = hls_events.send(HlsEvent::Error {
        kind: HlsErrorKind::Network,
        fatal: true,
        detail: "manifest timeout".into(),
    });
    settle().await;

    assert_eq!(*probe.start_loads.lock(), 1);
    let emitted = drain(&mut events);
    assert!(emitted.iter().any(|e| matches!(
        e,
        PlayerEvent::PlaybackError { recoverable: true, .. }
    )));
    // Still one session; recovery happened in place.
    assert_eq!(h.hls.attach_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn unrecoverable_session_failure_triggers_delayed_reload() {
    let h = build_harness(vec![segmented_track()]).await;
    let session = h.engine.session();

    session.load_and_play(segmented_track()).await.unwrap();
    settle().await;

    let (hls_events, probe) = h.hls.session(0);
    let _ = hls_events.send(HlsEvent::Error {
        kind: HlsErrorKind::Other("mux error".into()),
        fatal: true,
        detail: "mux error".into(),
    });
    settle().await;

    // Reload waits out the fatal-reload delay first.
    assert_eq!(h.hls.attach_count(), 1);
    tokio::time::sleep(Duration::from_millis(2100)).await;

    assert_eq!(h.hls.attach_count(), 2);
    assert!(*probe.destroyed.lock());
    assert!(h.engine.state().is_playing);
}

#[tokio::test(start_paused = true)]
async fn new_load_during_reload_window_cancels_stale_reload() {
    let h = build_harness(vec![segmented_track()]).await;
    let session = h.engine.session();

    session.load_and_play(segmented_track()).await.unwrap();
    settle().await;

    let (hls_events, _probe) = h.hls.session(0);
    let _ = hls_events.send(HlsEvent::Error {
        kind: HlsErrorKind::Other("mux error".into()),
        fatal: true,
        detail: "mux error".into(),
    });
    settle().await;

    // The user loads a different station while the reload delay is pending.
    let fresh = Track::new("Morning Mix", "https://radio.example.com/morning.mp3");
    session.load_and_play(fresh.clone()).await.unwrap();
    settle().await;
    assert_eq!(h.sink.bindings.lock().len(), 1);

    // The stale timer fires and must not touch the new stream.
    tokio::time::sleep(Duration::from_millis(2500)).await;

    assert_eq!(h.sink.bindings.lock().len(), 1);
    assert_eq!(h.hls.attach_count(), 1);
    let state = h.engine.state();
    assert_eq!(state.current_track.as_ref().unwrap().url, fresh.url);
    assert!(state.is_playing);
}

#[tokio::test(start_paused = true)]
async fn direct_bind_failure_flips_cross_origin_once() {
    let h = build_harness(vec![direct_track()]).await;
    let session = h.engine.session();
    let mut events = session.subscribe();

    session.load_and_play(direct_track()).await.unwrap();
    settle().await;
    assert_eq!(
        h.sink.bindings.lock()[0].cross_origin,
        CrossOriginMode::Disabled
    );

    h.sink.emit(SinkEvent::Failed {
        message: "fetch rejected".into(),
    });
    settle().await;

    // Rebound once with the opposite mode and replayed.
    {
        let bindings = h.sink.bindings.lock();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[1].cross_origin, CrossOriginMode::Anonymous);
    }
    assert!(h.engine.state().is_playing);

    // A second failure is final.
    h.sink.emit(SinkEvent::Failed {
        message: "fetch rejected".into(),
    });
    settle().await;

    assert_eq!(h.sink.bindings.lock().len(), 2);
    let state = h.engine.state();
    assert!(!state.is_playing);
    assert!(state.error.is_some());
    let emitted = drain(&mut events);
    assert!(emitted.iter().any(|e| matches!(
        e,
        PlayerEvent::PlaybackError { recoverable: false, .. }
    )));
}

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test(start_paused = true)]
async fn ownership_follows_last_interaction_and_freezes_loser_snapshot() {
    let h = build_harness(vec![direct_track()]).await;
    let a = h.engine.session();
    let b = h.engine.session();

    a.load_and_play(direct_track()).await.unwrap();
    settle().await;
    assert!(a.is_owner());
    let a_view = a.state();
    assert!(a_view.is_playing);

    // B interacts; ownership transfers before its async work runs.
    b.pause().await.unwrap();
    settle().await;
    assert!(b.is_owner());
    assert!(!a.is_owner());

    // B sees live state, A keeps the snapshot from when it last owned.
    assert!(b.state().is_paused);
    assert!(a.state().is_playing);

    // A interacts again and reconverges on live state.
    a.play().await.unwrap();
    settle().await;
    assert!(a.is_owner());
    assert!(a.state().is_playing);
}

// ============================================================================
// Media session commands and analytics
// ============================================================================

#[tokio::test(start_paused = true)]
async fn transport_commands_drive_the_engine() {
    let h = build_harness(vec![direct_track()]).await;
    let session = h.engine.session();
    session.load_and_play(direct_track()).await.unwrap();
    settle().await;

    h.commands.send(MediaCommand::Pause).unwrap();
    settle().await;
    let state = h.engine.state();
    assert!(state.is_paused);
    assert_eq!(state.paused_by, Some(PauseSource::User));

    h.commands.send(MediaCommand::Play).unwrap();
    settle().await;
    assert!(h.engine.state().is_playing);
}

#[tokio::test(start_paused = true)]
async fn analytics_reports_elapsed_listening_time() {
    let h = build_harness(vec![direct_track()]).await;
    let session = h.engine.session();
    session.load_and_play(direct_track()).await.unwrap();
    settle().await;

    tokio::time::sleep(Duration::from_secs(61)).await;

    let reports = h.analytics.reports.lock().clone();
    assert!(reports.len() >= 2);
    assert!(reports
        .iter()
        .all(|(url, elapsed)| url == &direct_track().url && *elapsed == 30));
}

#[tokio::test(start_paused = true)]
async fn analytics_is_silent_while_paused() {
    let h = build_harness(vec![direct_track()]).await;
    let session = h.engine.session();
    session.load_and_play(direct_track()).await.unwrap();
    settle().await;
    session.pause().await.unwrap();
    settle().await;

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert!(h.analytics.reports.lock().is_empty());
}
