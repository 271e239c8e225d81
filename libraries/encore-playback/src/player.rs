//! Async player
//!
//! Wraps a [`PlaybackEngine`] behind a mutex, owns the position clock for
//! placeholder tracks and forwards engine events to a channel.
//!
//! The clock is an explicit task handle. After every operation the player
//! compares the engine's [`ClockKey`] with the key of the running clock;
//! when they differ the old task is aborted and, if a key is wanted, a new
//! one is spawned. At most one clock task is ever live.

use crate::engine::PlaybackEngine;
use crate::events::PlaybackEvent;
use crate::media::MediaOutput;
use crate::types::{ClockKey, PlaybackSnapshot, RepeatMode};
use encore_core::{Track, TrackId};
use encore_sync::LikedSongs;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace};

const MIN_TICK: Duration = Duration::from_millis(1);

struct ClockHandle {
    key: ClockKey,
    epoch: u64,
    task: JoinHandle<()>,
}

struct PlayerInner {
    engine: PlaybackEngine,
    clock: Option<ClockHandle>,
    epoch: u64,
    period: Duration,
    events: UnboundedSender<PlaybackEvent>,
}

impl PlayerInner {
    fn flush_events(&mut self) {
        for event in self.engine.drain_events() {
            // Receiver gone means nobody is listening
            let _ = self.events.send(event);
        }
    }

    fn clock_epoch(&self) -> Option<u64> {
        self.clock.as_ref().map(|c| c.epoch)
    }
}

impl Drop for PlayerInner {
    fn drop(&mut self) {
        if let Some(clock) = self.clock.take() {
            clock.task.abort();
        }
    }
}

/// Playback engine with a running clock and like delegation
pub struct Player {
    inner: Arc<Mutex<PlayerInner>>,
    liked: Arc<LikedSongs>,
}

impl Player {
    /// Wrap `engine`, returning the player and its event stream
    ///
    /// Must be called inside a Tokio runtime when the engine is already
    /// playing a placeholder track, since its clock starts right away.
    pub fn new(
        engine: PlaybackEngine,
        liked: Arc<LikedSongs>,
    ) -> (Self, UnboundedReceiver<PlaybackEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let period = engine.config().tick_interval.max(MIN_TICK);
        let inner = Arc::new(Mutex::new(PlayerInner {
            engine,
            clock: None,
            epoch: 0,
            period,
            events: tx,
        }));

        if let Ok(mut guard) = inner.try_lock() {
            guard.flush_events();
            reconcile_clock(&inner, &mut guard);
        }

        (Self { inner, liked }, rx)
    }

    async fn with_engine<R>(&self, f: impl FnOnce(&mut PlaybackEngine) -> R) -> R {
        let mut inner = self.inner.lock().await;
        let result = f(&mut inner.engine);
        inner.flush_events();
        reconcile_clock(&self.inner, &mut inner);
        result
    }

    async fn read_engine<R>(&self, f: impl FnOnce(&PlaybackEngine) -> R) -> R {
        let inner = self.inner.lock().await;
        f(&inner.engine)
    }

    // ===== Transport =====

    pub async fn play_track(&self, track: Track, playlist: Option<Vec<Track>>) {
        self.with_engine(|e| e.play_track(track, playlist)).await
    }

    pub async fn toggle_play(&self) {
        self.with_engine(PlaybackEngine::toggle_play).await
    }

    pub async fn play(&self) {
        self.with_engine(PlaybackEngine::play).await
    }

    pub async fn pause(&self) {
        self.with_engine(PlaybackEngine::pause).await
    }

    pub async fn next_track(&self) {
        self.with_engine(PlaybackEngine::next_track).await
    }

    pub async fn prev_track(&self) {
        self.with_engine(PlaybackEngine::prev_track).await
    }

    pub async fn seek_to(&self, position_secs: f64) {
        self.with_engine(|e| e.seek_to(position_secs)).await
    }

    pub async fn seek_to_percent(&self, percent: f64) {
        self.with_engine(|e| e.seek_to_percent(percent)).await
    }

    // ===== Volume & Modes =====

    pub async fn set_volume(&self, level: f32) {
        self.with_engine(|e| e.set_volume(level)).await
    }

    pub async fn toggle_mute(&self) {
        self.with_engine(PlaybackEngine::toggle_mute).await
    }

    pub async fn toggle_shuffle(&self) {
        self.with_engine(PlaybackEngine::toggle_shuffle).await
    }

    pub async fn toggle_repeat(&self) {
        self.with_engine(PlaybackEngine::toggle_repeat).await
    }

    pub async fn add_to_queue(&self, track: Track) {
        self.with_engine(|e| e.add_to_queue(track)).await
    }

    // ===== Media Output =====

    pub async fn attach_output(&self, output: Box<dyn MediaOutput>) {
        self.with_engine(|e| e.attach_output(output)).await
    }

    pub async fn report_position(&self, position_secs: f64) {
        self.with_engine(|e| e.report_position(position_secs)).await
    }

    pub async fn report_ended(&self) {
        self.with_engine(PlaybackEngine::report_ended).await
    }

    // ===== Likes =====

    /// Like or unlike a track through the liked-songs sync
    pub async fn toggle_like(&self, track_id: &TrackId) -> encore_sync::Result<bool> {
        self.liked.toggle_like(track_id).await
    }

    pub async fn is_liked(&self, track_id: &TrackId) -> bool {
        self.liked.is_liked(track_id).await
    }

    // ===== State Queries =====

    pub async fn snapshot(&self) -> PlaybackSnapshot {
        self.read_engine(PlaybackEngine::snapshot).await
    }

    pub async fn get_current_track(&self) -> Option<Track> {
        self.read_engine(|e| e.get_current_track().cloned()).await
    }

    pub async fn is_playing(&self) -> bool {
        self.read_engine(PlaybackEngine::is_playing).await
    }

    pub async fn get_position(&self) -> f64 {
        self.read_engine(PlaybackEngine::get_position).await
    }

    pub async fn get_repeat(&self) -> RepeatMode {
        self.read_engine(PlaybackEngine::get_repeat).await
    }

    /// Whether a clock task is currently live
    pub async fn clock_active(&self) -> bool {
        self.inner.lock().await.clock.is_some()
    }
}

/// Bring the clock task in line with the engine's clock key
fn reconcile_clock(shared: &Arc<Mutex<PlayerInner>>, inner: &mut PlayerInner) {
    let wanted = inner.engine.clock_key();
    if inner.clock.as_ref().map(|c| &c.key) == wanted.as_ref() {
        return;
    }

    if let Some(old) = inner.clock.take() {
        trace!(epoch = old.epoch, "Stopping clock");
        old.task.abort();
    }

    if let Some(key) = wanted {
        inner.epoch += 1;
        let epoch = inner.epoch;
        debug!(track_id = %key.track_id, epoch, "Starting clock");
        let task = tokio::spawn(run_clock(Arc::downgrade(shared), epoch, inner.period));
        inner.clock = Some(ClockHandle { key, epoch, task });
    }
}

async fn run_clock(player: Weak<Mutex<PlayerInner>>, epoch: u64, period: Duration) {
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;

        let Some(shared) = player.upgrade() else {
            return;
        };
        let mut inner = shared.lock().await;

        // Superseded while waiting for the lock
        if inner.clock_epoch() != Some(epoch) {
            return;
        }

        inner.engine.tick();
        inner.flush_events();
        reconcile_clock(&shared, &mut inner);

        if inner.clock_epoch() != Some(epoch) {
            return;
        }
    }
}
