//! Playback engine
//!
//! Single source of truth for what is playing: current track, queue,
//! transport flag, position, volume, shuffle and repeat. Every operation is
//! synchronous and always succeeds; invalid requests are no-ops.
//!
//! The engine never spawns anything. The position clock for placeholder
//! tracks is driven from outside by calling [`PlaybackEngine::tick`] while
//! [`PlaybackEngine::clock_key`] is `Some` (see `Player`).

use crate::events::PlaybackEvent;
use crate::media::MediaOutput;
use crate::queue::Queue;
use crate::shuffle::pick_index;
use crate::types::{ClockKey, PlaybackConfig, PlaybackSnapshot, PlaybackStatus, RepeatMode};
use crate::volume::Volume;
use encore_core::Track;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::warn;

/// Playback state machine
pub struct PlaybackEngine {
    config: PlaybackConfig,

    // Transport
    current_track: Option<Track>,
    queue: Queue,
    is_playing: bool,
    current_time: f64,
    generation: u64,

    // Modes
    volume: Volume,
    shuffle: bool,
    repeat: RepeatMode,
    rng: StdRng,

    // Collaborators
    output: Option<Box<dyn MediaOutput>>,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("current_track", &self.current_track.as_ref().map(|t| &t.id))
            .field("queue_len", &self.queue.len())
            .field("is_playing", &self.is_playing)
            .field("current_time", &self.current_time)
            .field("volume", &self.volume.level())
            .field("shuffle", &self.shuffle)
            .field("repeat", &self.repeat)
            .finish_non_exhaustive()
    }
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self::new(PlaybackConfig::default())
    }
}

impl PlaybackEngine {
    /// Create new playback engine
    pub fn new(config: PlaybackConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Engine with a deterministic shuffle sequence
    pub fn with_seed(config: PlaybackConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: PlaybackConfig, rng: StdRng) -> Self {
        Self {
            current_track: None,
            queue: Queue::new(),
            is_playing: false,
            current_time: 0.0,
            generation: 0,
            volume: Volume::new(config.volume),
            shuffle: config.shuffle,
            repeat: config.repeat,
            rng,
            output: None,
            pending_events: Vec::new(),
            config,
        }
    }

    // ===== Media Output =====

    /// Attach the media collaborator and bring it up to date
    pub fn attach_output(&mut self, output: Box<dyn MediaOutput>) {
        self.output = Some(output);
        let level = self.volume.level();
        self.forward(|out| {
            out.set_volume(level);
            Ok(())
        });
        self.sync_output_track();
    }

    /// Detach the media collaborator
    pub fn detach_output(&mut self) -> Option<Box<dyn MediaOutput>> {
        self.output.take()
    }

    // ===== Playback Control =====

    /// Make `track` current and start playing it from 0
    ///
    /// With a playlist, the queue is replaced by it first.
    pub fn play_track(&mut self, track: Track, playlist: Option<Vec<Track>>) {
        if let Some(tracks) = playlist {
            self.queue.replace(tracks);
            self.emit(PlaybackEvent::QueueChanged {
                length: self.queue.len(),
            });
        }
        self.set_playing_flag(true);
        self.set_current(track);
    }

    /// Flip the playing flag
    ///
    /// Without a current track the head of the queue becomes current first.
    /// With neither, only the flag flips.
    pub fn toggle_play(&mut self) {
        if self.current_track.is_none() {
            if let Some(first) = self.queue.first().cloned() {
                self.set_current(first);
            }
        }
        self.set_playing_flag(!self.is_playing);
        self.forward_playing();
    }

    /// Start playback if paused
    pub fn play(&mut self) {
        if !self.is_playing {
            self.toggle_play();
        }
    }

    /// Pause playback if playing
    pub fn pause(&mut self) {
        if self.is_playing {
            self.toggle_play();
        }
    }

    /// Move to the next track
    ///
    /// Shuffle draws any queue index, the current one included. Otherwise
    /// the queue wraps from the last track to the first.
    pub fn next_track(&mut self) {
        let Some(current) = &self.current_track else {
            return;
        };
        if self.queue.is_empty() {
            return;
        }

        let index = if self.shuffle {
            pick_index(&mut self.rng, self.queue.len())
        } else {
            let position = self.queue.index_of(&current.id);
            self.queue.next_index(position)
        };

        if let Some(track) = index.and_then(|i| self.queue.get(i)).cloned() {
            self.set_current(track);
        }
    }

    /// Restart the current track, or move to the previous one
    ///
    /// Past the restart threshold the current track restarts; otherwise the
    /// queue is walked backwards, wrapping to the last track.
    pub fn prev_track(&mut self) {
        let Some(current) = &self.current_track else {
            return;
        };
        if self.queue.is_empty() {
            return;
        }

        if self.current_time > self.config.restart_threshold.as_secs_f64() {
            self.restart_current();
            return;
        }

        let position = self.queue.index_of(&current.id);
        if let Some(track) = self
            .queue
            .prev_index(position)
            .and_then(|i| self.queue.get(i))
            .cloned()
        {
            self.set_current(track);
        }
    }

    // ===== Seek =====

    /// Seek to a position in seconds
    ///
    /// Not bounded by the track duration. Negative values clamp to 0; NaN
    /// and calls without a current track are ignored.
    pub fn seek_to(&mut self, position_secs: f64) {
        if self.current_track.is_none() || position_secs.is_nan() {
            return;
        }
        self.current_time = position_secs.max(0.0);
        self.emit_position();
        if self.current_has_audio() {
            let position = self.current_time;
            self.forward(|out| out.seek(position));
        }
    }

    /// Seek to a percentage (0-100) of the current track
    pub fn seek_to_percent(&mut self, percent: f64) {
        let Some(track) = &self.current_track else {
            return;
        };
        if percent.is_nan() {
            return;
        }
        let duration = f64::from(track.duration);
        self.seek_to(percent.clamp(0.0, 100.0) / 100.0 * duration);
    }

    // ===== Volume =====

    /// Set volume, clamped to 0.0-1.0 (NaN is ignored)
    pub fn set_volume(&mut self, level: f32) {
        if self.volume.set_level(level) {
            self.volume_changed();
        }
    }

    /// Silence, or restore the default volume when already silent
    pub fn toggle_mute(&mut self) {
        self.volume.toggle_mute();
        self.volume_changed();
    }

    // ===== Shuffle & Repeat =====

    pub fn toggle_shuffle(&mut self) {
        self.shuffle = !self.shuffle;
        self.emit(PlaybackEvent::ShuffleChanged {
            enabled: self.shuffle,
        });
    }

    /// Advance repeat mode off → all → one → off
    pub fn toggle_repeat(&mut self) {
        self.repeat = self.repeat.next();
        self.emit(PlaybackEvent::RepeatChanged { mode: self.repeat });
    }

    // ===== Queue =====

    /// Append a track; the current track is untouched
    pub fn add_to_queue(&mut self, track: Track) {
        self.queue.push(track);
        self.emit(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    // ===== Clock =====

    /// Key of the clock that should be running, if any
    ///
    /// A clock runs only while playing a current track that has no audio
    /// URL; tracks with audio report their own position.
    pub fn clock_key(&self) -> Option<ClockKey> {
        let track = self.current_track.as_ref()?;
        if !self.is_playing || track.has_audio() {
            return None;
        }
        Some(ClockKey {
            track_id: track.id.clone(),
            generation: self.generation,
            repeat: self.repeat,
        })
    }

    /// Advance the clock by one period
    ///
    /// A tick that finds the position at or past the duration ends the
    /// track instead of advancing. Ignored while no clock should run.
    pub fn tick(&mut self) {
        let Some(track) = &self.current_track else {
            return;
        };
        if self.clock_key().is_none() {
            return;
        }

        if self.current_time >= f64::from(track.duration) {
            self.finish_current();
        } else {
            self.current_time += self.config.tick_interval.as_secs_f64();
            self.emit_position();
        }
    }

    /// Position reported by the media output
    ///
    /// Only accepted for tracks with an audio URL.
    pub fn report_position(&mut self, position_secs: f64) {
        if !self.current_has_audio() || position_secs.is_nan() {
            return;
        }
        self.current_time = position_secs.max(0.0);
        self.emit_position();
    }

    /// End of track reported by the media output
    pub fn report_ended(&mut self) {
        if self.current_has_audio() {
            self.finish_current();
        }
    }

    // ===== State Queries =====

    pub fn get_current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    pub fn get_queue(&self) -> &[Track] {
        self.queue.tracks()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Elapsed seconds into the current track
    pub fn get_position(&self) -> f64 {
        self.current_time
    }

    pub fn get_volume(&self) -> f32 {
        self.volume.level()
    }

    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    pub fn is_shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn get_repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn status(&self) -> PlaybackStatus {
        match (&self.current_track, self.is_playing) {
            (None, _) => PlaybackStatus::Idle,
            (Some(_), true) => PlaybackStatus::Playing,
            (Some(_), false) => PlaybackStatus::Paused,
        }
    }

    /// Position as a percentage of the duration (0 when idle)
    pub fn progress_percent(&self) -> f64 {
        match &self.current_track {
            Some(track) if track.duration > 0 => {
                self.current_time / f64::from(track.duration) * 100.0
            }
            _ => 0.0,
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            current_track: self.current_track.clone(),
            queue: self.queue.tracks().to_vec(),
            is_playing: self.is_playing,
            current_time: self.current_time,
            volume: self.volume.level(),
            is_shuffle: self.shuffle,
            repeat_mode: self.repeat,
            status: self.status(),
        }
    }

    // ===== Events =====

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internal =====

    fn set_current(&mut self, track: Track) {
        let previous_track_id = self.current_track.as_ref().map(|t| t.id.clone());
        let track_id = track.id.clone();

        self.current_track = Some(track);
        self.current_time = 0.0;
        self.generation = self.generation.wrapping_add(1);

        self.emit(PlaybackEvent::TrackChanged {
            track_id,
            previous_track_id,
        });
        self.sync_output_track();
    }

    fn set_playing_flag(&mut self, playing: bool) {
        if self.is_playing != playing {
            self.is_playing = playing;
            self.emit(PlaybackEvent::PlayStateChanged {
                is_playing: playing,
            });
        }
    }

    fn restart_current(&mut self) {
        self.current_time = 0.0;
        self.emit_position();
        if self.current_has_audio() {
            self.forward(|out| out.seek(0.0));
        }
    }

    /// End-of-track rule shared by the clock and the media output
    fn finish_current(&mut self) {
        let Some(track) = &self.current_track else {
            return;
        };
        let track_id = track.id.clone();
        self.emit(PlaybackEvent::TrackFinished { track_id });

        if self.repeat == RepeatMode::One {
            self.restart_current();
            self.forward_playing();
        } else {
            self.next_track();
            self.current_time = 0.0;
        }
    }

    fn current_has_audio(&self) -> bool {
        self.current_track.as_ref().is_some_and(Track::has_audio)
    }

    fn sync_output_track(&mut self) {
        let url = self
            .current_track
            .as_ref()
            .and_then(|t| t.audio_url.clone());
        match url {
            Some(url) => {
                self.forward(|out| out.load(&url));
                self.forward_playing();
            }
            None => self.forward(|out| {
                out.unload();
                Ok(())
            }),
        }
    }

    fn forward_playing(&mut self) {
        if self.current_has_audio() {
            let playing = self.is_playing;
            self.forward(|out| out.set_playing(playing));
        }
    }

    fn volume_changed(&mut self) {
        let level = self.volume.level();
        self.emit(PlaybackEvent::VolumeChanged { level });
        self.forward(|out| {
            out.set_volume(level);
            Ok(())
        });
    }

    fn forward(&mut self, command: impl FnOnce(&mut dyn MediaOutput) -> crate::Result<()>) {
        let Some(output) = self.output.as_mut() else {
            return;
        };
        if let Err(e) = command(output.as_mut()) {
            warn!("Media output command failed: {}", e);
            self.pending_events.push(PlaybackEvent::Error {
                message: e.to_string(),
            });
        }
    }

    fn emit_position(&mut self) {
        let duration_secs = self.current_track.as_ref().map_or(0, |t| t.duration);
        self.emit(PlaybackEvent::PositionChanged {
            position_secs: self.current_time,
            duration_secs,
        });
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.pending_events.push(event);
    }
}
