//! Core types for playback management

use encore_core::{Track, TrackId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default volume, also restored when unmuting
pub const DEFAULT_VOLUME: f32 = 0.7;

/// Repeat mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Advance through the queue
    #[default]
    Off,

    /// Advance through the queue, wrapping at the end
    All,

    /// Loop current track only
    One,
}

impl RepeatMode {
    /// Next mode in the cycle off → all → one → off
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }
}

/// Derived transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// No current track
    Idle,

    /// Current track, not playing
    Paused,

    /// Current track, playing
    Playing,
}

/// Playback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Initial volume (0.0-1.0, default: 0.7)
    pub volume: f32,

    /// Initial shuffle state (default: off)
    pub shuffle: bool,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Period of the position clock for placeholder tracks (default: 1s)
    pub tick_interval: Duration,

    /// `prev_track` restarts the current track past this position (default: 3s)
    pub restart_threshold: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            shuffle: false,
            repeat: RepeatMode::Off,
            tick_interval: Duration::from_secs(1),
            restart_threshold: Duration::from_secs(3),
        }
    }
}

/// Identity of the running position clock
///
/// The clock runs only while this is `Some`, and is restarted whenever it
/// changes. `generation` advances on every track change, so replaying the
/// same track also restarts it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClockKey {
    pub track_id: TrackId,
    pub generation: u64,
    pub repeat: RepeatMode,
}

/// Serializable copy of the whole playback state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub current_track: Option<Track>,
    pub queue: Vec<Track>,
    pub is_playing: bool,
    /// Elapsed seconds into the current track
    pub current_time: f64,
    pub volume: f32,
    pub is_shuffle: bool,
    pub repeat_mode: RepeatMode,
    pub status: PlaybackStatus,
}
