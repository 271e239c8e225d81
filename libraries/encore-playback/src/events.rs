//! Playback Events
//!
//! Every state change pushes an event; consumers drain them after each
//! operation (or receive them from the `Player` channel).

use crate::types::RepeatMode;
use encore_core::TrackId;
use serde::{Deserialize, Serialize};

/// Events emitted by the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// A different track became current
    TrackChanged {
        track_id: TrackId,
        previous_track_id: Option<TrackId>,
    },

    /// Playing flag flipped
    PlayStateChanged { is_playing: bool },

    /// Position moved (clock tick, seek, restart or external report)
    PositionChanged {
        position_secs: f64,
        duration_secs: u32,
    },

    VolumeChanged { level: f32 },

    ShuffleChanged { enabled: bool },

    RepeatChanged { mode: RepeatMode },

    /// Tracks replaced or appended
    QueueChanged { length: usize },

    /// Current track reached its end
    TrackFinished { track_id: TrackId },

    /// The media output rejected a command
    Error { message: String },
}
