//! Encore - Playback Engine
//!
//! In-memory "now playing" state for Encore clients.
//!
//! This crate provides:
//! - Transport (play, pause, next, previous, seek)
//! - Queue with wrap-around navigation
//! - Uniform shuffle over the whole queue
//! - Repeat modes (Off, All, One)
//! - Volume with mute/unmute
//! - A position clock for placeholder tracks without audio
//! - Event stream for UI synchronization
//!
//! # Architecture
//!
//! [`PlaybackEngine`] is a synchronous state machine: no I/O, no tasks.
//! [`Player`] wraps it for async callers, owns the clock task and delegates
//! likes to the liked-songs sync. Real audio decoding lives behind the
//! [`MediaOutput`] trait.
//!
//! # Example: Basic Playback
//!
//! ```rust
//! use encore_core::Track;
//! use encore_playback::{PlaybackConfig, PlaybackEngine, PlaybackStatus};
//!
//! let mut engine = PlaybackEngine::new(PlaybackConfig::default());
//!
//! let queue = vec![
//!     Track::new("t1", "First", "Artist", 180),
//!     Track::new("t2", "Second", "Artist", 200),
//! ];
//! engine.play_track(queue[0].clone(), Some(queue));
//! assert_eq!(engine.status(), PlaybackStatus::Playing);
//!
//! engine.next_track();
//! engine.next_track();
//! assert_eq!(engine.get_current_track().unwrap().id.as_str(), "t1");
//! ```
//!
//! # Example: Shuffle and Repeat
//!
//! ```rust
//! use encore_playback::{PlaybackEngine, RepeatMode};
//!
//! let mut engine = PlaybackEngine::default();
//! engine.toggle_shuffle();
//! engine.toggle_repeat();
//! assert!(engine.is_shuffle());
//! assert_eq!(engine.get_repeat(), RepeatMode::All);
//! ```

mod engine;
mod error;
mod events;
mod media;
mod player;
mod queue;
mod shuffle;
pub mod types;
mod volume;

// Public exports
pub use engine::PlaybackEngine;
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use media::MediaOutput;
pub use player::Player;
pub use queue::Queue;
pub use types::{
    ClockKey, PlaybackConfig, PlaybackSnapshot, PlaybackStatus, RepeatMode, DEFAULT_VOLUME,
};
pub use volume::Volume;
