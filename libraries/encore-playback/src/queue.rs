//! Play queue
//!
//! An ordered list of tracks. `play_track` replaces it with a playlist and
//! `add_to_queue` appends; navigation works on indices and wraps at both
//! ends.

use encore_core::{Track, TrackId};

/// Ordered play queue
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole queue
    pub fn replace(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
    }

    /// Append a track at the tail
    pub fn push(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Index of the first track with this id
    pub fn index_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn first(&self) -> Option<&Track> {
        self.tracks.first()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Index after `current`, wrapping to 0
    ///
    /// A track not in the queue continues at the head.
    pub fn next_index(&self, current: Option<usize>) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        Some(current.map_or(0, |i| (i + 1) % self.len()))
    }

    /// Index before `current`, wrapping to the last track
    ///
    /// A track not in the queue continues at the tail.
    pub fn prev_index(&self, current: Option<usize>) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let last = self.len() - 1;
        Some(match current {
            Some(0) | None => last,
            Some(i) => i - 1,
        })
    }
}
