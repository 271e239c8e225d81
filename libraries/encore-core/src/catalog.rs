//! Track catalog
//!
//! Playlists store `(track_id, position)` rows only; the catalog turns them
//! back into tracks. Ids missing from the catalog are skipped.

use crate::types::{PlaylistTrack, Track, TrackId};
use std::collections::HashMap;

/// Lookup table of known tracks, in insertion order
#[derive(Debug, Clone, Default)]
pub struct TrackCatalog {
    tracks: Vec<Track>,
    index: HashMap<TrackId, usize>,
}

impl TrackCatalog {
    /// Build a catalog; the first track wins when ids repeat
    pub fn new(tracks: impl IntoIterator<Item = Track>) -> Self {
        let mut catalog = Self::default();
        for track in tracks {
            catalog.insert(track);
        }
        catalog
    }

    /// Add a track unless its id is already known
    pub fn insert(&mut self, track: Track) -> bool {
        if self.index.contains_key(&track.id) {
            return false;
        }
        self.index.insert(track.id.clone(), self.tracks.len());
        self.tracks.push(track);
        true
    }

    /// Look up a track by id
    pub fn get(&self, id: &TrackId) -> Option<&Track> {
        self.index.get(id).map(|&i| &self.tracks[i])
    }

    /// All tracks in insertion order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Resolve membership rows into tracks ordered by position
    pub fn resolve(&self, entries: &[PlaylistTrack]) -> Vec<Track> {
        let mut ordered: Vec<&PlaylistTrack> = entries.iter().collect();
        ordered.sort_by_key(|entry| entry.position);

        ordered
            .into_iter()
            .filter_map(|entry| self.get(&entry.track_id).cloned())
            .collect()
    }

    /// Case-insensitive search over title, artist and album
    ///
    /// A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<Track> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.tracks
            .iter()
            .filter(|track| track.matches(&needle))
            .cloned()
            .collect()
    }

    /// Built-in placeholder tracks used by the offline demo
    pub fn demo() -> Self {
        Self::new([
            Track::new("demo-1", "Neon Harbor", "Glass Anchors", 243).with_album("Low Tide Signals"),
            Track::new("demo-2", "Paper Satellites", "Mira Vale", 229).with_album("Orbiting Slowly"),
            Track::new("demo-3", "Copper Rain", "The Quiet Foundry", 201).with_album("Copper Rain"),
            Track::new("demo-4", "Late Trains", "Nadia Kerr", 274).with_album("Night Schedules"),
            Track::new("demo-5", "Static Bloom", "Field Radio", 188).with_album("Static Bloom"),
            Track::new("demo-6", "Glasshouse", "Mira Vale", 256).with_album("Orbiting Slowly"),
            Track::new("demo-7", "Afterimage", "Glass Anchors", 312).with_album("Low Tide Signals"),
            Track::new("demo-8", "Small Hours", "Harbor Lights", 197).with_album("Small Hours"),
        ])
    }
}
