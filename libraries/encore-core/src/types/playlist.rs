/// Playlist domain types
use crate::error::{EncoreError, Result};
use crate::types::{PlaylistId, Track, TrackId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Playlist row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Unique playlist identifier
    pub id: PlaylistId,

    /// Owner user ID
    pub user_id: UserId,

    /// Playlist name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Optional cover image
    pub cover_url: Option<String>,

    /// Visible to other users
    #[serde(default)]
    pub is_public: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Playlist {
    /// Local row for a playlist that has not been confirmed by the store yet
    pub fn draft(create: &CreatePlaylist) -> Self {
        let now = Utc::now();
        Self {
            id: create.id.clone(),
            user_id: create.user_id.clone(),
            name: create.name.clone(),
            description: create.description.clone(),
            cover_url: None,
            is_public: create.is_public,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Data for creating a new playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePlaylist {
    pub id: PlaylistId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
}

impl CreatePlaylist {
    /// Private playlist with a freshly generated id
    ///
    /// An empty description is stored as absent.
    pub fn new(user_id: UserId, name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: PlaylistId::generate(),
            user_id,
            name: name.into(),
            description: description.filter(|d| !d.is_empty()),
            is_public: false,
        }
    }
}

/// Playlist membership row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistTrack {
    /// Playlist ID
    pub playlist_id: PlaylistId,

    /// Track ID
    pub track_id: TrackId,

    /// Position in the playlist (0-indexed, gaps allowed after removals)
    pub position: i64,
}

impl PlaylistTrack {
    /// Create a new playlist track association
    pub fn new(playlist_id: PlaylistId, track_id: TrackId, position: i64) -> Self {
        Self {
            playlist_id,
            track_id,
            position,
        }
    }
}

/// Position for the next inserted track given the current maximum
///
/// Empty playlists start at 0. Removals never renumber, so this is
/// always strictly past every existing row. A stored maximum of
/// `i64::MAX` leaves no room and is reported as a remote error.
pub fn next_position(current_max: Option<i64>) -> Result<i64> {
    match current_max {
        None => Ok(0),
        Some(max) => max.checked_add(1).ok_or_else(|| {
            EncoreError::remote(format!("playlist position {} is out of range", max))
        }),
    }
}

/// Playlist with its tracks resolved against the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistWithTracks {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub tracks: Vec<Track>,
}

impl PlaylistWithTracks {
    /// Wrap a playlist and its resolved tracks
    pub fn new(playlist: Playlist, tracks: Vec<Track>) -> Self {
        Self { playlist, tracks }
    }

    /// Playlist with no tracks
    pub fn empty(playlist: Playlist) -> Self {
        Self::new(playlist, Vec::new())
    }

    /// Playlist ID
    pub fn id(&self) -> &PlaylistId {
        &self.playlist.id
    }

    /// Sum of track durations in seconds
    pub fn total_duration(&self) -> u64 {
        self.tracks.iter().map(|t| u64::from(t.duration)).sum()
    }

    /// Case-insensitive match on name or description
    pub fn matches(&self, needle_lowercase: &str) -> bool {
        self.playlist.name.to_lowercase().contains(needle_lowercase)
            || self
                .playlist
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle_lowercase))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_position_starts_at_zero() {
        assert_eq!(next_position(None).unwrap(), 0);
    }

    #[test]
    fn next_position_follows_max() {
        assert_eq!(next_position(Some(4)).unwrap(), 5);
        assert_eq!(next_position(Some(0)).unwrap(), 1);
    }

    #[test]
    fn next_position_rejects_exhausted_range() {
        let err = next_position(Some(i64::MAX)).unwrap_err();
        assert!(matches!(err, EncoreError::Remote(_)));
        assert_eq!(next_position(Some(i64::MAX - 1)).unwrap(), i64::MAX);
    }

    #[test]
    fn create_playlist_drops_empty_description() {
        let create = CreatePlaylist::new(UserId::new("u1"), "Road Trip", Some(String::new()));
        assert_eq!(create.description, None);
        assert!(!create.is_public);

        let draft = Playlist::draft(&create);
        assert_eq!(draft.id, create.id);
        assert_eq!(draft.name, "Road Trip");
    }

    #[test]
    fn playlist_with_tracks_serializes_flat() {
        let create = CreatePlaylist::new(UserId::new("u1"), "Focus", None);
        let playlist = PlaylistWithTracks::new(
            Playlist::draft(&create),
            vec![Track::new("t1", "One", "A", 100), Track::new("t2", "Two", "B", 50)],
        );
        assert_eq!(playlist.total_duration(), 150);

        let json = serde_json::to_value(&playlist).unwrap();
        assert_eq!(json["name"], "Focus");
        assert_eq!(json["tracks"].as_array().unwrap().len(), 2);
    }
}
