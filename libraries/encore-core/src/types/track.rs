/// Track domain types
use crate::types::{TrackId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Album label used when an uploaded track has no album
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Artwork shown for tracks uploaded without a cover
pub const DEFAULT_COVER_URL: &str =
    "https://images.unsplash.com/photo-1470225620780-dba8ba36b745?w=300&h=300&fit=crop";

/// Playable track
///
/// Tracks are plain values shared by the queue, playlists and the upload
/// list. A track without `audio_url` is a placeholder whose position is
/// driven by the playback clock instead of a media element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    pub album: String,

    /// Track duration in whole seconds
    pub duration: u32,

    /// Artwork reference
    pub cover_url: String,

    /// Remote audio reference (None for placeholder tracks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl Track {
    /// Create a placeholder track with minimal metadata
    pub fn new(
        id: impl Into<TrackId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        duration: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: UNKNOWN_ALBUM.to_string(),
            duration,
            cover_url: DEFAULT_COVER_URL.to_string(),
            audio_url: None,
        }
    }

    /// Set the album name
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }

    /// Set the artwork reference
    pub fn with_cover(mut self, cover_url: impl Into<String>) -> Self {
        self.cover_url = cover_url.into();
        self
    }

    /// Attach a remote audio reference
    pub fn with_audio_url(mut self, audio_url: impl Into<String>) -> Self {
        self.audio_url = Some(audio_url.into());
        self
    }

    /// Get the track duration as a Duration
    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.duration))
    }

    /// Whether a media element reports position for this track
    pub fn has_audio(&self) -> bool {
        self.audio_url.is_some()
    }

    /// Case-insensitive match on title, artist or album
    pub fn matches(&self, needle_lowercase: &str) -> bool {
        self.title.to_lowercase().contains(needle_lowercase)
            || self.artist.to_lowercase().contains(needle_lowercase)
            || self.album.to_lowercase().contains(needle_lowercase)
    }
}

/// Track row uploaded by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedTrack {
    pub id: TrackId,
    pub user_id: UserId,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    /// Duration in whole seconds
    pub duration: u32,
    pub cover_url: Option<String>,
    pub audio_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UploadedTrack {
    /// Convert to a playable track, filling in album and cover defaults
    pub fn to_track(&self) -> Track {
        Track {
            id: self.id.clone(),
            title: self.title.clone(),
            artist: self.artist.clone(),
            album: self
                .album
                .clone()
                .unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
            duration: self.duration,
            cover_url: self
                .cover_url
                .clone()
                .unwrap_or_else(|| DEFAULT_COVER_URL.to_string()),
            audio_url: Some(self.audio_url.clone()),
        }
    }
}

/// Data for inserting an uploaded track row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTrack {
    pub user_id: UserId,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration: u32,
    pub cover_url: Option<String>,
    pub audio_url: String,
}

/// User-entered metadata for an upload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
}

impl TrackMetadata {
    /// Create metadata with title and artist
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: None,
        }
    }

    /// Album with blank input treated as absent
    pub fn album(&self) -> Option<String> {
        self.album
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
    }
}

/// Format whole seconds as `m:ss`
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
