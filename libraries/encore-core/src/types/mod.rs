mod ids;
mod playlist;
mod track;
mod user;

pub use ids::{PlaylistId, TrackId, UserId};
pub use playlist::{next_position, CreatePlaylist, Playlist, PlaylistTrack, PlaylistWithTracks};
pub use track::{
    format_duration, CreateTrack, Track, TrackMetadata, UploadedTrack, DEFAULT_COVER_URL,
    UNKNOWN_ALBUM,
};
pub use user::User;
