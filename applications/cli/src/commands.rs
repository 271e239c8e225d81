/// Command handlers
use crate::app::require_library;
use crate::config::EncoreConfig;
use anyhow::Context;
use encore_core::{format_duration, PlaylistId, PlaylistWithTracks, Track, TrackId, TrackMetadata};
use encore_playback::{PlaybackEngine, PlaybackEvent, Player};
use encore_sync::{AppContext, LibraryView, MediaFile, StorageMode};
use std::path::Path;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

// ============================================================================
// Output helpers
// ============================================================================

fn print_track(track: &Track) {
    println!(
        "  {:<12} {} - {} [{}] {}",
        track.id.as_str(),
        track.artist,
        track.title,
        track.album,
        format_duration(track.duration)
    );
}

fn print_playlist(playlist: &PlaylistWithTracks) {
    println!(
        "{} ({}) - {} tracks, {}",
        playlist.playlist.name,
        playlist.id().as_str(),
        playlist.tracks.len(),
        format_duration(u32::try_from(playlist.total_duration()).unwrap_or(u32::MAX))
    );
    if let Some(description) = &playlist.playlist.description {
        println!("  {}", description);
    }
    for track in &playlist.tracks {
        print_track(track);
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("m4a" | "mp4") => "audio/mp4",
        Some("flac") => "audio/flac",
        _ => "audio/mpeg",
    }
}

// ============================================================================
// Library
// ============================================================================

pub async fn library(app: &AppContext) -> anyhow::Result<()> {
    match app.library_view().await {
        LibraryView::SignInRequired => {
            println!("Sign in to see your library.");
        }
        LibraryView::Ready {
            playlists,
            liked_count,
        } => {
            println!("Liked songs: {}", liked_count);
            for track in app.liked_tracks().await {
                print_track(&track);
            }

            println!();
            if playlists.is_empty() {
                println!("No playlists yet.");
            }
            for playlist in &playlists {
                print_playlist(playlist);
            }

            let uploads = app.uploads().tracks().await;
            if !uploads.is_empty() {
                println!();
                println!("Uploaded tracks: {}", uploads.len());
                for uploaded in &uploads {
                    print_track(&uploaded.to_track());
                }
            }
        }
    }
    Ok(())
}

pub async fn search(app: &AppContext, query: &str) -> anyhow::Result<()> {
    let results = app.search(query).await;
    if results.is_empty() {
        println!("No results for \"{}\"", query);
        return Ok(());
    }

    if !results.tracks.is_empty() {
        println!("Tracks:");
        for track in &results.tracks {
            print_track(track);
        }
    }
    if !results.playlists.is_empty() {
        println!("Playlists:");
        for playlist in &results.playlists {
            print_playlist(playlist);
        }
    }
    Ok(())
}

// ============================================================================
// Playlists & likes
// ============================================================================

pub async fn create_playlist(
    app: &AppContext,
    name: &str,
    description: Option<&str>,
) -> anyhow::Result<()> {
    require_library(app).await?;
    let created = app.playlists().create_playlist(name, description).await?;
    println!("Created playlist {} ({})", created.playlist.name, created.id().as_str());
    Ok(())
}

pub async fn delete_playlist(app: &AppContext, id: &str) -> anyhow::Result<()> {
    require_library(app).await?;
    app.playlists()
        .delete_playlist(&PlaylistId::new(id))
        .await?;
    println!("Deleted playlist {}", id);
    Ok(())
}

pub async fn add_track(app: &AppContext, playlist_id: &str, track_id: &str) -> anyhow::Result<()> {
    require_library(app).await?;
    let position = app
        .playlists()
        .add_track_to_playlist(&PlaylistId::new(playlist_id), &TrackId::new(track_id))
        .await?;
    println!("Added {} to {} at position {}", track_id, playlist_id, position);
    Ok(())
}

pub async fn remove_track(
    app: &AppContext,
    playlist_id: &str,
    track_id: &str,
) -> anyhow::Result<()> {
    require_library(app).await?;
    app.playlists()
        .remove_track_from_playlist(&PlaylistId::new(playlist_id), &TrackId::new(track_id))
        .await?;
    println!("Removed {} from {}", track_id, playlist_id);
    Ok(())
}

pub async fn like(app: &AppContext, track_id: &str) -> anyhow::Result<()> {
    let liked = app.liked().toggle_like(&TrackId::new(track_id)).await?;
    if liked {
        println!("Liked {}", track_id);
    } else {
        println!("Unliked {}", track_id);
    }
    Ok(())
}

// ============================================================================
// Uploads
// ============================================================================

pub async fn upload(
    app: &AppContext,
    file: &Path,
    metadata: TrackMetadata,
    duration_secs: f64,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("track")
        .to_string();

    let audio = MediaFile::new(name, bytes, content_type_for(file));
    let stored = app
        .uploads()
        .upload_track(audio, None, &metadata, duration_secs)
        .await?;

    println!("Uploaded {} ({})", stored.title, stored.id.as_str());
    println!("  {}", stored.audio_url);
    Ok(())
}

pub async fn add_url(
    app: &AppContext,
    url: &str,
    metadata: TrackMetadata,
    download: bool,
    duration_secs: f64,
) -> anyhow::Result<()> {
    let mode = if download {
        StorageMode::Download
    } else {
        StorageMode::Stream
    };
    let stored = app
        .uploads()
        .add_track_from_url(url, None, &metadata, mode, duration_secs)
        .await?;

    println!("Added {} ({})", stored.title, stored.id.as_str());
    Ok(())
}

// ============================================================================
// Demo
// ============================================================================

fn describe(event: &PlaybackEvent) -> String {
    match event {
        PlaybackEvent::TrackChanged { track_id, .. } => format!("now playing {}", track_id),
        PlaybackEvent::PlayStateChanged { is_playing } => {
            if *is_playing { "playing" } else { "paused" }.to_string()
        }
        PlaybackEvent::PositionChanged {
            position_secs,
            duration_secs,
        } => format!(
            "{} / {}",
            format_duration(*position_secs as u32),
            format_duration(*duration_secs)
        ),
        PlaybackEvent::TrackFinished { track_id } => format!("finished {}", track_id),
        other => format!("{:?}", other),
    }
}

/// Play the demo catalog and print player events for `seconds`
///
/// With `near_end`, playback starts a few seconds before the end of the
/// first track so the hand-over to the next one is visible.
pub async fn demo(
    app: &AppContext,
    config: &EncoreConfig,
    seconds: u64,
    near_end: bool,
) -> anyhow::Result<()> {
    let queue = app.catalog().read().await.tracks().to_vec();
    let Some(first) = queue.first().cloned() else {
        anyhow::bail!("Catalog is empty");
    };

    let engine = PlaybackEngine::new(config.playback());
    let (player, mut events) = Player::new(engine, app.liked().clone());

    player.play_track(first.clone(), Some(queue)).await;
    if near_end {
        player
            .seek_to(f64::from(first.duration.saturating_sub(2)))
            .await;
    }
    player.toggle_like(&first.id).await?;

    let deadline = Instant::now() + Duration::from_secs(seconds);
    while let Ok(Some(event)) = timeout_at(deadline, events.recv()).await {
        println!("[player] {}", describe(&event));
    }

    let snapshot = player.snapshot().await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    println!(
        "Liked {}: {}",
        first.id,
        player.is_liked(&first.id).await
    );
    Ok(())
}
