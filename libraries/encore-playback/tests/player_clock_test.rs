//! Player clock tests
//!
//! Runs with Tokio's paused clock so ticks are deterministic. Assertions are
//! made at half-second offsets between ticks.

use encore_core::{MemoryBackend, Track, TrackId, User, UserId};
use encore_playback::{PlaybackEngine, PlaybackEvent, Player};
use encore_sync::{LikedSongs, NoticeLog, Session};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::sleep;

// ===== Helpers =====

struct Harness {
    player: Player,
    events: UnboundedReceiver<PlaybackEvent>,
    backend: Arc<MemoryBackend>,
}

fn harness(signed_in: bool) -> Harness {
    let backend = Arc::new(MemoryBackend::new());
    let session = if signed_in {
        Session::signed_in(User::new(UserId::new("u1"), "listener@encore.fm"))
    } else {
        Session::new()
    };
    let liked = Arc::new(LikedSongs::new(
        backend.clone(),
        Arc::new(session),
        Arc::new(NoticeLog::new()),
    ));
    let (player, events) = Player::new(PlaybackEngine::default(), liked);
    Harness {
        player,
        events,
        backend,
    }
}

fn placeholder(id: &str, duration: u32) -> Track {
    Track::new(id, id.to_uppercase(), "Glass Anchors", duration)
}

async fn advance(secs: f64) {
    sleep(Duration::from_secs_f64(secs)).await;
}

fn drain(events: &mut UnboundedReceiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

async fn current_id(player: &Player) -> Option<String> {
    player
        .get_current_track()
        .await
        .map(|t| t.id.as_str().to_string())
}

// ===== Clock =====

#[tokio::test(start_paused = true)]
async fn clock_advances_once_per_second() {
    let h = harness(false);
    h.player.play_track(placeholder("a", 60), None).await;

    advance(0.5).await;
    assert_eq!(h.player.get_position().await, 0.0);

    advance(1.0).await;
    assert_eq!(h.player.get_position().await, 1.0);

    advance(2.0).await;
    assert_eq!(h.player.get_position().await, 3.0);
}

#[tokio::test(start_paused = true)]
async fn short_track_moves_on_after_its_duration() {
    let mut h = harness(false);
    let queue = vec![placeholder("a", 3), placeholder("b", 3)];
    h.player.play_track(queue[0].clone(), Some(queue)).await;

    advance(3.5).await;
    assert_eq!(current_id(&h.player).await.as_deref(), Some("a"));
    assert_eq!(h.player.get_position().await, 3.0);

    // The fourth tick sees the end and moves on
    advance(1.0).await;
    assert_eq!(current_id(&h.player).await.as_deref(), Some("b"));
    assert_eq!(h.player.get_position().await, 0.0);
    assert!(h.player.is_playing().await);

    let events = drain(&mut h.events);
    assert!(events.contains(&PlaybackEvent::TrackFinished {
        track_id: TrackId::new("a")
    }));

    // The new track gets a fresh clock
    advance(1.0).await;
    assert_eq!(h.player.get_position().await, 1.0);
}

#[tokio::test(start_paused = true)]
async fn repeat_one_loops_the_same_track() {
    let h = harness(false);
    let queue = vec![placeholder("a", 2), placeholder("b", 2)];
    h.player.play_track(queue[0].clone(), Some(queue)).await;
    h.player.toggle_repeat().await;
    h.player.toggle_repeat().await;

    // Ticks at 1, 2 advance; tick at 3 restarts
    advance(3.5).await;
    assert_eq!(current_id(&h.player).await.as_deref(), Some("a"));
    assert_eq!(h.player.get_position().await, 0.0);

    advance(1.0).await;
    assert_eq!(h.player.get_position().await, 1.0);
    assert_eq!(current_id(&h.player).await.as_deref(), Some("a"));
}

#[tokio::test(start_paused = true)]
async fn pause_stops_the_clock() {
    let h = harness(false);
    h.player.play_track(placeholder("a", 60), None).await;

    advance(2.5).await;
    h.player.toggle_play().await;
    assert!(!h.player.clock_active().await);

    advance(10.0).await;
    assert_eq!(h.player.get_position().await, 2.0);
}

#[tokio::test(start_paused = true)]
async fn audio_tracks_are_not_clock_driven() {
    let h = harness(false);
    let track = placeholder("a", 60).with_audio_url("https://cdn.encore.fm/a.mp3");
    h.player.play_track(track, None).await;

    advance(5.5).await;
    assert!(!h.player.clock_active().await);
    assert_eq!(h.player.get_position().await, 0.0);

    h.player.report_position(12.0).await;
    assert_eq!(h.player.get_position().await, 12.0);
}

#[tokio::test(start_paused = true)]
async fn resume_never_runs_two_clocks() {
    let h = harness(false);
    h.player.play_track(placeholder("a", 60), None).await;

    for _ in 0..5 {
        h.player.toggle_play().await;
        h.player.toggle_play().await;
    }

    advance(1.5).await;
    assert_eq!(h.player.get_position().await, 1.0);
    advance(1.0).await;
    assert_eq!(h.player.get_position().await, 2.0);
}

#[tokio::test(start_paused = true)]
async fn changing_repeat_restarts_the_period() {
    let h = harness(false);
    h.player.play_track(placeholder("a", 60), None).await;

    advance(0.5).await;
    h.player.toggle_repeat().await;

    // New clock started at 0.5, first tick at 1.5
    advance(0.75).await;
    assert_eq!(h.player.get_position().await, 0.0);
    advance(0.5).await;
    assert_eq!(h.player.get_position().await, 1.0);
}

// ===== Likes =====

#[tokio::test]
async fn likes_go_through_the_sync_layer() {
    let h = harness(true);
    let track = TrackId::new("demo-1");

    assert!(h.player.toggle_like(&track).await.unwrap());
    assert!(h.player.is_liked(&track).await);
    assert_eq!(h.backend.liked_rows(&UserId::new("u1")).await, vec![track]);
}

#[tokio::test]
async fn signed_out_like_is_rejected() {
    let h = harness(false);
    let err = h.player.toggle_like(&TrackId::new("demo-1")).await.unwrap_err();

    assert!(err.is_auth_required());
    assert!(h.backend.calls().await.is_empty());
}
