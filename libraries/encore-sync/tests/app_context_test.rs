//! End-to-end flows through `AppContext` against the in-memory backend

use encore_core::{
    CreateTrack, MemoryBackend, RemoteStore, SignUp, TrackCatalog, TrackId, UserId,
};
use encore_sync::{AppContext, Backend, LibraryView, NoticeLog, PlaylistView, SyncError};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    backend: Arc<MemoryBackend>,
    notices: Arc<NoticeLog>,
    app: AppContext,
}

async fn harness() -> Harness {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .register("listener@example.com", "secret1", Some("Listener"))
        .await;
    let notices = Arc::new(NoticeLog::new());
    let app = AppContext::new(
        Backend::memory(backend.clone()),
        TrackCatalog::demo(),
        notices.clone(),
    );
    Harness {
        backend,
        notices,
        app,
    }
}

#[tokio::test]
async fn library_flow_from_signed_out_to_new_playlist() {
    let h = harness().await;

    assert_eq!(h.app.library_view().await, LibraryView::SignInRequired);

    h.app
        .sign_in("listener@example.com", "secret1")
        .await
        .unwrap();
    match h.app.library_view().await {
        LibraryView::Ready {
            playlists,
            liked_count,
        } => {
            assert!(playlists.is_empty());
            assert_eq!(liked_count, 0);
        }
        LibraryView::SignInRequired => panic!("expected a signed-in library"),
    }

    h.app
        .playlists()
        .create_playlist("Existing", None)
        .await
        .unwrap();
    let created = h
        .app
        .playlists()
        .create_playlist("Road Trip", None)
        .await
        .unwrap();
    assert!(created.tracks.is_empty());

    let LibraryView::Ready { playlists, .. } = h.app.library_view().await else {
        panic!("expected a signed-in library");
    };
    assert_eq!(playlists[0].playlist.name, "Road Trip");
    assert_eq!(playlists[1].playlist.name, "Existing");

    let notice = h.notices.last().unwrap();
    assert_eq!(notice.title, "Playlist created");
    assert!(!notice.is_error());
}

#[tokio::test]
async fn sign_in_loads_existing_data_and_sign_out_clears_it() {
    let h = harness().await;
    h.app
        .sign_in("listener@example.com", "secret1")
        .await
        .unwrap();

    let mix = h
        .app
        .playlists()
        .create_playlist("Mix", None)
        .await
        .unwrap();
    h.app
        .playlists()
        .add_track_to_playlist(mix.id(), &TrackId::new("demo-3"))
        .await
        .unwrap();
    h.app
        .liked()
        .toggle_like(&TrackId::new("demo-1"))
        .await
        .unwrap();

    h.app.sign_out().await.unwrap();
    assert_eq!(h.app.library_view().await, LibraryView::SignInRequired);
    assert_eq!(h.app.liked().count().await, 0);
    assert!(matches!(
        h.app.playlists().playlist_view(mix.id()).await,
        PlaylistView::NotFound { .. }
    ));

    // A fresh sign-in reads everything back from the store
    h.app
        .sign_in("listener@example.com", "secret1")
        .await
        .unwrap();
    assert!(h.app.liked().is_liked(&TrackId::new("demo-1")).await);
    let PlaylistView::Found(mix) = h.app.playlists().playlist_view(mix.id()).await else {
        panic!("playlist should be loaded");
    };
    assert_eq!(mix.tracks[0].title, "Copper Rain");

    let liked = h.app.liked_tracks().await;
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0].title, "Neon Harbor");
}

#[tokio::test]
async fn bad_credentials_are_reported() {
    let h = harness().await;

    let err = h
        .app
        .sign_in("not-an-email", "")
        .await
        .unwrap_err();
    let SyncError::Validation(errors) = err else {
        panic!("expected validation errors");
    };
    assert_eq!(errors.len(), 2);
    assert!(h.backend.calls().await.is_empty());

    assert!(h
        .app
        .sign_in("listener@example.com", "wrong")
        .await
        .is_err());
    assert_eq!(h.notices.last().unwrap().title, "Sign in failed");
    assert!(h.app.current_user().is_none());
}

#[tokio::test]
async fn sign_up_starts_a_session() {
    let h = harness().await;
    let form = SignUp {
        email: "new@example.com".to_string(),
        password: "hunter22".to_string(),
        display_name: "Newcomer".to_string(),
    };

    let user = h.app.sign_up(&form).await.unwrap();
    assert_eq!(user.display_name.as_deref(), Some("Newcomer"));
    assert!(h.app.session().is_signed_in());
    assert_eq!(h.notices.last().unwrap().title, "Welcome to Encore!");

    h.app.sign_out().await.unwrap();
    assert!(h.app.sign_up(&form).await.is_err());
    assert_eq!(h.notices.last().unwrap().title, "Account exists");
}

#[tokio::test]
async fn search_covers_catalog_and_playlists() {
    let h = harness().await;
    h.app
        .sign_in("listener@example.com", "secret1")
        .await
        .unwrap();
    h.app
        .playlists()
        .create_playlist("Harbor walks", Some("Evening set"))
        .await
        .unwrap();

    let results = h.app.search("harbor").await;
    assert_eq!(results.tracks.len(), 2);
    assert_eq!(results.playlists.len(), 1);
    assert!(h.app.search("").await.is_empty());
}

#[tokio::test]
async fn remote_failures_never_leave_partial_state() {
    let h = harness().await;
    h.app
        .sign_in("listener@example.com", "secret1")
        .await
        .unwrap();
    let mix = h
        .app
        .playlists()
        .create_playlist("Mix", None)
        .await
        .unwrap();
    let before = h.app.library_view().await;

    h.backend.set_fail_writes(true).await;
    let _ = h.app.liked().toggle_like(&TrackId::new("demo-2")).await;
    let _ = h.app.playlists().create_playlist("Another", None).await;
    let _ = h.app.playlists().delete_playlist(mix.id()).await;

    assert_eq!(h.app.library_view().await, before);
    let errors = h.notices.notices().into_iter().filter(|n| n.is_error()).count();
    assert_eq!(errors, 3);
}

#[tokio::test(start_paused = true)]
async fn late_rollback_does_not_leak_into_next_session() {
    let h = harness().await;
    h.backend.register("second@example.com", "secret2", None).await;
    h.app
        .sign_in("listener@example.com", "secret1")
        .await
        .unwrap();

    let demo = TrackId::new("demo-1");
    h.app.liked().toggle_like(&demo).await.unwrap();
    let private = h
        .app
        .playlists()
        .create_playlist("First user only", None)
        .await
        .unwrap();

    h.backend.set_latency(Some(Duration::from_secs(1))).await;
    h.backend.set_fail_writes(true).await;

    let unlike = {
        let liked = Arc::clone(h.app.liked());
        let demo = demo.clone();
        tokio::spawn(async move { liked.toggle_like(&demo).await })
    };
    let delete = {
        let playlists = Arc::clone(h.app.playlists());
        let id = private.id().clone();
        tokio::spawn(async move { playlists.delete_playlist(&id).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Both requests are still in flight when the user changes
    h.backend.set_latency(None).await;
    let _ = h.app.sign_out().await;
    h.app
        .sign_in("second@example.com", "secret2")
        .await
        .unwrap();

    assert!(unlike.await.unwrap().is_err());
    assert!(delete.await.unwrap().is_err());

    assert_eq!(
        h.app.current_user().unwrap().email,
        "second@example.com"
    );
    assert!(!h.app.liked().is_liked(&demo).await);
    assert_eq!(h.app.liked().count().await, 0);
    assert!(h.app.playlists().playlists().await.is_empty());
    assert!(matches!(
        h.app.playlists().playlist_view(private.id()).await,
        PlaylistView::NotFound { .. }
    ));
}

#[tokio::test]
async fn signed_out_refresh_loads_uploads_only() {
    let h = harness().await;
    assert!(!h.app.liked().is_loading());
    assert!(!h.app.playlists().is_loading());
    assert!(!h.app.uploads().is_loading());

    h.backend
        .create_track(CreateTrack {
            user_id: UserId::new("someone"),
            title: "Harbor Lights".to_string(),
            artist: "Open Mic".to_string(),
            album: None,
            duration: 180,
            cover_url: None,
            audio_url: "memory://song/someone/1-harbor.mp3".to_string(),
        })
        .await
        .unwrap();

    h.app.refresh().await;

    assert_eq!(h.app.library_view().await, LibraryView::SignInRequired);
    assert_eq!(h.app.uploads().tracks().await.len(), 1);
    assert!(!h.app.uploads().is_loading());
    assert_eq!(h.app.search("open mic").await.tracks.len(), 1);
}
