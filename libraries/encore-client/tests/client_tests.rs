//! Tests for the Encore backend client.
//!
//! These tests use mock servers to verify client behavior without
//! requiring a real backend.

use encore_client::{ClientConfig, ClientError, EncoreClient};
use encore_core::{
    AuthProvider, CreatePlaylist, CreateTrack, EncoreError, ObjectStorage, PlaylistId,
    PlaylistTrack, RemoteStore, SignUp, TrackId, UserId,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "anon-key";

fn client_for(server: &MockServer) -> EncoreClient {
    EncoreClient::new(ClientConfig::new(server.uri(), API_KEY)).unwrap()
}

fn signed_in_client(server: &MockServer) -> EncoreClient {
    EncoreClient::new(ClientConfig::with_tokens(
        server.uri(),
        API_KEY,
        "access-123",
        None,
    ))
    .unwrap()
}

fn session_json() -> serde_json::Value {
    json!({
        "access_token": "access-123",
        "refresh_token": "refresh-456",
        "token_type": "bearer",
        "expires_in": 3600,
        "user": {
            "id": "user-1",
            "email": "listener@encore.fm",
            "user_metadata": { "display_name": "Listener" }
        }
    })
}

fn playlist_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": "user-1",
        "name": name,
        "description": null,
        "cover_url": null,
        "is_public": false,
        "created_at": "2024-03-01T10:00:00Z",
        "updated_at": "2024-03-01T10:00:00Z"
    })
}

// =============================================================================
// Client Config Tests
// =============================================================================

mod client_config {
    use super::*;

    #[test]
    fn test_new_has_no_tokens() {
        let config = ClientConfig::new("https://abc.example.co", API_KEY);
        assert_eq!(config.url, "https://abc.example.co");
        assert!(config.access_token.is_none());
        assert!(config.refresh_token.is_none());
    }

    #[test]
    fn test_empty_url_rejected() {
        match EncoreClient::new(ClientConfig::new("", API_KEY)) {
            Err(ClientError::InvalidConfig(msg)) => assert!(msg.contains("empty")),
            other => panic!("Expected InvalidConfig error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_url_without_scheme_rejected() {
        match EncoreClient::new(ClientConfig::new("abc.example.co", API_KEY)) {
            Err(ClientError::InvalidConfig(msg)) => {
                assert!(msg.contains("http://") || msg.contains("https://"));
            }
            other => panic!("Expected InvalidConfig error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_tokens_from_config() {
        let client = EncoreClient::new(ClientConfig::with_tokens(
            "https://abc.example.co",
            API_KEY,
            "tok",
            Some("ref".to_string()),
        ))
        .unwrap();

        assert!(client.is_authenticated().await);
        assert_eq!(
            client.get_tokens().await,
            (Some("tok".to_string()), Some("ref".to_string()))
        );
    }
}

// =============================================================================
// Authentication Tests
// =============================================================================

mod authentication {
    use super::*;

    #[tokio::test]
    async fn test_successful_sign_in() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", API_KEY))
            .and(body_json(json!({
                "email": "listener@encore.fm",
                "password": "secret1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let user = client.sign_in("listener@encore.fm", "secret1").await.unwrap();

        assert_eq!(user.id, UserId::new("user-1"));
        assert_eq!(user.display_name.as_deref(), Some("Listener"));
        assert!(client.is_authenticated().await);
        assert_eq!(
            client.get_tokens().await,
            (
                Some("access-123".to_string()),
                Some("refresh-456".to_string())
            )
        );
    }

    #[tokio::test]
    async fn test_sign_in_invalid_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        match AuthProvider::sign_in(&client, "listener@encore.fm", "wrong").await {
            Err(EncoreError::AuthFailed(msg)) => assert_eq!(msg, "Invalid login credentials"),
            other => panic!("Expected AuthFailed, got {:?}", other),
        }
        assert!(!client.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_sign_up_sends_display_name() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(body_json(json!({
                "email": "new@encore.fm",
                "password": "secret1",
                "data": { "display_name": "Newcomer" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json()))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let form = SignUp {
            email: "new@encore.fm".into(),
            password: "secret1".into(),
            display_name: "Newcomer".into(),
        };
        AuthProvider::sign_up(&client, &form).await.unwrap();
        assert!(client.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_sign_up_pending_confirmation_has_no_session() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "user-2",
                "email": "new@encore.fm",
                "user_metadata": {}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let user = client.sign_up("new@encore.fm", "secret1", "New").await.unwrap();

        assert_eq!(user.id, UserId::new("user-2"));
        assert!(!client.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_sign_up_existing_account() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(json!({ "code": 422, "msg": "User already registered" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        match client.sign_up("taken@encore.fm", "secret1", "Taken").await {
            Err(ClientError::AuthFailed(msg)) => assert!(msg.contains("already registered")),
            other => panic!("Expected AuthFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sign_out_revokes_and_clears() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("authorization", "Bearer access-123"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = signed_in_client(&server);
        client.sign_out().await.unwrap();
        assert!(!client.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_sign_out_clears_tokens_on_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = signed_in_client(&server);
        assert!(client.sign_out().await.is_err());
        assert!(!client.is_authenticated().await);
    }
}

// =============================================================================
// Row Tests
// =============================================================================

mod rows {
    use super::*;

    #[tokio::test]
    async fn test_liked_ids_filter_by_user() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/liked_songs"))
            .and(query_param("select", "track_id"))
            .and(query_param("user_id", "eq.user-1"))
            .and(header("apikey", API_KEY))
            .and(header("authorization", "Bearer access-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "track_id": "demo-1" },
                { "track_id": "demo-3" }
            ])))
            .mount(&server)
            .await;

        let client = signed_in_client(&server);
        let ids = client
            .get_liked_track_ids(&UserId::new("user-1"))
            .await
            .unwrap();
        assert_eq!(ids, vec![TrackId::new("demo-1"), TrackId::new("demo-3")]);
    }

    #[tokio::test]
    async fn test_api_key_is_bearer_before_sign_in() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/tracks"))
            .and(header("authorization", "Bearer anon-key"))
            .and(query_param("order", "created_at.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.get_uploaded_tracks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_and_delete_liked() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/liked_songs"))
            .and(header("prefer", "return=minimal"))
            .and(body_json(json!({ "user_id": "user-1", "track_id": "demo-2" })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/rest/v1/liked_songs"))
            .and(query_param("user_id", "eq.user-1"))
            .and(query_param("track_id", "eq.demo-2"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = signed_in_client(&server);
        let user = UserId::new("user-1");
        let track = TrackId::new("demo-2");
        client.insert_liked(&user, &track).await.unwrap();
        client.delete_liked(&user, &track).await.unwrap();
    }

    #[tokio::test]
    async fn test_playlists_newest_first() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/playlists"))
            .and(query_param("user_id", "eq.user-1"))
            .and(query_param("order", "created_at.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                playlist_json("pl-2", "Late Night"),
                playlist_json("pl-1", "Road Trip")
            ])))
            .mount(&server)
            .await;

        let client = signed_in_client(&server);
        let playlists = client
            .get_user_playlists(&UserId::new("user-1"))
            .await
            .unwrap();

        let names: Vec<_> = playlists.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Late Night", "Road Trip"]);
    }

    #[tokio::test]
    async fn test_create_playlist_returns_stored_row() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/playlists"))
            .and(header("prefer", "return=representation"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!([playlist_json("pl-9", "Road Trip")])),
            )
            .mount(&server)
            .await;

        let client = signed_in_client(&server);
        let create = CreatePlaylist::new(UserId::new("user-1"), "Road Trip", None);
        let stored = client.create_playlist(create).await.unwrap();

        assert_eq!(stored.id, PlaylistId::new("pl-9"));
        assert_eq!(stored.name, "Road Trip");
    }

    #[tokio::test]
    async fn test_max_position() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/playlist_tracks"))
            .and(query_param("playlist_id", "eq.pl-1"))
            .and(query_param("select", "position"))
            .and(query_param("order", "position.desc"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "position": 4 }])))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/playlist_tracks"))
            .and(query_param("playlist_id", "eq.pl-empty"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = signed_in_client(&server);
        assert_eq!(
            client.get_max_position(&PlaylistId::new("pl-1")).await.unwrap(),
            Some(4)
        );
        assert_eq!(
            client
                .get_max_position(&PlaylistId::new("pl-empty"))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_playlist_membership_rows() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/playlist_tracks"))
            .and(query_param("order", "position.asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "playlist_id": "pl-1", "track_id": "demo-1", "position": 0 },
                { "playlist_id": "pl-1", "track_id": "demo-4", "position": 1 }
            ])))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/playlist_tracks"))
            .and(body_json(json!({
                "playlist_id": "pl-1",
                "track_id": "demo-5",
                "position": 2
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = signed_in_client(&server);
        let playlist = PlaylistId::new("pl-1");
        let rows = client.get_playlist_tracks(&playlist).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].track_id, TrackId::new("demo-4"));

        client
            .add_playlist_track(PlaylistTrack::new(playlist, TrackId::new("demo-5"), 2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_track() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/tracks"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
                "id": "trk-1",
                "user_id": "user-1",
                "title": "Tidewater",
                "artist": "Glass Anchors",
                "album": null,
                "duration": 201,
                "cover_url": null,
                "audio_url": "https://abc.example.co/storage/v1/object/public/song/user-1/1-a.mp3",
                "created_at": "2024-03-01T10:00:00Z",
                "updated_at": "2024-03-01T10:00:00Z"
            }])))
            .mount(&server)
            .await;

        let client = signed_in_client(&server);
        let stored = client
            .create_track(CreateTrack {
                user_id: UserId::new("user-1"),
                title: "Tidewater".into(),
                artist: "Glass Anchors".into(),
                album: None,
                duration: 201,
                cover_url: None,
                audio_url: "https://abc.example.co/storage/v1/object/public/song/user-1/1-a.mp3"
                    .into(),
            })
            .await
            .unwrap();

        assert_eq!(stored.id, TrackId::new("trk-1"));
        assert_eq!(stored.to_track().album, encore_core::UNKNOWN_ALBUM);
    }
}

// =============================================================================
// Status Mapping Tests
// =============================================================================

mod status_mapping {
    use super::*;

    async fn failing_server(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/playlists"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_unauthorized_requires_auth() {
        let server = failing_server(ResponseTemplate::new(401)).await;
        let client = signed_in_client(&server);

        let err = client
            .get_user_playlists(&UserId::new("user-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, EncoreError::AuthRequired));
    }

    #[tokio::test]
    async fn test_not_found() {
        let server = failing_server(ResponseTemplate::new(404)).await;
        let client = signed_in_client(&server);

        let err = client
            .get_user_playlists(&UserId::new("user-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, EncoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_rate_limited_reads_retry_after() {
        let server =
            failing_server(ResponseTemplate::new(429).insert_header("Retry-After", "17")).await;
        let client = signed_in_client(&server);

        let err = client
            .get_user_playlists(&UserId::new("user-1"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("17 seconds"));
    }

    #[tokio::test]
    async fn test_server_error_keeps_message() {
        let server = failing_server(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "message": "relation \"playlists\" does not exist" })),
        )
        .await;
        let client = signed_in_client(&server);

        match client.get_user_playlists(&UserId::new("user-1")).await {
            Err(EncoreError::Remote(msg)) => {
                assert!(msg.contains("500"));
                assert!(msg.contains("does not exist"));
            }
            other => panic!("Expected Remote error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let client = EncoreClient::new(ClientConfig::new("http://127.0.0.1:1", API_KEY)).unwrap();

        let err = client
            .get_user_playlists(&UserId::new("user-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, EncoreError::Network(_)));
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let server = failing_server(ResponseTemplate::new(200).set_body_string("not json")).await;
        let client = signed_in_client(&server);

        match client.get_user_playlists(&UserId::new("user-1")).await {
            Err(EncoreError::Remote(msg)) => assert!(msg.contains("Failed to parse")),
            other => panic!("Expected Remote error, got {:?}", other),
        }
    }
}

// =============================================================================
// Storage Tests
// =============================================================================

mod storage {
    use super::*;

    #[tokio::test]
    async fn test_upload_posts_bytes() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/storage/v1/object/song/user-1/1700000000000-my%20song.mp3"))
            .and(header("content-type", "audio/mpeg"))
            .and(header("x-upsert", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Key": "song/user-1/1700000000000-my song.mp3"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = signed_in_client(&server);
        let stored = ObjectStorage::upload(
            &client,
            "song",
            "user-1/1700000000000-my song.mp3",
            vec![1, 2, 3],
            "audio/mpeg",
        )
        .await
        .unwrap();
        assert_eq!(stored, "user-1/1700000000000-my song.mp3");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].body, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_public_url() {
        let client = EncoreClient::new(ClientConfig::new("https://abc.example.co/", API_KEY)).unwrap();
        assert_eq!(
            client.public_url("album-covers", "user-1/1-cover.png"),
            "https://abc.example.co/storage/v1/object/public/album-covers/user-1/1-cover.png"
        );
    }

    #[tokio::test]
    async fn test_fetch_reports_content_type() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/files/track.ogg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/ogg")
                    .set_body_bytes(vec![7u8; 16]),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let fetched = client
            .fetch(&format!("{}/files/track.ogg", server.uri()))
            .await
            .unwrap();

        assert_eq!(fetched.bytes.len(), 16);
        assert_eq!(fetched.content_type.as_deref(), Some("audio/ogg"));
    }

    #[tokio::test]
    async fn test_fetch_missing_file() {
        let server = MockServer::start().await;
        let client = client_for(&server);

        let err = client
            .fetch(&format!("{}/files/missing.mp3", server.uri()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
