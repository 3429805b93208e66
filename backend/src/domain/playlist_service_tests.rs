//! Tests for the playlist service.

use std::sync::Arc;

use super::*;
use crate::domain::ports::{MockPersistence, PersistenceError};
use crate::domain::{ErrorCode, PasswordHash, User};
use chrono::Utc;
use rstest::{fixture, rstest};

const OWNER_EMAIL: &str = "joe@shmo.com";
const OWNER_ID: &str = "u-1";

fn email(raw: &str) -> Email {
    Email::new(raw).expect("valid email")
}

fn name(raw: &str) -> PlaylistName {
    PlaylistName::new(raw).expect("valid name")
}

fn playlist_id(raw: &str) -> PlaylistId {
    PlaylistId::new(raw).expect("valid id")
}

fn user(id: &str, address: &str) -> User {
    let now = Utc::now();
    User {
        id: UserId::new(id).expect("valid id"),
        first_name: "Joe".into(),
        last_name: "Shmo".into(),
        email: email(address),
        password_hash: PasswordHash::new("hash").expect("hash"),
        playlist_ids: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

fn song(title: &str) -> PlaylistSong {
    PlaylistSong {
        title: title.into(),
        artist: "Band".into(),
        year: Some(1999),
        you_tube_id: "yt".into(),
    }
}

fn stored_playlist(id: &str, playlist_name: &str) -> Playlist {
    let now = Utc::now();
    Playlist {
        id: playlist_id(id),
        name: name(playlist_name),
        owner_email: email(OWNER_EMAIL),
        songs: vec![song("One"), song("Two")],
        created_at: now,
        updated_at: now,
    }
}

fn pair(playlist_name: &str) -> PlaylistPair {
    PlaylistPair::from(&stored_playlist("p-x", playlist_name))
}

#[fixture]
fn principal() -> AuthenticatedPrincipal {
    AuthenticatedPrincipal::new(UserId::new(OWNER_ID).expect("id"), email(OWNER_EMAIL))
}

fn make_service(store: MockPersistence) -> PlaylistService<MockPersistence> {
    PlaylistService::new(Arc::new(store))
}

/// Expect the playlist lookup and owner lookup performed by ownership checks.
fn expect_owned_by(store: &mut MockPersistence, playlist: Playlist, owner_id: &'static str) {
    store
        .expect_get_playlist_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(playlist)));
    store
        .expect_get_user_by_email()
        .withf(|address| address.as_str() == OWNER_EMAIL)
        .times(1)
        .return_once(move |address| Ok(Some(user(owner_id, address.as_str()))));
}

#[rstest]
#[tokio::test]
async fn create_defaults_owner_to_principal(principal: AuthenticatedPrincipal) {
    let mut store = MockPersistence::new();
    store
        .expect_create_playlist()
        .withf(|payload| payload.owner_email.as_str() == OWNER_EMAIL && payload.songs.len() == 1)
        .times(1)
        .return_once(|_| Ok(stored_playlist("p-1", "Mix")));
    store
        .expect_append_user_playlist()
        .withf(|user_id, id| user_id.as_str() == OWNER_ID && id.as_str() == "p-1")
        .times(1)
        .return_once(|_, _| BestEffort::Unsupported);

    let request = NewPlaylistRequest {
        name: name("Mix"),
        owner_email: None,
        songs: vec![song("One")],
    };
    let created = make_service(store)
        .create_playlist(&principal, request)
        .await
        .expect("create succeeds");
    assert_eq!(created.id.as_str(), "p-1");
}

#[rstest]
#[tokio::test]
async fn create_ignores_degraded_append(principal: AuthenticatedPrincipal) {
    let mut store = MockPersistence::new();
    store
        .expect_create_playlist()
        .return_once(|_| Ok(stored_playlist("p-1", "Mix")));
    store
        .expect_append_user_playlist()
        .return_once(|_, _| BestEffort::degraded("user document missing"));

    let request = NewPlaylistRequest {
        name: name("Mix"),
        owner_email: None,
        songs: Vec::new(),
    };
    make_service(store)
        .create_playlist(&principal, request)
        .await
        .expect("degraded append is not an error");
}

#[rstest]
#[tokio::test]
async fn create_surfaces_store_rejections(principal: AuthenticatedPrincipal) {
    let mut store = MockPersistence::new();
    store
        .expect_create_playlist()
        .return_once(|_| Err(PersistenceError::validation("owner must exist")));
    store.expect_append_user_playlist().never();

    let request = NewPlaylistRequest {
        name: name("Mix"),
        owner_email: Some(email("ghost@nowhere.com")),
        songs: Vec::new(),
    };
    let error = make_service(store)
        .create_playlist(&principal, request)
        .await
        .expect_err("validation error");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn get_returns_owned_playlist(principal: AuthenticatedPrincipal) {
    let mut store = MockPersistence::new();
    expect_owned_by(&mut store, stored_playlist("p-1", "Mix"), OWNER_ID);

    let playlist = make_service(store)
        .get_playlist(&principal, &playlist_id("p-1"))
        .await
        .expect("owner can read");
    assert_eq!(playlist.name.as_str(), "Mix");
}

#[rstest]
#[tokio::test]
async fn get_missing_playlist_is_not_found(principal: AuthenticatedPrincipal) {
    let mut store = MockPersistence::new();
    store
        .expect_get_playlist_by_id()
        .return_once(|_| Ok(None));
    store.expect_get_user_by_email().never();

    let error = make_service(store)
        .get_playlist(&principal, &playlist_id("missing"))
        .await
        .expect_err("not found");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn other_owners_are_forbidden(principal: AuthenticatedPrincipal) {
    let mut store = MockPersistence::new();
    expect_owned_by(&mut store, stored_playlist("p-1", "Mix"), "u-2");
    store.expect_delete_playlist_by_id().never();

    let error = make_service(store)
        .delete_playlist(&principal, &playlist_id("p-1"))
        .await
        .expect_err("forbidden");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn unknown_owner_is_forbidden(principal: AuthenticatedPrincipal) {
    let mut store = MockPersistence::new();
    store
        .expect_get_playlist_by_id()
        .return_once(|_| Ok(Some(stored_playlist("p-1", "Mix"))));
    store
        .expect_get_user_by_email()
        .return_once(|_| Ok(None));

    let error = make_service(store)
        .get_playlist(&principal, &playlist_id("p-1"))
        .await
        .expect_err("forbidden");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn update_returns_refreshed_record(principal: AuthenticatedPrincipal) {
    let mut store = MockPersistence::new();
    expect_owned_by(&mut store, stored_playlist("p-1", "Mix"), OWNER_ID);
    store
        .expect_update_playlist_by_id()
        .withf(|id, update| {
            id.as_str() == "p-1"
                && update.name.as_ref().map(PlaylistName::as_str) == Some("Renamed")
                && update.songs.is_none()
        })
        .times(1)
        .return_once(|_, _| Ok(Some(stored_playlist("p-1", "Renamed"))));

    let updated = make_service(store)
        .update_playlist(
            &principal,
            &playlist_id("p-1"),
            PlaylistUpdate::default().with_name(name("Renamed")),
        )
        .await
        .expect("update succeeds");
    assert_eq!(updated.name.as_str(), "Renamed");
}

#[rstest]
#[tokio::test]
async fn update_racing_delete_is_not_found(principal: AuthenticatedPrincipal) {
    let mut store = MockPersistence::new();
    expect_owned_by(&mut store, stored_playlist("p-1", "Mix"), OWNER_ID);
    store
        .expect_update_playlist_by_id()
        .return_once(|_, _| Ok(None));

    let error = make_service(store)
        .update_playlist(&principal, &playlist_id("p-1"), PlaylistUpdate::default())
        .await
        .expect_err("gone");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[case(1, None)]
#[case(0, Some(ErrorCode::NotFound))]
#[tokio::test]
async fn delete_reports_removed_count(
    principal: AuthenticatedPrincipal,
    #[case] removed: u64,
    #[case] expected: Option<ErrorCode>,
) {
    let mut store = MockPersistence::new();
    expect_owned_by(&mut store, stored_playlist("p-1", "Mix"), OWNER_ID);
    store
        .expect_delete_playlist_by_id()
        .times(1)
        .return_once(move |_| Ok(removed));

    let result = make_service(store)
        .delete_playlist(&principal, &playlist_id("p-1"))
        .await;
    assert_eq!(result.err().map(|error| error.code()), expected);
}

#[rstest]
#[tokio::test]
async fn pairs_are_scoped_to_principal(principal: AuthenticatedPrincipal) {
    let mut store = MockPersistence::new();
    store
        .expect_get_user_by_id()
        .withf(|id| id.as_str() == OWNER_ID)
        .return_once(|_| Ok(Some(user(OWNER_ID, OWNER_EMAIL))));
    store
        .expect_get_playlist_pairs()
        .withf(|filter| {
            filter.owner_email().map(Email::as_str) == Some(OWNER_EMAIL)
                && filter.name_prefix().is_none()
        })
        .return_once(|_| Ok(vec![pair("Mix"), pair("Chill")]));

    let pairs = make_service(store)
        .playlist_pairs(&principal)
        .await
        .expect("pairs");
    assert_eq!(pairs.len(), 2);
}

#[tokio::test]
async fn empty_listing_is_not_found() {
    let mut store = MockPersistence::new();
    store
        .expect_get_playlists()
        .withf(|filter| filter.name_prefix() == Some("road"))
        .return_once(|_| Ok(Vec::new()));

    let error = make_service(store)
        .list_playlists(Some("road"))
        .await
        .expect_err("nothing stored");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn copy_uses_next_free_name_and_clones_songs(principal: AuthenticatedPrincipal) {
    let mut store = MockPersistence::new();
    expect_owned_by(&mut store, stored_playlist("p-1", "Road Trip"), OWNER_ID);
    store
        .expect_get_playlist_pairs()
        .times(1)
        .return_once(|_| Ok(vec![pair("Road Trip"), pair("Road Trip (copy)")]));
    store
        .expect_create_playlist()
        .withf(|payload| {
            payload.name.as_str() == "Road Trip (copy 2)"
                && payload.owner_email.as_str() == OWNER_EMAIL
                && payload.songs.len() == 2
        })
        .times(1)
        .return_once(|_| Ok(stored_playlist("p-2", "Road Trip (copy 2)")));
    store
        .expect_append_user_playlist()
        .times(1)
        .return_once(|_, _| BestEffort::Applied);

    let copy = make_service(store)
        .copy_playlist(&principal, &playlist_id("p-1"))
        .await
        .expect("copy succeeds");
    assert_eq!(copy.id.as_str(), "p-2");
}

#[rstest]
#[tokio::test]
async fn copy_survives_name_probe_failure(principal: AuthenticatedPrincipal) {
    let mut store = MockPersistence::new();
    expect_owned_by(&mut store, stored_playlist("p-1", "Road Trip"), OWNER_ID);
    store
        .expect_get_playlist_pairs()
        .return_once(|_| Err(PersistenceError::query("cursor killed")));
    store
        .expect_create_playlist()
        .withf(|payload| payload.name.as_str() == "Road Trip (copy)")
        .times(1)
        .return_once(|_| Ok(stored_playlist("p-2", "Road Trip (copy)")));
    store
        .expect_append_user_playlist()
        .return_once(|_, _| BestEffort::degraded("user missing"));

    let copy = make_service(store)
        .copy_playlist(&principal, &playlist_id("p-1"))
        .await
        .expect("copy proceeds");
    assert_eq!(copy.name.as_str(), "Road Trip (copy)");
}

#[rstest]
#[tokio::test]
async fn copy_requires_ownership(principal: AuthenticatedPrincipal) {
    let mut store = MockPersistence::new();
    expect_owned_by(&mut store, stored_playlist("p-1", "Road Trip"), "u-9");
    store.expect_create_playlist().never();

    let error = make_service(store)
        .copy_playlist(&principal, &playlist_id("p-1"))
        .await
        .expect_err("forbidden");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}
