//! Song catalog use cases.
//!
//! Anyone signed in may browse or add songs; only the user who added a song
//! may change or remove it.

use std::sync::Arc;

use crate::domain::ports::Persistence;
use crate::domain::{
    AuthenticatedPrincipal, Error, NewSong, ServiceResult, Song, SongId, SongUpdate,
    SongValidationError,
};

/// Decoded payload for [`SongCatalogService::create_song`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSongRequest {
    pub title: String,
    pub artist: String,
    pub year: i32,
    pub you_tube_id: String,
}

/// Catalog service over any [`Persistence`] driver.
pub struct SongCatalogService<P: ?Sized> {
    store: Arc<P>,
}

impl<P: ?Sized> Clone for SongCatalogService<P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<P: ?Sized> SongCatalogService<P> {
    /// Create a service backed by `store`.
    pub fn new(store: Arc<P>) -> Self {
        Self { store }
    }
}

impl<P> SongCatalogService<P>
where
    P: Persistence + ?Sized,
{
    /// Every song in the catalog, unfiltered.
    pub async fn list_songs(&self) -> ServiceResult<Vec<Song>> {
        Ok(self.store.get_songs().await?)
    }

    /// Add a song owned by the principal. Counters start at zero.
    pub async fn create_song(
        &self,
        principal: &AuthenticatedPrincipal,
        request: NewSongRequest,
    ) -> ServiceResult<Song> {
        let song = NewSong::new(
            request.title,
            request.artist,
            request.year,
            request.you_tube_id,
            principal.user_id().clone(),
        )
        .map_err(invalid_song)?;
        Ok(self.store.create_song(&song).await?)
    }

    /// Apply `update` to a song the principal owns.
    /// 
    /// Unknown songs yield not-found; songs owned by others yield forbidden.
    pub async fn update_song(
        &self,
        principal: &AuthenticatedPrincipal,
        id: &SongId,
        update: SongUpdate,
    ) -> ServiceResult<Song> {
        self.load_owned(principal, id).await?;
        self.store
            .update_song_by_id(id, &update)
            .await?
            .ok_or_else(|| song_not_found(id))
    }

    /// Remove a song the principal owns.
    pub async fn delete_song(
        &self,
        principal: &AuthenticatedPrincipal,
        id: &SongId,
    ) -> ServiceResult<()> {
        self.load_owned(principal, id).await?;
        match self.store.delete_song_by_id(id).await? {
            0 => Err(song_not_found(id)),
            _ => Ok(()),
        }
    }

    async fn load_owned(
        &self,
        principal: &AuthenticatedPrincipal,
        id: &SongId,
    ) -> ServiceResult<Song> {
        let song = self
            .store
            .get_song_by_id(id)
            .await?
            .ok_or_else(|| song_not_found(id))?;
        if !principal.is_user(&song.owner_id) {
            return Err(Error::forbidden("song belongs to another user"));
        }
        Ok(song)
    }
}

fn song_not_found(id: &SongId) -> Error {
    Error::not_found(format!("song {id} not found"))
}

fn invalid_song(error: SongValidationError) -> Error {
    Error::invalid_request(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockPersistence, PersistenceError};
    use crate::domain::{Email, ErrorCode, UserId};
    use chrono::Utc;
    use rstest::{fixture, rstest};

    const OWNER_ID: &str = "u-1";

    #[fixture]
    fn principal() -> AuthenticatedPrincipal {
        AuthenticatedPrincipal::new(
            UserId::new(OWNER_ID).expect("id"),
            Email::new("joe@shmo.com").expect("email"),
        )
    }

    fn stored_song(owner: &str) -> Song {
        let now = Utc::now();
        Song {
            id: SongId::new("s-1").expect("id"),
            title: "Fast Car".into(),
            artist: "Tracy Chapman".into(),
            year: 1988,
            you_tube_id: "AIOAlaACuv4".into(),
            listens: 0,
            playlist_count: 0,
            owner_id: UserId::new(owner).expect("id"),
            created_at: now,
            updated_at: now,
        }
    }

    fn request(title: &str) -> NewSongRequest {
        NewSongRequest {
            title: title.into(),
            artist: "Tracy Chapman".into(),
            year: 1988,
            you_tube_id: "AIOAlaACuv4".into(),
        }
    }

    fn song_id() -> SongId {
        SongId::new("s-1").expect("id")
    }

    #[rstest]
    #[tokio::test]
    async fn create_assigns_principal_as_owner(principal: AuthenticatedPrincipal) {
        let mut store = MockPersistence::new();
        store
            .expect_create_song()
            .withf(|song| song.owner_id().as_str() == OWNER_ID && song.title() == "Fast Car")
            .times(1)
            .return_once(|_| Ok(stored_song(OWNER_ID)));

        let song = SongCatalogService::new(Arc::new(store))
            .create_song(&principal, request("Fast Car"))
            .await
            .expect("create succeeds");
        assert_eq!(song.listens, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn create_rejects_blank_title_before_storage(principal: AuthenticatedPrincipal) {
        let mut store = MockPersistence::new();
        store.expect_create_song().never();

        let error = SongCatalogService::new(Arc::new(store))
            .create_song(&principal, request(" "))
            .await
            .expect_err("invalid");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[case(OWNER_ID, None)]
    #[case("u-2", Some(ErrorCode::Forbidden))]
    #[tokio::test]
    async fn update_is_restricted_to_owner(
        principal: AuthenticatedPrincipal,
        #[case] owner: &'static str,
        #[case] expected: Option<ErrorCode>,
    ) {
        let mut store = MockPersistence::new();
        store
            .expect_get_song_by_id()
            .return_once(move |_| Ok(Some(stored_song(owner))));
        store
            .expect_update_song_by_id()
            .times(usize::from(expected.is_none()))
            .return_once(|_, _| Ok(Some(stored_song(OWNER_ID))));

        let result = SongCatalogService::new(Arc::new(store))
            .update_song(&principal, &song_id(), SongUpdate::default().listens(5))
            .await;
        assert_eq!(result.err().map(|error| error.code()), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn delete_missing_song_is_not_found(principal: AuthenticatedPrincipal) {
        let mut store = MockPersistence::new();
        store.expect_get_song_by_id().return_once(|_| Ok(None));
        store.expect_delete_song_by_id().never();

        let error = SongCatalogService::new(Arc::new(store))
            .delete_song(&principal, &song_id())
            .await
            .expect_err("missing");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn list_maps_connection_errors() {
        let mut store = MockPersistence::new();
        store
            .expect_get_songs()
            .return_once(|| Err(PersistenceError::connection("not connected")));

        let error = SongCatalogService::new(Arc::new(store))
            .list_songs()
            .await
            .expect_err("unavailable");
        assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    }
}
