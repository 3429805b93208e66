//! Test utilities for the backend crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`, via
//! the `test-support` feature).

pub mod memory {
    //! In-memory `Persistence` used as the reference implementation in the
    //! contract suite.
    //!
    //! Identifiers are decimal counters shared across collections. Ownership
    //! is not enforced, mirroring the document store.

    use std::sync::atomic::{AtomicU64, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Mutex;

    use crate::domain::ports::{BestEffort, Persistence, PersistenceError};
    use crate::domain::{
        DbVendor, Email, NewPlaylist, NewSong, NewUser, Playlist, PlaylistFilter, PlaylistId,
        PlaylistPair, PlaylistUpdate, Song, SongId, SongUpdate, User, UserId,
    };

    #[derive(Default)]
    struct Tables {
        users: Vec<User>,
        playlists: Vec<Playlist>,
        songs: Vec<Song>,
    }

    /// Vec-backed store; records are kept in creation order.
    #[derive(Default)]
    pub struct InMemoryPersistence {
        next_id: AtomicU64,
        tables: Mutex<Tables>,
    }

    impl InMemoryPersistence {
        /// Empty store.
        pub fn new() -> Self {
            Self::default()
        }

        fn next_id(&self) -> String {
            (self.next_id.fetch_add(1, Ordering::Relaxed) + 1).to_string()
        }

        fn invalid_id(error: impl std::fmt::Display) -> PersistenceError {
            PersistenceError::query(format!("generated id rejected: {error}"))
        }
    }

    #[async_trait]
    impl Persistence for InMemoryPersistence {
        fn vendor(&self) -> DbVendor {
            DbVendor::Mongo
        }

        async fn connect(&self) -> Result<(), PersistenceError> {
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), PersistenceError> {
            Ok(())
        }

        async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, PersistenceError> {
            let tables = self.tables.lock().await;
            Ok(tables.users.iter().find(|user| &user.id == id).cloned())
        }

        async fn get_user_by_email(
            &self,
            email: &Email,
        ) -> Result<Option<User>, PersistenceError> {
            let tables = self.tables.lock().await;
            Ok(tables.users.iter().find(|user| &user.email == email).cloned())
        }

        async fn create_user(&self, user: &NewUser) -> Result<User, PersistenceError> {
            let mut tables = self.tables.lock().await;
            if tables.users.iter().any(|existing| &existing.email == user.email()) {
                return Err(PersistenceError::conflict("duplicate key"));
            }
            let now = Utc::now();
            let created = User {
                id: UserId::new(self.next_id()).map_err(Self::invalid_id)?,
                first_name: user.first_name().to_owned(),
                last_name: user.last_name().to_owned(),
                email: user.email().clone(),
                password_hash: user.password_hash().clone(),
                playlist_ids: Vec::new(),
                created_at: now,
                updated_at: now,
            };
            tables.users.push(created.clone());
            Ok(created)
        }

        async fn append_user_playlist(
            &self,
            user_id: &UserId,
            playlist_id: &PlaylistId,
        ) -> BestEffort {
            let mut tables = self.tables.lock().await;
            let Some(user) = tables.users.iter_mut().find(|user| &user.id == user_id) else {
                return BestEffort::degraded("user not found");
            };
            if user.playlist_ids.contains(playlist_id) {
                return BestEffort::skipped("playlist already recorded");
            }
            user.playlist_ids.push(playlist_id.clone());
            user.updated_at = Utc::now();
            BestEffort::Applied
        }

        async fn create_playlist(
            &self,
            playlist: &NewPlaylist,
        ) -> Result<Playlist, PersistenceError> {
            let mut tables = self.tables.lock().await;
            let now = Utc::now();
            let created = Playlist {
                id: PlaylistId::new(self.next_id()).map_err(Self::invalid_id)?,
                name: playlist.name.clone(),
                owner_email: playlist.owner_email.clone(),
                songs: playlist.songs.clone(),
                created_at: now,
                updated_at: now,
            };
            tables.playlists.push(created.clone());
            Ok(created)
        }

        async fn get_playlist_by_id(
            &self,
            id: &PlaylistId,
        ) -> Result<Option<Playlist>, PersistenceError> {
            let tables = self.tables.lock().await;
            Ok(tables.playlists.iter().find(|p| &p.id == id).cloned())
        }

        async fn get_playlists(
            &self,
            filter: &PlaylistFilter,
        ) -> Result<Vec<Playlist>, PersistenceError> {
            let tables = self.tables.lock().await;
            Ok(tables
                .playlists
                .iter()
                .filter(|p| filter.matches(&p.owner_email, &p.name))
                .cloned()
                .collect())
        }

        async fn get_playlist_pairs(
            &self,
            filter: &PlaylistFilter,
        ) -> Result<Vec<PlaylistPair>, PersistenceError> {
            let tables = self.tables.lock().await;
            Ok(tables
                .playlists
                .iter()
                .filter(|p| filter.matches(&p.owner_email, &p.name))
                .map(PlaylistPair::from)
                .collect())
        }

        async fn update_playlist_by_id(
            &self,
            id: &PlaylistId,
            update: &PlaylistUpdate,
        ) -> Result<Option<Playlist>, PersistenceError> {
            let mut tables = self.tables.lock().await;
            let Some(playlist) = tables.playlists.iter_mut().find(|p| &p.id == id) else {
                return Ok(None);
            };
            if let Some(name) = &update.name {
                playlist.name = name.clone();
            }
            if let Some(songs) = &update.songs {
                playlist.songs = songs.clone();
            }
            playlist.updated_at = Utc::now();
            Ok(Some(playlist.clone()))
        }

        async fn delete_playlist_by_id(&self, id: &PlaylistId) -> Result<u64, PersistenceError> {
            let mut tables = self.tables.lock().await;
            let before = tables.playlists.len();
            tables.playlists.retain(|p| &p.id != id);
            Ok((before - tables.playlists.len()) as u64)
        }

        async fn get_songs(&self) -> Result<Vec<Song>, PersistenceError> {
            Ok(self.tables.lock().await.songs.clone())
        }

        async fn get_song_by_id(&self, id: &SongId) -> Result<Option<Song>, PersistenceError> {
            let tables = self.tables.lock().await;
            Ok(tables.songs.iter().find(|song| &song.id == id).cloned())
        }

        async fn create_song(&self, song: &NewSong) -> Result<Song, PersistenceError> {
            let mut tables = self.tables.lock().await;
            let now = Utc::now();
            let created = Song {
                id: SongId::new(self.next_id()).map_err(Self::invalid_id)?,
                title: song.title().to_owned(),
                artist: song.artist().to_owned(),
                year: song.year(),
                you_tube_id: song.you_tube_id().to_owned(),
                listens: 0,
                playlist_count: 0,
                owner_id: song.owner_id().clone(),
                created_at: now,
                updated_at: now,
            };
            tables.songs.push(created.clone());
            Ok(created)
        }

        async fn update_song_by_id(
            &self,
            id: &SongId,
            update: &SongUpdate,
        ) -> Result<Option<Song>, PersistenceError> {
            let mut tables = self.tables.lock().await;
            let Some(song) = tables.songs.iter_mut().find(|song| &song.id == id) else {
                return Ok(None);
            };
            update.apply_to(song);
            song.updated_at = Utc::now();
            Ok(Some(song.clone()))
        }

        async fn delete_song_by_id(&self, id: &SongId) -> Result<u64, PersistenceError> {
            let mut tables = self.tables.lock().await;
            let before = tables.songs.len();
            tables.songs.retain(|song| &song.id != id);
            Ok((before - tables.songs.len()) as u64)
        }
    }
}
