//! PostgreSQL-backed `Persistence` implementation using Diesel.
//!
//! Identifiers are `BIGSERIAL` values rendered as decimal strings. An id that
//! does not parse as `i64` cannot name a row, so it is reported as not found.

use async_trait::async_trait;
use diesel::dsl::now;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::ports::{BestEffort, Persistence, PersistenceError};
use crate::domain::{
    DbVendor, Email, NewPlaylist, NewSong, NewUser, Playlist, PlaylistFilter, PlaylistId,
    PlaylistPair, PlaylistUpdate, Song, SongId, SongUpdate, User, UserId,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{
    NewPlaylistRow, NewSongRow, NewUserRow, PlaylistChangeset, PlaylistPairRow, PlaylistRow,
    SongChangeset, SongRow, UserRow, counter_to_db, songs_to_json,
};
use super::pool::{DbPool, PoolConfig};
use super::schema::{playlists, songs, users};
use super::schema_sync::sync_schema;

/// Relational driver holding one `bb8` pool per process.
pub struct DieselPersistence {
    config: PoolConfig,
    pool: RwLock<Option<DbPool>>,
}

impl DieselPersistence {
    /// Create a disconnected driver; call `connect` before use.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            pool: RwLock::new(None),
        }
    }

    async fn pool(&self) -> Result<DbPool, PersistenceError> {
        self.pool
            .read()
            .await
            .clone()
            .ok_or_else(|| PersistenceError::connection("PostgreSQL driver is not connected"))
    }
}

fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

/// `ILIKE` pattern matching names that start with `prefix` literally.
fn prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for ch in prefix.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn apply_filter<'a, ST>(
    mut query: playlists::BoxedQuery<'a, Pg, ST>,
    filter: &'a PlaylistFilter,
) -> playlists::BoxedQuery<'a, Pg, ST> {
    if let Some(owner) = filter.owner_email() {
        query = query.filter(playlists::owner_email.eq(owner.as_str()));
    }
    if let Some(prefix) = filter.name_prefix() {
        query = query.filter(playlists::name.ilike(prefix_pattern(prefix)));
    }
    query
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, PersistenceError>
where
    T: TryFrom<R, Error = PersistenceError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl Persistence for DieselPersistence {
    fn vendor(&self) -> DbVendor {
        DbVendor::Sql
    }

    async fn connect(&self) -> Result<(), PersistenceError> {
        let existing = self.pool.read().await.clone();
        let pool = match existing {
            Some(pool) => pool,
            None => DbPool::new(self.config.clone())
                .await
                .map_err(map_pool_error)?,
        };

        {
            let mut conn = pool.get().await.map_err(map_pool_error)?;
            diesel::sql_query("SELECT 1")
                .execute(&mut conn)
                .await
                .map_err(|error| {
                    PersistenceError::connection(map_diesel_error(error).to_string())
                })?;
            sync_schema(&mut conn).await?;
        }

        *self.pool.write().await = Some(pool);
        info!(url = %self.config.redacted_url(), "connected to PostgreSQL");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), PersistenceError> {
        if self.pool.write().await.take().is_some() {
            info!("disconnected from PostgreSQL");
        }
        Ok(())
    }

    async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, PersistenceError> {
        let Some(id) = parse_id(id.as_str()) else {
            return Ok(None);
        };
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .find(id)
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(User::try_from).transpose()
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, PersistenceError> {
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(User::try_from).transpose()
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, PersistenceError> {
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(map_pool_error)?;

        let new_row = NewUserRow {
            first_name: user.first_name(),
            last_name: user.last_name(),
            email: user.email().as_str(),
            password_hash: user.password_hash().expose(),
        };
        let row: UserRow = diesel::insert_into(users::table)
            .values(&new_row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        User::try_from(row)
    }

    /// Stamp `owner_id` on the playlist row.
    async fn append_user_playlist(&self, user_id: &UserId, playlist_id: &PlaylistId) -> BestEffort {
        let (Some(owner), Some(id)) = (parse_id(user_id.as_str()), parse_id(playlist_id.as_str()))
        else {
            return BestEffort::degraded("identifiers are not relational ids");
        };
        let pool = match self.pool().await {
            Ok(pool) => pool,
            Err(error) => return BestEffort::degraded(error.to_string()),
        };
        let mut conn = match pool.get().await {
            Ok(conn) => conn,
            Err(error) => return BestEffort::degraded(error.to_string()),
        };

        let updated = diesel::update(playlists::table.find(id))
            .set(playlists::owner_id.eq(Some(owner)))
            .execute(&mut conn)
            .await;
        match updated {
            Ok(0) => BestEffort::skipped("playlist not found"),
            Ok(_) => BestEffort::Applied,
            Err(error) => {
                let error = map_diesel_error(error);
                warn!(%user_id, %playlist_id, %error, "owner_id update failed");
                BestEffort::degraded(error.to_string())
            }
        }
    }

    async fn create_playlist(&self, playlist: &NewPlaylist) -> Result<Playlist, PersistenceError> {
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(map_pool_error)?;

        let new_row = NewPlaylistRow {
            name: playlist.name.as_str(),
            owner_email: playlist.owner_email.as_str(),
            songs: songs_to_json(&playlist.songs)?,
        };
        let row: PlaylistRow = diesel::insert_into(playlists::table)
            .values(&new_row)
            .returning(PlaylistRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Playlist::try_from(row)
    }

    async fn get_playlist_by_id(
        &self,
        id: &PlaylistId,
    ) -> Result<Option<Playlist>, PersistenceError> {
        let Some(id) = parse_id(id.as_str()) else {
            return Ok(None);
        };
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(map_pool_error)?;

        let row: Option<PlaylistRow> = playlists::table
            .find(id)
            .select(PlaylistRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Playlist::try_from).transpose()
    }

    async fn get_playlists(
        &self,
        filter: &PlaylistFilter,
    ) -> Result<Vec<Playlist>, PersistenceError> {
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(map_pool_error)?;

        let query = playlists::table
            .select(PlaylistRow::as_select())
            .order(playlists::id.asc())
            .into_boxed();
        let rows: Vec<PlaylistRow> = apply_filter(query, filter)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_all(rows)
    }

    async fn get_playlist_pairs(
        &self,
        filter: &PlaylistFilter,
    ) -> Result<Vec<PlaylistPair>, PersistenceError> {
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(map_pool_error)?;

        let query = playlists::table
            .select(PlaylistPairRow::as_select())
            .order(playlists::id.asc())
            .into_boxed();
        let rows: Vec<PlaylistPairRow> = apply_filter(query, filter)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_all(rows)
    }

    async fn update_playlist_by_id(
        &self,
        id: &PlaylistId,
        update: &PlaylistUpdate,
    ) -> Result<Option<Playlist>, PersistenceError> {
        let Some(id) = parse_id(id.as_str()) else {
            return Ok(None);
        };
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(map_pool_error)?;

        let changeset = PlaylistChangeset {
            name: update.name.as_ref().map(|name| name.as_str()),
            songs: update.songs.as_deref().map(songs_to_json).transpose()?,
        };
        let row: Option<PlaylistRow> = diesel::update(playlists::table.find(id))
            .set((&changeset, playlists::updated_at.eq(now)))
            .returning(PlaylistRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Playlist::try_from).transpose()
    }

    async fn delete_playlist_by_id(&self, id: &PlaylistId) -> Result<u64, PersistenceError> {
        let Some(id) = parse_id(id.as_str()) else {
            return Ok(0);
        };
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(map_pool_error)?;

        let removed = diesel::delete(playlists::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        debug!(playlist_id = id, removed, "playlist delete");
        Ok(removed as u64)
    }

    async fn get_songs(&self) -> Result<Vec<Song>, PersistenceError> {
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<SongRow> = songs::table
            .select(SongRow::as_select())
            .order(songs::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_all(rows)
    }

    async fn get_song_by_id(&self, id: &SongId) -> Result<Option<Song>, PersistenceError> {
        let Some(id) = parse_id(id.as_str()) else {
            return Ok(None);
        };
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(map_pool_error)?;

        let row: Option<SongRow> = songs::table
            .find(id)
            .select(SongRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Song::try_from).transpose()
    }

    async fn create_song(&self, song: &NewSong) -> Result<Song, PersistenceError> {
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(map_pool_error)?;

        let new_row = NewSongRow {
            title: song.title(),
            artist: song.artist(),
            year: song.year(),
            you_tube_id: song.you_tube_id(),
            owner_id: song.owner_id().as_str(),
        };
        let row: SongRow = diesel::insert_into(songs::table)
            .values(&new_row)
            .returning(SongRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Song::try_from(row)
    }

    async fn update_song_by_id(
        &self,
        id: &SongId,
        update: &SongUpdate,
    ) -> Result<Option<Song>, PersistenceError> {
        let Some(id) = parse_id(id.as_str()) else {
            return Ok(None);
        };
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(map_pool_error)?;

        let changeset = SongChangeset {
            title: update.new_title(),
            artist: update.new_artist(),
            year: update.new_year(),
            you_tube_id: update.new_you_tube_id(),
            listens: update.new_listens().map(counter_to_db).transpose()?,
            playlist_count: update.new_playlist_count().map(counter_to_db).transpose()?,
        };
        let row: Option<SongRow> = diesel::update(songs::table.find(id))
            .set((&changeset, songs::updated_at.eq(now)))
            .returning(SongRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Song::try_from).transpose()
    }

    async fn delete_song_by_id(&self, id: &SongId) -> Result<u64, PersistenceError> {
        let Some(id) = parse_id(id.as_str()) else {
            return Ok(0);
        };
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(map_pool_error)?;

        let removed = diesel::delete(songs::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(removed as u64)
    }
}
