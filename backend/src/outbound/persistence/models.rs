//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the relational driver and must
//! never be exposed to the domain. Conversions into domain records live here
//! so the driver only shuttles rows.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::ports::PersistenceError;
use crate::domain::{
    Email, PasswordHash, Playlist, PlaylistId, PlaylistName, PlaylistPair, PlaylistSong, Song,
    SongId, User, UserId,
};

use super::schema::{playlists, songs, users};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

impl TryFrom<UserRow> for User {
    type Error = PersistenceError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: decode(UserId::new(row.id.to_string()), "users.id")?,
            first_name: row.first_name,
            last_name: row.last_name,
            email: decode(Email::new(row.email), "users.email")?,
            password_hash: decode(PasswordHash::new(row.password_hash), "users.password_hash")?,
            playlist_ids: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Playlists
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = playlists)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PlaylistRow {
    pub id: i64,
    pub name: String,
    pub owner_email: String,
    pub songs: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing projection; omits the songs column.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = playlists)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PlaylistPairRow {
    pub id: i64,
    pub name: String,
    pub owner_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = playlists)]
pub(crate) struct NewPlaylistRow<'a> {
    pub name: &'a str,
    pub owner_email: &'a str,
    pub songs: serde_json::Value,
}

/// Partial playlist update; `None` fields are left untouched. `updated_at`
/// is set by the driver from the database clock.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = playlists)]
pub(crate) struct PlaylistChangeset<'a> {
    pub name: Option<&'a str>,
    pub songs: Option<serde_json::Value>,
}

impl TryFrom<PlaylistRow> for Playlist {
    type Error = PersistenceError;

    fn try_from(row: PlaylistRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: decode(PlaylistId::new(row.id.to_string()), "playlists.id")?,
            name: decode(PlaylistName::new(row.name), "playlists.name")?,
            owner_email: decode(Email::new(row.owner_email), "playlists.owner_email")?,
            songs: songs_from_json(row.songs)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<PlaylistPairRow> for PlaylistPair {
    type Error = PersistenceError;

    fn try_from(row: PlaylistPairRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: decode(PlaylistId::new(row.id.to_string()), "playlists.id")?,
            name: decode(PlaylistName::new(row.name), "playlists.name")?,
            owner_email: decode(Email::new(row.owner_email), "playlists.owner_email")?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Encode a playlist's songs for the `songs` JSONB column.
pub(crate) fn songs_to_json(
    songs: &[PlaylistSong],
) -> Result<serde_json::Value, PersistenceError> {
    serde_json::to_value(songs)
        .map_err(|error| PersistenceError::validation(format!("songs not serialisable: {error}")))
}

fn songs_from_json(value: serde_json::Value) -> Result<Vec<PlaylistSong>, PersistenceError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value)
        .map_err(|error| PersistenceError::query(format!("malformed playlists.songs: {error}")))
}

// ---------------------------------------------------------------------------
// Songs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = songs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SongRow {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub year: i32,
    pub you_tube_id: String,
    pub listens: i32,
    pub playlist_count: i32,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = songs)]
pub(crate) struct NewSongRow<'a> {
    pub title: &'a str,
    pub artist: &'a str,
    pub year: i32,
    pub you_tube_id: &'a str,
    pub owner_id: &'a str,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = songs)]
pub(crate) struct SongChangeset<'a> {
    pub title: Option<&'a str>,
    pub artist: Option<&'a str>,
    pub year: Option<i32>,
    pub you_tube_id: Option<&'a str>,
    pub listens: Option<i32>,
    pub playlist_count: Option<i32>,
}

impl TryFrom<SongRow> for Song {
    type Error = PersistenceError;

    fn try_from(row: SongRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: decode(SongId::new(row.id.to_string()), "songs.id")?,
            title: row.title,
            artist: row.artist,
            year: row.year,
            you_tube_id: row.you_tube_id,
            listens: counter_from_db(row.listens),
            playlist_count: counter_from_db(row.playlist_count),
            owner_id: decode(UserId::new(row.owner_id), "songs.owner_id")?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Counters are stored as `INTEGER` with a non-negative check.
fn counter_from_db(value: i32) -> u32 {
    u32::try_from(value).unwrap_or_default()
}

/// Counters above `i32::MAX` are rejected rather than wrapped.
pub(crate) fn counter_to_db(value: u32) -> Result<i32, PersistenceError> {
    i32::try_from(value)
        .map_err(|_| PersistenceError::validation(format!("counter {value} out of range")))
}

fn decode<T, E>(value: Result<T, E>, column: &str) -> Result<T, PersistenceError>
where
    E: std::fmt::Display,
{
    value.map_err(|error| PersistenceError::query(format!("invalid {column}: {error}")))
}
