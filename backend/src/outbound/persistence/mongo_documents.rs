//! BSON document shapes stored by the MongoDB driver.
//!
//! Field names are camelCase and identifiers live in `_id`, matching the
//! collections written by earlier releases of the application.

use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::domain::ports::PersistenceError;
use crate::domain::{
    Email, PasswordHash, Playlist, PlaylistId, PlaylistName, PlaylistPair, PlaylistSong, Song,
    SongId, User, UserId,
};

pub(crate) const USERS: &str = "users";
pub(crate) const PLAYLISTS: &str = "playlists";
pub(crate) const SONGS: &str = "songs";

fn epoch() -> bson::DateTime {
    bson::DateTime::from_millis(0)
}

fn from_bson_time(value: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or_default()
}

fn require_id(id: Option<ObjectId>, collection: &str) -> Result<String, PersistenceError> {
    id.map(|oid| oid.to_hex())
        .ok_or_else(|| PersistenceError::query(format!("{collection} document without _id")))
}

fn decode<T, E>(value: Result<T, E>, field: &str) -> Result<T, PersistenceError>
where
    E: std::fmt::Display,
{
    value.map_err(|error| PersistenceError::query(format!("invalid {field}: {error}")))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    /// Owned playlist ids; absent on users created before the field existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlists: Option<Vec<ObjectId>>,
    #[serde(default = "epoch")]
    pub created_at: bson::DateTime,
    #[serde(default = "epoch")]
    pub updated_at: bson::DateTime,
}

impl TryFrom<UserDocument> for User {
    type Error = PersistenceError;

    fn try_from(document: UserDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: decode(UserId::new(require_id(document.id, USERS)?), "users._id")?,
            first_name: document.first_name,
            last_name: document.last_name,
            email: decode(Email::new(document.email), "users.email")?,
            password_hash: decode(
                PasswordHash::new(document.password_hash),
                "users.passwordHash",
            )?,
            playlist_ids: document
                .playlists
                .unwrap_or_default()
                .into_iter()
                .map(|oid| decode(PlaylistId::new(oid.to_hex()), "users.playlists"))
                .collect::<Result<_, _>>()?,
            created_at: from_bson_time(document.created_at),
            updated_at: from_bson_time(document.updated_at),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaylistDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub owner_email: String,
    #[serde(default)]
    pub songs: Vec<PlaylistSong>,
    #[serde(default = "epoch")]
    pub created_at: bson::DateTime,
    #[serde(default = "epoch")]
    pub updated_at: bson::DateTime,
}

impl TryFrom<PlaylistDocument> for Playlist {
    type Error = PersistenceError;

    fn try_from(document: PlaylistDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: decode(
                PlaylistId::new(require_id(document.id, PLAYLISTS)?),
                "playlists._id",
            )?,
            name: decode(PlaylistName::new(document.name), "playlists.name")?,
            owner_email: decode(Email::new(document.owner_email), "playlists.ownerEmail")?,
            songs: document.songs,
            created_at: from_bson_time(document.created_at),
            updated_at: from_bson_time(document.updated_at),
        })
    }
}

/// Listing projection read with `clone_with_type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaylistPairDocument {
    #[serde(rename = "_id", default)]
    pub id: Option<ObjectId>,
    pub name: String,
    pub owner_email: String,
    #[serde(default = "epoch")]
    pub created_at: bson::DateTime,
    #[serde(default = "epoch")]
    pub updated_at: bson::DateTime,
}

impl TryFrom<PlaylistPairDocument> for PlaylistPair {
    type Error = PersistenceError;

    fn try_from(document: PlaylistPairDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: decode(
                PlaylistId::new(require_id(document.id, PLAYLISTS)?),
                "playlists._id",
            )?,
            name: decode(PlaylistName::new(document.name), "playlists.name")?,
            owner_email: decode(Email::new(document.owner_email), "playlists.ownerEmail")?,
            created_at: from_bson_time(document.created_at),
            updated_at: from_bson_time(document.updated_at),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SongDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub artist: String,
    pub year: i32,
    pub you_tube_id: String,
    #[serde(default)]
    pub listens: i64,
    #[serde(default)]
    pub playlist_count: i64,
    pub owner_id: String,
    #[serde(default = "epoch")]
    pub created_at: bson::DateTime,
    #[serde(default = "epoch")]
    pub updated_at: bson::DateTime,
}

fn counter(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

impl TryFrom<SongDocument> for Song {
    type Error = PersistenceError;

    fn try_from(document: SongDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: decode(SongId::new(require_id(document.id, SONGS)?), "songs._id")?,
            title: document.title,
            artist: document.artist,
            year: document.year,
            you_tube_id: document.you_tube_id,
            listens: counter(document.listens),
            playlist_count: counter(document.playlist_count),
            owner_id: decode(UserId::new(document.owner_id), "songs.ownerId")?,
            created_at: from_bson_time(document.created_at),
            updated_at: from_bson_time(document.updated_at),
        })
    }
}
