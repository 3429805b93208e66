//! Playlist data model and query filters.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Email, PlaylistId};

/// Validation errors returned by playlist constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistValidationError {
    EmptyName,
}

impl fmt::Display for PlaylistValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "playlist name must not be empty"),
        }
    }
}

impl std::error::Error for PlaylistValidationError {}

/// Non-empty playlist name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlaylistName(String);

impl PlaylistName {
    /// Validate and construct a [`PlaylistName`].
    pub fn new(name: impl Into<String>) -> Result<Self, PlaylistValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PlaylistValidationError::EmptyName);
        }
        Ok(Self(name))
    }

    /// Borrow the name text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Append a suffix separated by a single space; the result stays non-empty.
    pub(crate) fn suffixed(&self, suffix: &str) -> Self {
        Self(format!("{} {suffix}", self.0))
    }
}

impl AsRef<str> for PlaylistName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for PlaylistName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<PlaylistName> for String {
    fn from(value: PlaylistName) -> Self {
        value.0
    }
}

impl TryFrom<String> for PlaylistName {
    type Error = PlaylistValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Song embedded in a playlist.
///
/// Embedded songs are copies, not references: editing the catalog entry a song
/// was picked from never changes playlists that already contain it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSong {
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub you_tube_id: String,
}

/// Stored playlist record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(alias = "_id")]
    pub id: PlaylistId,
    pub name: PlaylistName,
    pub owner_email: Email,
    #[serde(default)]
    pub songs: Vec<PlaylistSong>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation payload for a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlaylist {
    pub name: PlaylistName,
    pub owner_email: Email,
    pub songs: Vec<PlaylistSong>,
}

impl NewPlaylist {
    /// Start a playlist with no songs.
    pub fn new(name: PlaylistName, owner_email: Email) -> Self {
        Self {
            name,
            owner_email,
            songs: Vec::new(),
        }
    }

    /// Replace the embedded songs.
    /// Replace the whole song list.
    pub fn with_songs(mut self, songs: Vec<PlaylistSong>) -> Self {
        self.songs = songs;
        self
    }
}

/// Partial update applied by `update_playlist_by_id`.
///
/// Fields left as `None` are not touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistUpdate {
    pub name: Option<PlaylistName>,
    pub songs: Option<Vec<PlaylistSong>>,
}

impl PlaylistUpdate {
    /// Rename the playlist.
    pub fn with_name(mut self, name: PlaylistName) -> Self {
        self.name = Some(name);
        self
    }

    /// Replace the whole song list.
    pub fn with_songs(mut self, songs: Vec<PlaylistSong>) -> Self {
        self.songs = Some(songs);
        self
    }
}

/// Listing filter for playlists.
///
/// An empty name prefix is treated as no prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistFilter {
    owner_email: Option<Email>,
    name_prefix: Option<String>,
}

impl PlaylistFilter {
    /// Match every playlist.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to playlists owned by `email` (exact match).
    pub fn owned_by(mut self, email: Email) -> Self {
        self.owner_email = Some(email);
        self
    }

    /// Restrict to names starting with `prefix`, ignoring case.
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    /// Owner restriction, if any.
    pub fn owner_email(&self) -> Option<&Email> {
        self.owner_email.as_ref()
    }

    /// Name prefix restriction; an empty prefix reads as none.
    pub fn name_prefix(&self) -> Option<&str> {
        self.name_prefix.as_deref().filter(|prefix| !prefix.is_empty())
    }

    /// Evaluate the filter against a playlist held in memory.
    pub fn matches(&self, owner_email: &Email, name: &PlaylistName) -> bool {
        let owner_matches = self
            .owner_email()
            .is_none_or(|wanted| wanted == owner_email);
        let prefix_matches = self
            .name_prefix()
            .is_none_or(|prefix| starts_with_ignore_case(name.as_str(), prefix));
        owner_matches && prefix_matches
    }
}

fn starts_with_ignore_case(name: &str, prefix: &str) -> bool {
    name.to_lowercase().starts_with(&prefix.to_lowercase())
}

/// Lightweight listing projection of a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistPair {
    #[serde(alias = "_id")]
    pub id: PlaylistId,
    pub name: PlaylistName,
    pub owner_email: Email,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Playlist> for PlaylistPair {
    fn from(playlist: &Playlist) -> Self {
        Self {
            id: playlist.id.clone(),
            name: playlist.name.clone(),
            owner_email: playlist.owner_email.clone(),
            created_at: playlist.created_at,
            updated_at: playlist.updated_at,
        }
    }
}
