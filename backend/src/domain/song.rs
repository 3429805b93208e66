//! Song catalog data model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SongId, UserId};

/// Validation errors returned by song constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SongValidationError {
    EmptyTitle,
    EmptyArtist,
    EmptyYouTubeId,
}

impl fmt::Display for SongValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "song title must not be empty"),
            Self::EmptyArtist => write!(f, "song artist must not be empty"),
            Self::EmptyYouTubeId => write!(f, "song YouTube id must not be empty"),
        }
    }
}

impl std::error::Error for SongValidationError {}

fn require(value: String, error: SongValidationError) -> Result<String, SongValidationError> {
    if value.trim().is_empty() {
        Err(error)
    } else {
        Ok(value)
    }
}

/// Stored catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    #[serde(alias = "_id")]
    pub id: SongId,
    pub title: String,
    pub artist: String,
    pub year: i32,
    pub you_tube_id: String,
    pub listens: u32,
    pub playlist_count: u32,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation payload for a catalog entry; counters start at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSong {
    title: String,
    artist: String,
    year: i32,
    you_tube_id: String,
    owner_id: UserId,
}

impl NewSong {
    /// Validate and construct a catalog entry owned by `owner_id`.
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        year: i32,
        you_tube_id: impl Into<String>,
        owner_id: UserId,
    ) -> Result<Self, SongValidationError> {
        Ok(Self {
            title: require(title.into(), SongValidationError::EmptyTitle)?,
            artist: require(artist.into(), SongValidationError::EmptyArtist)?,
            year,
            you_tube_id: require(you_tube_id.into(), SongValidationError::EmptyYouTubeId)?,
            owner_id,
        })
    }

    /// Song title, trimmed and non-empty.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Performing artist.
    pub fn artist(&self) -> &str {
        self.artist.as_str()
    }

    /// Release year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// YouTube video identifier.
    pub fn you_tube_id(&self) -> &str {
        self.you_tube_id.as_str()
    }

    /// User who added the song.
    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }
}

/// Partial update for a catalog entry. Ownership cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongUpdate {
    title: Option<String>,
    artist: Option<String>,
    year: Option<i32>,
    you_tube_id: Option<String>,
    listens: Option<u32>,
    playlist_count: Option<u32>,
}

impl SongUpdate {
    /// Set a new title; blank titles are rejected.
    pub fn title(mut self, title: impl Into<String>) -> Result<Self, SongValidationError> {
        self.title = Some(require(title.into(), SongValidationError::EmptyTitle)?);
        Ok(self)
    }

    /// Set a new artist; blank names are rejected.
    pub fn artist(mut self, artist: impl Into<String>) -> Result<Self, SongValidationError> {
        self.artist = Some(require(artist.into(), SongValidationError::EmptyArtist)?);
        Ok(self)
    }

    /// Set a new video identifier; blank identifiers are rejected.
    pub fn you_tube_id(
        mut self,
        you_tube_id: impl Into<String>,
    ) -> Result<Self, SongValidationError> {
        self.you_tube_id = Some(require(
            you_tube_id.into(),
            SongValidationError::EmptyYouTubeId,
        )?);
        Ok(self)
    }

    /// Set a new release year.
    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Overwrite the listen counter.
    pub fn listens(mut self, listens: u32) -> Self {
        self.listens = Some(listens);
        self
    }

    /// Overwrite the number of playlists referencing the song.
    pub fn playlist_count(mut self, playlist_count: u32) -> Self {
        self.playlist_count = Some(playlist_count);
        self
    }

    /// Title to write, if changed.
    pub fn new_title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Artist to write, if changed.
    pub fn new_artist(&self) -> Option<&str> {
        self.artist.as_deref()
    }

    /// Year to write, if changed.
    pub fn new_year(&self) -> Option<i32> {
        self.year
    }

    /// Video identifier to write, if changed.
    pub fn new_you_tube_id(&self) -> Option<&str> {
        self.you_tube_id.as_deref()
    }

    /// Listen counter to write, if changed.
    pub fn new_listens(&self) -> Option<u32> {
        self.listens
    }

    /// Playlist counter to write, if changed.
    pub fn new_playlist_count(&self) -> Option<u32> {
        self.playlist_count
    }

    /// Apply the update to an in-memory copy of a song.
    pub fn apply_to(&self, song: &mut Song) {
        if let Some(title) = &self.title {
            song.title.clone_from(title);
        }
        if let Some(artist) = &self.artist {
            song.artist.clone_from(artist);
        }
        if let Some(year) = self.year {
            song.year = year;
        }
        if let Some(you_tube_id) = &self.you_tube_id {
            song.you_tube_id.clone_from(you_tube_id);
        }
        if let Some(listens) = self.listens {
            song.listens = listens;
        }
        if let Some(playlist_count) = self.playlist_count {
            song.playlist_count = playlist_count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn owner() -> UserId {
        UserId::new("7").expect("valid id")
    }

    #[rstest]
    #[case("", "Artist", "yt", SongValidationError::EmptyTitle)]
    #[case("Title", " ", "yt", SongValidationError::EmptyArtist)]
    #[case("Title", "Artist", "", SongValidationError::EmptyYouTubeId)]
    fn new_song_requires_text_fields(
        owner: UserId,
        #[case] title: &str,
        #[case] artist: &str,
        #[case] you_tube_id: &str,
        #[case] expected: SongValidationError,
    ) {
        let err = NewSong::new(title, artist, 1999, you_tube_id, owner).expect_err("invalid song");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn update_applies_only_present_fields(owner: UserId) {
        let now = Utc::now();
        let mut song = Song {
            id: SongId::new("1").expect("id"),
            title: "Old".into(),
            artist: "Band".into(),
            year: 1990,
            you_tube_id: "abc".into(),
            listens: 3,
            playlist_count: 1,
            owner_id: owner,
            created_at: now,
            updated_at: now,
        };

        let update = SongUpdate::default()
            .title("New")
            .expect("valid title")
            .listens(10);
        update.apply_to(&mut song);

        assert_eq!(song.title, "New");
        assert_eq!(song.artist, "Band");
        assert_eq!(song.year, 1990);
        assert_eq!(song.listens, 10);
    }

    #[rstest]
    fn update_rejects_blank_artist() {
        assert_eq!(
            SongUpdate::default().artist(""),
            Err(SongValidationError::EmptyArtist)
        );
    }
}
