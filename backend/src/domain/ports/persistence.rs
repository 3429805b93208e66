//! Vendor-neutral persistence contract.
//!
//! [`Persistence`] is the single seam between the playlist/catalog services
//! and a backing store. Drivers translate each call into one logical backend
//! operation and hand back normalised domain records: every record exposes a
//! single `id`, whatever the store calls it internally.
//!
//! Not-found is never an error. Lookups return `None`, listings return an
//! empty vector and deletes return a removed count of `0`. Identifiers the
//! driver cannot parse (a decimal id handed to the document store, say) are
//! treated the same way.

use async_trait::async_trait;

use crate::domain::{
    DbVendor, Email, NewPlaylist, NewSong, NewUser, Playlist, PlaylistFilter, PlaylistId,
    PlaylistPair, PlaylistUpdate, Song, SongId, SongUpdate, User, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by persistence drivers.
    pub enum PersistenceError {
        /// The backend is unreachable, or the driver is not connected.
        Connection { message: String } => "persistence connection failed: {message}",
        /// A uniqueness constraint rejected the write.
        Conflict { message: String } => "persistence conflict: {message}",
        /// The backend rejected the record against its schema constraints.
        Validation { message: String } => "persistence validation failed: {message}",
        /// Any other failure while executing a query or mutation.
        Query { message: String } => "persistence query failed: {message}",
    }
}

/// Outcome of an operation whose failure must not abort the caller.
///
/// Callers log non-[`Applied`](Self::Applied) outcomes at most; none of them
/// is an error.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort {
    /// The change was made.
    Applied,
    /// Nothing needed doing (already present, or the target is gone).
    Skipped { reason: String },
    /// The driver does not offer this capability.
    Unsupported,
    /// The attempt failed and was abandoned.
    Degraded { reason: String },
}

impl BestEffort {
    /// Nothing was changed, for the given reason.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    /// The attempt failed and was abandoned, for the given reason.
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self::Degraded {
            reason: reason.into(),
        }
    }

    /// Whether the change was made.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Storage contract implemented by every backing-store driver.
///
/// `connect` and `disconnect` bracket the driver's lifetime. Calls made while
/// disconnected fail with [`PersistenceError::Connection`]. Disconnecting an
/// unconnected driver is a no-op.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Backing store family this driver talks to.
    fn vendor(&self) -> DbVendor;

    /// Acquire the backend connection and prepare indexes or tables.
    async fn connect(&self) -> Result<(), PersistenceError>;

    /// Release the backend connection.
    async fn disconnect(&self) -> Result<(), PersistenceError>;

    async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, PersistenceError>;

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, PersistenceError>;

    /// Insert a user. A duplicate email yields [`PersistenceError::Conflict`].
    async fn create_user(&self, user: &NewUser) -> Result<User, PersistenceError>;

    /// Record `playlist_id` against the user's denormalised playlist list.
    ///
    /// Drivers without such a list keep this default.
    async fn append_user_playlist(
        &self,
        _user_id: &UserId,
        _playlist_id: &PlaylistId,
    ) -> BestEffort {
        BestEffort::Unsupported
    }

    async fn create_playlist(&self, playlist: &NewPlaylist) -> Result<Playlist, PersistenceError>;

    async fn get_playlist_by_id(&self, id: &PlaylistId)
    -> Result<Option<Playlist>, PersistenceError>;

    /// Full playlist records matching `filter`.
    async fn get_playlists(&self, filter: &PlaylistFilter)
    -> Result<Vec<Playlist>, PersistenceError>;

    /// Listing projection of the playlists matching `filter`.
    async fn get_playlist_pairs(
        &self,
        filter: &PlaylistFilter,
    ) -> Result<Vec<PlaylistPair>, PersistenceError>;

    /// Apply `update` and return the refreshed record, or `None` if absent.
    ///
    /// `updated_at` advances even when `update` is empty.
    async fn update_playlist_by_id(
        &self,
        id: &PlaylistId,
        update: &PlaylistUpdate,
    ) -> Result<Option<Playlist>, PersistenceError>;

    /// Remove a playlist and return how many records went away (0 or 1).
    async fn delete_playlist_by_id(&self, id: &PlaylistId) -> Result<u64, PersistenceError>;

    async fn get_songs(&self) -> Result<Vec<Song>, PersistenceError>;

    async fn get_song_by_id(&self, id: &SongId) -> Result<Option<Song>, PersistenceError>;

    async fn create_song(&self, song: &NewSong) -> Result<Song, PersistenceError>;

    async fn update_song_by_id(
        &self,
        id: &SongId,
        update: &SongUpdate,
    ) -> Result<Option<Song>, PersistenceError>;

    async fn delete_song_by_id(&self, id: &SongId) -> Result<u64, PersistenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BestEffort::Applied, true)]
    #[case(BestEffort::skipped("present"), false)]
    #[case(BestEffort::degraded("timeout"), false)]
    fn best_effort_reports_application(#[case] outcome: BestEffort, #[case] applied: bool) {
        assert_eq!(outcome.is_applied(), applied);
    }

    #[rstest]
    fn errors_render_with_context() {
        let err = PersistenceError::conflict("email joe@shmo.com already registered");
        assert_eq!(
            err.to_string(),
            "persistence conflict: email joe@shmo.com already registered"
        );
    }
}
