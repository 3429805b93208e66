//! Domain primitives, ports and services.
//!
//! Purpose: Define strongly typed records shared by both persistence drivers
//! and the services that consume them. Document invariants and serialisation
//! contracts (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::Error`): service error payload.
//! - User, Playlist, Song: stored records with a single `id`.
//! - ports::Persistence: the storage contract.
//! - PlaylistService, SongCatalogService: consumers of the contract.

pub mod copy_name;
pub mod error;
pub mod playlist;
pub mod playlist_service;
pub mod ports;
pub mod principal;
pub mod record_id;
pub mod song;
pub mod song_catalog_service;
pub mod user;
pub mod vendor;

pub use self::copy_name::{CopyName, copy_name_for, resolve_copy_name};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::playlist::{
    NewPlaylist, Playlist, PlaylistFilter, PlaylistName, PlaylistPair, PlaylistSong,
    PlaylistUpdate, PlaylistValidationError,
};
pub use self::playlist_service::{NewPlaylistRequest, PlaylistService};
pub use self::principal::AuthenticatedPrincipal;
pub use self::record_id::{PlaylistId, RecordIdError, SongId, UserId};
pub use self::song::{NewSong, Song, SongUpdate, SongValidationError};
pub use self::song_catalog_service::{NewSongRequest, SongCatalogService};
pub use self::user::{Email, NewUser, PasswordHash, User, UserProfile, UserValidationError};
pub use self::vendor::{DbVendor, UnknownVendorError};

/// Convenient service result alias.
///
/// # Examples
/// ```
/// use playlister::domain::{Error, ServiceResult};
///
/// fn guard(owner: bool) -> ServiceResult<()> {
///     if owner { Ok(()) } else { Err(Error::forbidden("not your playlist")) }
/// }
/// assert!(guard(false).is_err());
/// ```
pub type ServiceResult<T> = Result<T, Error>;
