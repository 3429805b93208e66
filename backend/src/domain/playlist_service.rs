//! Playlist use cases written against the persistence contract.
//!
//! Ownership is resolved the same way for every protected operation: the
//! playlist's `owner_email` is looked up as a user, and that user's id must
//! equal the acting principal's id.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::ports::{BestEffort, Persistence};
use crate::domain::{
    AuthenticatedPrincipal, CopyName, Email, Error, NewPlaylist, Playlist, PlaylistFilter,
    PlaylistId, PlaylistName, PlaylistPair, PlaylistSong, PlaylistUpdate, ServiceResult, UserId,
    resolve_copy_name,
};

/// Decoded payload for [`PlaylistService::create_playlist`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlaylistRequest {
    pub name: PlaylistName,
    /// Defaults to the acting principal's email.
    pub owner_email: Option<Email>,
    pub songs: Vec<PlaylistSong>,
}

/// Playlist service over any [`Persistence`] driver.
pub struct PlaylistService<P: ?Sized> {
    store: Arc<P>,
}

impl<P: ?Sized> Clone for PlaylistService<P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<P: ?Sized> PlaylistService<P> {
    /// Create a new service backed by `store`.
    pub fn new(store: Arc<P>) -> Self {
        Self { store }
    }
}

impl<P> PlaylistService<P>
where
    P: Persistence + ?Sized,
{
    /// Create a playlist and record it against the principal.
    pub async fn create_playlist(
        &self,
        principal: &AuthenticatedPrincipal,
        request: NewPlaylistRequest,
    ) -> ServiceResult<Playlist> {
        let owner_email = request
            .owner_email
            .unwrap_or_else(|| principal.email().clone());
        let payload = NewPlaylist::new(request.name, owner_email).with_songs(request.songs);
        let created = self.store.create_playlist(&payload).await?;
        self.record_ownership(principal.user_id(), &created.id).await;
        Ok(created)
    }

    /// Fetch a playlist owned by the principal.
    pub async fn get_playlist(
        &self,
        principal: &AuthenticatedPrincipal,
        id: &PlaylistId,
    ) -> ServiceResult<Playlist> {
        self.load_owned(principal, id).await
    }

    /// Every stored playlist, optionally narrowed by a name prefix.
    ///
    /// An empty result is reported as `NotFound`.
    pub async fn list_playlists(&self, name_prefix: Option<&str>) -> ServiceResult<Vec<Playlist>> {
        let filter = match name_prefix {
            Some(prefix) => PlaylistFilter::all().with_name_prefix(prefix),
            None => PlaylistFilter::all(),
        };
        let playlists = self.store.get_playlists(&filter).await?;
        if playlists.is_empty() {
            return Err(Error::not_found("no playlists found"));
        }
        Ok(playlists)
    }

    /// Listing projection of the principal's playlists.
    pub async fn playlist_pairs(
        &self,
        principal: &AuthenticatedPrincipal,
    ) -> ServiceResult<Vec<PlaylistPair>> {
        let user = self
            .store
            .get_user_by_id(principal.user_id())
            .await?
            .ok_or_else(|| Error::not_found("user not found"))?;
        let filter = PlaylistFilter::all().owned_by(user.email);
        Ok(self.store.get_playlist_pairs(&filter).await?)
    }

    /// Apply a partial update to a playlist owned by the principal.
    pub async fn update_playlist(
        &self,
        principal: &AuthenticatedPrincipal,
        id: &PlaylistId,
        update: PlaylistUpdate,
    ) -> ServiceResult<Playlist> {
        self.load_owned(principal, id).await?;
        self.store
            .update_playlist_by_id(id, &update)
            .await?
            .ok_or_else(|| playlist_not_found(id))
    }

    /// Delete a playlist owned by the principal.
    pub async fn delete_playlist(
        &self,
        principal: &AuthenticatedPrincipal,
        id: &PlaylistId,
    ) -> ServiceResult<()> {
        self.load_owned(principal, id).await?;
        match self.store.delete_playlist_by_id(id).await? {
            0 => Err(playlist_not_found(id)),
            _ => Ok(()),
        }
    }

    /// Duplicate a playlist owned by the principal under a fresh name.
    ///
    /// The copy keeps the original owner and a clone of its songs. A failed
    /// name probe or ownership append never aborts the copy.
    pub async fn copy_playlist(
        &self,
        principal: &AuthenticatedPrincipal,
        id: &PlaylistId,
    ) -> ServiceResult<Playlist> {
        let original = self.load_owned(principal, id).await?;
        let copy_name =
            resolve_copy_name(self.store.as_ref(), &original.owner_email, &original.name).await;
        if let CopyName::Fallback { reason, .. } = &copy_name {
            debug!(playlist_id = %id, %reason, "copying with unchecked name");
        }

        let payload = NewPlaylist::new(copy_name.into_name(), original.owner_email)
            .with_songs(original.songs);
        let created = self.store.create_playlist(&payload).await?;
        self.record_ownership(principal.user_id(), &created.id).await;
        Ok(created)
    }

    async fn load_owned(
        &self,
        principal: &AuthenticatedPrincipal,
        id: &PlaylistId,
    ) -> ServiceResult<Playlist> {
        let playlist = self
            .store
            .get_playlist_by_id(id)
            .await?
            .ok_or_else(|| playlist_not_found(id))?;
        let owner = self.store.get_user_by_email(&playlist.owner_email).await?;
        match owner {
            Some(owner) if principal.is_user(&owner.id) => Ok(playlist),
            _ => Err(Error::forbidden("playlist belongs to another user")),
        }
    }

    async fn record_ownership(&self, user_id: &UserId, playlist_id: &PlaylistId) {
        match self.store.append_user_playlist(user_id, playlist_id).await {
            BestEffort::Degraded { reason } => {
                warn!(%user_id, %playlist_id, %reason, "could not record playlist ownership");
            }
            outcome => debug!(%user_id, %playlist_id, ?outcome, "playlist ownership append"),
        }
    }
}

fn playlist_not_found(id: &PlaylistId) -> Error {
    Error::not_found(format!("playlist {id} not found"))
}

#[cfg(test)]
#[path = "playlist_service_tests.rs"]
mod tests;
