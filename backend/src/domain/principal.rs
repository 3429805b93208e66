//! Authenticated principal supplied by the session layer.

use super::{Email, UserId};

/// Identity of the user performing an operation.
///
/// The session/token collaborator verifies credentials before constructing
/// this value; the persistence layer trusts it as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    user_id: UserId,
    email: Email,
}

impl AuthenticatedPrincipal {
    /// Wrap an identity the session layer has already verified.
    pub fn new(user_id: UserId, email: Email) -> Self {
        Self { user_id, email }
    }

    /// Identifier of the signed-in user.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Email of the signed-in user; playlists are owned by it.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// `true` when `user_id` identifies this principal.
    pub fn is_user(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }
}
