//! Naming for playlist copies.
//!
//! A copy of "Road Trip" is called "Road Trip (copy)". When the owner already
//! has a playlist with that exact name the suffix becomes "(copy 2)",
//! "(copy 3)" and so on. Names are only unique per owner.

use std::collections::HashSet;

use tracing::warn;

use super::ports::Persistence;
use super::{Email, PlaylistFilter, PlaylistName};

const COPY_SUFFIX: &str = "(copy)";

/// Name chosen for a playlist copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyName {
    /// Checked against the owner's existing names.
    Unique(PlaylistName),
    /// The existing names could not be read, so the plain "(copy)" name was
    /// used unchecked.
    Fallback { name: PlaylistName, reason: String },
}

impl CopyName {
    /// The chosen name, whichever way it was reached.
    pub fn name(&self) -> &PlaylistName {
        match self {
            Self::Unique(name) | Self::Fallback { name, .. } => name,
        }
    }

    /// Consume the outcome, keeping only the name.
    pub fn into_name(self) -> PlaylistName {
        match self {
            Self::Unique(name) | Self::Fallback { name, .. } => name,
        }
    }
}

/// First "(copy)"/"(copy N)" name for `base` absent from `existing`.
pub fn copy_name_for<'a>(
    base: &PlaylistName,
    existing: impl IntoIterator<Item = &'a str>,
) -> PlaylistName {
    let taken: HashSet<&str> = existing.into_iter().collect();
    let first = base.suffixed(COPY_SUFFIX);
    if !taken.contains(first.as_str()) {
        return first;
    }
    (2_u64..)
        .map(|n| base.suffixed(&format!("(copy {n})")))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or(first)
}

/// Pick a copy name for `original`, owned by `owner`.
///
/// Reads the owner's playlist names with a single listing call. If that call
/// fails the plain "(copy)" name is returned as [`CopyName::Fallback`].
pub async fn resolve_copy_name<P>(store: &P, owner: &Email, original: &PlaylistName) -> CopyName
where
    P: Persistence + ?Sized,
{
    let filter = PlaylistFilter::all().owned_by(owner.clone());
    match store.get_playlist_pairs(&filter).await {
        Ok(pairs) => CopyName::Unique(copy_name_for(
            original,
            pairs.iter().map(|pair| pair.name.as_str()),
        )),
        Err(error) => {
            warn!(%error, "copy name probe failed; using default suffix");
            CopyName::Fallback {
                name: original.suffixed(COPY_SUFFIX),
                reason: error.to_string(),
            }
        }
    }
}
