//! MongoDB-backed `Persistence` implementation.
//!
//! Identifiers are ObjectId hex strings. An id that is not a valid ObjectId
//! cannot name a document, so it is reported as not found.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, Document, doc, oid::ObjectId};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::{DatabaseSettings, redact_url};
use crate::domain::ports::{BestEffort, Persistence, PersistenceError};
use crate::domain::{
    DbVendor, Email, NewPlaylist, NewSong, NewUser, Playlist, PlaylistFilter, PlaylistId,
    PlaylistPair, PlaylistSong, PlaylistUpdate, Song, SongId, SongUpdate, User, UserId,
};

use super::mongo_documents::{
    PLAYLISTS, PlaylistDocument, PlaylistPairDocument, SONGS, SongDocument, USERS, UserDocument,
};
use super::mongo_error_mapping::{map_connect_error, map_mongo_error};

struct Connected {
    client: Client,
    database: Database,
}

/// Document driver holding one shared client per process.
pub struct MongoPersistence {
    uri: String,
    database_name: String,
    state: RwLock<Option<Connected>>,
}

impl MongoPersistence {
    /// Create a disconnected driver; call `connect` before use.
    pub fn new(uri: impl Into<String>, database_name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database_name: database_name.into(),
            state: RwLock::new(None),
        }
    }

    /// Driver addressed by the resolved settings.
    pub fn from_settings(settings: &DatabaseSettings) -> Self {
        Self::new(settings.mongo_uri(), settings.mongo_database())
    }

    async fn database(&self) -> Result<Database, PersistenceError> {
        self.state
            .read()
            .await
            .as_ref()
            .map(|connected| connected.database.clone())
            .ok_or_else(|| PersistenceError::connection("MongoDB driver is not connected"))
    }

    async fn users(&self) -> Result<Collection<UserDocument>, PersistenceError> {
        Ok(self.database().await?.collection(USERS))
    }

    async fn playlists(&self) -> Result<Collection<PlaylistDocument>, PersistenceError> {
        Ok(self.database().await?.collection(PLAYLISTS))
    }

    async fn songs(&self) -> Result<Collection<SongDocument>, PersistenceError> {
        Ok(self.database().await?.collection(SONGS))
    }

    async fn try_append(&self, user_oid: ObjectId, playlist_oid: ObjectId) -> BestEffort {
        let users = match self.users().await {
            Ok(users) => users,
            Err(error) => return BestEffort::degraded(error.to_string()),
        };
        let user = match users.find_one(doc! { "_id": user_oid }).await {
            Ok(Some(user)) => user,
            Ok(None) => return BestEffort::degraded("user not found"),
            Err(error) => return BestEffort::degraded(map_mongo_error(error).to_string()),
        };

        let mut owned = user.playlists.unwrap_or_default();
        if owned.contains(&playlist_oid) {
            return BestEffort::skipped("playlist already recorded");
        }
        owned.push(playlist_oid);

        let update = doc! {
            "$set": { "playlists": owned, "updatedAt": bson::DateTime::now() }
        };
        match users.update_one(doc! { "_id": user_oid }, update).await {
            Ok(_) => BestEffort::Applied,
            Err(error) => BestEffort::degraded(map_mongo_error(error).to_string()),
        }
    }
}

fn parse_oid(raw: &str) -> Option<ObjectId> {
    ObjectId::parse_str(raw).ok()
}

/// Query document for a playlist listing filter.
fn filter_document(filter: &PlaylistFilter) -> Document {
    let mut query = Document::new();
    if let Some(owner) = filter.owner_email() {
        query.insert("ownerEmail", owner.as_str());
    }
    if let Some(prefix) = filter.name_prefix() {
        query.insert(
            "name",
            doc! { "$regex": format!("^{}", regex::escape(prefix)), "$options": "i" },
        );
    }
    query
}

fn songs_to_bson(songs: &[PlaylistSong]) -> Result<bson::Bson, PersistenceError> {
    bson::to_bson(songs)
        .map_err(|error| PersistenceError::validation(format!("songs not serialisable: {error}")))
}

fn playlist_set_document(update: &PlaylistUpdate) -> Result<Document, PersistenceError> {
    let mut set = doc! { "updatedAt": bson::DateTime::now() };
    if let Some(name) = &update.name {
        set.insert("name", name.as_str());
    }
    if let Some(songs) = &update.songs {
        set.insert("songs", songs_to_bson(songs)?);
    }
    Ok(set)
}

fn song_set_document(update: &SongUpdate) -> Document {
    let mut set = doc! { "updatedAt": bson::DateTime::now() };
    if let Some(title) = update.new_title() {
        set.insert("title", title);
    }
    if let Some(artist) = update.new_artist() {
        set.insert("artist", artist);
    }
    if let Some(year) = update.new_year() {
        set.insert("year", year);
    }
    if let Some(you_tube_id) = update.new_you_tube_id() {
        set.insert("youTubeId", you_tube_id);
    }
    if let Some(listens) = update.new_listens() {
        set.insert("listens", i64::from(listens));
    }
    if let Some(playlist_count) = update.new_playlist_count() {
        set.insert("playlistCount", i64::from(playlist_count));
    }
    set
}

async fn collect_converted<D, T>(cursor: mongodb::Cursor<D>) -> Result<Vec<T>, PersistenceError>
where
    D: serde::de::DeserializeOwned + Send + Sync + Unpin,
    T: TryFrom<D, Error = PersistenceError>,
{
    let documents: Vec<D> = cursor.try_collect().await.map_err(map_mongo_error)?;
    documents.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl Persistence for MongoPersistence {
    fn vendor(&self) -> DbVendor {
        DbVendor::Mongo
    }

    /// Ping the server and ensure the unique email index. A driver that is
    /// already connected returns immediately.
    async fn connect(&self) -> Result<(), PersistenceError> {
        let mut state = self.state.write().await;
        if state.is_some() {
            return Ok(());
        }

        let client = Client::with_uri_str(&self.uri)
            .await
            .map_err(map_connect_error)?;
        let database = client.database(&self.database_name);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(map_connect_error)?;

        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        database
            .collection::<Document>(USERS)
            .create_index(unique_email)
            .await
            .map_err(map_mongo_error)?;

        *state = Some(Connected { client, database });
        info!(
            uri = %redact_url(&self.uri),
            database = %self.database_name,
            "connected to MongoDB"
        );
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), PersistenceError> {
        let taken = self.state.write().await.take();
        if let Some(connected) = taken {
            connected.client.shutdown().await;
            info!("disconnected from MongoDB");
        }
        Ok(())
    }

    async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, PersistenceError> {
        let Some(oid) = parse_oid(id.as_str()) else {
            return Ok(None);
        };
        self.users()
            .await?
            .find_one(doc! { "_id": oid })
            .await
            .map_err(map_mongo_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, PersistenceError> {
        self.users()
            .await?
            .find_one(doc! { "email": email.as_str() })
            .await
            .map_err(map_mongo_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, PersistenceError> {
        let now = bson::DateTime::now();
        let document = UserDocument {
            id: Some(ObjectId::new()),
            first_name: user.first_name().to_owned(),
            last_name: user.last_name().to_owned(),
            email: user.email().as_str().to_owned(),
            password_hash: user.password_hash().expose().to_owned(),
            playlists: Some(Vec::new()),
            created_at: now,
            updated_at: now,
        };
        self.users()
            .await?
            .insert_one(&document)
            .await
            .map_err(map_mongo_error)?;
        User::try_from(document)
    }

    /// Add the playlist to the user's `playlists` array unless present.
    async fn append_user_playlist(&self, user_id: &UserId, playlist_id: &PlaylistId) -> BestEffort {
        let (Some(user_oid), Some(playlist_oid)) =
            (parse_oid(user_id.as_str()), parse_oid(playlist_id.as_str()))
        else {
            return BestEffort::degraded("identifiers are not ObjectIds");
        };
        let outcome = self.try_append(user_oid, playlist_oid).await;
        if let BestEffort::Degraded { reason } = &outcome {
            warn!(%user_id, %playlist_id, %reason, "playlist append degraded");
        }
        outcome
    }

    async fn create_playlist(&self, playlist: &NewPlaylist) -> Result<Playlist, PersistenceError> {
        let now = bson::DateTime::now();
        let document = PlaylistDocument {
            id: Some(ObjectId::new()),
            name: playlist.name.as_str().to_owned(),
            owner_email: playlist.owner_email.as_str().to_owned(),
            songs: playlist.songs.clone(),
            created_at: now,
            updated_at: now,
        };
        self.playlists()
            .await?
            .insert_one(&document)
            .await
            .map_err(map_mongo_error)?;
        Playlist::try_from(document)
    }

    async fn get_playlist_by_id(
        &self,
        id: &PlaylistId,
    ) -> Result<Option<Playlist>, PersistenceError> {
        let Some(oid) = parse_oid(id.as_str()) else {
            return Ok(None);
        };
        self.playlists()
            .await?
            .find_one(doc! { "_id": oid })
            .await
            .map_err(map_mongo_error)?
            .map(Playlist::try_from)
            .transpose()
    }

    async fn get_playlists(
        &self,
        filter: &PlaylistFilter,
    ) -> Result<Vec<Playlist>, PersistenceError> {
        let cursor = self
            .playlists()
            .await?
            .find(filter_document(filter))
            .sort(doc! { "_id": 1 })
            .await
            .map_err(map_mongo_error)?;
        collect_converted(cursor).await
    }

    async fn get_playlist_pairs(
        &self,
        filter: &PlaylistFilter,
    ) -> Result<Vec<PlaylistPair>, PersistenceError> {
        let cursor = self
            .playlists()
            .await?
            .clone_with_type::<PlaylistPairDocument>()
            .find(filter_document(filter))
            .projection(doc! { "name": 1, "ownerEmail": 1, "createdAt": 1, "updatedAt": 1 })
            .sort(doc! { "_id": 1 })
            .await
            .map_err(map_mongo_error)?;
        collect_converted(cursor).await
    }

    async fn update_playlist_by_id(
        &self,
        id: &PlaylistId,
        update: &PlaylistUpdate,
    ) -> Result<Option<Playlist>, PersistenceError> {
        let Some(oid) = parse_oid(id.as_str()) else {
            return Ok(None);
        };
        let set = playlist_set_document(update)?;
        self.playlists()
            .await?
            .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_mongo_error)?
            .map(Playlist::try_from)
            .transpose()
    }

    async fn delete_playlist_by_id(&self, id: &PlaylistId) -> Result<u64, PersistenceError> {
        let Some(oid) = parse_oid(id.as_str()) else {
            return Ok(0);
        };
        let result = self
            .playlists()
            .await?
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(map_mongo_error)?;
        debug!(playlist_id = %id, removed = result.deleted_count, "playlist delete");
        Ok(result.deleted_count)
    }

    async fn get_songs(&self) -> Result<Vec<Song>, PersistenceError> {
        let cursor = self
            .songs()
            .await?
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await
            .map_err(map_mongo_error)?;
        collect_converted(cursor).await
    }

    async fn get_song_by_id(&self, id: &SongId) -> Result<Option<Song>, PersistenceError> {
        let Some(oid) = parse_oid(id.as_str()) else {
            return Ok(None);
        };
        self.songs()
            .await?
            .find_one(doc! { "_id": oid })
            .await
            .map_err(map_mongo_error)?
            .map(Song::try_from)
            .transpose()
    }

    async fn create_song(&self, song: &NewSong) -> Result<Song, PersistenceError> {
        let now = bson::DateTime::now();
        let document = SongDocument {
            id: Some(ObjectId::new()),
            title: song.title().to_owned(),
            artist: song.artist().to_owned(),
            year: song.year(),
            you_tube_id: song.you_tube_id().to_owned(),
            listens: 0,
            playlist_count: 0,
            owner_id: song.owner_id().as_str().to_owned(),
            created_at: now,
            updated_at: now,
        };
        self.songs()
            .await?
            .insert_one(&document)
            .await
            .map_err(map_mongo_error)?;
        Song::try_from(document)
    }

    async fn update_song_by_id(
        &self,
        id: &SongId,
        update: &SongUpdate,
    ) -> Result<Option<Song>, PersistenceError> {
        let Some(oid) = parse_oid(id.as_str()) else {
            return Ok(None);
        };
        self.songs()
            .await?
            .find_one_and_update(doc! { "_id": oid }, doc! { "$set": song_set_document(update) })
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_mongo_error)?
            .map(Song::try_from)
            .transpose()
    }

    async fn delete_song_by_id(&self, id: &SongId) -> Result<u64, PersistenceError> {
        let Some(oid) = parse_oid(id.as_str()) else {
            return Ok(0);
        };
        let result = self
            .songs()
            .await?
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(map_mongo_error)?;
        Ok(result.deleted_count)
    }
}
