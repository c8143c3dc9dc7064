//! Users and the authenticated client user

use async_trait::async_trait;
use provider_spotify::NewPlaylist;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::ops::Deref;
use tracing::{info, instrument};

use super::{
    decode, follower_count, null_as_default, require_id, Album, Asset, CatalogObject, ExternalUrl,
    Fetch, Followable, FollowersRecord, ListItem, Playlist,
};
use crate::chunked::{chunked, LIBRARY_CHUNK};
use crate::error::{CatalogError, Result};
use crate::objectify::EntityKind;
use crate::sequence::ListIterator;
use crate::state::State;

#[derive(Debug, Deserialize)]
struct UserRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    uri: String,
    #[serde(default)]
    href: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    external_urls: HashMap<String, String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    followers: Option<FollowersRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    images: Vec<Asset>,
}

/// A public user profile.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: String,
    uri: String,
    pub href: Option<String>,
    pub external_urls: HashMap<String, String>,
    pub display_name: Option<String>,
    followers: Option<u64>,
    pub images: Vec<Asset>,
    state: State,
}

impl User {
    pub(crate) fn from_record(state: &State, record: Value) -> Result<Self> {
        let record: UserRecord = decode(EntityKind::User, record)?;
        Ok(Self {
            id: record.id,
            uri: record.uri,
            href: record.href,
            external_urls: record.external_urls,
            display_name: record.display_name,
            followers: follower_count(record.followers),
            images: record.images,
            state: state.clone(),
        })
    }

    /// Public playlists owned or followed by the user.
    pub fn playlists(&self, limit: Option<u32>) -> ListIterator<Playlist> {
        let id = self.id.clone();
        self.state.paginate(
            move |state: State, page| {
                let id = id.clone();
                async move {
                    state
                        .http()
                        .get_user_playlists(&id, page)
                        .await
                        .map_err(CatalogError::from)
                }
            },
            None,
            limit,
            None,
        )
    }
}

impl CatalogObject for User {
    fn id(&self) -> &str {
        &self.id
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn kind(&self) -> EntityKind {
        EntityKind::User
    }
}

impl ExternalUrl for User {
    fn external_urls(&self) -> &HashMap<String, String> {
        &self.external_urls
    }
}

impl Followable for User {
    fn followers(&self) -> Option<u64> {
        self.followers
    }
}

#[async_trait]
impl Fetch for User {
    #[instrument(skip(self), fields(id = %self.id))]
    async fn fetch(&mut self) -> Result<()> {
        require_id(EntityKind::User, &self.id, &self.uri)?;
        let record = self.state.http().get_user(&self.id).await?;
        let fresh = User::from_record(&self.state, record)?;
        *self = User {
            id: std::mem::take(&mut self.id),
            uri: std::mem::take(&mut self.uri),
            ..fresh
        };
        Ok(())
    }
}

/// Explicit content settings of the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ExplicitContent {
    #[serde(default)]
    pub filter_enabled: bool,
    #[serde(default)]
    pub filter_locked: bool,
}

#[derive(Debug, Default, Deserialize)]
struct PrivateRecord {
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    explicit_content: Option<ExplicitContent>,
    #[serde(default)]
    product: Option<String>,
}

/// The user the client is authorized as.
///
/// Private fields are present only when the matching scopes were granted
/// (`user-read-email` for `email`, `user-read-private` for the rest).
/// Derefs to the public [`User`] profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientUser {
    user: User,
    pub country: Option<String>,
    pub email: Option<String>,
    pub explicit_content: Option<ExplicitContent>,
    /// `premium`, `free` or `open`
    pub product: Option<String>,
}

impl ClientUser {
    pub(crate) fn from_record(state: &State, record: Value) -> Result<Self> {
        let private = PrivateRecord::deserialize(&record)
            .map_err(|e| CatalogError::decode("user", e))?;
        Ok(Self {
            user: User::from_record(state, record)?,
            country: private.country,
            email: private.email,
            explicit_content: private.explicit_content,
            product: private.product,
        })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    fn state(&self) -> &State {
        &self.user.state
    }

    /// Albums saved in the user's library, newest first.
    pub fn saved_albums(&self, limit: Option<u32>) -> ListIterator<ListItem<Album>> {
        self.state().paginate(
            |state: State, page| async move {
                state
                    .http()
                    .get_me_albums(page, None)
                    .await
                    .map_err(CatalogError::from)
            },
            None,
            limit,
            Some(EntityKind::Album),
        )
    }

    /// Save albums to the library, [`LIBRARY_CHUNK`] per request.
    #[instrument(skip(self, albums), fields(count = albums.len()))]
    pub async fn save_albums<T: CatalogObject>(&self, albums: &[T]) -> Result<()> {
        let ids = ids_of(albums);
        for batch in chunked(&ids, LIBRARY_CHUNK) {
            self.state().http().put_me_albums(batch).await?;
        }
        info!(count = ids.len(), "Saved albums");
        Ok(())
    }

    #[instrument(skip(self, albums), fields(count = albums.len()))]
    pub async fn remove_saved_albums<T: CatalogObject>(&self, albums: &[T]) -> Result<()> {
        let ids = ids_of(albums);
        for batch in chunked(&ids, LIBRARY_CHUNK) {
            self.state().http().delete_me_albums(batch).await?;
        }
        info!(count = ids.len(), "Removed saved albums");
        Ok(())
    }

    /// Whether each album is saved, in input order.
    #[instrument(skip(self, albums), fields(count = albums.len()))]
    pub async fn saved_albums_contain<T: CatalogObject>(&self, albums: &[T]) -> Result<Vec<bool>> {
        let ids = ids_of(albums);
        let mut saved = Vec::with_capacity(ids.len());
        for batch in chunked(&ids, LIBRARY_CHUNK) {
            saved.extend(self.state().http().get_me_albums_contains(batch).await?);
        }
        Ok(saved)
    }

    /// Playlists owned or followed by the user, private ones included.
    pub fn playlists(&self, limit: Option<u32>) -> ListIterator<Playlist> {
        self.state().paginate(
            |state: State, page| async move {
                state
                    .http()
                    .get_me_playlists(page)
                    .await
                    .map_err(CatalogError::from)
            },
            None,
            limit,
            None,
        )
    }

    #[instrument(skip(self, playlist), fields(name = %playlist.name))]
    pub async fn create_playlist(&self, playlist: NewPlaylist) -> Result<Playlist> {
        let record = self
            .state()
            .http()
            .post_user_playlists(&self.user.id, &playlist)
            .await?;
        let created: Playlist = self.state().objectify_as(record)?;
        info!(id = %created.id(), "Created playlist");
        Ok(created)
    }
}

fn ids_of<T: CatalogObject>(items: &[T]) -> Vec<String> {
    items.iter().map(|item| item.id().to_string()).collect()
}

impl Deref for ClientUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.user
    }
}

impl CatalogObject for ClientUser {
    fn id(&self) -> &str {
        self.user.id()
    }

    fn uri(&self) -> &str {
        self.user.uri()
    }

    fn kind(&self) -> EntityKind {
        EntityKind::User
    }
}

impl ExternalUrl for ClientUser {
    fn external_urls(&self) -> &HashMap<String, String> {
        &self.user.external_urls
    }
}

#[async_trait]
impl Fetch for ClientUser {
    #[instrument(skip(self), fields(id = %self.user.id))]
    async fn fetch(&mut self) -> Result<()> {
        require_id(EntityKind::User, &self.user.id, &self.user.uri)?;
        let record = self.state().http().fetch_me().await?;
        let fresh = ClientUser::from_record(self.state(), record)?;
        *self = ClientUser {
            user: User {
                id: std::mem::take(&mut self.user.id),
                uri: std::mem::take(&mut self.user.uri),
                ..fresh.user
            },
            ..fresh
        };
        Ok(())
    }
}
