//! Playlists

use async_trait::async_trait;
use provider_spotify::{Page, PlaylistDetails};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

use super::{
    decode, follower_count, null_as_default, objectify_opt, Asset, CatalogObject, ExternalUrl,
    Fetch, Followable, FollowersRecord, ListItem, Track, User,
};
use crate::chunked::{chunked, PLAYLIST_ADD_CHUNK, PLAYLIST_REMOVE_CHUNK};
use crate::error::{CatalogError, Result};
use crate::objectify::EntityKind;
use crate::sequence::ListIterator;
use crate::state::State;

#[derive(Debug, Deserialize)]
struct PlaylistRecord {
    id: String,
    uri: String,
    #[serde(default)]
    href: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    external_urls: HashMap<String, String>,
    #[serde(default)]
    collaborative: Option<bool>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    followers: Option<FollowersRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    images: Vec<Asset>,
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(default)]
    owner: Option<Value>,
    #[serde(default)]
    primary_color: Option<String>,
    #[serde(default)]
    public: Option<bool>,
    #[serde(default)]
    snapshot_id: Option<String>,
    #[serde(default)]
    tracks: Option<Page>,
}

/// A user playlist.
///
/// Listed playlists embed only the track count; the full record embeds the
/// first page of tracks. Mutations go straight to the server and keep the
/// local snapshot id current; other fields are refreshed by
/// [`Fetch::fetch`].
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    id: String,
    uri: String,
    pub href: Option<String>,
    pub external_urls: HashMap<String, String>,
    pub collaborative: Option<bool>,
    pub description: Option<String>,
    followers: Option<u64>,
    pub images: Vec<Asset>,
    pub name: String,
    pub owner: Option<User>,
    pub primary_color: Option<String>,
    /// `None` when the playlist's status is not relevant
    pub public: Option<bool>,
    snapshot_id: Option<String>,
    tracks: Option<Page>,
    state: State,
}

impl Playlist {
    pub(crate) fn from_record(state: &State, record: Value) -> Result<Self> {
        let record: PlaylistRecord = decode(EntityKind::Playlist, record)?;
        Ok(Self {
            id: record.id,
            uri: record.uri,
            href: record.href,
            external_urls: record.external_urls,
            collaborative: record.collaborative,
            description: record.description,
            followers: follower_count(record.followers),
            images: record.images,
            name: record.name,
            owner: objectify_opt(state, record.owner)?,
            primary_color: record.primary_color,
            public: record.public,
            snapshot_id: record.snapshot_id,
            tracks: record.tracks,
            state: state.clone(),
        })
    }

    /// Version identifier of the playlist contents, updated by every
    /// mutation made through this object.
    pub fn snapshot_id(&self) -> Option<&str> {
        self.snapshot_id.as_deref()
    }

    /// Number of tracks as reported by the last record.
    pub fn total_tracks(&self) -> Option<u32> {
        self.tracks.as_ref().and_then(|page| page.total)
    }

    /// The playlist's tracks with their membership metadata. Entries whose
    /// track is no longer available are skipped.
    pub fn tracks(&self, limit: Option<u32>) -> ListIterator<ListItem<Track>> {
        let id = self.id.clone();
        self.state.paginate(
            move |state: State, page| {
                let id = id.clone();
                async move {
                    state
                        .http()
                        .get_playlist_tracks(&id, page, None)
                        .await
                        .map_err(CatalogError::from)
                }
            },
            self.tracks.clone(),
            limit,
            Some(EntityKind::Track),
        )
    }

    /// Change name, description or visibility. Fields left `None` keep
    /// their server value; the local copy is updated on success.
    #[instrument(skip(self, details), fields(id = %self.id))]
    pub async fn edit(&mut self, details: PlaylistDetails) -> Result<()> {
        self.state.http().put_playlist(&self.id, &details).await?;

        if let Some(name) = details.name {
            self.name = name;
        }
        if let Some(description) = details.description {
            self.description = Some(description);
        }
        if details.public.is_some() {
            self.public = details.public;
        }
        if details.collaborative.is_some() {
            self.collaborative = details.collaborative;
        }
        Ok(())
    }

    /// Insert items at `position` (appended when `None`), in batches of
    /// [`PLAYLIST_ADD_CHUNK`]. Batches land one after another, so the
    /// items keep their order.
    #[instrument(skip(self, items), fields(id = %self.id, count = items.len()))]
    pub async fn add<T: CatalogObject>(&mut self, items: &[T], position: Option<u32>) -> Result<()> {
        let uris: Vec<String> = items.iter().map(|item| item.uri().to_string()).collect();

        for (index, batch) in chunked(&uris, PLAYLIST_ADD_CHUNK).enumerate() {
            let batch_position = position.map(|p| p + (index * PLAYLIST_ADD_CHUNK) as u32);
            let snapshot = self
                .state
                .http()
                .post_playlist_tracks(&self.id, batch, batch_position)
                .await?;
            debug!(batch = index, size = batch.len(), snapshot = %snapshot, "Added playlist batch");
            self.snapshot_id = Some(snapshot);
        }

        info!(count = uris.len(), "Added items to playlist");
        Ok(())
    }

    /// Remove every occurrence of the items, in batches of
    /// [`PLAYLIST_REMOVE_CHUNK`]. Each batch targets the snapshot produced
    /// by the previous one.
    #[instrument(skip(self, items), fields(id = %self.id, count = items.len()))]
    pub async fn remove<T: CatalogObject>(&mut self, items: &[T]) -> Result<()> {
        let uris: Vec<String> = items.iter().map(|item| item.uri().to_string()).collect();
        if uris.is_empty() {
            return Ok(());
        }

        for (index, batch) in chunked(&uris, PLAYLIST_REMOVE_CHUNK).enumerate() {
            let snapshot_id = self.snapshot_id.clone().ok_or_else(|| {
                CatalogError::InvalidArgument {
                    field: "snapshot_id".to_string(),
                    message: "playlist record carried no snapshot id; fetch it first".to_string(),
                }
            })?;
            let snapshot = self
                .state
                .http()
                .delete_playlist_tracks(&self.id, batch, &snapshot_id)
                .await?;
            debug!(batch = index, size = batch.len(), snapshot = %snapshot, "Removed playlist batch");
            self.snapshot_id = Some(snapshot);
        }

        info!(count = uris.len(), "Removed items from playlist");
        Ok(())
    }

    /// Replace the cover with a JPEG image (at most 256 KB once encoded).
    #[instrument(skip(self, image), fields(id = %self.id))]
    pub async fn update_image(&self, image: &[u8]) -> Result<()> {
        self.state.http().put_playlist_image(&self.id, image).await?;
        Ok(())
    }
}

impl CatalogObject for Playlist {
    fn id(&self) -> &str {
        &self.id
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Playlist
    }
}

impl ExternalUrl for Playlist {
    fn external_urls(&self) -> &HashMap<String, String> {
        &self.external_urls
    }
}

impl Followable for Playlist {
    fn followers(&self) -> Option<u64> {
        self.followers
    }
}

#[async_trait]
impl Fetch for Playlist {
    #[instrument(skip(self), fields(id = %self.id))]
    async fn fetch(&mut self) -> Result<()> {
        let record = self.state.http().get_playlist(&self.id, None).await?;
        let fresh = Playlist::from_record(&self.state, record)?;
        *self = Playlist {
            id: std::mem::take(&mut self.id),
            uri: std::mem::take(&mut self.uri),
            ..fresh
        };
        Ok(())
    }
}
