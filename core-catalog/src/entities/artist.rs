//! Artists

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::instrument;

use super::{
    decode, follower_count, null_as_default, objectify_all, require_id, Album, AlbumGroup, Asset,
    CatalogObject, ExternalUrl, Fetch, Followable, FollowersRecord, Track,
};
use crate::error::{CatalogError, Result};
use crate::objectify::EntityKind;
use crate::sequence::ListIterator;
use crate::state::State;

#[derive(Debug, Deserialize)]
struct ArtistRecord {
    // null when nested under a local file
    #[serde(default, deserialize_with = "null_as_default")]
    id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    uri: String,
    #[serde(default)]
    href: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    external_urls: HashMap<String, String>,
    #[serde(default)]
    followers: Option<FollowersRecord>,
    #[serde(default)]
    genres: Option<Vec<String>>,
    #[serde(default, deserialize_with = "null_as_default")]
    images: Vec<Asset>,
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(default)]
    popularity: Option<u32>,
}

/// A catalog artist. Artists nested in albums and tracks carry only
/// identity and name.
#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    id: String,
    uri: String,
    pub href: Option<String>,
    pub external_urls: HashMap<String, String>,
    followers: Option<u64>,
    pub genres: Option<Vec<String>>,
    pub images: Vec<Asset>,
    pub name: String,
    pub popularity: Option<u32>,
    state: State,
}

impl Artist {
    pub(crate) fn from_record(state: &State, record: Value) -> Result<Self> {
        let record: ArtistRecord = decode(EntityKind::Artist, record)?;
        Ok(Self {
            id: record.id,
            uri: record.uri,
            href: record.href,
            external_urls: record.external_urls,
            followers: follower_count(record.followers),
            genres: record.genres,
            images: record.images,
            name: record.name,
            popularity: record.popularity,
            state: state.clone(),
        })
    }

    /// The artist's albums, optionally restricted to some groups.
    pub fn albums(&self, include_groups: &[AlbumGroup], limit: Option<u32>) -> ListIterator<Album> {
        let id = self.id.clone();
        let groups: Vec<String> = include_groups
            .iter()
            .map(|group| group.as_str().to_string())
            .collect();
        self.state.paginate(
            move |state: State, page| {
                let id = id.clone();
                let groups = groups.clone();
                async move {
                    state
                        .http()
                        .get_artist_albums(&id, &groups, None, page)
                        .await
                        .map_err(CatalogError::from)
                }
            },
            None,
            limit,
            None,
        )
    }

    /// Most popular tracks in a market (ISO 3166-1 alpha-2 country code).
    #[instrument(skip(self), fields(id = %self.id))]
    pub async fn top_tracks(&self, country: &str) -> Result<Vec<Track>> {
        let records = self.state.http().get_artist_top_tracks(&self.id, country).await?;
        objectify_all(&self.state, records)
    }

    #[instrument(skip(self), fields(id = %self.id))]
    pub async fn related_artists(&self) -> Result<Vec<Artist>> {
        let records = self.state.http().get_artist_related(&self.id).await?;
        objectify_all(&self.state, records)
    }
}

impl CatalogObject for Artist {
    fn id(&self) -> &str {
        &self.id
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Artist
    }
}

impl ExternalUrl for Artist {
    fn external_urls(&self) -> &HashMap<String, String> {
        &self.external_urls
    }
}

impl Followable for Artist {
    fn followers(&self) -> Option<u64> {
        self.followers
    }
}

#[async_trait]
impl Fetch for Artist {
    #[instrument(skip(self), fields(id = %self.id))]
    async fn fetch(&mut self) -> Result<()> {
        require_id(EntityKind::Artist, &self.id, &self.uri)?;
        let record = self.state.http().get_artist(&self.id).await?;
        let fresh = Artist::from_record(&self.state, record)?;
        *self = Artist {
            id: std::mem::take(&mut self.id),
            uri: std::mem::take(&mut self.uri),
            ..fresh
        };
        Ok(())
    }
}
