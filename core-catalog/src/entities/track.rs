//! Tracks

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::instrument;

use super::{
    decode, null_as_default, objectify_all, objectify_opt, require_id, Album, Artist,
    CatalogObject, ExternalUrl, Fetch,
};
use crate::error::Result;
use crate::objectify::EntityKind;
use crate::state::State;

#[derive(Debug, Deserialize)]
struct TrackRecord {
    // null for local files
    #[serde(default, deserialize_with = "null_as_default")]
    id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    uri: String,
    #[serde(default)]
    href: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    external_urls: HashMap<String, String>,
    #[serde(default)]
    album: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    artists: Vec<Value>,
    #[serde(default)]
    available_markets: Option<Vec<String>>,
    #[serde(default)]
    disc_number: Option<u32>,
    #[serde(default)]
    duration_ms: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    explicit: bool,
    #[serde(default)]
    external_ids: Option<HashMap<String, String>>,
    #[serde(default, deserialize_with = "null_as_default")]
    is_local: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(default)]
    popularity: Option<u32>,
    #[serde(default)]
    preview_url: Option<String>,
    #[serde(default)]
    track_number: Option<u32>,
}

/// A catalog track. Tracks listed under an album carry no `album`.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    id: String,
    uri: String,
    pub href: Option<String>,
    pub external_urls: HashMap<String, String>,
    pub album: Option<Album>,
    pub artists: Vec<Artist>,
    pub available_markets: Option<Vec<String>>,
    pub disc_number: Option<u32>,
    pub duration: Option<Duration>,
    pub explicit: bool,
    pub external_ids: Option<HashMap<String, String>>,
    /// Local files have an empty id and cannot be fetched
    pub is_local: bool,
    pub name: String,
    pub popularity: Option<u32>,
    /// 30 second MP3 preview
    pub preview_url: Option<String>,
    pub track_number: Option<u32>,
    state: State,
}

impl Track {
    pub(crate) fn from_record(state: &State, record: Value) -> Result<Self> {
        let record: TrackRecord = decode(EntityKind::Track, record)?;
        Ok(Self {
            id: record.id,
            uri: record.uri,
            href: record.href,
            external_urls: record.external_urls,
            album: objectify_opt(state, record.album)?,
            artists: objectify_all(state, record.artists)?,
            available_markets: record.available_markets,
            disc_number: record.disc_number,
            duration: record.duration_ms.map(Duration::from_millis),
            explicit: record.explicit,
            external_ids: record.external_ids,
            is_local: record.is_local,
            name: record.name,
            popularity: record.popularity,
            preview_url: record.preview_url,
            track_number: record.track_number,
            state: state.clone(),
        })
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.duration.map(|d| d.as_millis() as u64)
    }
}

impl CatalogObject for Track {
    fn id(&self) -> &str {
        &self.id
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Track
    }
}

impl ExternalUrl for Track {
    fn external_urls(&self) -> &HashMap<String, String> {
        &self.external_urls
    }
}

#[async_trait]
impl Fetch for Track {
    #[instrument(skip(self), fields(id = %self.id))]
    async fn fetch(&mut self) -> Result<()> {
        require_id(EntityKind::Track, &self.id, &self.uri)?;
        let record = self.state.http().get_track(&self.id, None).await?;
        let fresh = Track::from_record(&self.state, record)?;
        *self = Track {
            id: std::mem::take(&mut self.id),
            uri: std::mem::take(&mut self.uri),
            ..fresh
        };
        Ok(())
    }
}
