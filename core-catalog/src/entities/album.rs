//! Albums

use async_trait::async_trait;
use chrono::NaiveDate;
use provider_spotify::Page;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::instrument;

use super::{
    decode, normalize_release_date, null_as_default, objectify_all, require_id, Artist, Asset,
    CatalogObject, DatePrecision, ExternalUrl, Fetch, Track,
};
use crate::error::{CatalogError, Result};
use crate::objectify::EntityKind;
use crate::sequence::ListIterator;
use crate::state::State;

/// Album groups an artist's discography can be filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlbumGroup {
    Album,
    Single,
    AppearsOn,
    Compilation,
}

impl AlbumGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlbumGroup::Album => "album",
            AlbumGroup::Single => "single",
            AlbumGroup::AppearsOn => "appears_on",
            AlbumGroup::Compilation => "compilation",
        }
    }
}

/// Copyright statement; `kind` is `C` (copyright) or `P` (performance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Copyright {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
struct AlbumRecord {
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
    album_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    artists: Vec<Value>,
    #[serde(default)]
    available_markets: Option<Vec<String>>,
    #[serde(default)]
    copyrights: Option<Vec<Copyright>>,
    #[serde(default)]
    external_ids: Option<HashMap<String, String>>,
    #[serde(default)]
    genres: Option<Vec<String>>,
    #[serde(default, deserialize_with = "null_as_default")]
    images: Vec<Asset>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(default)]
    popularity: Option<u32>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    release_date_precision: Option<DatePrecision>,
    #[serde(default)]
    total_tracks: Option<u32>,
    #[serde(default)]
    tracks: Option<Page>,
}

/// A catalog album.
///
/// Albums reached through a track or a listing are partial: `genres`,
/// `label`, `popularity` and the embedded track page are typically absent
/// until [`Fetch::fetch`] is called.
#[derive(Debug, Clone, PartialEq)]
pub struct Album {
    id: String,
    uri: String,
    pub href: Option<String>,
    pub external_urls: HashMap<String, String>,
    /// `album`, `single` or `compilation`
    pub album_type: Option<String>,
    pub artists: Vec<Artist>,
    pub available_markets: Option<Vec<String>>,
    pub copyrights: Option<Vec<Copyright>>,
    pub external_ids: Option<HashMap<String, String>>,
    pub genres: Option<Vec<String>>,
    pub images: Vec<Asset>,
    pub label: Option<String>,
    pub name: String,
    pub popularity: Option<u32>,
    release_date: Option<NaiveDate>,
    release_date_precision: Option<DatePrecision>,
    pub total_tracks: Option<u32>,
    tracks: Option<Page>,
    state: State,
}

impl Album {
    pub(crate) fn from_record(state: &State, record: Value) -> Result<Self> {
        let record: AlbumRecord = decode(EntityKind::Album, record)?;

        let release_date = record
            .release_date
            .as_deref()
            .filter(|date| !date.is_empty())
            .map(|date| normalize_release_date(date, record.release_date_precision))
            .transpose()
            .map_err(|message| CatalogError::decode("album", message))?;

        Ok(Self {
            id: record.id,
            uri: record.uri,
            href: record.href,
            external_urls: record.external_urls,
            album_type: record.album_type,
            artists: objectify_all(state, record.artists)?,
            available_markets: record.available_markets,
            copyrights: record.copyrights,
            external_ids: record.external_ids,
            genres: record.genres,
            images: record.images,
            label: record.label,
            name: record.name,
            popularity: record.popularity,
            release_date,
            release_date_precision: record.release_date_precision,
            total_tracks: record.total_tracks,
            tracks: record.tracks,
            state: state.clone(),
        })
    }

    /// Release date with unknown month and day set to the 1st.
    pub fn release_date(&self) -> Option<NaiveDate> {
        self.release_date
    }

    pub fn release_date_precision(&self) -> Option<DatePrecision> {
        self.release_date_precision
    }

    /// The album's tracks, starting from the page embedded in the record
    /// when there is one.
    pub fn tracks(&self, limit: Option<u32>) -> ListIterator<Track> {
        let id = self.id.clone();
        self.state.paginate(
            move |state: State, page| {
                let id = id.clone();
                async move {
                    state
                        .http()
                        .get_album_tracks(&id, page, None)
                        .await
                        .map_err(CatalogError::from)
                }
            },
            self.tracks.clone(),
            limit,
            None,
        )
    }
}

impl CatalogObject for Album {
    fn id(&self) -> &str {
        &self.id
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Album
    }
}

impl ExternalUrl for Album {
    fn external_urls(&self) -> &HashMap<String, String> {
        &self.external_urls
    }
}

#[async_trait]
impl Fetch for Album {
    #[instrument(skip(self), fields(id = %self.id))]
    async fn fetch(&mut self) -> Result<()> {
        require_id(EntityKind::Album, &self.id, &self.uri)?;
        let record = self.state.http().get_album(&self.id, None).await?;
        let fresh = Album::from_record(&self.state, record)?;
        *self = Album {
            id: std::mem::take(&mut self.id),
            uri: std::mem::take(&mut self.uri),
            ..fresh
        };
        Ok(())
    }
}
