//! Domain entities decoded from Web API records
//!
//! Each entity decodes its record in one step into typed fields, then
//! dispatches nested object records (an album's artists, a track's album,
//! a playlist's owner) through [`State::objectify`](crate::State::objectify).
//! Fields that partial records omit are `None` or empty; [`Fetch`] replaces
//! them with the full record.

mod album;
mod artist;
mod asset;
mod dates;
mod list_item;
mod playlist;
mod track;
mod traits;
mod user;

pub use album::{Album, AlbumGroup, Copyright};
pub use artist::Artist;
pub use asset::Asset;
pub use dates::{normalize_release_date, DatePrecision};
pub use list_item::ListItem;
pub use playlist::Playlist;
pub use track::Track;
pub use traits::{CatalogObject, ExternalUrl, Fetch, Followable};
pub use user::{ClientUser, ExplicitContent, User};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{CatalogError, Result};
use crate::objectify::{Entity, EntityKind};
use crate::state::State;

/// Decode a record into its typed field set.
pub(crate) fn decode<T: DeserializeOwned>(kind: EntityKind, record: Value) -> Result<T> {
    serde_json::from_value(record).map_err(|e| CatalogError::decode(kind.as_str(), e))
}

/// Entities nested under a local file carry no catalog id and cannot be fetched.
pub(crate) fn require_id(kind: EntityKind, id: &str, uri: &str) -> Result<()> {
    if id.is_empty() {
        return Err(CatalogError::InvalidArgument {
            field: "id".to_string(),
            message: format!("local {} {} has no catalog id", kind, uri),
        });
    }
    Ok(())
}

/// `null` decodes like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

pub(crate) fn objectify_all<T>(state: &State, records: Vec<Value>) -> Result<Vec<T>>
where
    T: TryFrom<Entity, Error = CatalogError>,
{
    records
        .into_iter()
        .map(|record| state.objectify_as(record))
        .collect()
}

pub(crate) fn objectify_opt<T>(state: &State, record: Option<Value>) -> Result<Option<T>>
where
    T: TryFrom<Entity, Error = CatalogError>,
{
    match record {
        Some(record) if !record.is_null() => state.objectify_as(record).map(Some),
        _ => Ok(None),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FollowersRecord {
    #[serde(default)]
    pub total: Option<u64>,
}

pub(crate) fn follower_count(followers: Option<FollowersRecord>) -> Option<u64> {
    followers.and_then(|f| f.total)
}
