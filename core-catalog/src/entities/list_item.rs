//! List membership wrappers

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::ops::Deref;

use super::{null_as_default, objectify_opt, CatalogObject, User};
use crate::error::{CatalogError, Result};
use crate::objectify::{Entity, EntityKind};
use crate::state::State;

#[derive(Debug, Deserialize)]
struct MembershipRecord {
    #[serde(default)]
    added_at: Option<DateTime<Utc>>,
    #[serde(default)]
    added_by: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    is_local: bool,
}

/// An entity together with when and by whom it was added to a list
/// (a playlist, or the user's saved albums).
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem<T> {
    pub item: T,
    /// `None` for very old playlist entries
    pub added_at: Option<DateTime<Utc>>,
    pub added_by: Option<User>,
    pub is_local: bool,
}

impl<T> ListItem<T>
where
    T: TryFrom<Entity, Error = CatalogError>,
{
    pub(crate) fn from_record(state: &State, record: Value, kind: EntityKind) -> Result<Self> {
        let mut record = match record {
            Value::Object(map) => map,
            other => {
                return Err(CatalogError::decode(
                    "list item",
                    format!("expected an object, got {}", other),
                ))
            }
        };

        let mut item = match record.remove(kind.as_str()) {
            Some(item) if !item.is_null() => item,
            _ => {
                return Err(CatalogError::decode(
                    "list item",
                    format!("missing `{}` entry", kind),
                ))
            }
        };
        // local file entries may omit the nested `type`
        if let Value::Object(map) = &mut item {
            map.entry("type")
                .or_insert_with(|| Value::String(kind.as_str().to_string()));
        }
        let membership: MembershipRecord = serde_json::from_value(Value::Object(record))
            .map_err(|e| CatalogError::decode("list item", e))?;

        Ok(Self {
            item: state.objectify_as(item)?,
            added_at: membership.added_at,
            added_by: objectify_opt(state, membership.added_by)?,
            is_local: membership.is_local,
        })
    }
}

impl<T> ListItem<T> {
    pub fn into_inner(self) -> T {
        self.item
    }
}

impl<T> Deref for ListItem<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.item
    }
}

impl<T: CatalogObject> CatalogObject for ListItem<T> {
    fn id(&self) -> &str {
        self.item.id()
    }

    fn uri(&self) -> &str {
        self.item.uri()
    }

    fn kind(&self) -> EntityKind {
        self.item.kind()
    }
}
