//! Record dispatch
//!
//! Maps one raw JSON record to the entity it describes. The decision is a
//! closed, two-step tagged decode: first a [`Discriminator`], then the
//! entity decode selected by it.
//!
//! - A record wrapped with list membership metadata (an `added_at` key) is
//!   a list item. Endpoints known to return such wrappers supply the
//!   wrapped kind; without that context exactly one of the kind keys
//!   `track`, `album`, `artist`, `user` must be present.
//! - Any other record is selected by its own `type` field.

use serde_json::Value;
use std::fmt;
use tracing::trace;

use crate::entities::{Album, Artist, ListItem, Playlist, Track, User};
use crate::error::{CatalogError, Result};
use crate::state::State;

/// Entity kinds the catalog knows, named by their `type` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Album,
    Artist,
    Track,
    Playlist,
    User,
}

impl EntityKind {
    /// Kind keys recognized next to `added_at`, in lookup order.
    pub const LIST_ITEM_KEYS: [EntityKind; 4] = [
        EntityKind::Track,
        EntityKind::Album,
        EntityKind::Artist,
        EntityKind::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Album => "album",
            EntityKind::Artist => "artist",
            EntityKind::Track => "track",
            EntityKind::Playlist => "playlist",
            EntityKind::User => "user",
        }
    }

    pub fn from_type(value: &str) -> Option<Self> {
        match value {
            "album" => Some(EntityKind::Album),
            "artist" => Some(EntityKind::Artist),
            "track" => Some(EntityKind::Track),
            "playlist" => Some(EntityKind::Playlist),
            "user" => Some(EntityKind::User),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a record is, decided before it is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Discriminator {
    /// A bare entity record
    Entity(EntityKind),
    /// An `added_at` wrapper around an entity of this kind
    ListItem(EntityKind),
}

impl Discriminator {
    /// Classify `record`. `list_kind` is the wrapped kind for endpoints that
    /// return list items; it takes precedence over key inspection.
    pub fn detect(record: &Value, list_kind: Option<EntityKind>) -> Result<Self> {
        let object = record
            .as_object()
            .ok_or_else(|| CatalogError::decode("record", "expected a JSON object"))?;

        if let Some(kind) = list_kind {
            return Ok(Discriminator::ListItem(kind));
        }

        if object.contains_key("added_at") {
            let candidates: Vec<EntityKind> = EntityKind::LIST_ITEM_KEYS
                .into_iter()
                .filter(|kind| object.contains_key(kind.as_str()))
                .collect();
            return match candidates.as_slice() {
                [kind] => Ok(Discriminator::ListItem(*kind)),
                _ => Err(CatalogError::AmbiguousListItem {
                    candidates: candidates.iter().map(|k| k.as_str().to_string()).collect(),
                }),
            };
        }

        match object.get("type") {
            Some(Value::String(kind)) => EntityKind::from_type(kind)
                .map(Discriminator::Entity)
                .ok_or_else(|| CatalogError::UnsupportedEntityKind(kind.clone())),
            Some(other) => Err(CatalogError::UnsupportedEntityKind(other.to_string())),
            None => Err(CatalogError::decode(
                "record",
                "no `type` field and no `added_at` wrapper",
            )),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Discriminator::Entity(kind) | Discriminator::ListItem(kind) => *kind,
        }
    }
}

impl fmt::Display for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discriminator::Entity(kind) => write!(f, "{}", kind),
            Discriminator::ListItem(kind) => write!(f, "list_{}", kind),
        }
    }
}

/// Any entity the dispatcher can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Album(Album),
    Artist(Artist),
    Track(Track),
    Playlist(Playlist),
    User(User),
    ListAlbum(ListItem<Album>),
    ListArtist(ListItem<Artist>),
    ListTrack(ListItem<Track>),
    ListUser(ListItem<User>),
}

impl Entity {
    pub fn discriminator(&self) -> Discriminator {
        match self {
            Entity::Album(_) => Discriminator::Entity(EntityKind::Album),
            Entity::Artist(_) => Discriminator::Entity(EntityKind::Artist),
            Entity::Track(_) => Discriminator::Entity(EntityKind::Track),
            Entity::Playlist(_) => Discriminator::Entity(EntityKind::Playlist),
            Entity::User(_) => Discriminator::Entity(EntityKind::User),
            Entity::ListAlbum(_) => Discriminator::ListItem(EntityKind::Album),
            Entity::ListArtist(_) => Discriminator::ListItem(EntityKind::Artist),
            Entity::ListTrack(_) => Discriminator::ListItem(EntityKind::Track),
            Entity::ListUser(_) => Discriminator::ListItem(EntityKind::User),
        }
    }
}

macro_rules! entity_conversion {
    ($variant:ident, $target:ty, $expected:literal) => {
        impl TryFrom<Entity> for $target {
            type Error = CatalogError;

            fn try_from(entity: Entity) -> Result<Self> {
                match entity {
                    Entity::$variant(inner) => Ok(inner),
                    other => Err(CatalogError::UnexpectedEntityKind {
                        expected: $expected.to_string(),
                        actual: other.discriminator().to_string(),
                    }),
                }
            }
        }

        impl From<$target> for Entity {
            fn from(inner: $target) -> Self {
                Entity::$variant(inner)
            }
        }
    };
}

entity_conversion!(Album, Album, "album");
entity_conversion!(Artist, Artist, "artist");
entity_conversion!(Track, Track, "track");
entity_conversion!(Playlist, Playlist, "playlist");
entity_conversion!(User, User, "user");
entity_conversion!(ListAlbum, ListItem<Album>, "list_album");
entity_conversion!(ListArtist, ListItem<Artist>, "list_artist");
entity_conversion!(ListTrack, ListItem<Track>, "list_track");
entity_conversion!(ListUser, ListItem<User>, "list_user");

impl State {
    /// Build the entity a record describes, dispatching on its `type`
    /// field or its `added_at` wrapper.
    pub fn objectify(&self, record: Value) -> Result<Entity> {
        self.objectify_in(record, None)
    }

    /// Build a list item of a known kind, as returned by list-wrapper
    /// endpoints (saved albums, playlist items).
    pub fn objectify_list_item(&self, record: Value, kind: EntityKind) -> Result<Entity> {
        self.objectify_in(record, Some(kind))
    }

    /// [`objectify`](Self::objectify) and require a specific entity type.
    pub fn objectify_as<T>(&self, record: Value) -> Result<T>
    where
        T: TryFrom<Entity, Error = CatalogError>,
    {
        self.objectify(record).and_then(T::try_from)
    }

    pub(crate) fn objectify_in(&self, record: Value, list_kind: Option<EntityKind>) -> Result<Entity> {
        let discriminator = Discriminator::detect(&record, list_kind)?;
        trace!(%discriminator, "Objectifying record");

        Ok(match discriminator {
            Discriminator::Entity(EntityKind::Album) => Entity::Album(Album::from_record(self, record)?),
            Discriminator::Entity(EntityKind::Artist) => {
                Entity::Artist(Artist::from_record(self, record)?)
            }
            Discriminator::Entity(EntityKind::Track) => Entity::Track(Track::from_record(self, record)?),
            Discriminator::Entity(EntityKind::Playlist) => {
                Entity::Playlist(Playlist::from_record(self, record)?)
            }
            Discriminator::Entity(EntityKind::User) => Entity::User(User::from_record(self, record)?),
            Discriminator::ListItem(EntityKind::Album) => {
                Entity::ListAlbum(ListItem::from_record(self, record, EntityKind::Album)?)
            }
            Discriminator::ListItem(EntityKind::Artist) => {
                Entity::ListArtist(ListItem::from_record(self, record, EntityKind::Artist)?)
            }
            Discriminator::ListItem(EntityKind::Track) => {
                Entity::ListTrack(ListItem::from_record(self, record, EntityKind::Track)?)
            }
            Discriminator::ListItem(EntityKind::User) => {
                Entity::ListUser(ListItem::from_record(self, record, EntityKind::User)?)
            }
            Discriminator::ListItem(EntityKind::Playlist) => {
                return Err(CatalogError::UnsupportedEntityKind(discriminator.to_string()))
            }
        })
    }
}
