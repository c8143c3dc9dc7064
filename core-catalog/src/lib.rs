//! # Catalog Module
//!
//! Typed access to the music catalog: albums, artists, tracks, playlists
//! and users, with every list endpoint exposed as a lazy sequence.
//!
//! ## Overview
//!
//! - Raw JSON records come from the transport (`provider-spotify`).
//! - The dispatcher decides which entity a record describes and decodes it.
//! - List endpoints are walked page by page, one request per refill and no
//!   prefetching ahead of consumption.
//!
//! ## Components
//!
//! - **Client** (`client`): session entry point, single and bulk fetches, browse listings
//! - **Paginator** (`pagination`): offset/limit buffered pull over one list endpoint
//! - **Dispatcher** (`objectify`): `Discriminator` detection and `Entity` decoding
//! - **Entities** (`entities`): domain types, capability traits, list wrappers
//! - **Lazy sequences** (`sequence`): `ListIterator`, the single-pass stream handed to callers
//! - **Chunker** (`chunked`): id batching for capped batch endpoints

pub mod chunked;
pub mod client;
pub mod entities;
pub mod error;
pub mod objectify;
pub mod pagination;
pub mod sequence;
pub mod state;

pub use chunked::{
    chunked, chunked_owned, BULK_FETCH_CHUNK, LIBRARY_CHUNK, PLAYLIST_ADD_CHUNK,
    PLAYLIST_REMOVE_CHUNK,
};
pub use client::Client;
pub use entities::{
    normalize_release_date, Album, AlbumGroup, Artist, Asset, CatalogObject, ClientUser,
    Copyright, DatePrecision, ExplicitContent, ExternalUrl, Fetch, Followable, ListItem, Playlist,
    Track, User,
};
pub use error::{CatalogError, Result};
pub use objectify::{Discriminator, Entity, EntityKind};
pub use pagination::Paginator;
pub use provider_spotify::{NewPlaylist, PlaylistDetails};
pub use sequence::ListIterator;
pub use state::State;
