//! Web API request and response shapes
//!
//! Entity records stay as raw `serde_json::Value`; decoding them into typed
//! entities is the catalog crate's job. Only the envelopes the transport
//! itself unwraps live here.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SpotifyError};

/// Largest `limit` any list endpoint accepts.
pub const PAGE_CAP: u32 = 50;

/// Largest id list accepted by the bulk album/artist/track endpoints.
pub const MAX_BULK_IDS: usize = 50;

/// Largest id list accepted by the saved-albums endpoints.
pub const MAX_LIBRARY_IDS: usize = 20;

/// Largest uri list accepted when adding playlist items.
pub const MAX_PLAYLIST_ADD: usize = 100;

/// Largest uri list accepted when removing playlist items.
pub const MAX_PLAYLIST_REMOVE: usize = 20;

/// Offset-paginated list envelope.
///
/// Parent records embed only `{href, total}` for some collections, so
/// everything but `total` tolerates being absent.
///
/// See: https://developer.spotify.com/documentation/web-api/concepts/api-calls#pagination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T = Value> {
    /// Records of this page
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,

    /// Size of the whole collection, when reported
    #[serde(default)]
    pub total: Option<u32>,

    /// Requested page size
    #[serde(default)]
    pub limit: u32,

    /// Offset of the first item of this page
    #[serde(default)]
    pub offset: u32,

    /// URL of the next page
    #[serde(default)]
    pub next: Option<String>,

    /// URL of the previous page
    #[serde(default)]
    pub previous: Option<String>,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Page<Value> {
    /// Decode an embedded page such as `album.tracks`.
    pub fn from_value(value: Value) -> Result<Self> {
        decode(value)
    }
}

/// `limit` / `offset` window of one page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u32,
}

impl PageRequest {
    /// Window starting at `offset`, with `limit` clamped to [`PAGE_CAP`].
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: limit.clamp(1, PAGE_CAP),
            offset,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(PAGE_CAP, 0)
    }
}

/// Response of every playlist item mutation.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotResponse {
    pub snapshot_id: String,
}

/// Playlist detail changes; only the provided fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaylistDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaborative: Option<bool>,
}

impl PlaylistDetails {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Body of the create-playlist call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPlaylist {
    pub name: String,
    pub public: bool,
    pub collaborative: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewPlaylist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public: true,
            collaborative: false,
            description: None,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct TrackUri<'a> {
    pub uri: &'a str,
}

#[derive(Serialize)]
pub(crate) struct RemoveTracksBody<'a> {
    pub tracks: Vec<TrackUri<'a>>,
    pub snapshot_id: &'a str,
}

/// Decode a JSON value into a response type.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| SpotifyError::Parse(e.to_string()))
}

/// Take `key` out of a wrapping object such as `{"albums": [...]}`.
pub(crate) fn unwrap_key(mut value: Value, key: &str) -> Result<Value> {
    value
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| SpotifyError::Parse(format!("Response has no `{}` field", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_full_payload() {
        let page: Page = decode(json!({
            "href": "https://api.spotify.com/v1/albums/1/tracks?offset=0&limit=2",
            "items": [{"id": "a"}, {"id": "b"}],
            "limit": 2,
            "next": "https://api.spotify.com/v1/albums/1/tracks?offset=2&limit=2",
            "offset": 0,
            "previous": null,
            "total": 7
        }))
        .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, Some(7));
        assert_eq!(page.limit, 2);
        assert!(page.next.is_some());
        assert!(page.previous.is_none());
    }

    #[test]
    fn test_page_href_and_total_only() {
        let page = Page::from_value(json!({
            "href": "https://api.spotify.com/v1/playlists/p/tracks",
            "total": 12
        }))
        .unwrap();

        assert!(page.is_empty());
        assert_eq!(page.total, Some(12));
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn test_page_request_clamps_limit() {
        assert_eq!(PageRequest::new(500, 100).limit, PAGE_CAP);
        assert_eq!(PageRequest::new(0, 0).limit, 1);
        assert_eq!(PageRequest::default(), PageRequest { limit: 50, offset: 0 });
    }

    #[test]
    fn test_playlist_details_sends_only_provided_fields() {
        let details = PlaylistDetails {
            name: Some("Road trip".to_string()),
            public: Some(false),
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&details).unwrap(),
            json!({"name": "Road trip", "public": false})
        );
        assert!(PlaylistDetails::default().is_empty());
    }

    #[test]
    fn test_new_playlist_body() {
        let body = serde_json::to_value(NewPlaylist::new("Mix")).unwrap();
        assert_eq!(body, json!({"name": "Mix", "public": true, "collaborative": false}));
    }

    #[test]
    fn test_unwrap_key() {
        let value = json!({"albums": [{"id": "x"}]});
        assert_eq!(unwrap_key(value, "albums").unwrap(), json!([{"id": "x"}]));
        assert!(matches!(
            unwrap_key(json!({}), "tracks"),
            Err(SpotifyError::Parse(_))
        ));
    }
}
