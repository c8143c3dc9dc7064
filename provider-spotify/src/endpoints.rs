//! Web API endpoint wrappers
//!
//! One method per endpoint. Records come back as raw JSON; wrapping
//! envelopes such as `{"albums": [...]}` are removed here.
//!
//! See: https://developer.spotify.com/documentation/web-api/reference

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::connector::{RequestBody, SpotifyHttp};
use crate::error::{Result, SpotifyError};
use crate::route::Route;
use crate::types::{
    decode, unwrap_key, NewPlaylist, Page, PageRequest, PlaylistDetails, RemoveTracksBody,
    SnapshotResponse, TrackUri, MAX_BULK_IDS, MAX_LIBRARY_IDS, MAX_PLAYLIST_ADD,
    MAX_PLAYLIST_REMOVE,
};

fn check_len(what: &str, len: usize, max: usize) -> Result<()> {
    if len > max {
        return Err(SpotifyError::InvalidRequest(format!(
            "{} {} given, at most {} per request",
            len, what, max
        )));
    }
    Ok(())
}

/// Records of a bulk response; unknown ids come back as `null` and are
/// dropped.
fn records(value: Value, key: &str) -> Result<Vec<Value>> {
    let list: Vec<Value> = decode(unwrap_key(value, key)?)?;
    Ok(list.into_iter().filter(|v| !v.is_null()).collect())
}

fn page_under(value: Value, key: &str) -> Result<Page> {
    decode(unwrap_key(value, key)?)
}

impl SpotifyHttp {
    async fn get_json(&self, route: Route) -> Result<Value> {
        self.request_json(&route, None).await
    }

    async fn get_page(&self, route: Route) -> Result<Page> {
        decode(self.get_json(route).await?)
    }

    async fn send(&self, route: Route, body: Option<RequestBody>) -> Result<()> {
        self.request(&route, body).await.map(|_| ())
    }

    // Users

    /// The authenticated user.
    pub async fn fetch_me(&self) -> Result<Value> {
        self.get_json(Route::get("/me")).await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Value> {
        self.get_json(Route::get("/users").segment(user_id)).await
    }

    // Albums

    pub async fn get_album(&self, album_id: &str, market: Option<&str>) -> Result<Value> {
        self.get_json(Route::get("/albums").segment(album_id).query_opt("market", market))
            .await
    }

    /// Up to [`MAX_BULK_IDS`] albums in one call.
    #[instrument(skip(self, album_ids), fields(count = album_ids.len()))]
    pub async fn get_albums(&self, album_ids: &[String], market: Option<&str>) -> Result<Vec<Value>> {
        check_len("album ids", album_ids.len(), MAX_BULK_IDS)?;
        if album_ids.is_empty() {
            return Ok(Vec::new());
        }
        let route = Route::get("/albums")
            .query_list("ids", album_ids)
            .query_opt("market", market);
        records(self.get_json(route).await?, "albums")
    }

    pub async fn get_album_tracks(
        &self,
        album_id: &str,
        page: PageRequest,
        market: Option<&str>,
    ) -> Result<Page> {
        let route = Route::get("/albums")
            .segment(album_id)
            .segment("tracks")
            .page(page)
            .query_opt("market", market);
        self.get_page(route).await
    }

    /// Saved albums of the authenticated user, `added_at` wrapped.
    pub async fn get_me_albums(&self, page: PageRequest, market: Option<&str>) -> Result<Page> {
        let route = Route::get("/me/albums").page(page).query_opt("market", market);
        self.get_page(route).await
    }

    pub async fn put_me_albums(&self, album_ids: &[String]) -> Result<()> {
        check_len("album ids", album_ids.len(), MAX_LIBRARY_IDS)?;
        self.send(Route::put("/me/albums").query_list("ids", album_ids), None)
            .await
    }

    pub async fn delete_me_albums(&self, album_ids: &[String]) -> Result<()> {
        check_len("album ids", album_ids.len(), MAX_LIBRARY_IDS)?;
        self.send(Route::delete("/me/albums").query_list("ids", album_ids), None)
            .await
    }

    /// One flag per id, in request order.
    pub async fn get_me_albums_contains(&self, album_ids: &[String]) -> Result<Vec<bool>> {
        check_len("album ids", album_ids.len(), MAX_LIBRARY_IDS)?;
        if album_ids.is_empty() {
            return Ok(Vec::new());
        }
        let route = Route::get("/me/albums/contains").query_list("ids", album_ids);
        decode(self.get_json(route).await?)
    }

    pub async fn get_browse_new_releases(
        &self,
        country: Option<&str>,
        page: PageRequest,
    ) -> Result<Page> {
        let route = Route::get("/browse/new-releases")
            .query_opt("country", country)
            .page(page);
        page_under(self.get_json(route).await?, "albums")
    }

    // Artists

    pub async fn get_artist(&self, artist_id: &str) -> Result<Value> {
        self.get_json(Route::get("/artists").segment(artist_id))
            .await
    }

    /// Up to [`MAX_BULK_IDS`] artists in one call.
    #[instrument(skip(self, artist_ids), fields(count = artist_ids.len()))]
    pub async fn get_artists(&self, artist_ids: &[String]) -> Result<Vec<Value>> {
        check_len("artist ids", artist_ids.len(), MAX_BULK_IDS)?;
        if artist_ids.is_empty() {
            return Ok(Vec::new());
        }
        let route = Route::get("/artists").query_list("ids", artist_ids);
        records(self.get_json(route).await?, "artists")
    }

    /// `include_groups` filters by `album`, `single`, `appears_on`,
    /// `compilation`; empty means all.
    pub async fn get_artist_albums(
        &self,
        artist_id: &str,
        include_groups: &[String],
        market: Option<&str>,
        page: PageRequest,
    ) -> Result<Page> {
        let route = Route::get("/artists")
            .segment(artist_id)
            .segment("albums")
            .query_list("include_groups", include_groups)
            .query_opt("market", market)
            .page(page);
        self.get_page(route).await
    }

    pub async fn get_artist_top_tracks(&self, artist_id: &str, country: &str) -> Result<Vec<Value>> {
        let route = Route::get("/artists")
            .segment(artist_id)
            .segment("top-tracks")
            .query("country", country);
        records(self.get_json(route).await?, "tracks")
    }

    pub async fn get_artist_related(&self, artist_id: &str) -> Result<Vec<Value>> {
        let route = Route::get("/artists").segment(artist_id).segment("related-artists");
        records(self.get_json(route).await?, "artists")
    }

    // Tracks

    pub async fn get_track(&self, track_id: &str, market: Option<&str>) -> Result<Value> {
        self.get_json(Route::get("/tracks").segment(track_id).query_opt("market", market))
            .await
    }

    /// Up to [`MAX_BULK_IDS`] tracks in one call.
    #[instrument(skip(self, track_ids), fields(count = track_ids.len()))]
    pub async fn get_tracks(&self, track_ids: &[String], market: Option<&str>) -> Result<Vec<Value>> {
        check_len("track ids", track_ids.len(), MAX_BULK_IDS)?;
        if track_ids.is_empty() {
            return Ok(Vec::new());
        }
        let route = Route::get("/tracks")
            .query_list("ids", track_ids)
            .query_opt("market", market);
        records(self.get_json(route).await?, "tracks")
    }

    // Playlists

    pub async fn get_playlist(&self, playlist_id: &str, market: Option<&str>) -> Result<Value> {
        self.get_json(Route::get("/playlists").segment(playlist_id).query_opt("market", market))
            .await
    }

    #[instrument(skip(self, details))]
    pub async fn put_playlist(&self, playlist_id: &str, details: &PlaylistDetails) -> Result<()> {
        if details.is_empty() {
            debug!("No playlist details to change");
            return Ok(());
        }
        let body = RequestBody::Json(serde_json::to_value(details).map_err(|e| {
            SpotifyError::InvalidRequest(format!("Unserializable playlist details: {}", e))
        })?);
        self.send(Route::put("/playlists").segment(playlist_id), Some(body))
            .await
    }

    /// Playlist items, `added_at` wrapped.
    pub async fn get_playlist_tracks(
        &self,
        playlist_id: &str,
        page: PageRequest,
        market: Option<&str>,
    ) -> Result<Page> {
        let route = Route::get("/playlists")
            .segment(playlist_id)
            .segment("tracks")
            .page(page)
            .query_opt("market", market);
        self.get_page(route).await
    }

    /// Add up to [`MAX_PLAYLIST_ADD`] items, returning the new snapshot id.
    #[instrument(skip(self, uris), fields(count = uris.len()))]
    pub async fn post_playlist_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
        position: Option<u32>,
    ) -> Result<String> {
        check_len("track uris", uris.len(), MAX_PLAYLIST_ADD)?;
        let route = Route::post("/playlists")
            .segment(playlist_id)
            .segment("tracks")
            .query_list("uris", uris)
            .query_opt("position", position);
        let response: SnapshotResponse = decode(self.request_json(&route, None).await?)?;
        Ok(response.snapshot_id)
    }

    /// Remove up to [`MAX_PLAYLIST_REMOVE`] items from the given snapshot,
    /// returning the new snapshot id.
    #[instrument(skip(self, uris, snapshot_id), fields(count = uris.len()))]
    pub async fn delete_playlist_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
        snapshot_id: &str,
    ) -> Result<String> {
        check_len("track uris", uris.len(), MAX_PLAYLIST_REMOVE)?;
        let body = RemoveTracksBody {
            tracks: uris.iter().map(|uri| TrackUri { uri }).collect(),
            snapshot_id,
        };
        let body = serde_json::to_value(&body)
            .map_err(|e| SpotifyError::InvalidRequest(format!("Unserializable track list: {}", e)))?;
        let route = Route::delete("/playlists").segment(playlist_id).segment("tracks");
        let response: SnapshotResponse =
            decode(self.request_json(&route, Some(RequestBody::Json(body))).await?)?;
        Ok(response.snapshot_id)
    }

    pub async fn get_me_playlists(&self, page: PageRequest) -> Result<Page> {
        self.get_page(Route::get("/me/playlists").page(page)).await
    }

    pub async fn get_user_playlists(&self, user_id: &str, page: PageRequest) -> Result<Page> {
        self.get_page(Route::get("/users").segment(user_id).segment("playlists").page(page))
            .await
    }

    /// Create a playlist owned by `user_id`, returning its record.
    #[instrument(skip(self, playlist), fields(name = %playlist.name))]
    pub async fn post_user_playlists(&self, user_id: &str, playlist: &NewPlaylist) -> Result<Value> {
        let body = serde_json::to_value(playlist)
            .map_err(|e| SpotifyError::InvalidRequest(format!("Unserializable playlist: {}", e)))?;
        let route = Route::post("/users").segment(user_id).segment("playlists");
        self.request_json(&route, Some(RequestBody::Json(body))).await
    }

    pub async fn get_browse_featured_playlists(
        &self,
        country: Option<&str>,
        page: PageRequest,
    ) -> Result<Page> {
        let route = Route::get("/browse/featured-playlists")
            .query_opt("country", country)
            .page(page);
        page_under(self.get_json(route).await?, "playlists")
    }

    pub async fn get_browse_category_playlists(
        &self,
        category_id: &str,
        country: Option<&str>,
        page: PageRequest,
    ) -> Result<Page> {
        let route = Route::get("/browse/categories")
            .segment(category_id)
            .segment("playlists")
            .query_opt("country", country)
            .page(page);
        page_under(self.get_json(route).await?, "playlists")
    }

    /// Upload a JPEG cover image.
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub async fn put_playlist_image(&self, playlist_id: &str, image: &[u8]) -> Result<()> {
        let body = RequestBody::Raw {
            content_type: "image/jpeg",
            data: Bytes::from(STANDARD.encode(image)),
        };
        self.send(Route::put("/playlists").segment(playlist_id).segment("images"), Some(body))
            .await
    }
}
