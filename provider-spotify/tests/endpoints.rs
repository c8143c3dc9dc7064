//! Endpoint wrappers against a canned-response HTTP client

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_auth::StaticTokenProvider;
use provider_spotify::{
    NewPlaylist, PageRequest, PlaylistDetails, RetryPolicy, SpotifyError, SpotifyHttp,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const BASE: &str = "https://api.test/v1";

/// Serves canned bodies by `METHOD url` and records every request.
#[derive(Default)]
struct CannedHttpClient {
    responses: HashMap<String, (u16, String)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl CannedHttpClient {
    fn on(mut self, method: HttpMethod, path_and_query: &str, status: u16, body: Value) -> Self {
        let body = if body.is_null() { String::new() } else { body.to_string() };
        self.responses
            .insert(format!("{} {}{}", method, BASE, path_and_query), (status, body));
        self
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for CannedHttpClient {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let key = format!("{} {}", request.method, request.url);
        self.requests.lock().unwrap().push(request);
        Ok(match self.responses.get(&key) {
            Some((status, body)) => HttpResponse::new(*status, body.clone()),
            None => HttpResponse::new(
                404,
                json!({"error": {"status": 404, "message": format!("no route for {}", key)}}).to_string(),
            ),
        })
    }
}

fn connect(client: CannedHttpClient) -> (Arc<CannedHttpClient>, SpotifyHttp) {
    let client = Arc::new(client);
    let http = SpotifyHttp::new(client.clone(), Arc::new(StaticTokenProvider::new("token")))
        .with_base_url(BASE)
        .with_retry_policy(RetryPolicy::no_delay());
    (client, http)
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_bulk_albums_unwraps_and_drops_unknown_ids() {
    let (_, http) = connect(CannedHttpClient::default().on(
        HttpMethod::Get,
        "/albums?ids=a%2Cb%2Cc",
        200,
        json!({"albums": [{"id": "a", "type": "album"}, null, {"id": "c", "type": "album"}]}),
    ));

    let albums = http.get_albums(&ids(&["a", "b", "c"]), None).await.unwrap();
    assert_eq!(albums.len(), 2);
    assert_eq!(albums[1]["id"], "c");
}

#[tokio::test]
async fn test_bulk_fetch_rejects_more_than_fifty_ids() {
    let (client, http) = connect(CannedHttpClient::default());
    let many: Vec<String> = (0..51).map(|i| format!("id{}", i)).collect();

    let err = http.get_tracks(&many, None).await.unwrap_err();
    assert!(matches!(err, SpotifyError::InvalidRequest(_)));
    assert!(client.requests().is_empty());

    assert!(http.get_artists(&[]).await.unwrap().is_empty());
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn test_paged_endpoint_sends_window() {
    let (client, http) = connect(CannedHttpClient::default().on(
        HttpMethod::Get,
        "/artists/x/albums?include_groups=album%2Csingle&limit=10&offset=20",
        200,
        json!({"items": [{"id": "1"}], "total": 21, "limit": 10, "offset": 20, "next": null, "previous": null}),
    ));

    let page = http
        .get_artist_albums("x", &ids(&["album", "single"]), None, PageRequest::new(10, 20))
        .await
        .unwrap();
    assert_eq!(page.total, Some(21));
    assert_eq!(page.items.len(), 1);
    assert_eq!(client.requests().len(), 1);
}

#[tokio::test]
async fn test_browse_endpoints_unwrap_page() {
    let (_, http) = connect(
        CannedHttpClient::default()
            .on(
                HttpMethod::Get,
                "/browse/new-releases?country=SE&limit=50&offset=0",
                200,
                json!({"albums": {"items": [{"id": "n"}], "total": 1}}),
            )
            .on(
                HttpMethod::Get,
                "/browse/featured-playlists?limit=50&offset=0",
                200,
                json!({"message": "Monday", "playlists": {"items": [], "total": 0}}),
            ),
    );

    let releases = http
        .get_browse_new_releases(Some("SE"), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(releases.items[0]["id"], "n");

    let featured = http
        .get_browse_featured_playlists(None, PageRequest::default())
        .await
        .unwrap();
    assert!(featured.is_empty());
}

#[tokio::test]
async fn test_top_tracks_and_related() {
    let (_, http) = connect(
        CannedHttpClient::default()
            .on(
                HttpMethod::Get,
                "/artists/x/top-tracks?country=US",
                200,
                json!({"tracks": [{"id": "t1"}, {"id": "t2"}]}),
            )
            .on(
                HttpMethod::Get,
                "/artists/x/related-artists",
                200,
                json!({"artists": [{"id": "r"}]}),
            ),
    );

    assert_eq!(http.get_artist_top_tracks("x", "US").await.unwrap().len(), 2);
    assert_eq!(http.get_artist_related("x").await.unwrap()[0]["id"], "r");
}

#[tokio::test]
async fn test_playlist_mutations() {
    let (client, http) = connect(
        CannedHttpClient::default()
            .on(
                HttpMethod::Post,
                "/playlists/p/tracks?uris=spotify%3Atrack%3A1&position=3",
                201,
                json!({"snapshot_id": "s2"}),
            )
            .on(HttpMethod::Delete, "/playlists/p/tracks", 200, json!({"snapshot_id": "s3"}))
            .on(HttpMethod::Put, "/playlists/p", 200, Value::Null)
            .on(HttpMethod::Put, "/playlists/p/images", 202, Value::Null),
    );

    let snapshot = http
        .post_playlist_tracks("p", &ids(&["spotify:track:1"]), Some(3))
        .await
        .unwrap();
    assert_eq!(snapshot, "s2");

    let snapshot = http
        .delete_playlist_tracks("p", &ids(&["spotify:track:1"]), "s2")
        .await
        .unwrap();
    assert_eq!(snapshot, "s3");

    let details = PlaylistDetails {
        description: Some("new".to_string()),
        ..Default::default()
    };
    http.put_playlist("p", &details).await.unwrap();
    http.put_playlist("p", &PlaylistDetails::default()).await.unwrap();
    http.put_playlist_image("p", b"\xff\xd8jpeg").await.unwrap();

    let requests = client.requests();
    assert_eq!(requests.len(), 4);

    let removed: Value = serde_json::from_slice(requests[1].body.as_deref().unwrap()).unwrap();
    assert_eq!(
        removed,
        json!({"tracks": [{"uri": "spotify:track:1"}], "snapshot_id": "s2"})
    );

    let edited: Value = serde_json::from_slice(requests[2].body.as_deref().unwrap()).unwrap();
    assert_eq!(edited, json!({"description": "new"}));

    assert_eq!(requests[3].body.as_deref(), Some(&b"/9hqcGVn"[..]));
    assert_eq!(
        requests[3].headers.get("Content-Type").map(String::as_str),
        Some("image/jpeg")
    );
}

#[tokio::test]
async fn test_create_playlist_and_library() {
    let (client, http) = connect(
        CannedHttpClient::default()
            .on(
                HttpMethod::Post,
                "/users/u/playlists",
                201,
                json!({"id": "new", "type": "playlist"}),
            )
            .on(HttpMethod::Put, "/me/albums?ids=a%2Cb", 200, Value::Null)
            .on(
                HttpMethod::Get,
                "/me/albums/contains?ids=a%2Cb",
                200,
                json!([true, false]),
            ),
    );

    let mut playlist = NewPlaylist::new("Mix");
    playlist.description = Some("weekly".to_string());
    let created = http.post_user_playlists("u", &playlist).await.unwrap();
    assert_eq!(created["id"], "new");

    http.put_me_albums(&ids(&["a", "b"])).await.unwrap();
    assert_eq!(
        http.get_me_albums_contains(&ids(&["a", "b"])).await.unwrap(),
        vec![true, false]
    );

    let sent: Value = serde_json::from_slice(client.requests()[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(
        sent,
        json!({"name": "Mix", "public": true, "collaborative": false, "description": "weekly"})
    );
}

#[tokio::test]
async fn test_missing_resource_is_not_found() {
    let (_, http) = connect(CannedHttpClient::default());
    let err = http.get_playlist("missing", None).await.unwrap_err();
    assert!(matches!(err, SpotifyError::NotFound(_)));
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_ids_with_reserved_characters_stay_one_segment() {
    let (client, http) = connect(
        CannedHttpClient::default()
            .on(
                HttpMethod::Get,
                "/users/old%20user%2F1/playlists?limit=50&offset=0",
                200,
                json!({"items": [{"id": "p1"}], "total": 1}),
            )
            .on(
                HttpMethod::Get,
                "/browse/categories/k%23pop/playlists?limit=50&offset=0",
                200,
                json!({"playlists": {"items": [], "total": 0}}),
            ),
    );

    let page = http
        .get_user_playlists("old user/1", PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.items[0]["id"], "p1");

    let page = http
        .get_browse_category_playlists("k#pop", None, PageRequest::default())
        .await
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(client.requests().len(), 2);
}
