//! Scripted Web API for catalog tests

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_auth::StaticTokenProvider;
use core_catalog::{Client, State};
use provider_spotify::{RetryPolicy, SpotifyHttp};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const BASE: &str = "https://api.test/v1";

/// One request as the API saw it, query decoded.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: HttpMethod,
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
}

impl Call {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn offset(&self) -> u32 {
        self.param("offset").and_then(|o| o.parse().ok()).unwrap_or(0)
    }

    pub fn limit(&self) -> u32 {
        self.param("limit").and_then(|l| l.parse().ok()).unwrap_or(0)
    }

    pub fn ids(&self, key: &str) -> Vec<String> {
        self.param(key)
            .map(|ids| ids.split(',').map(str::to_string).collect())
            .unwrap_or_default()
    }
}

type Handler = dyn Fn(&Call) -> Option<(u16, Value)> + Send + Sync;

/// Answers every request through a handler; unhandled routes get 404.
pub struct FakeApi {
    handler: Box<Handler>,
    calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&Call) -> Option<(u16, Value)> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: HttpMethod, path: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method && call.path == path)
            .collect()
    }

    pub fn http(self: &Arc<Self>) -> SpotifyHttp {
        SpotifyHttp::new(self.clone(), Arc::new(StaticTokenProvider::new("token")))
            .with_base_url(BASE)
            .with_retry_policy(RetryPolicy::no_delay())
    }

    pub fn state(self: &Arc<Self>) -> State {
        State::new(self.http())
    }

    pub fn client(self: &Arc<Self>) -> Client {
        Client::from_http(self.http())
    }
}

#[async_trait]
impl HttpClient for FakeApi {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let url = url::Url::parse(&request.url).unwrap();
        let call = Call {
            method: request.method,
            path: url.path().trim_start_matches("/v1").to_string(),
            query: url.query_pairs().into_owned().collect(),
            body: request
                .body
                .as_ref()
                .and_then(|body| serde_json::from_slice(body).ok()),
        };
        let response = (self.handler)(&call);
        self.calls.lock().unwrap().push(call);

        Ok(match response {
            Some((status, body)) if body.is_null() => HttpResponse::new(status, String::new()),
            Some((status, body)) => HttpResponse::new(status, body.to_string()),
            None => HttpResponse::new(
                404,
                json!({"error": {"status": 404, "message": "Non existing id"}}).to_string(),
            ),
        })
    }
}

/// Serve `total` records of `make(i)` under offset/limit paging.
pub fn page_of(call: &Call, total: u32, make: impl Fn(u32) -> Value) -> Value {
    let start = call.offset();
    let end = (start + call.limit()).min(total);
    json!({
        "items": (start..end).map(make).collect::<Vec<_>>(),
        "total": total,
        "limit": call.limit(),
        "offset": start,
        "next": null,
        "previous": null,
    })
}

pub fn artist(id: &str) -> Value {
    json!({
        "id": id,
        "uri": format!("spotify:artist:{}", id),
        "type": "artist",
        "name": format!("Artist {}", id),
        "external_urls": {"spotify": format!("https://open.spotify.com/artist/{}", id)},
    })
}

pub fn simple_album(id: &str) -> Value {
    json!({
        "id": id,
        "uri": format!("spotify:album:{}", id),
        "type": "album",
        "album_type": "album",
        "name": format!("Album {}", id),
        "artists": [artist("ar1")],
        "images": [{"url": "https://i.test/640", "width": 640, "height": 640}],
        "release_date": "1999-07",
        "release_date_precision": "month",
        "total_tracks": 3,
    })
}

pub fn simple_track(id: &str) -> Value {
    json!({
        "id": id,
        "uri": format!("spotify:track:{}", id),
        "type": "track",
        "name": format!("Track {}", id),
        "artists": [artist("ar1")],
        "duration_ms": 215000,
        "explicit": false,
        "track_number": 1,
        "disc_number": 1,
    })
}

pub fn track(id: &str) -> Value {
    let mut record = simple_track(id);
    record["album"] = simple_album("al1");
    record["popularity"] = json!(40);
    record
}

pub fn user(id: &str) -> Value {
    json!({
        "id": id,
        "uri": format!("spotify:user:{}", id),
        "type": "user",
        "display_name": format!("User {}", id),
    })
}
