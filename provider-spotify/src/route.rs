//! Request routes: method, path below the API base and query parameters.

use bridge_traits::http::HttpMethod;
use url::Url;

use crate::error::{Result, SpotifyError};
use crate::types::PageRequest;

/// One Web API endpoint invocation.
///
/// # Example
///
/// ```
/// use provider_spotify::Route;
///
/// let route = Route::get("/albums").query_list("ids", ["a", "b"]);
/// let url = route.url("https://api.spotify.com/v1").unwrap();
/// assert_eq!(url, "https://api.spotify.com/v1/albums?ids=a%2Cb");
///
/// let route = Route::get("/users").segment("a b").segment("playlists");
/// let url = route.url("https://api.spotify.com/v1").unwrap();
/// assert_eq!(url, "https://api.spotify.com/v1/users/a%20b/playlists");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    method: HttpMethod,
    path: String,
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl Route {
    /// `path` is a fixed endpoint path; caller-supplied ids go through
    /// [`Route::segment`].
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        let path = path.into();
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            method,
            path,
            segments,
            query: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Append one path segment. It is percent-encoded as a whole, so a `/`
    /// inside it does not split the path.
    pub fn segment(mut self, value: impl AsRef<str>) -> Self {
        let value = value.as_ref();
        self.path.push('/');
        self.path.push_str(value);
        self.segments.push(value.to_string());
        self
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Add the parameter only when a value is given.
    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Comma-joined list parameter; an empty list adds nothing.
    pub fn query_list<I, S>(self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        if joined.is_empty() {
            self
        } else {
            self.query(key, joined)
        }
    }

    pub fn page(self, page: PageRequest) -> Self {
        self.query("limit", page.limit).query("offset", page.offset)
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Absolute URL below `base` with path segments and query percent-encoded.
    pub fn url(&self, base: &str) -> Result<String> {
        let mut url = Url::parse(base)
            .map_err(|e| SpotifyError::InvalidRequest(format!("{}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| SpotifyError::InvalidRequest(format!("{}: not a base URL", base)))?
            .pop_if_empty()
            .extend(&self.segments);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url.into())
    }
}
