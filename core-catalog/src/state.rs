//! Session state shared by every entity of one client.

use futures::future;
use futures::stream::TryStreamExt;
use provider_spotify::{Page, PageRequest, SpotifyHttp};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::objectify::{Entity, EntityKind};
use crate::pagination::Paginator;
use crate::sequence::ListIterator;

/// Read-only handle to the client's transport.
///
/// Cloning is cheap; every clone refers to the same connection pool and
/// token cache.
#[derive(Clone)]
pub struct State {
    http: Arc<SpotifyHttp>,
}

impl State {
    pub fn new(http: SpotifyHttp) -> Self {
        Self {
            http: Arc::new(http),
        }
    }

    pub fn from_shared(http: Arc<SpotifyHttp>) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &SpotifyHttp {
        &self.http
    }

    /// Lazy sequence of entities over a list endpoint.
    ///
    /// `fetch` issues one page request; `seed` is a first page embedded in
    /// a parent record. With `list_kind` set, records are decoded as list
    /// items of that kind and wrappers whose item is `null` (content no
    /// longer available) are skipped.
    pub(crate) fn paginate<T, F, Fut>(
        &self,
        mut fetch: F,
        seed: Option<Page>,
        limit: Option<u32>,
        list_kind: Option<EntityKind>,
    ) -> ListIterator<T>
    where
        T: TryFrom<Entity, Error = CatalogError> + Send + 'static,
        F: FnMut(State, PageRequest) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Page>> + Send + 'static,
    {
        let fetch_state = self.clone();
        let mut paginator =
            Paginator::new(move |page: PageRequest| fetch(fetch_state.clone(), page)).with_limit(limit);
        if let Some(seed) = seed {
            paginator = paginator.with_seed(seed);
        }

        let state = self.clone();
        ListIterator::new(
            paginator
                .into_stream()
                .try_filter_map(move |record| future::ready(state.materialize(record, list_kind))),
        )
    }

    fn materialize<T>(&self, record: Value, list_kind: Option<EntityKind>) -> Result<Option<T>>
    where
        T: TryFrom<Entity, Error = CatalogError>,
    {
        if record.is_null() {
            debug!("Skipping null list entry");
            return Ok(None);
        }
        if let Some(kind) = list_kind {
            if record.get(kind.as_str()).map_or(false, Value::is_null) {
                debug!(kind = %kind, "Skipping unavailable list item");
                return Ok(None);
            }
        }
        self.objectify_in(record, list_kind)
            .and_then(T::try_from)
            .map(Some)
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.http, &other.http)
    }
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("api_base_url", &self.http.base_url())
            .finish()
    }
}
