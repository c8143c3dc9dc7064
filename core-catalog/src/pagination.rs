//! Offset/limit pagination over a Web API list endpoint
//!
//! A [`Paginator`] hands out one raw record per pull while fetching whole
//! pages behind the scenes. It stops when the caller's limit is reached,
//! when the server-declared total is reached, or when a refill comes back
//! empty (a server may declare more items than it delivers).

use futures::stream::{self, BoxStream, StreamExt};
use provider_spotify::{Page, PageRequest, PAGE_CAP};
use serde_json::Value;
use std::collections::VecDeque;
use std::future::Future;
use tracing::debug;

use crate::error::{CatalogError, Result};

/// Buffered lazy sequence of raw records from one list endpoint.
///
/// `fetch` receives the `limit`/`offset` window of each refill; every other
/// endpoint parameter is bound inside the closure. Concurrent pulls on the
/// same paginator are ruled out by `&mut self`.
///
/// # Example
///
/// ```ignore
/// let http = Arc::new(SpotifyHttp::new(http_client, tokens));
/// let mut pages = Paginator::new(move |page| {
///     let http = http.clone();
///     async move { http.get_me_playlists(page).await.map_err(CatalogError::from) }
/// })
/// .with_limit(Some(120));
///
/// while let Some(record) = pages.next_item().await? {
///     println!("{}", record["name"]);
/// }
/// ```
pub struct Paginator<F> {
    fetch: F,
    buffer: VecDeque<Value>,
    consumed: u32,
    declared_total: Option<u32>,
    limit: Option<u32>,
    refills: u32,
    exhausted: bool,
}

impl<F, Fut> Paginator<F>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page>>,
{
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            buffer: VecDeque::new(),
            consumed: 0,
            declared_total: None,
            limit: None,
            refills: 0,
            exhausted: false,
        }
    }

    /// Cap the number of items handed out; `None` is unbounded.
    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    /// Start from a first page that arrived embedded in a parent record,
    /// saving the initial round trip.
    pub fn with_seed(mut self, seed: Page) -> Self {
        self.declared_total = seed.total;
        self.buffer = seed.items.into();
        self
    }

    pub fn consumed(&self) -> u32 {
        self.consumed
    }

    pub fn declared_total(&self) -> Option<u32> {
        self.declared_total
    }

    /// Number of requests issued so far.
    pub fn refills(&self) -> u32 {
        self.refills
    }

    fn is_done(&self) -> bool {
        self.exhausted
            || self.limit.is_some_and(|limit| self.consumed >= limit)
            || self.declared_total.is_some_and(|total| self.consumed >= total)
    }

    async fn refill(&mut self) -> Result<()> {
        let page_limit = match self.limit {
            Some(limit) => PAGE_CAP.min(limit - self.consumed),
            None => PAGE_CAP,
        };
        let request = PageRequest {
            limit: page_limit,
            offset: self.consumed,
        };

        self.refills += 1;
        let page = (self.fetch)(request).await?;
        debug!(
            limit = request.limit,
            offset = request.offset,
            received = page.items.len(),
            total = ?page.total,
            "Page fetched"
        );

        if page.total.is_some() {
            self.declared_total = page.total;
        }
        self.buffer = page.items.into();
        Ok(())
    }

    /// Pull the next record; `Ok(None)` once the sequence has ended.
    ///
    /// A failed refill is returned as is; items already handed out stay
    /// consumed.
    pub async fn next_item(&mut self) -> Result<Option<Value>> {
        if self.is_done() {
            return Ok(None);
        }

        if self.buffer.is_empty() {
            self.refill().await?;
            if self.buffer.is_empty() {
                debug!(
                    consumed = self.consumed,
                    total = ?self.declared_total,
                    "Empty page before the declared total, ending sequence"
                );
                self.exhausted = true;
                return Ok(None);
            }
        }

        let item = self.buffer.pop_front();
        if item.is_some() {
            self.consumed += 1;
        }
        Ok(item)
    }

    /// Drive the paginator as a stream of records.
    pub fn into_stream(self) -> BoxStream<'static, Result<Value>>
    where
        F: Send + 'static,
        Fut: Send + 'static,
    {
        stream::try_unfold(self, |mut paginator| async move {
            let record = paginator.next_item().await?;
            Ok::<_, CatalogError>(record.map(|record| (record, paginator)))
        })
        .boxed()
    }
}
