//! Single-pass lazy sequences handed to callers.

use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::{CatalogError, Result};

/// Lazy, single-pass sequence of catalog items.
///
/// Each pull may wait on a network round trip; nothing is fetched ahead of
/// consumption. The sequence ends for good after its last item or after the
/// first error, and dropping it midway needs no cleanup.
///
/// Iterate with [`TryStreamExt::try_next`] or collect with
/// [`to_list`](Self::to_list):
///
/// ```ignore
/// use futures::TryStreamExt;
///
/// let mut tracks = album.tracks(None);
/// while let Some(track) = tracks.try_next().await? {
///     println!("{}", track.name);
/// }
///
/// let first_ten = playlist.tracks(None).to_list(Some(10)).await?;
/// ```
pub struct ListIterator<T> {
    inner: BoxStream<'static, Result<T>>,
    done: bool,
}

impl<T> ListIterator<T> {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<T>> + Send + 'static,
    {
        Self {
            inner: stream.boxed(),
            done: false,
        }
    }

    /// Sequence over items already in memory.
    pub fn from_items(items: Vec<T>) -> Self
    where
        T: Send + 'static,
    {
        Self::new(stream::iter(items.into_iter().map(Ok)))
    }

    /// Sequence that fails on its first pull.
    pub fn failed(error: CatalogError) -> Self
    where
        T: Send + 'static,
    {
        Self::new(stream::once(async move { Err(error) }))
    }

    /// Drain into a list, stopping without a further pull once `limit` items
    /// were collected.
    pub async fn to_list(mut self, limit: Option<usize>) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while limit.map_or(true, |limit| items.len() < limit) {
            match self.try_next().await? {
                Some(item) => items.push(item),
                None => break,
            }
        }
        Ok(items)
    }
}

impl<T> Stream for ListIterator<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }
        let polled = self.inner.poll_next_unpin(cx);
        if let Poll::Ready(None | Some(Err(_))) = &polled {
            self.done = true;
        }
        polled
    }
}

impl<T> std::fmt::Debug for ListIterator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListIterator")
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
