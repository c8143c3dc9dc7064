//! Fixed-size batching of id lists for capped batch endpoints.

pub use provider_spotify::{
    MAX_BULK_IDS as BULK_FETCH_CHUNK, MAX_LIBRARY_IDS as LIBRARY_CHUNK,
    MAX_PLAYLIST_ADD as PLAYLIST_ADD_CHUNK, MAX_PLAYLIST_REMOVE as PLAYLIST_REMOVE_CHUNK,
};

/// Consecutive groups of at most `size` items, order preserved; only the
/// last group may be shorter. A `size` of zero is treated as one.
pub fn chunked<T>(items: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.max(1))
}

/// Owned copy of [`chunked`], for batches that outlive the input slice.
pub fn chunked_owned<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    chunked(items, size).map(<[T]>::to_vec).collect()
}
