// ── Reactive query subscriptions ──

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::{CacheEntry, QueryKey};

/// A subscription to one cache key.
///
/// Offers the entry captured at creation, the latest entry, and change
/// notification via [`changed`](Self::changed) or as a `Stream`.
pub struct QueryStream {
    key: QueryKey,
    current: CacheEntry,
    receiver: watch::Receiver<CacheEntry>,
}

impl QueryStream {
    pub(crate) fn new(key: QueryKey, mut receiver: watch::Receiver<CacheEntry>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self {
            key,
            current,
            receiver,
        }
    }

    pub fn key(&self) -> QueryKey {
        self.key
    }

    /// Entry as of creation or the last [`changed`](Self::changed).
    pub fn current(&self) -> &CacheEntry {
        &self.current
    }

    pub fn latest(&self) -> CacheEntry {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<CacheEntry> {
        self.receiver.changed().await.ok()?;
        let entry = self.receiver.borrow_and_update().clone();
        self.current = entry.clone();
        Some(entry)
    }

    /// Wait until `predicate` holds for the entry, checking the latest
    /// value first.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&CacheEntry) -> bool,
    ) -> Option<CacheEntry> {
        let entry = self.receiver.wait_for(predicate).await.ok()?.clone();
        self.current = entry.clone();
        Some(entry)
    }

    pub fn into_stream(self) -> QueryWatchStream {
        QueryWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding the entry each time it changes, starting with
/// the current one.
pub struct QueryWatchStream {
    inner: WatchStream<CacheEntry>,
}

impl Stream for QueryWatchStream {
    type Item = CacheEntry;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
