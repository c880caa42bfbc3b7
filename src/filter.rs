//! Debounced search filter
//!
//! [`SearchFilter`] keeps a source collection, a search key, the raw query and
//! its debounced copy. The filtered view is a pure function of the collection,
//! the key and the debounced query; it is cached as a list of indices and
//! rebuilt from scratch whenever one of those changes.

use crate::debounce::{DEFAULT_DELAY, Debounced};
use crate::query::{Needle, SearchKey, Searchable};
use std::borrow::Cow;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Indices of the elements of `items` retained for `query`, in collection order.
pub fn filter_indices<T: Searchable>(items: &[T], key: &SearchKey, query: &str) -> Vec<usize> {
    let needle = Needle::new(query);
    let indices: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| key.matches(*item, &needle))
        .map(|(i, _)| i)
        .collect();
    trace!(
        total = items.len(),
        retained = indices.len(),
        %key,
        "filter pass"
    );
    indices
}

/// Elements of `items` retained for `query`, in collection order.
pub fn filter_items<'a, T: Searchable>(items: &'a [T], key: &SearchKey, query: &str) -> Vec<&'a T> {
    filter_indices(items, key, query)
        .into_iter()
        .map(|i| &items[i])
        .collect()
}

/// A collection filtered by a debounced, case-insensitive substring query.
///
/// Only the query is debounced. Replacing the collection or the key applies
/// to the very next read of the view.
#[derive(Debug, Clone)]
pub struct SearchFilter<T> {
    items: Vec<T>,
    key: SearchKey,
    query: String,
    debounced: Debounced<String>,
    matches: Vec<usize>,
}

impl<T: Searchable> SearchFilter<T> {
    /// Create a filter with the default 300ms quiet period.
    pub fn new(items: Vec<T>, key: SearchKey) -> Self {
        Self::with_delay(items, key, DEFAULT_DELAY)
    }

    pub fn with_delay(items: Vec<T>, key: SearchKey, delay: Duration) -> Self {
        // the empty query retains everything
        let matches = (0..items.len()).collect();
        Self {
            items,
            key,
            query: String::new(),
            debounced: Debounced::new(String::new(), delay),
            matches,
        }
    }

    /// The raw query, updated synchronously by [`set_query`](Self::set_query).
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Record a new query and restart the quiet period.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.debounced.set(self.query.clone());
    }

    /// The query the view is currently filtered by.
    pub fn debounced_query(&self) -> &str {
        self.debounced.get()
    }

    /// The filtered view as of now, in collection order.
    pub fn filtered(&self) -> Vec<&T> {
        self.filtered_indices()
            .iter()
            .map(|&i| &self.items[i])
            .collect()
    }

    /// Positions in [`items`](Self::items) of the filtered view.
    pub fn filtered_indices(&self) -> Cow<'_, [usize]> {
        match self.debounced.ready() {
            // settled by the clock but not committed by `poll` yet
            Some(query) => Cow::Owned(filter_indices(&self.items, &self.key, query)),
            None => Cow::Borrowed(&self.matches),
        }
    }

    /// Commit an elapsed countdown. Returns the newly settled query.
    pub fn poll(&mut self) -> Option<&str> {
        if self.debounced.poll().is_some() {
            self.refresh();
            Some(self.debounced.settled().as_str())
        } else {
            None
        }
    }

    /// Commit the pending query without waiting for the quiet period.
    pub fn flush(&mut self) -> Option<&str> {
        if self.debounced.flush().is_some() {
            self.refresh();
            Some(self.debounced.settled().as_str())
        } else {
            None
        }
    }

    /// Drop the pending countdown, keeping the last settled query.
    ///
    /// The raw query is left as typed; returns the discarded pending query.
    pub fn cancel(&mut self) -> Option<String> {
        self.poll();
        self.debounced.cancel()
    }

    pub fn is_pending(&self) -> bool {
        self.debounced.is_pending()
    }

    /// When the armed countdown elapses, for event loops that sleep until then.
    pub fn deadline(&self) -> Option<Instant> {
        self.debounced.deadline()
    }

    pub fn delay(&self) -> Duration {
        self.debounced.delay()
    }

    /// Change the quiet period. An armed countdown restarts from now.
    pub fn set_delay(&mut self, delay: Duration) {
        self.poll();
        self.debounced.set_delay(delay);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Replace the whole collection. Not debounced.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.refresh();
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn key(&self) -> &SearchKey {
        &self.key
    }

    /// Replace the search key. Not debounced.
    pub fn set_key(&mut self, key: SearchKey) {
        self.key = key;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.matches = filter_indices(&self.items, &self.key, self.debounced.settled());
    }
}
