//! Timer-driven search filter
//!
//! [`LiveFilter`] wraps a [`SearchFilter`] and drives its countdown with a tokio
//! task. Every `set_query` aborts the previous task and spawns a new one that
//! sleeps until the new deadline, commits the query and publishes it on a
//! `watch` channel. Dropping the filter aborts the task, so nothing is
//! published after teardown.

use crate::filter::SearchFilter;
use crate::query::{SearchKey, Searchable};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A [`SearchFilter`] whose query settles on its own.
///
/// Must be used from within a tokio runtime.
pub struct LiveFilter<T> {
    shared: Arc<Mutex<SearchFilter<T>>>,
    settled_tx: Arc<watch::Sender<String>>,
    timer: Option<JoinHandle<()>>,
}

impl<T> LiveFilter<T>
where
    T: Searchable + Send + 'static,
{
    pub fn new(items: Vec<T>, key: SearchKey) -> Self {
        Self::from_filter(SearchFilter::new(items, key))
    }

    pub fn with_delay(items: Vec<T>, key: SearchKey, delay: Duration) -> Self {
        Self::from_filter(SearchFilter::with_delay(items, key, delay))
    }

    /// Take over a filter, arming a timer if it has a countdown in flight.
    pub fn from_filter(filter: SearchFilter<T>) -> Self {
        let (settled_tx, _) = watch::channel(filter.debounced_query().to_string());
        let deadline = filter.deadline();
        let mut live = Self {
            shared: Arc::new(Mutex::new(filter)),
            settled_tx: Arc::new(settled_tx),
            timer: None,
        };
        live.rearm(deadline);
        live
    }

    /// Receiver of settled queries. The current value is marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.settled_tx.subscribe()
    }

    /// Wait for the pending countdown to settle.
    ///
    /// Returns `None` straight away when no countdown is armed.
    pub async fn settled(&self) -> Option<String> {
        let mut rx = self.subscribe();
        lock(&self.shared).deadline()?;
        rx.changed().await.ok()?;
        let query = rx.borrow_and_update().clone();
        Some(query)
    }

    pub fn query(&self) -> String {
        lock(&self.shared).query().to_string()
    }

    pub fn debounced_query(&self) -> String {
        lock(&self.shared).debounced_query().to_string()
    }

    /// Record a new query and restart the quiet period.
    pub fn set_query(&mut self, query: impl Into<String>) {
        let deadline = {
            let mut filter = lock(&self.shared);
            filter.set_query(query);
            filter.deadline()
        };
        self.rearm(deadline);
    }

    /// Commit the pending query now and publish it.
    pub fn flush(&mut self) -> Option<String> {
        self.abort_timer();
        let settled = lock(&self.shared).flush().map(str::to_string);
        if let Some(query) = &settled {
            self.publish(query.clone());
        }
        settled
    }

    /// Drop the pending countdown. Returns the discarded query.
    pub fn cancel(&mut self) -> Option<String> {
        self.abort_timer();
        let (committed, discarded) = {
            let mut filter = lock(&self.shared);
            let committed = filter.poll().map(str::to_string);
            (committed, filter.cancel())
        };
        if let Some(query) = committed {
            self.publish(query);
        }
        discarded
    }

    /// Stop the timer and discard any pending query without publishing it.
    pub fn close(&mut self) {
        self.abort_timer();
        lock(&self.shared).cancel();
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.shared).is_pending()
    }

    pub fn deadline(&self) -> Option<Instant> {
        lock(&self.shared).deadline()
    }

    pub fn delay(&self) -> Duration {
        lock(&self.shared).delay()
    }

    /// Change the quiet period. An armed countdown restarts from now.
    pub fn set_delay(&mut self, delay: Duration) {
        let (committed, deadline) = {
            let mut filter = lock(&self.shared);
            let committed = filter.poll().map(str::to_string);
            filter.set_delay(delay);
            (committed, filter.deadline())
        };
        if let Some(query) = committed {
            self.publish(query);
        }
        self.rearm(deadline);
    }

    pub fn key(&self) -> SearchKey {
        lock(&self.shared).key().clone()
    }

    /// Replace the search key. Not debounced.
    pub fn set_key(&mut self, key: SearchKey) {
        lock(&self.shared).set_key(key);
    }

    /// Replace the whole collection. Not debounced.
    pub fn set_items(&mut self, items: Vec<T>) {
        lock(&self.shared).set_items(items);
    }

    /// Run `f` over the current filtered view without cloning it.
    pub fn with_filtered<R>(&self, f: impl FnOnce(&[&T]) -> R) -> R {
        let filter = lock(&self.shared);
        f(&filter.filtered())
    }

    /// Clone out the current filtered view.
    pub fn filtered(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.with_filtered(|view| view.iter().map(|&item| item.clone()).collect())
    }

    fn rearm(&mut self, deadline: Option<Instant>) {
        self.abort_timer();
        let Some(deadline) = deadline else {
            return;
        };

        let shared = Arc::clone(&self.shared);
        let settled_tx = Arc::clone(&self.settled_tx);
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            // a newer set_query moves the deadline, so this commits nothing if we lost the race
            let settled = lock(&shared).poll().map(str::to_string);
            if let Some(query) = settled {
                debug!(%query, "query settled");
                settled_tx.send_replace(query);
            }
        }));
    }

    fn publish(&self, query: String) {
        debug!(%query, "query settled");
        self.settled_tx.send_replace(query);
    }

    fn abort_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl<T> Drop for LiveFilter<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tokio::time::{advance, timeout};

    fn records() -> Vec<Value> {
        vec![
            json!({"id": 1, "username": "john_doe"}),
            json!({"id": 2, "username": "jane_doe"}),
            json!({"id": 3, "username": "michael_smith"}),
        ]
    }

    fn ids(view: &[Value]) -> Vec<i64> {
        view.iter().filter_map(|r| r["id"].as_i64()).collect()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_settles_and_is_published() {
        let start = Instant::now();
        let mut live = LiveFilter::new(records(), SearchKey::field("username"));
        let mut rx = live.subscribe();

        live.set_query("doe");
        assert_eq!(live.query(), "doe");
        assert_eq!(ids(&live.filtered()), vec![1, 2, 3]);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), "doe");
        assert!(Instant::now() - start >= ms(300));
        assert_eq!(live.debounced_query(), "doe");
        assert_eq!(ids(&live.filtered()), vec![1, 2]);
        assert!(!live.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_publishes_only_last_query() {
        let mut live = LiveFilter::new(records(), SearchKey::field("username"));
        let mut rx = live.subscribe();

        for query in ["a", "ab", "abc"] {
            live.set_query(query);
            advance(ms(100)).await;
            assert!(!rx.has_changed().unwrap());
        }

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), "abc");

        // nothing else is ever published
        assert!(timeout(ms(5_000), rx.changed()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_during_countdown_never_publishes() {
        let mut live = LiveFilter::new(records(), SearchKey::field("username"));
        let mut rx = live.subscribe();

        live.set_query("doe");
        advance(ms(100)).await;
        drop(live);

        // the channel closes instead of delivering "doe"
        assert!(rx.changed().await.is_err());
        assert_eq!(*rx.borrow(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_discards_pending_query() {
        let mut live = LiveFilter::new(records(), SearchKey::field("username"));
        let mut rx = live.subscribe();

        live.set_query("smith");
        live.close();
        advance(ms(1_000)).await;

        assert!(!rx.has_changed().unwrap());
        assert_eq!(live.debounced_query(), "");
        assert_eq!(ids(&live.filtered()), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_publishes_immediately() {
        let start = Instant::now();
        let mut live = LiveFilter::new(records(), SearchKey::field("username"));
        let mut rx = live.subscribe();

        live.set_query("smith");
        assert_eq!(live.flush(), Some("smith".to_string()));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), "smith");
        assert_eq!(Instant::now(), start);
        assert_eq!(ids(&live.filtered()), vec![3]);

        assert!(timeout(ms(1_000), rx.changed()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_returns_discarded_query() {
        let mut live = LiveFilter::new(records(), SearchKey::field("username"));
        let mut rx = live.subscribe();

        live.set_query("jane");
        assert_eq!(live.cancel(), Some("jane".to_string()));
        assert!(timeout(ms(1_000), rx.changed()).await.is_err());
        assert_eq!(live.query(), "jane");
        assert_eq!(live.debounced_query(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_waits_for_countdown() {
        let mut live = LiveFilter::new(records(), SearchKey::field("username"));
        assert_eq!(live.settled().await, None);

        live.set_query("JANE");
        assert_eq!(live.settled().await, Some("JANE".to_string()));
        assert_eq!(ids(&live.filtered()), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_items_and_key_apply_immediately() {
        let mut live = LiveFilter::new(records(), SearchKey::field("username"));
        live.set_query("doe");
        live.flush();

        live.set_items(vec![json!({"id": 9, "username": "doe_ray"})]);
        assert_eq!(ids(&live.filtered()), vec![9]);

        live.set_key(SearchKey::field("id"));
        assert!(live.filtered().is_empty());
        assert_eq!(live.key(), SearchKey::field("id"));

        let count = live.with_filtered(|view| view.len());
        assert_eq!(count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_delay_rearms_timer() {
        let start = Instant::now();
        let mut live = LiveFilter::with_delay(records(), SearchKey::field("username"), ms(500));
        let mut rx = live.subscribe();

        live.set_query("doe");
        advance(ms(100)).await;
        live.set_delay(ms(50));
        assert_eq!(live.delay(), ms(50));
        assert_eq!(live.deadline(), Some(start + ms(150)));

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), "doe");
        assert!(Instant::now() - start < ms(500));
    }
}
