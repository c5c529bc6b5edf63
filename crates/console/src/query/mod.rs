//! Query/mutation cache.
//!
//! Every read is keyed by a [`QueryKey`]. Concurrent reads of one key share a
//! single request; fresh data is served without a network call; stale data
//! with observers is served immediately while a background fetch revalidates
//! it. Successful mutations invalidate the keys listed in
//! [`Mutation::invalidates`].
//!
//! Fetches run in spawned tasks, so a result still lands in the cache when
//! every caller waiting on it has gone away.
//!
//! Entries live in a `moka` cache with idle eviction and a capacity bound.
//! Entries with live subscriptions or a fetch in flight are also tracked
//! separately, so eviction never detaches an observer from the key it
//! watches and never lets a second request start for a key already being
//! fetched.

mod key;
mod mutation;

pub use key::{QueryKey, scope};
pub use mutation::Mutation;

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use moka::future::Cache;
use parking_lot::Mutex;
use rand::Rng;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::config::QueryConfig;
use crate::error::ApiError;
use crate::notify::Notifier;

/// Description of the notification raised after a successful mutation.
pub const MUTATION_SUCCESS_MESSAGE: &str = "Operation completed successfully";

/// Description used when a failed read carries no server message.
pub const FETCH_FAILURE_MESSAGE: &str = "An error occurred while fetching data";

type FetchResult = Result<Value, ApiError>;
type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, FetchResult> + Send + Sync>;
type InFlight = Shared<BoxFuture<'static, FetchResult>>;

/// Lifecycle of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never fetched.
    Idle,
    /// A request is in flight. Earlier data, if any, is still available.
    Fetching,
    Success,
    Error,
}

// =============================================================================
// Entries
// =============================================================================

#[derive(Debug, Clone)]
struct Snapshot {
    status: QueryStatus,
    data: Option<Value>,
    error: Option<ApiError>,
    fetched_at: Option<(Instant, DateTime<Utc>)>,
    invalidated: bool,
}

impl Snapshot {
    const fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            fetched_at: None,
            invalidated: false,
        }
    }
}

struct EntryState {
    status: QueryStatus,
    data: Option<Value>,
    error: Option<ApiError>,
    fetched_at: Option<(Instant, DateTime<Utc>)>,
    invalidated: bool,
    /// A background failure has been notified since the last success.
    error_reported: bool,
    /// Bumped on invalidation; results of fetches started earlier are dropped.
    generation: u64,
    inflight: Option<InFlight>,
    /// An explicit `fetch` is waiting and will report failures itself.
    explicit_waiters: bool,
    /// Most recent fetcher, reused for background revalidation.
    fetcher: Option<Fetcher>,
}

impl EntryState {
    const fn new() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            fetched_at: None,
            invalidated: false,
            error_reported: false,
            generation: 0,
            inflight: None,
            explicit_waiters: false,
            fetcher: None,
        }
    }

    fn is_fresh(&self, stale_time: Duration) -> bool {
        self.data.is_some()
            && !self.invalidated
            && self
                .fetched_at
                .is_some_and(|(at, _)| at.elapsed() < stale_time)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            fetched_at: self.fetched_at,
            invalidated: self.invalidated,
        }
    }

    fn settled_status(&self) -> QueryStatus {
        if self.error.is_some() {
            QueryStatus::Error
        } else if self.data.is_some() {
            QueryStatus::Success
        } else {
            QueryStatus::Idle
        }
    }
}

struct Entry {
    key: QueryKey,
    state: Mutex<EntryState>,
    snapshots: watch::Sender<Snapshot>,
}

impl Entry {
    fn new(key: QueryKey) -> Self {
        let (snapshots, _) = watch::channel(Snapshot::idle());
        Self {
            key,
            state: Mutex::new(EntryState::new()),
            snapshots,
        }
    }

    fn is_observed(&self) -> bool {
        self.snapshots.receiver_count() > 0
    }

    fn publish(&self, state: &EntryState) {
        self.snapshots.send_replace(state.snapshot());
    }
}

// =============================================================================
// QueryCache
// =============================================================================

/// Shared cache of server reads.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    config: QueryConfig,
    notifier: Notifier,
    entries: Cache<QueryKey, Arc<Entry>>,
    observed: Mutex<HashMap<QueryKey, Weak<Entry>>>,
    /// Entries with a fetch in flight, held until it settles.
    pinned: Mutex<HashMap<QueryKey, Arc<Entry>>>,
}

impl CacheInner {
    fn pin(&self, entry: &Arc<Entry>) {
        self.pinned
            .lock()
            .insert(entry.key.clone(), Arc::clone(entry));
    }

    fn unpin(&self, entry: &Entry) {
        let mut pinned = self.pinned.lock();
        if pinned
            .get(&entry.key)
            .is_some_and(|p| std::ptr::eq(Arc::as_ptr(p), entry))
        {
            pinned.remove(&entry.key);
        }
    }
}

impl QueryCache {
    #[must_use]
    pub fn new(config: QueryConfig, notifier: Notifier) -> Self {
        let entries = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_idle(config.gc_time)
            .build();

        Self {
            inner: Arc::new(CacheInner {
                config,
                notifier,
                entries,
                observed: Mutex::new(HashMap::new()),
                pinned: Mutex::new(HashMap::new()),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &QueryConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    /// Describe a read. Nothing happens until the returned [`Query`] is
    /// fetched or watched.
    ///
    /// `fetch` may be called many times: once per network attempt and again
    /// for every background revalidation.
    pub fn query<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Query<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let fetcher: Fetcher = Arc::new(move || {
            let request = fetch();
            async move {
                let value = request.await?;
                Ok(serde_json::to_value(value)?)
            }
            .boxed()
        });

        Query {
            cache: self.clone(),
            key,
            fetcher,
            _data: PhantomData,
        }
    }

    async fn entry(&self, key: &QueryKey) -> Arc<Entry> {
        let revived = self
            .inner
            .pinned
            .lock()
            .get(key)
            .cloned()
            .or_else(|| self.inner.observed.lock().get(key).and_then(Weak::upgrade));
        let fresh_key = key.clone();
        self.inner
            .entries
            .get_with(key.clone(), async move {
                revived.unwrap_or_else(|| Arc::new(Entry::new(fresh_key)))
            })
            .await
    }

    async fn fetch_value(&self, key: &QueryKey, fetcher: Fetcher) -> FetchResult {
        let entry = self.entry(key).await;
        let inflight = {
            let mut state = entry.state.lock();
            state.fetcher = Some(Arc::clone(&fetcher));
            if state.is_fresh(self.inner.config.stale_time)
                && let Some(data) = &state.data
            {
                debug!(key = %key, "Cache hit");
                return Ok(data.clone());
            }
            state.explicit_waiters = true;
            start_fetch(&self.inner, &entry, &mut state, fetcher)
        };
        inflight.await
    }

    async fn observe(&self, key: &QueryKey, fetcher: Fetcher) -> (Arc<Entry>, watch::Receiver<Snapshot>) {
        let entry = self.entry(key).await;
        let receiver = entry.snapshots.subscribe();

        {
            let mut observed = self.inner.observed.lock();
            observed.retain(|_, weak| weak.upgrade().is_some_and(|e| e.is_observed()));
            observed.insert(key.clone(), Arc::downgrade(&entry));
        }

        {
            let mut state = entry.state.lock();
            state.fetcher = Some(Arc::clone(&fetcher));
            if !state.is_fresh(self.inner.config.stale_time) {
                start_fetch(&self.inner, &entry, &mut state, fetcher);
            }
        }

        (entry, receiver)
    }

    fn observed_entries(&self) -> Vec<Arc<Entry>> {
        self.inner
            .observed
            .lock()
            .values()
            .filter_map(Weak::upgrade)
            .filter(|entry| entry.is_observed())
            .collect()
    }

    /// Mark every entry under any of `prefixes` stale.
    ///
    /// Observed entries refetch in the background; unobserved ones refetch
    /// on their next read. Returns the number of entries affected.
    #[instrument(skip_all, fields(prefixes = prefixes.len()))]
    pub fn invalidate(&self, prefixes: &[QueryKey]) -> usize {
        if prefixes.is_empty() {
            return 0;
        }
        let matches = |key: &QueryKey| prefixes.iter().any(|prefix| key.starts_with(prefix));

        let mut targets: Vec<Arc<Entry>> = self
            .inner
            .entries
            .iter()
            .filter(|(key, _)| matches(&**key))
            .map(|(_, entry)| entry)
            .collect();
        for entry in self.observed_entries() {
            if matches(&entry.key) && !targets.iter().any(|t| Arc::ptr_eq(t, &entry)) {
                targets.push(entry);
            }
        }

        for entry in &targets {
            let mut state = entry.state.lock();
            state.generation += 1;
            state.invalidated = true;
            state.inflight = None;
            state.explicit_waiters = false;
            state.status = state.settled_status();

            match state.fetcher.clone() {
                Some(fetcher) if entry.is_observed() => {
                    debug!(key = %entry.key, "Revalidating observed entry");
                    start_fetch(&self.inner, entry, &mut state, fetcher);
                }
                _ => {
                    self.inner.unpin(entry);
                    entry.publish(&state);
                }
            }
        }

        debug!(count = targets.len(), "Invalidated cache entries");
        targets.len()
    }

    /// Revalidate stale observed entries, as when the console regains focus.
    /// Returns the number of fetches started.
    pub fn on_focus(&self) -> usize {
        if !self.inner.config.refetch_on_focus {
            return 0;
        }

        let mut started = 0;
        for entry in self.observed_entries() {
            let mut state = entry.state.lock();
            if state.inflight.is_some() || state.is_fresh(self.inner.config.stale_time) {
                continue;
            }
            if let Some(fetcher) = state.fetcher.clone() {
                start_fetch(&self.inner, &entry, &mut state, fetcher);
                started += 1;
            }
        }
        debug!(started, "Focus revalidation");
        started
    }

    /// Run a write, then invalidate what it affected.
    ///
    /// Success and failure both raise a notification. Mutations are never
    /// retried and the cache never rolls anything back; optimistic callers
    /// revert their own local state on error.
    ///
    /// # Errors
    ///
    /// Returns the operation's error unchanged.
    #[instrument(skip_all, fields(mutation = %mutation))]
    pub async fn mutate<T, Fut>(&self, mutation: Mutation, operation: Fut) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match operation.await {
            Ok(value) => {
                let invalidated = self.invalidate(&mutation.invalidates());
                debug!(invalidated, "Mutation succeeded");
                self.inner
                    .notifier
                    .success("Success", MUTATION_SUCCESS_MESSAGE);
                Ok(value)
            }
            Err(e) => {
                warn!(error = %e, "Mutation failed");
                self.inner.notifier.error("Error", e.user_message());
                Err(e)
            }
        }
    }

    /// Replace cached data directly, e.g. after a mutation returned the
    /// updated entity. Any in-flight fetch for the key is superseded.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if `value` cannot be serialized.
    pub async fn set_data<T: Serialize>(&self, key: &QueryKey, value: &T) -> Result<(), ApiError> {
        let value = serde_json::to_value(value)?;
        let entry = self.entry(key).await;
        let mut state = entry.state.lock();
        state.generation += 1;
        state.inflight = None;
        self.inner.unpin(&entry);
        state.data = Some(value);
        state.error = None;
        state.error_reported = false;
        state.invalidated = false;
        state.status = QueryStatus::Success;
        state.fetched_at = Some((Instant::now(), Utc::now()));
        entry.publish(&state);
        Ok(())
    }

    /// Cached data for `key`, without fetching. Stale data is returned too.
    pub async fn get_data<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.inner.entries.get(key).await?;
        let data = entry.state.lock().data.clone()?;
        serde_json::from_value(data).ok()
    }

    /// Drop every entry, e.g. when the signed-in user changes. Live
    /// subscriptions keep their current snapshot until resubscribed.
    pub fn clear(&self) {
        self.inner.entries.invalidate_all();
        self.inner.observed.lock().clear();
        self.inner.pinned.lock().clear();
        debug!("Cleared query cache");
    }
}

// =============================================================================
// Fetching
// =============================================================================

/// Attach to the in-flight fetch for an entry, or start one.
fn start_fetch(
    inner: &Arc<CacheInner>,
    entry: &Arc<Entry>,
    state: &mut EntryState,
    fetcher: Fetcher,
) -> InFlight {
    if let Some(inflight) = &state.inflight {
        return inflight.clone();
    }

    let generation = state.generation;
    let task_inner = Arc::clone(inner);
    let task_entry = Arc::clone(entry);
    let handle = tokio::spawn(async move {
        let result = fetch_with_retry(&fetcher, &task_inner.config).await;
        complete(&task_inner, &task_entry, generation, &result);
        result
    });

    let inflight = async move {
        handle
            .await
            .unwrap_or_else(|e| Err(ApiError::Network(format!("fetch task failed: {e}"))))
    }
    .boxed()
    .shared();

    state.inflight = Some(inflight.clone());
    inner.pin(entry);
    state.status = QueryStatus::Fetching;
    entry.publish(state);
    debug!(key = %entry.key, "Fetch started");
    inflight
}

async fn fetch_with_retry(fetcher: &Fetcher, config: &QueryConfig) -> FetchResult {
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Err(e) if e.is_retryable() && attempt < config.retry => {
                let delay = backoff(config, attempt);
                debug!(attempt, ?delay, error = %e, "Retrying fetch");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// `retry_delay * 2^attempt`, capped, plus up to 25% jitter.
fn backoff(config: &QueryConfig, attempt: u32) -> Duration {
    let base = config
        .retry_delay
        .saturating_mul(2_u32.saturating_pow(attempt))
        .min(config.max_retry_delay);
    let jitter_cap = u64::try_from(base.as_millis() / 4).unwrap_or(u64::MAX);
    let jitter = rand::rng().random_range(0..=jitter_cap);
    base + Duration::from_millis(jitter)
}

fn complete(inner: &CacheInner, entry: &Entry, generation: u64, result: &FetchResult) {
    let mut state = entry.state.lock();
    if state.generation != generation {
        debug!(key = %entry.key, "Discarding result of superseded fetch");
        if state.inflight.is_none() {
            inner.unpin(entry);
        }
        return;
    }

    state.inflight = None;
    inner.unpin(entry);
    let explicit = std::mem::take(&mut state.explicit_waiters);
    let report = match result {
        Ok(data) => {
            state.status = QueryStatus::Success;
            state.data = Some(data.clone());
            state.error = None;
            state.error_reported = false;
            state.invalidated = false;
            state.fetched_at = Some((Instant::now(), Utc::now()));
            None
        }
        Err(e) => {
            state.status = QueryStatus::Error;
            state.error = Some(e.clone());
            let first = !state.error_reported;
            state.error_reported = true;
            (!explicit && first).then_some(e)
        }
    };
    if let Some(e) = report {
        inner.notifier.error("Error", fetch_failure_description(e));
    }
    entry.publish(&state);
}

fn fetch_failure_description(error: &ApiError) -> String {
    error
        .server_message()
        .map_or_else(|| FETCH_FAILURE_MESSAGE.to_string(), str::to_string)
}

// =============================================================================
// Query handles
// =============================================================================

/// A described read, ready to be fetched once or watched.
pub struct Query<T> {
    cache: QueryCache,
    key: QueryKey,
    fetcher: Fetcher,
    _data: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Query<T> {
    #[must_use]
    pub const fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Resolve once: fresh cached data, the in-flight request, or a new one.
    /// Never serves stale data.
    ///
    /// # Errors
    ///
    /// Returns the fetch error after raising a notification for it.
    pub async fn fetch(self) -> Result<T, ApiError> {
        let result = self
            .cache
            .fetch_value(&self.key, self.fetcher)
            .await
            .and_then(|value| Ok(serde_json::from_value(value)?));

        if let Err(e) = &result {
            self.cache
                .notifier()
                .error("Error", fetch_failure_description(e));
        }
        result
    }

    /// Subscribe to the entry. Cached data is available immediately; stale
    /// or missing data is fetched in the background.
    pub async fn watch(self) -> QuerySubscription<T> {
        let (entry, receiver) = self.cache.observe(&self.key, self.fetcher).await;
        QuerySubscription {
            cache: self.cache,
            entry,
            receiver,
            _data: PhantomData,
        }
    }
}

/// Decoded view of an entry.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    pub data: Option<T>,
    pub error: Option<ApiError>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub is_stale: bool,
}

impl<T> QueryState<T> {
    #[must_use]
    pub const fn is_fetching(&self) -> bool {
        matches!(self.status, QueryStatus::Fetching)
    }

    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self.status, QueryStatus::Success | QueryStatus::Error)
    }
}

/// A live observer of one key. Dropping it stops observing; fetches already
/// started still complete and populate the cache.
pub struct QuerySubscription<T> {
    cache: QueryCache,
    entry: Arc<Entry>,
    receiver: watch::Receiver<Snapshot>,
    _data: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> QuerySubscription<T> {
    #[must_use]
    pub fn key(&self) -> &QueryKey {
        &self.entry.key
    }

    /// The latest state, marking it seen.
    pub fn current(&mut self) -> QueryState<T> {
        let snapshot = self.receiver.borrow_and_update().clone();
        self.decode(snapshot)
    }

    /// Wait for the next change and return it.
    pub async fn changed(&mut self) -> QueryState<T> {
        // The sender lives in the entry this subscription holds.
        let _ = self.receiver.changed().await;
        self.current()
    }

    /// Wait until no fetch is in flight.
    pub async fn settled(&mut self) -> QueryState<T> {
        let mut state = self.current();
        while !state.is_settled() {
            state = self.changed().await;
        }
        state
    }

    /// Start a background fetch unless one is already running.
    pub fn refetch(&self) {
        let mut state = self.entry.state.lock();
        if let Some(fetcher) = state.fetcher.clone() {
            start_fetch(&self.cache.inner, &self.entry, &mut state, fetcher);
        }
    }

    fn decode(&self, snapshot: Snapshot) -> QueryState<T> {
        let stale_time = self.cache.inner.config.stale_time;
        let is_stale = snapshot.invalidated
            || snapshot
                .fetched_at
                .is_none_or(|(at, _)| at.elapsed() >= stale_time);

        let (data, error) = match snapshot.data.map(serde_json::from_value::<T>) {
            Some(Ok(data)) => (Some(data), snapshot.error),
            Some(Err(e)) => (None, Some(ApiError::from(e))),
            None => (None, snapshot.error),
        };

        QueryState {
            status: snapshot.status,
            data,
            error,
            last_fetched_at: snapshot.fetched_at.map(|(_, at)| at),
            is_stale,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::notify::NotificationKind;

    type TestFetch = BoxFuture<'static, Result<usize, ApiError>>;

    fn config(stale_time: Duration) -> QueryConfig {
        QueryConfig {
            retry: 0,
            retry_delay: Duration::from_millis(1),
            max_retry_delay: Duration::from_millis(5),
            stale_time,
            ..QueryConfig::default()
        }
    }

    /// Fetcher that counts calls and returns the call number.
    fn counting(
        calls: &Arc<AtomicUsize>,
        delay: Duration,
    ) -> impl Fn() -> TestFetch + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                tokio::time::sleep(delay).await;
                Ok(n)
            }
            .boxed()
        }
    }

    /// Fetcher that fails with `error` for the first `failures` calls.
    fn flaky(
        calls: &Arc<AtomicUsize>,
        failures: usize,
        error: ApiError,
    ) -> impl Fn() -> TestFetch + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            let result = if n <= failures {
                Err(error.clone())
            } else {
                Ok(n)
            };
            async move { result }.boxed()
        }
    }

    fn list_key() -> QueryKey {
        QueryKey::scope(scope::ARTWORKS).with("list")
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<crate::notify::Notification>) -> Vec<crate::notify::Notification> {
        let mut out = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(n) => out.push(n),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return out,
                Err(TryRecvError::Lagged(_)) => {}
            }
        }
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_request() {
        let cache = QueryCache::new(config(Duration::ZERO), Notifier::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let a = cache.query(list_key(), counting(&calls, Duration::from_millis(20)));
        let b = cache.query(list_key(), counting(&calls, Duration::from_millis(20)));
        let (a, b) = tokio::join!(a.fetch(), b.fetch());

        assert_eq!(a.unwrap(), 1);
        assert_eq!(b.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fresh_data_is_served_from_cache() {
        let cache = QueryCache::new(config(Duration::from_secs(60)), Notifier::new());
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let value = cache
                .query(list_key(), counting(&calls, Duration::ZERO))
                .fetch()
                .await
                .unwrap();
            assert_eq!(value, 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_capacity_eviction_keeps_inflight_fetch_shared() {
        let cache = QueryCache::new(
            QueryConfig {
                max_entries: 2,
                ..config(Duration::ZERO)
            },
            Notifier::new(),
        );
        let slow_calls = Arc::new(AtomicUsize::new(0));
        let other_calls = Arc::new(AtomicUsize::new(0));
        let slow_key = QueryKey::scope(scope::ARTWORKS).with("search").with("kochi");

        let first = cache
            .query(slow_key.clone(), counting(&slow_calls, Duration::from_millis(300)))
            .fetch();
        let churn = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            for _ in 0..3 {
                for n in 0..5 {
                    let key = QueryKey::scope(scope::ARTWORKS).with("search").with(n);
                    cache
                        .query(key, counting(&other_calls, Duration::ZERO))
                        .fetch()
                        .await
                        .unwrap();
                }
                cache.inner.entries.run_pending_tasks().await;
            }
            cache
                .query(slow_key.clone(), counting(&slow_calls, Duration::from_millis(300)))
                .fetch()
                .await
        };
        let (first, second) = tokio::join!(first, churn);

        assert_eq!(first.unwrap(), 1);
        assert_eq!(second.unwrap(), 1);
        assert_eq!(slow_calls.load(Ordering::SeqCst), 1);
        assert!(cache.inner.pinned.lock().is_empty());
    }

    #[tokio::test]
    async fn test_idle_eviction_keeps_inflight_fetch_shared() {
        let cache = QueryCache::new(
            QueryConfig {
                gc_time: Duration::from_millis(50),
                ..config(Duration::ZERO)
            },
            Notifier::new(),
        );
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .query(list_key(), counting(&calls, Duration::from_millis(400)))
            .fetch();
        let late = async {
            tokio::time::sleep(Duration::from_millis(150)).await;
            cache.inner.entries.run_pending_tasks().await;
            cache
                .query(list_key(), counting(&calls, Duration::from_millis(400)))
                .fetch()
                .await
        };
        let (first, late) = tokio::join!(first, late);

        assert_eq!(first.unwrap(), 1);
        assert_eq!(late.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_stale_time_refetches_every_read() {
        let cache = QueryCache::new(config(Duration::ZERO), Notifier::new());
        let calls = Arc::new(AtomicUsize::new(0));

        cache.query(list_key(), counting(&calls, Duration::ZERO)).fetch().await.unwrap();
        let second = cache.query(list_key(), counting(&calls, Duration::ZERO)).fetch().await.unwrap();

        assert_eq!(second, 2);
    }

    #[tokio::test]
    async fn test_invalidate_matches_by_prefix() {
        let cache = QueryCache::new(config(Duration::from_secs(60)), Notifier::new());
        let list_calls = Arc::new(AtomicUsize::new(0));
        let detail_calls = Arc::new(AtomicUsize::new(0));
        let detail_key = QueryKey::scope(scope::ARTWORK).with("aw-1");

        cache.query(list_key(), counting(&list_calls, Duration::ZERO)).fetch().await.unwrap();
        cache.query(detail_key.clone(), counting(&detail_calls, Duration::ZERO)).fetch().await.unwrap();

        assert_eq!(cache.invalidate(&[QueryKey::scope(scope::ARTWORKS)]), 1);

        let list = cache.query(list_key(), counting(&list_calls, Duration::ZERO)).fetch().await.unwrap();
        let detail = cache.query(detail_key, counting(&detail_calls, Duration::ZERO)).fetch().await.unwrap();
        assert_eq!(list, 2);
        assert_eq!(detail, 1);
    }

    #[tokio::test]
    async fn test_observed_entry_revalidates_in_background() {
        let cache = QueryCache::new(config(Duration::from_secs(60)), Notifier::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut sub = cache
            .query(list_key(), counting(&calls, Duration::from_millis(5)))
            .watch()
            .await;
        let state = sub.settled().await;
        assert_eq!(state.data, Some(1));
        assert!(!state.is_stale);

        cache.invalidate(&[QueryKey::scope(scope::ARTWORKS)]);
        let state = sub.current();
        assert!(state.is_fetching());
        assert_eq!(state.data, Some(1), "stale data stays visible while revalidating");

        let state = sub.settled().await;
        assert_eq!(state.data, Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let cache = QueryCache::new(
            QueryConfig {
                retry: 3,
                ..config(Duration::ZERO)
            },
            Notifier::new(),
        );
        let calls = Arc::new(AtomicUsize::new(0));

        let value = cache
            .query(list_key(), flaky(&calls, 2, ApiError::Network("reset".to_string())))
            .fetch()
            .await
            .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        let cache = QueryCache::new(
            QueryConfig {
                retry: 3,
                ..config(Duration::ZERO)
            },
            notifier,
        );
        let calls = Arc::new(AtomicUsize::new(0));

        let err = cache
            .query(list_key(), flaky(&calls, 10, ApiError::NotFound("gone".to_string())))
            .fetch()
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let notes = drain(&mut rx);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Error);
        assert_eq!(notes[0].description, "gone");
    }

    #[tokio::test]
    async fn test_background_failures_notify_once_until_recovery() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        let cache = QueryCache::new(config(Duration::ZERO), notifier);
        let calls = Arc::new(AtomicUsize::new(0));

        let mut sub = cache
            .query(list_key(), flaky(&calls, 10, ApiError::Network("down".to_string())))
            .watch()
            .await;
        let state = sub.settled().await;
        assert_eq!(state.status, QueryStatus::Error);

        assert_eq!(cache.on_focus(), 1);
        sub.settled().await;

        let notes = drain(&mut rx);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].description, FETCH_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_mutation_success_invalidates_and_notifies() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        let cache = QueryCache::new(config(Duration::from_secs(60)), notifier);
        let calls = Arc::new(AtomicUsize::new(0));

        cache.query(list_key(), counting(&calls, Duration::ZERO)).fetch().await.unwrap();
        cache
            .mutate(Mutation::CreateArtwork, async { Ok::<_, ApiError>(()) })
            .await
            .unwrap();

        let notes = drain(&mut rx);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Success);
        assert_eq!(notes[0].description, MUTATION_SUCCESS_MESSAGE);

        let value = cache.query(list_key(), counting(&calls, Duration::ZERO)).fetch().await.unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_mutation_failure_notifies_and_keeps_cache() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        let cache = QueryCache::new(config(Duration::from_secs(60)), notifier);
        let calls = Arc::new(AtomicUsize::new(0));

        cache.query(list_key(), counting(&calls, Duration::ZERO)).fetch().await.unwrap();
        let err = cache
            .mutate(Mutation::CreateArtwork, async {
                Err::<(), _>(ApiError::Validation {
                    message: "Title is required".to_string(),
                    details: None,
                })
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Validation { .. }));
        let notes = drain(&mut rx);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Error);
        assert_eq!(notes[0].description, "Title is required");

        let value = cache.query(list_key(), counting(&calls, Duration::ZERO)).fetch().await.unwrap();
        assert_eq!(value, 1);
    }

    #[tokio::test]
    async fn test_result_lands_after_caller_gives_up() {
        let cache = QueryCache::new(config(Duration::from_secs(60)), Notifier::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let query = cache.query(list_key(), counting(&calls, Duration::from_millis(30)));
        let timed_out = tokio::time::timeout(Duration::from_millis(5), query.fetch()).await;
        assert!(timed_out.is_err());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get_data::<usize>(&list_key()).await, Some(1));
    }

    #[tokio::test]
    async fn test_set_data_replaces_cached_value() {
        let cache = QueryCache::new(config(Duration::from_secs(60)), Notifier::new());
        let calls = Arc::new(AtomicUsize::new(0));

        cache.set_data(&list_key(), &42_usize).await.unwrap();
        let value = cache.query(list_key(), counting(&calls, Duration::ZERO)).fetch().await.unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_backoff_grows_and_is_capped() {
        let config = QueryConfig {
            retry_delay: Duration::from_millis(1000),
            max_retry_delay: Duration::from_secs(30),
            ..QueryConfig::default()
        };

        let first = backoff(&config, 0);
        assert!(first >= Duration::from_millis(1000) && first <= Duration::from_millis(1250));

        let third = backoff(&config, 2);
        assert!(third >= Duration::from_millis(4000) && third <= Duration::from_millis(5000));

        let capped = backoff(&config, 20);
        assert!(capped >= Duration::from_secs(30) && capped <= Duration::from_millis(37_500));
    }
}
