//! The query client and its cache.

use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use super::error::QueryError;
use super::key::CacheKey;
use super::mutation::Mutation;
use super::observer::{Query, QueryOptions, QueryStatus, RawState, Select};
use crate::models::Validate;
use crate::transport::{Method, Transport};

/// Default time an unobserved entry is kept before it is dropped.
const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);

/// Recheck interval for an entry that is due for collection while fetching.
const MIN_GC_RECHECK: Duration = Duration::from_secs(1);

type FetchResult = Result<Arc<Value>, QueryError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// Cache timing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Data younger than this is served on mount without refetching
    pub stale_time: Duration,
    /// Entries left unobserved this long are dropped
    pub gc_time: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            gc_time: DEFAULT_GC_TIME,
        }
    }
}

/// How an entry is fetched: the endpoint and an optional transform of the
/// unwrapped payload applied before it is cached.
#[derive(Clone)]
pub(crate) struct FetchSpec {
    pub(crate) endpoint: String,
    pub(crate) select: Option<Select>,
}

struct InFlight {
    id: u64,
    generation: u64,
    future: SharedFetch,
}

struct Entry {
    /// Distinguishes this entry from any later one under the same key
    id: u64,
    spec: FetchSpec,
    state: watch::Sender<RawState>,
    /// Enabled observers currently mounted
    observers: usize,
    /// Bumped by every invalidation
    generation: u64,
    stale: bool,
    updated_at: Option<Instant>,
    unobserved_since: Option<Instant>,
    in_flight: Option<InFlight>,
}

impl Entry {
    fn new(id: u64, spec: FetchSpec) -> Self {
        let (state, _) = watch::channel(RawState::default());
        Self {
            id,
            spec,
            state,
            observers: 0,
            generation: 0,
            stale: false,
            updated_at: None,
            unobserved_since: Some(Instant::now()),
            in_flight: None,
        }
    }

    fn is_fresh(&self, stale_time: Duration) -> bool {
        match self.updated_at {
            Some(at) => !self.stale && at.elapsed() < stale_time,
            None => false,
        }
    }
}

pub(crate) struct Inner {
    transport: Arc<dyn Transport>,
    config: CacheConfig,
    entries: Mutex<HashMap<CacheKey, Entry>>,
    next_fetch_id: AtomicU64,
    next_entry_id: AtomicU64,
}

/// Handle to the shared query cache.
///
/// Cheap to clone; clones share one cache. Mounting queries spawns fetches on
/// the current tokio runtime.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("config", &self.inner.config)
            .field("entries", &self.inner.lock().len())
            .finish()
    }
}

impl QueryClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, CacheConfig::default())
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                config,
                entries: Mutex::new(HashMap::new()),
                next_fetch_id: AtomicU64::new(1),
                next_entry_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> CacheConfig {
        self.inner.config
    }

    /// The underlying transport, for calls that bypass the cache.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// Mounts an enabled read of `endpoint` cached under `key`.
    pub fn query<T>(&self, endpoint: impl Into<String>, key: impl Into<CacheKey>) -> Query<T>
    where
        T: DeserializeOwned,
    {
        self.query_with(QueryOptions::new(endpoint, key))
    }

    /// Mounts a read with explicit options.
    ///
    /// Enabled reads start a fetch unless the key already has one in flight
    /// or holds fresh data. Disabled reads never touch the network.
    pub fn query_with<T>(&self, options: QueryOptions) -> Query<T>
    where
        T: DeserializeOwned,
    {
        let QueryOptions {
            endpoint,
            key,
            enabled,
            select,
        } = options;
        let spec = FetchSpec { endpoint, select };

        let mut entries = self.inner.lock();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| self.inner.new_entry(spec.clone()));
        entry.spec = spec;
        let entry_id = entry.id;
        let receiver = entry.state.subscribe();

        if enabled {
            entry.observers += 1;
            entry.unobserved_since = None;

            if entry.in_flight.is_none() && !entry.is_fresh(self.inner.config.stale_time) {
                let _ = self.inner.begin_fetch(&key, entry);
            }
        } else if entry.observers == 0 {
            self.inner.schedule_gc(&key, entry_id);
        }
        drop(entries);

        Query::new(self.clone(), key, entry_id, enabled, receiver)
    }

    /// Creates a POST mutation that invalidates `key` on success.
    pub fn create<T, R>(&self, endpoint: impl Into<String>, key: impl Into<CacheKey>) -> Mutation<T, R>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
        R: Serialize + Validate + Send + 'static,
    {
        self.mutation(Method::Post, endpoint, vec![key.into()])
    }

    /// Creates a PUT (full replace) mutation that invalidates `key` on success.
    pub fn update<T, R>(&self, endpoint: impl Into<String>, key: impl Into<CacheKey>) -> Mutation<T, R>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
        R: Serialize + Validate + Send + 'static,
    {
        self.mutation(Method::Put, endpoint, vec![key.into()])
    }

    /// Creates a body-less DELETE mutation that invalidates `key` on success.
    pub fn delete<T>(&self, endpoint: impl Into<String>, key: impl Into<CacheKey>) -> Mutation<T, ()>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        self.mutation(Method::Delete, endpoint, vec![key.into()])
    }

    /// Creates a mutation with any method, invalidating every key in
    /// `invalidates` on success.
    pub fn mutation<T, R>(
        &self,
        method: Method,
        endpoint: impl Into<String>,
        invalidates: Vec<CacheKey>,
    ) -> Mutation<T, R>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
        R: Serialize + Validate + Send + 'static,
    {
        Mutation::new(self.clone(), method, endpoint.into(), invalidates)
    }

    /// Reads `key` without mounting an observer, sharing any in-flight fetch.
    ///
    /// Fresh cached data is returned without a request.
    pub async fn fetch_query<T>(
        &self,
        endpoint: impl Into<String>,
        key: impl Into<CacheKey>,
    ) -> Result<T, QueryError>
    where
        T: DeserializeOwned,
    {
        let key = key.into();
        let spec = FetchSpec {
            endpoint: endpoint.into(),
            select: None,
        };

        let cached = {
            let mut entries = self.inner.lock();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| self.inner.new_entry(spec.clone()));
            if entry.observers == 0 {
                entry.spec = spec;
                self.inner.schedule_gc(&key, entry.id);
            }
            if entry.is_fresh(self.inner.config.stale_time) {
                entry.state.borrow().data.clone()
            } else {
                None
            }
        };

        let data = match cached {
            Some(data) => data,
            None => self
                .inner
                .refetch(&key)
                .await
                .unwrap_or_else(|| Err(QueryError::Disabled(key.to_string())))?,
        };
        decode(&data)
    }

    /// Cached data for `key`, if any decodes as `T`.
    pub fn get_query_data<T>(&self, key: &CacheKey) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let entries = self.inner.lock();
        let data = entries.get(key)?.state.borrow().data.clone()?;
        decode(&data).ok()
    }

    /// Writes `data` into the cache for an existing entry.
    ///
    /// Returns false when nothing is registered under `key`.
    pub fn set_query_data<T>(&self, key: &CacheKey, data: &T) -> Result<bool, QueryError>
    where
        T: Serialize,
    {
        let value = serde_json::to_value(data).map_err(|e| QueryError::Decode(e.to_string()))?;
        let mut entries = self.inner.lock();
        let Some(entry) = entries.get_mut(key) else {
            return Ok(false);
        };
        entry.updated_at = Some(Instant::now());
        entry.stale = false;
        entry.state.send_modify(|state| {
            state.status = QueryStatus::Success;
            state.data = Some(Arc::new(value));
            state.error = None;
        });
        Ok(true)
    }

    /// Marks `key` and every key it prefixes stale, then refetches those with
    /// mounted observers and waits for the refetches to settle.
    ///
    /// Returns the number of entries refetched. Refetch failures land in the
    /// entries' error state.
    pub async fn invalidate(&self, key: &CacheKey) -> usize {
        let active: Vec<CacheKey> = {
            let mut entries = self.inner.lock();
            entries
                .iter_mut()
                .filter(|(k, _)| key.is_prefix_of(k))
                .filter_map(|(k, entry)| {
                    entry.generation += 1;
                    entry.stale = true;
                    (entry.observers > 0).then(|| k.clone())
                })
                .collect()
        };

        tracing::debug!(key = %key, refetching = active.len(), "invalidated");
        join_all(active.iter().map(|k| self.inner.refetch(k))).await;
        active.len()
    }

    /// Drops the entry for `key`. Mounted observers keep their last state and
    /// no longer count toward a later entry under the same key.
    pub fn remove(&self, key: &CacheKey) -> bool {
        self.inner.lock().remove(key).is_some()
    }

    /// Drops every entry that has been unobserved for longer than `gc_time`.
    ///
    /// Entries are also collected on their own once their last observer
    /// goes away; this sweeps them all at once. Returns the number removed.
    pub fn gc(&self) -> usize {
        let gc_time = self.inner.config.gc_time;
        let mut entries = self.inner.lock();
        let before = entries.len();
        entries.retain(|_, entry| {
            entry.observers > 0
                || entry.in_flight.is_some()
                || entry
                    .unobserved_since
                    .map_or(true, |since| since.elapsed() < gc_time)
        });
        before - entries.len()
    }

    /// Whether anything is cached under exactly `key`.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock().contains_key(key)
    }

    /// True while `key` has a fetch in flight.
    pub fn is_fetching(&self, key: &CacheKey) -> bool {
        self.inner
            .lock()
            .get(key)
            .is_some_and(|entry| entry.in_flight.is_some())
    }

    /// Sends a request through the transport and unwraps the envelope,
    /// without touching the cache.
    pub async fn execute<T>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<T, QueryError>
    where
        T: DeserializeOwned,
    {
        let body = if method.has_body() { body } else { None };
        let response = self.inner.transport.send(method, endpoint, body).await?;
        let data = response.into_data()?;
        serde_json::from_value(data).map_err(|e| QueryError::Decode(e.to_string()))
    }

    pub(crate) async fn refetch(&self, key: &CacheKey) -> Option<FetchResult> {
        self.inner.refetch(key).await
    }

    pub(crate) fn release(&self, key: &CacheKey, entry_id: u64, enabled: bool) {
        if !enabled {
            return;
        }
        let mut entries = self.inner.lock();
        let Some(entry) = entries.get_mut(key).filter(|entry| entry.id == entry_id) else {
            return;
        };
        entry.observers = entry.observers.saturating_sub(1);
        if entry.observers == 0 {
            entry.unobserved_since = Some(Instant::now());
            self.inner.schedule_gc(key, entry_id);
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Entry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn new_entry(&self, spec: FetchSpec) -> Entry {
        Entry::new(self.next_entry_id.fetch_add(1, Ordering::Relaxed), spec)
    }

    /// Starts a fetch for `entry` on its own task and records it as in flight.
    ///
    /// The fetch settles the entry whether or not anyone awaits the returned
    /// future; callers that give up only stop waiting.
    fn begin_fetch(self: &Arc<Self>, key: &CacheKey, entry: &mut Entry) -> SharedFetch {
        let id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let generation = entry.generation;
        let spec = entry.spec.clone();
        let transport = Arc::clone(&self.transport);
        let weak: Weak<Inner> = Arc::downgrade(self);
        let fetch_key = key.clone();

        tracing::debug!(key = %key, endpoint = %spec.endpoint, "fetching");

        let future = async move {
            let result = fetch(transport.as_ref(), &spec).await;
            if let Some(inner) = weak.upgrade() {
                inner.settle(&fetch_key, id, generation, &result);
            }
            result
        }
        .boxed()
        .shared();

        tokio::spawn(future.clone());
        entry.in_flight = Some(InFlight {
            id,
            generation,
            future: future.clone(),
        });
        entry.state.send_modify(|state| {
            state.is_fetching = true;
            if state.data.is_none() {
                state.status = QueryStatus::Loading;
            }
        });

        future
    }

    fn settle(&self, key: &CacheKey, id: u64, generation: u64, result: &FetchResult) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        if entry.in_flight.as_ref().map(|f| f.id) != Some(id) {
            return;
        }
        entry.in_flight = None;

        match result {
            Ok(data) => {
                entry.updated_at = Some(Instant::now());
                // Invalidated while in flight: the data predates the write
                entry.stale = generation != entry.generation;
                entry.state.send_modify(|state| {
                    state.status = QueryStatus::Success;
                    state.data = Some(Arc::clone(data));
                    state.error = None;
                    state.is_fetching = false;
                });
                tracing::debug!(key = %key, "fetch succeeded");
            }
            Err(e) => {
                entry.stale = true;
                entry.state.send_modify(|state| {
                    state.status = QueryStatus::Error;
                    state.error = Some(e.clone());
                    state.is_fetching = false;
                });
                tracing::debug!(key = %key, error = %e, "fetch failed");
            }
        }
    }

    /// Drops the entry `entry_id` under `key` once it has gone `gc_time`
    /// without observers. A remount cancels the removal.
    fn schedule_gc(self: &Arc<Self>, key: &CacheKey, entry_id: u64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let weak = Arc::downgrade(self);
        let key = key.clone();
        let gc_time = self.config.gc_time;

        runtime.spawn(async move {
            let mut wait = gc_time;
            loop {
                tokio::time::sleep(wait).await;
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                match inner.collect(&key, entry_id) {
                    Some(remaining) => wait = remaining,
                    None => return,
                }
            }
        });
    }

    /// Removes the entry if it is still the same, unobserved, idle and past
    /// `gc_time`. Returns how much longer to wait when it is not due yet.
    fn collect(&self, key: &CacheKey, entry_id: u64) -> Option<Duration> {
        let gc_time = self.config.gc_time;
        let mut entries = self.lock();
        let entry = entries.get(key).filter(|entry| entry.id == entry_id)?;
        if entry.observers > 0 {
            return None;
        }
        let elapsed = entry.unobserved_since?.elapsed();
        if entry.in_flight.is_some() {
            return Some(gc_time.max(MIN_GC_RECHECK));
        }
        if elapsed < gc_time {
            return Some(gc_time - elapsed);
        }
        entries.remove(key);
        tracing::trace!(key = %key, "collected");
        None
    }

    /// Fetches `key`, joining an in-flight request when it is current.
    ///
    /// A request started before the latest invalidation is awaited and then
    /// followed by a fresh one, keeping at most one request per key in flight.
    /// Returns `None` when the key is not registered.
    async fn refetch(self: &Arc<Self>, key: &CacheKey) -> Option<FetchResult> {
        loop {
            let (future, current) = {
                let mut entries = self.lock();
                let entry = entries.get_mut(key)?;
                match &entry.in_flight {
                    Some(in_flight) => (
                        in_flight.future.clone(),
                        in_flight.generation == entry.generation,
                    ),
                    None => (self.begin_fetch(key, entry), true),
                }
            };

            let result = future.await;
            if current {
                return Some(result);
            }
        }
    }
}

async fn fetch(transport: &dyn Transport, spec: &FetchSpec) -> FetchResult {
    let response = transport.send(Method::Get, &spec.endpoint, None).await?;
    let data = response.into_data()?;
    let data = match &spec.select {
        Some(select) => select(data)?,
        None => data,
    };
    Ok(Arc::new(data))
}

pub(crate) fn decode<T: DeserializeOwned>(data: &Value) -> Result<T, QueryError> {
    T::deserialize(data).map_err(|e| QueryError::Decode(e.to_string()))
}
