//! Mounted reads.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::watch;

use super::client::{decode, QueryClient};
use super::error::QueryError;
use super::key::CacheKey;

/// Transform applied to the unwrapped payload before it is cached.
pub type Select = Arc<dyn Fn(Value) -> Result<Value, QueryError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never fetched (disabled, or not started)
    Idle,
    /// First fetch in flight, no data yet
    Loading,
    Success,
    Error,
}

/// Untyped per-key state broadcast to every observer of the key.
#[derive(Debug, Clone)]
pub(crate) struct RawState {
    pub(crate) status: QueryStatus,
    pub(crate) data: Option<Arc<Value>>,
    pub(crate) error: Option<QueryError>,
    pub(crate) is_fetching: bool,
}

impl Default for RawState {
    fn default() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            is_fetching: false,
        }
    }
}

/// Snapshot of a read as seen by one consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    pub data: Option<T>,
    pub error: Option<QueryError>,
    /// Any fetch in flight, including background refetches
    pub is_fetching: bool,
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// The latest outcome: the error when the last fetch failed, the data
    /// otherwise.
    pub fn into_result(self) -> Result<T, QueryError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.data
            .ok_or_else(|| QueryError::Disabled("no data fetched".to_string()))
    }
}

/// Options for mounting a read.
#[derive(Clone)]
pub struct QueryOptions {
    pub(crate) endpoint: String,
    pub(crate) key: CacheKey,
    pub(crate) enabled: bool,
    pub(crate) select: Option<Select>,
}

impl QueryOptions {
    pub fn new(endpoint: impl Into<String>, key: impl Into<CacheKey>) -> Self {
        Self {
            endpoint: endpoint.into(),
            key: key.into(),
            enabled: true,
            select: None,
        }
    }

    /// Disabled reads never fetch.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Transforms the payload before caching it under this key.
    pub fn select<F>(mut self, select: F) -> Self
    where
        F: Fn(Value) -> Result<Value, QueryError> + Send + Sync + 'static,
    {
        self.select = Some(Arc::new(select));
        self
    }
}

impl fmt::Debug for QueryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryOptions")
            .field("endpoint", &self.endpoint)
            .field("key", &self.key)
            .field("enabled", &self.enabled)
            .field("select", &self.select.is_some())
            .finish()
    }
}

/// A mounted read of one cache key.
///
/// While an enabled `Query` is alive the key counts as observed: invalidating
/// it triggers a refetch. Dropping the handle unmounts it; a fetch still in
/// flight completes into the cache.
pub struct Query<T> {
    client: QueryClient,
    key: CacheKey,
    entry_id: u64,
    enabled: bool,
    receiver: watch::Receiver<RawState>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("key", &self.key)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl<T: DeserializeOwned> Query<T> {
    pub(crate) fn new(
        client: QueryClient,
        key: CacheKey,
        entry_id: u64,
        enabled: bool,
        receiver: watch::Receiver<RawState>,
    ) -> Self {
        Self {
            client,
            key,
            entry_id,
            enabled,
            receiver,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current state, decoded as `T`.
    ///
    /// Data that does not decode is reported as a `Decode` error.
    pub fn state(&self) -> QueryState<T> {
        let raw = self.receiver.borrow().clone();
        let mut state = QueryState {
            status: raw.status,
            data: None,
            error: raw.error,
            is_fetching: raw.is_fetching,
        };
        if let Some(data) = raw.data {
            match decode(&data) {
                Ok(data) => state.data = Some(data),
                Err(e) => {
                    state.status = QueryStatus::Error;
                    state.error = Some(e);
                }
            }
        }
        state
    }

    pub fn data(&self) -> Option<T> {
        self.state().data
    }

    /// Waits for the next state change. Returns false once the entry has
    /// been removed from the cache.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Waits until no fetch is in flight, then returns the state.
    ///
    /// Disabled reads return immediately.
    pub async fn settled(&mut self) -> QueryState<T> {
        loop {
            if !self.receiver.borrow_and_update().is_fetching {
                break;
            }
            if self.receiver.changed().await.is_err() {
                break;
            }
        }
        self.state()
    }

    /// Fetches again, joining a fetch already in flight.
    pub async fn refetch(&self) -> Result<T, QueryError> {
        if !self.enabled {
            return Err(QueryError::Disabled(self.key.to_string()));
        }
        let data = self
            .client
            .refetch(&self.key)
            .await
            .unwrap_or_else(|| Err(QueryError::Disabled(self.key.to_string())))?;
        decode(&data)
    }
}

impl<T> Drop for Query<T> {
    fn drop(&mut self) {
        self.client.release(&self.key, self.entry_id, self.enabled);
    }
}
