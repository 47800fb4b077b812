//! Writes that invalidate cached reads.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::watch;

use super::client::QueryClient;
use super::error::QueryError;
use super::key::CacheKey;
use crate::models::Validate;
use crate::transport::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Idle,
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationState<T> {
    pub status: MutationStatus,
    pub data: Option<T>,
    pub error: Option<QueryError>,
}

impl<T> Default for MutationState<T> {
    fn default() -> Self {
        Self {
            status: MutationStatus::Idle,
            data: None,
            error: None,
        }
    }
}

impl<T> MutationState<T> {
    pub fn is_idle(&self) -> bool {
        self.status == MutationStatus::Idle
    }

    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status == MutationStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == MutationStatus::Error
    }
}

struct MutationInner<T> {
    client: QueryClient,
    method: Method,
    endpoint: String,
    invalidates: Vec<CacheKey>,
    state: watch::Sender<MutationState<T>>,
}

/// An imperative write returning `T`, taking a body of type `R`.
///
/// On success every key in the invalidation list (and everything below it)
/// is invalidated before the mutation reports success. Failures, including
/// validation failures caught before sending, leave the cache untouched.
pub struct Mutation<T, R = ()> {
    inner: Arc<MutationInner<T>>,
    _body: PhantomData<fn(R)>,
}

impl<T, R> Clone for Mutation<T, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _body: PhantomData,
        }
    }
}

impl<T, R> fmt::Debug for Mutation<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutation")
            .field("method", &self.inner.method)
            .field("endpoint", &self.inner.endpoint)
            .field("invalidates", &self.inner.invalidates)
            .finish()
    }
}

impl<T, R> Mutation<T, R>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
    R: Serialize + Validate + Send + 'static,
{
    pub(crate) fn new(
        client: QueryClient,
        method: Method,
        endpoint: String,
        invalidates: Vec<CacheKey>,
    ) -> Self {
        let (state, _) = watch::channel(MutationState::default());
        Self {
            inner: Arc::new(MutationInner {
                client,
                method,
                endpoint,
                invalidates,
                state,
            }),
            _body: PhantomData,
        }
    }

    pub fn method(&self) -> Method {
        self.inner.method
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    pub fn invalidates(&self) -> &[CacheKey] {
        &self.inner.invalidates
    }

    pub fn state(&self) -> MutationState<T> {
        self.inner.state.borrow().clone()
    }

    /// Receiver that sees every later state change.
    pub fn subscribe(&self) -> watch::Receiver<MutationState<T>> {
        self.inner.state.subscribe()
    }

    /// Returns the mutation to idle.
    pub fn reset(&self) {
        self.inner.state.send_replace(MutationState::default());
    }

    /// Runs the write and waits for it, including the invalidation refetches.
    pub async fn mutate_async(&self, body: R) -> Result<T, QueryError> {
        if let Err(e) = body.validate() {
            return Err(self.fail(QueryError::Validation(e)));
        }
        let body = match serde_json::to_value(&body) {
            Ok(body) => body,
            Err(e) => return Err(self.fail(QueryError::Decode(e.to_string()))),
        };

        self.inner.state.send_replace(MutationState {
            status: MutationStatus::Pending,
            data: None,
            error: None,
        });

        // Detached: the write and its invalidations finish even if the
        // caller stops waiting.
        let mutation = self.clone();
        match tokio::spawn(async move { mutation.send(body).await }).await {
            Ok(result) => result,
            Err(e) => Err(self.fail(QueryError::Transport(e.to_string()))),
        }
    }

    /// Fires the write in the background; watch [`state`](Self::state) or
    /// [`subscribe`](Self::subscribe) for the outcome.
    pub fn mutate(&self, body: R) {
        let mutation = self.clone();
        tokio::spawn(async move {
            let _ = mutation.mutate_async(body).await;
        });
    }

    async fn send(&self, body: Value) -> Result<T, QueryError> {
        let inner = &self.inner;
        let result = inner
            .client
            .execute::<T>(inner.method, &inner.endpoint, Some(body))
            .await;

        match result {
            Ok(data) => {
                for key in &inner.invalidates {
                    inner.client.invalidate(key).await;
                }
                inner.state.send_replace(MutationState {
                    status: MutationStatus::Success,
                    data: Some(data.clone()),
                    error: None,
                });
                Ok(data)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&self, error: QueryError) -> QueryError {
        self.inner.state.send_replace(MutationState {
            status: MutationStatus::Error,
            data: None,
            error: Some(error.clone()),
        });
        error
    }
}
