//! In-memory transport with scripted responses.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Notify, Semaphore};

use super::{Method, Transport, TransportError, TransportResponse};

/// A request seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
enum Scripted {
    Respond(TransportResponse),
    Fail(TransportError),
}

/// Transport answering from a table of `(method, path)` routes.
///
/// Routes are sticky: a scripted response is returned for every matching
/// request until replaced. Unscripted routes answer `404`. Requests are
/// recorded before the response is produced, so a paused transport still
/// shows how many requests are in flight.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), Scripted>>,
    requests: Mutex<Vec<RecordedRequest>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    arrived: Notify,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `status` + `body` for `method path`.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        lock(&self.routes).insert(
            (method, path.to_string()),
            Scripted::Respond(TransportResponse::new(status, body)),
        );
    }

    /// Scripts an enveloped success: `{"data": data, "status": status}`.
    pub fn respond_data(&self, method: Method, path: &str, status: u16, data: Value) {
        self.respond(method, path, status, json!({ "data": data, "status": status }));
    }

    /// Scripts a transport-level failure for `method path`.
    pub fn fail(&self, method: Method, path: &str, error: TransportError) {
        lock(&self.routes).insert((method, path.to_string()), Scripted::Fail(error));
    }

    /// Holds every subsequent request until [`resume`](Self::resume).
    pub fn pause(&self) {
        *lock(&self.gate) = Some(Arc::new(Semaphore::new(0)));
    }

    /// Releases all held requests.
    pub fn resume(&self) {
        if let Some(gate) = lock(&self.gate).take() {
            gate.close();
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests recorded for `method path`.
    pub fn count(&self, method: Method, path: &str) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn total(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Waits until at least `n` requests have been recorded in total.
    pub async fn wait_for_requests(&self, n: usize) {
        loop {
            let arrived = self.arrived.notified();
            if self.total() >= n {
                return;
            }
            arrived.await;
        }
    }

    fn lookup(&self, method: Method, path: &str) -> Scripted {
        lock(&self.routes)
            .get(&(method, path.to_string()))
            .cloned()
            .unwrap_or_else(|| {
                Scripted::Respond(TransportResponse::new(
                    404,
                    json!({ "data": null, "message": format!("no route for {} {}", method, path), "status": 404 }),
                ))
            })
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<TransportResponse, TransportError> {
        lock(&self.requests).push(RecordedRequest {
            method,
            path: path.to_string(),
            body,
        });
        self.arrived.notify_waiters();

        let gate = lock(&self.gate).clone();
        if let Some(gate) = gate {
            // Closed on resume; the error is the release signal
            let _ = gate.acquire().await;
        }

        match self.lookup(method, path) {
            Scripted::Respond(response) => Ok(response),
            Scripted::Fail(error) => Err(error),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
