//! Development backend for the console.
//!
//! Serves every resource path under `/api/v1` from an in-memory [`Store`],
//! speaking the same enveloped contract the query client expects.

pub mod routes;
pub mod store;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use routes::ApiError;
pub use store::Store;

pub const API_PREFIX: &str = "/api/v1";

/// Server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Bearer token required on API routes, if set
    pub token: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = env("HMS_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let token = env("HMS_API_TOKEN").filter(|t| !t.is_empty());

        Self { port, token }
    }
}

/// Application state shared across handlers
#[derive(Clone, Default)]
pub struct AppState {
    pub store: Arc<Store>,
    token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store, token: None }
    }

    pub fn with_token(mut self, token: impl Into<Arc<str>>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Rejects API requests without the configured bearer token.
async fn auth_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(expected) = state.token.as_deref() else {
        return next.run(request).await;
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) if token == expected => next.run(request).await,
        Some(_) => ApiError::new(StatusCode::UNAUTHORIZED, "Invalid API token").into_response(),
        None => ApiError::new(
            StatusCode::UNAUTHORIZED,
            "Authorization header must use Bearer scheme",
        )
        .into_response(),
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Builds the full router: `/health` plus the API under [`API_PREFIX`].
pub fn app(state: AppState) -> Router {
    let api = routes::router().layer(middleware::from_fn_with_state(
        state.clone(),
        auth_middleware,
    ));

    Router::new()
        .route("/health", get(health))
        .nest(API_PREFIX, api)
        .fallback(routes::fallback)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Method as HttpMethod;
    use hms_core::{
        CacheKey, CreatePatientRequest, Gender, HttpTransport, Patients, QueryClient, QueryError,
        StaffMembers,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(app: Router, method: HttpMethod, uri: &str, body: Option<Value>) -> (u16, Value) {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status().as_u16();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn patient_body() -> Value {
        json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "dateOfBirth": "1985-03-14",
            "gender": "Female",
            "phoneNumber": "555-0100",
            "address": "1 Main St"
        })
    }

    #[test]
    fn test_config_from_lookup() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config, ServerConfig { port: 8080, token: None });

        let config = ServerConfig::from_lookup(|name| match name {
            "HMS_PORT" => Some("9090".into()),
            "HMS_API_TOKEN" => Some("secret".into()),
            _ => None,
        });
        assert_eq!(config.port, 9090);
        assert_eq!(config.token.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_create_then_get_is_enveloped() {
        let app = app(AppState::default());

        let (status, body) = send(
            app.clone(),
            HttpMethod::POST,
            "/api/v1/patients",
            Some(patient_body()),
        )
        .await;
        assert_eq!(status, 201);
        assert_eq!(body["status"], 201);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(app, HttpMethod::GET, &format!("/api/v1/patients/{}", id), None).await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["firstName"], "Jane");
        assert_eq!(body["data"]["medicalHistory"], json!([]));
    }

    #[tokio::test]
    async fn test_missing_record_is_enveloped_404() {
        let app = app(AppState::default());
        let (status, body) = send(app, HttpMethod::DELETE, "/api/v1/staff/9", None).await;

        assert_eq!(status, 404);
        assert_eq!(body["data"], Value::Null);
        assert_eq!(body["status"], 404);
        assert_eq!(body["message"], "Staff member not found: 9");
    }

    #[tokio::test]
    async fn test_invalid_body_is_rejected() {
        let app = app(AppState::default());
        let mut body = patient_body();
        body["firstName"] = json!("");

        let (status, body) = send(app, HttpMethod::POST, "/api/v1/patients", Some(body)).await;
        assert_eq!(status, 400);
        assert_eq!(body["message"], "firstName is required");
    }

    #[tokio::test]
    async fn test_malformed_json_is_enveloped() {
        let app = app(AppState::default());
        let (status, body) = send(
            app,
            HttpMethod::POST,
            "/api/v1/staff",
            Some(json!({"firstName": 3})),
        )
        .await;

        assert!(status >= 400 && status < 500);
        assert_eq!(body["data"], Value::Null);
    }

    #[tokio::test]
    async fn test_bad_date_filter() {
        let app = app(AppState::default());
        let (status, _) = send(app, HttpMethod::GET, "/api/v1/appointments/date/tomorrow", None).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_unknown_route_is_enveloped() {
        let app = app(AppState::default());
        let (status, body) = send(app, HttpMethod::GET, "/api/v1/billing", None).await;
        assert_eq!(status, 404);
        assert_eq!(body["data"], Value::Null);
    }

    #[tokio::test]
    async fn test_token_required_when_configured() {
        let app = app(AppState::default().with_token("secret"));

        let (status, body) = send(app.clone(), HttpMethod::GET, "/api/v1/tasks", None).await;
        assert_eq!(status, 401);
        assert_eq!(body["status"], 401);

        let request = axum::http::Request::builder()
            .uri("/api/v1/tasks")
            .header(header::AUTHORIZATION, "Bearer secret")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, _) = send(app, HttpMethod::GET, "/health", None).await;
        assert_eq!(status, 200);
    }

    /// Serves the app on an ephemeral port and returns the API base URL.
    async fn serve(state: AppState) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.unwrap();
        });
        format!("http://{}{}", addr, API_PREFIX)
    }

    #[tokio::test]
    async fn test_query_client_over_http() {
        let base_url = serve(AppState::default()).await;
        let client = QueryClient::new(Arc::new(HttpTransport::new(base_url)));
        let patients = Patients::new(client.clone());

        let mut list = patients.list();
        assert_eq!(list.settled().await.into_result().unwrap(), Vec::new());

        let created = patients
            .create()
            .mutate_async(CreatePatientRequest {
                first_name: "Jane".into(),
                last_name: "Doe".into(),
                date_of_birth: chrono::NaiveDate::from_ymd_opt(1985, 3, 14).unwrap(),
                gender: Gender::Female,
                phone_number: "555-0100".into(),
                address: "1 Main St".into(),
            })
            .await
            .unwrap();

        // The mounted list was refetched by the create's invalidation
        let listed = list.data().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);

        let mut detail = patients.get(&created.id);
        assert_eq!(detail.settled().await.data.unwrap().full_name(), "Jane Doe");
        assert!(client.contains(&CacheKey::from(["patients", created.id.as_str()])));
    }

    #[tokio::test]
    async fn test_failed_delete_over_http_keeps_cache() {
        let base_url = serve(AppState::default()).await;
        let client = QueryClient::new(Arc::new(HttpTransport::new(base_url)));
        let staff = StaffMembers::new(client);

        let mut list = staff.list();
        list.settled().await;

        let delete = staff.delete("9");
        let err = delete.mutate_async(()).await.unwrap_err();

        assert!(matches!(err, QueryError::Status { status: 404, .. }));
        assert!(delete.state().is_error());
        assert_eq!(list.data(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_bearer_token_over_http() {
        let base_url = serve(AppState::default().with_token("secret")).await;

        let anonymous = QueryClient::new(Arc::new(HttpTransport::new(base_url.clone())));
        let mut tasks = hms_core::Tasks::new(anonymous).list();
        let state = tasks.settled().await;
        assert_eq!(state.error.and_then(|e| e.status()), Some(401));

        let authorized =
            QueryClient::new(Arc::new(HttpTransport::new(base_url).with_token("secret")));
        let mut tasks = hms_core::Tasks::new(authorized).list();
        assert!(tasks.settled().await.is_success());
    }
}
