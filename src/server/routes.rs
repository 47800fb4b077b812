//! REST handlers. Every response, errors included, is wrapped in the
//! `{data, message?, status}` envelope.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use hms_core::{
    CreateAndAssignTaskRequest, CreateAppointmentRequest, CreateMedicalRecordRequest,
    CreatePatientRequest, CreateStaffRequest, Envelope, Validate,
};
use serde::Serialize;
use serde_json::Value;

use super::AppState;

/// Enveloped error response with `data: null`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(what: &str, id: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{} not found: {}", what, id))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Envelope::new(self.status.as_u16(), Value::Null).with_message(self.message);
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

type ApiResult = Result<Response, ApiError>;

fn ok<T: Serialize>(data: T) -> ApiResult {
    Ok(envelope(StatusCode::OK, data, None))
}

fn created<T: Serialize>(data: T) -> ApiResult {
    Ok(envelope(StatusCode::CREATED, data, None))
}

fn deleted(what: &str) -> ApiResult {
    Ok(envelope(StatusCode::OK, Value::Null, Some(format!("{} deleted", what))))
}

fn envelope<T: Serialize>(status: StatusCode, data: T, message: Option<String>) -> Response {
    let mut body = Envelope::new(status.as_u16(), data);
    body.message = message;
    (status, Json(body)).into_response()
}

/// Unwraps a JSON body and runs its client-side validation again.
fn validated<R: Validate>(body: Result<Json<R>, JsonRejection>) -> Result<R, ApiError> {
    let Json(request) = body?;
    request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    Ok(request)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/patients", get(list_patients).post(create_patient))
        .route(
            "/patients/{id}",
            get(get_patient)
                .put(update_patient)
                .patch(update_patient)
                .delete(delete_patient),
        )
        .route("/patients/{id}/medical-history", get(medical_history))
        .route(
            "/patients/{id}/medical-records",
            axum::routing::post(add_medical_record),
        )
        .route("/staff", get(list_staff).post(create_staff))
        .route(
            "/staff/{id}",
            get(get_staff)
                .put(update_staff)
                .patch(update_staff)
                .delete(delete_staff),
        )
        .route("/staff/{id}/tasks", get(staff_tasks).post(assign_task))
        .route("/tasks", get(list_tasks))
        .route(
            "/appointments",
            get(list_appointments).post(create_appointment),
        )
        .route(
            "/appointments/{id}",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
        .route("/appointments/date/{date}", get(appointments_on))
        .route("/appointments/staff/{id}", get(appointments_for_staff))
        .route("/appointments/patient/{id}", get(appointments_for_patient))
}

pub async fn fallback() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "route not found")
}

// Patients

async fn list_patients(State(state): State<AppState>) -> ApiResult {
    ok(state.store.list_patients().await)
}

async fn get_patient(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    match state.store.get_patient(&id).await {
        Some(patient) => ok(patient),
        None => Err(ApiError::not_found("Patient", &id)),
    }
}

async fn create_patient(
    State(state): State<AppState>,
    body: Result<Json<CreatePatientRequest>, JsonRejection>,
) -> ApiResult {
    let request = validated(body)?;
    let patient = state.store.create_patient(request).await;
    tracing::info!(id = %patient.id, "created patient");
    created(patient)
}

async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<CreatePatientRequest>, JsonRejection>,
) -> ApiResult {
    let request = validated(body)?;
    match state.store.update_patient(&id, request).await {
        Some(patient) => ok(patient),
        None => Err(ApiError::not_found("Patient", &id)),
    }
}

async fn delete_patient(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    if !state.store.delete_patient(&id).await {
        return Err(ApiError::not_found("Patient", &id));
    }
    tracing::info!(id = %id, "deleted patient");
    deleted("Patient")
}

async fn medical_history(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    match state.store.medical_history(&id).await {
        Some(history) => ok(history),
        None => Err(ApiError::not_found("Patient", &id)),
    }
}

async fn add_medical_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<CreateMedicalRecordRequest>, JsonRejection>,
) -> ApiResult {
    let request = validated(body)?;
    match state.store.add_medical_record(&id, request).await {
        Some(record) => created(record),
        None => Err(ApiError::not_found("Patient", &id)),
    }
}

// Staff

async fn list_staff(State(state): State<AppState>) -> ApiResult {
    ok(state.store.list_staff().await)
}

async fn get_staff(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    match state.store.get_staff(&id).await {
        Some(staff) => ok(staff),
        None => Err(ApiError::not_found("Staff member", &id)),
    }
}

async fn create_staff(
    State(state): State<AppState>,
    body: Result<Json<CreateStaffRequest>, JsonRejection>,
) -> ApiResult {
    let request = validated(body)?;
    let staff = state.store.create_staff(request).await;
    tracing::info!(id = %staff.id, "created staff member");
    created(staff)
}

async fn update_staff(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<CreateStaffRequest>, JsonRejection>,
) -> ApiResult {
    let request = validated(body)?;
    match state.store.update_staff(&id, request).await {
        Some(staff) => ok(staff),
        None => Err(ApiError::not_found("Staff member", &id)),
    }
}

async fn delete_staff(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    if !state.store.delete_staff(&id).await {
        return Err(ApiError::not_found("Staff member", &id));
    }
    tracing::info!(id = %id, "deleted staff member");
    deleted("Staff member")
}

async fn staff_tasks(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    match state.store.tasks_for_staff(&id).await {
        Some(tasks) => ok(tasks),
        None => Err(ApiError::not_found("Staff member", &id)),
    }
}

async fn assign_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<CreateAndAssignTaskRequest>, JsonRejection>,
) -> ApiResult {
    let request = validated(body)?;
    match state.store.assign_task(&id, request).await {
        Some(task) => created(task),
        None => Err(ApiError::not_found("Staff member", &id)),
    }
}

// Tasks

async fn list_tasks(State(state): State<AppState>) -> ApiResult {
    ok(state.store.list_tasks().await)
}

// Appointments

async fn list_appointments(State(state): State<AppState>) -> ApiResult {
    ok(state.store.list_appointments().await)
}

async fn get_appointment(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    match state.store.get_appointment(&id).await {
        Some(appointment) => ok(appointment),
        None => Err(ApiError::not_found("Appointment", &id)),
    }
}

async fn appointments_on(State(state): State<AppState>, Path(date): Path<String>) -> ApiResult {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("Invalid date '{}' (expected YYYY-MM-DD)", date)))?;
    ok(state.store.appointments_on(date).await)
}

async fn appointments_for_staff(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult {
    ok(state.store.appointments_for_staff(&id).await)
}

async fn appointments_for_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult {
    ok(state.store.appointments_for_patient(&id).await)
}

async fn create_appointment(
    State(state): State<AppState>,
    body: Result<Json<CreateAppointmentRequest>, JsonRejection>,
) -> ApiResult {
    let request = validated(body)?;
    let appointment = state.store.create_appointment(request).await;
    tracing::info!(id = %appointment.id, "created appointment");
    created(appointment)
}

async fn update_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<CreateAppointmentRequest>, JsonRejection>,
) -> ApiResult {
    let request = validated(body)?;
    match state.store.update_appointment(&id, request).await {
        Some(appointment) => ok(appointment),
        None => Err(ApiError::not_found("Appointment", &id)),
    }
}

async fn delete_appointment(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    if !state.store.delete_appointment(&id).await {
        return Err(ApiError::not_found("Appointment", &id));
    }
    deleted("Appointment")
}
