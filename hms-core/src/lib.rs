//! HMS Core Library
//!
//! Shared types and logic for the hospital administration console: typed
//! request/response models, the HTTP transport, and the resource query cache
//! every feature module reads and writes through.

pub mod models;
pub mod query;
pub mod resources;
pub mod transport;

pub use models::{
    Appointment, AppointmentStatus, AppointmentType, CreateAndAssignTaskRequest,
    CreateAppointmentRequest, CreateMedicalRecordRequest, CreatePatientRequest, CreateStaffRequest,
    Gender, MedicalRecord, Patient, PersonRef, Staff, Task, UpdateAppointmentRequest,
    UpdatePatientRequest, UpdateStaffRequest, Validate, ValidationError,
};
pub use query::{
    CacheConfig, CacheKey, Envelope, Mutation, MutationState, MutationStatus, Query, QueryClient,
    QueryError, QueryOptions, QueryState, QueryStatus,
};
pub use resources::{Appointments, Patients, Resource, StaffMembers, Tasks};
pub use transport::{
    HttpTransport, Method, MockTransport, RecordedRequest, Transport, TransportError,
    TransportResponse,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
