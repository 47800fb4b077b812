mod appointment;
mod medical_record;
mod patient;
mod staff;
mod task;
mod validate;

pub use appointment::{
    Appointment, AppointmentStatus, AppointmentType, CreateAppointmentRequest, PersonRef,
    UpdateAppointmentRequest,
};
pub use medical_record::{CreateMedicalRecordRequest, MedicalRecord};
pub use patient::{CreatePatientRequest, Gender, Patient, UpdatePatientRequest};
pub use staff::{CreateStaffRequest, Staff, UpdateStaffRequest, DOCTOR_ROLE};
pub use task::{CreateAndAssignTaskRequest, Task};
pub use validate::{Validate, ValidationError};
