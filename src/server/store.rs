//! In-memory record store for the development backend.
//!
//! Records live in insertion order; ids are random UUIDs. Nothing is
//! persisted across restarts.

use chrono::{NaiveDate, Utc};
use hms_core::{
    Appointment, CreateAndAssignTaskRequest, CreateAppointmentRequest, CreateMedicalRecordRequest,
    CreatePatientRequest, CreateStaffRequest, MedicalRecord, Patient, PersonRef, Staff, Task,
};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Records {
    patients: Vec<Patient>,
    staff: Vec<Staff>,
    tasks: Vec<Task>,
    appointments: Vec<Appointment>,
}

#[derive(Debug, Default)]
pub struct Store {
    records: RwLock<Records>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // Patients

    pub async fn list_patients(&self) -> Vec<Patient> {
        self.records.read().await.patients.clone()
    }

    pub async fn get_patient(&self, id: &str) -> Option<Patient> {
        let records = self.records.read().await;
        records.patients.iter().find(|p| p.id == id).cloned()
    }

    pub async fn create_patient(&self, request: CreatePatientRequest) -> Patient {
        let now = Utc::now();
        let patient = Patient {
            id: new_id(),
            first_name: request.first_name,
            last_name: request.last_name,
            date_of_birth: request.date_of_birth,
            gender: request.gender,
            phone_number: request.phone_number,
            address: request.address,
            created_at: now,
            updated_at: now,
            medical_history: Vec::new(),
        };
        self.records.write().await.patients.push(patient.clone());
        patient
    }

    /// Replaces every writable field. Returns `None` for an unknown id.
    pub async fn update_patient(&self, id: &str, request: CreatePatientRequest) -> Option<Patient> {
        let mut records = self.records.write().await;
        let patient = records.patients.iter_mut().find(|p| p.id == id)?;
        patient.first_name = request.first_name;
        patient.last_name = request.last_name;
        patient.date_of_birth = request.date_of_birth;
        patient.gender = request.gender;
        patient.phone_number = request.phone_number;
        patient.address = request.address;
        patient.updated_at = Utc::now();
        Some(patient.clone())
    }

    /// Removes the patient along with their appointments.
    pub async fn delete_patient(&self, id: &str) -> bool {
        let mut records = self.records.write().await;
        let before = records.patients.len();
        records.patients.retain(|p| p.id != id);
        let removed = records.patients.len() != before;
        if removed {
            records.appointments.retain(|a| a.patient_id != id);
        }
        removed
    }

    pub async fn medical_history(&self, patient_id: &str) -> Option<Vec<MedicalRecord>> {
        self.get_patient(patient_id)
            .await
            .map(|patient| patient.medical_history)
    }

    pub async fn add_medical_record(
        &self,
        patient_id: &str,
        request: CreateMedicalRecordRequest,
    ) -> Option<MedicalRecord> {
        let mut records = self.records.write().await;
        let patient = records.patients.iter_mut().find(|p| p.id == patient_id)?;
        let now = Utc::now();
        let record = MedicalRecord {
            id: new_id(),
            patient_id: patient_id.to_string(),
            staff_id: request.staff_id,
            date: request.date,
            diagnosis: request.diagnosis,
            treatment: request.treatment,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        };
        patient.medical_history.push(record.clone());
        patient.updated_at = now;
        Some(record)
    }

    // Staff

    pub async fn list_staff(&self) -> Vec<Staff> {
        self.records.read().await.staff.clone()
    }

    pub async fn get_staff(&self, id: &str) -> Option<Staff> {
        let records = self.records.read().await;
        records.staff.iter().find(|s| s.id == id).cloned()
    }

    pub async fn create_staff(&self, request: CreateStaffRequest) -> Staff {
        let now = Utc::now();
        let staff = Staff {
            id: new_id(),
            first_name: request.first_name,
            last_name: request.last_name,
            date_of_birth: request.date_of_birth,
            address: request.address,
            phone_number: request.phone_number,
            nurse_type: request.nurse_type,
            role_id: request.role_id,
            specialization: request.specialization,
            status_id: request.status_id,
            created_at: now,
            updated_at: now,
        };
        self.records.write().await.staff.push(staff.clone());
        staff
    }

    pub async fn update_staff(&self, id: &str, request: CreateStaffRequest) -> Option<Staff> {
        let mut records = self.records.write().await;
        let staff = records.staff.iter_mut().find(|s| s.id == id)?;
        staff.first_name = request.first_name;
        staff.last_name = request.last_name;
        staff.date_of_birth = request.date_of_birth;
        staff.address = request.address;
        staff.phone_number = request.phone_number;
        staff.nurse_type = request.nurse_type;
        staff.role_id = request.role_id;
        staff.specialization = request.specialization;
        staff.status_id = request.status_id;
        staff.updated_at = Utc::now();
        Some(staff.clone())
    }

    /// Removes the staff member and unassigns their tasks.
    pub async fn delete_staff(&self, id: &str) -> bool {
        let mut records = self.records.write().await;
        let before = records.staff.len();
        records.staff.retain(|s| s.id != id);
        let removed = records.staff.len() != before;
        if removed {
            for task in records
                .tasks
                .iter_mut()
                .filter(|t| t.assigned_staff_id.as_deref() == Some(id))
            {
                task.assigned_staff_id = None;
            }
        }
        removed
    }

    pub async fn tasks_for_staff(&self, staff_id: &str) -> Option<Vec<Task>> {
        let records = self.records.read().await;
        if !records.staff.iter().any(|s| s.id == staff_id) {
            return None;
        }
        Some(
            records
                .tasks
                .iter()
                .filter(|t| t.assigned_staff_id.as_deref() == Some(staff_id))
                .cloned()
                .collect(),
        )
    }

    pub async fn assign_task(
        &self,
        staff_id: &str,
        request: CreateAndAssignTaskRequest,
    ) -> Option<Task> {
        let mut records = self.records.write().await;
        if !records.staff.iter().any(|s| s.id == staff_id) {
            return None;
        }
        let now = Utc::now();
        let task = Task {
            id: new_id(),
            title: request.title,
            description: request.description,
            status_id: request.status_id,
            assigned_staff_id: Some(staff_id.to_string()),
            start_time: request.start_time,
            end_time: request.end_time,
            priority: request.priority,
            created_at: now,
            updated_at: now,
        };
        records.tasks.push(task.clone());
        Some(task)
    }

    // Tasks

    pub async fn list_tasks(&self) -> Vec<Task> {
        self.records.read().await.tasks.clone()
    }

    // Appointments

    pub async fn list_appointments(&self) -> Vec<Appointment> {
        self.records.read().await.appointments.clone()
    }

    pub async fn get_appointment(&self, id: &str) -> Option<Appointment> {
        let records = self.records.read().await;
        records.appointments.iter().find(|a| a.id == id).cloned()
    }

    pub async fn appointments_on(&self, date: NaiveDate) -> Vec<Appointment> {
        self.filter_appointments(|a| a.date == date).await
    }

    pub async fn appointments_for_staff(&self, staff_id: &str) -> Vec<Appointment> {
        self.filter_appointments(|a| a.staff_id == staff_id).await
    }

    pub async fn appointments_for_patient(&self, patient_id: &str) -> Vec<Appointment> {
        self.filter_appointments(|a| a.patient_id == patient_id)
            .await
    }

    pub async fn create_appointment(&self, request: CreateAppointmentRequest) -> Appointment {
        let mut records = self.records.write().await;
        let mut appointment = Appointment {
            id: new_id(),
            patient_id: String::new(),
            staff_id: String::new(),
            date: request.date,
            time: String::new(),
            kind: request.kind,
            status: request.status,
            notes: None,
            patient: None,
            staff: None,
        };
        apply_appointment(&records, &mut appointment, request);
        records.appointments.push(appointment.clone());
        appointment
    }

    pub async fn update_appointment(
        &self,
        id: &str,
        request: CreateAppointmentRequest,
    ) -> Option<Appointment> {
        let mut records = self.records.write().await;
        let index = records.appointments.iter().position(|a| a.id == id)?;
        let mut appointment = records.appointments[index].clone();
        apply_appointment(&records, &mut appointment, request);
        records.appointments[index] = appointment.clone();
        Some(appointment)
    }

    pub async fn delete_appointment(&self, id: &str) -> bool {
        let mut records = self.records.write().await;
        let before = records.appointments.len();
        records.appointments.retain(|a| a.id != id);
        records.appointments.len() != before
    }

    async fn filter_appointments<F>(&self, keep: F) -> Vec<Appointment>
    where
        F: Fn(&Appointment) -> bool,
    {
        let records = self.records.read().await;
        records
            .appointments
            .iter()
            .filter(|a| keep(a))
            .cloned()
            .collect()
    }
}

/// Copies the writable fields and resolves the linked names.
fn apply_appointment(
    records: &Records,
    appointment: &mut Appointment,
    request: CreateAppointmentRequest,
) {
    appointment.patient = records
        .patients
        .iter()
        .find(|p| p.id == request.patient_id)
        .map(|p| PersonRef {
            id: p.id.clone(),
            name: p.full_name(),
        });
    appointment.staff = records
        .staff
        .iter()
        .find(|s| s.id == request.staff_id)
        .map(|s| PersonRef {
            id: s.id.clone(),
            name: s.full_name(),
        });
    appointment.patient_id = request.patient_id;
    appointment.staff_id = request.staff_id;
    appointment.date = request.date;
    appointment.time = request.time;
    appointment.kind = request.kind;
    appointment.status = request.status;
    appointment.notes = request.notes;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hms_core::{AppointmentStatus, AppointmentType, Gender};

    fn patient_request() -> CreatePatientRequest {
        CreatePatientRequest {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 3, 14).unwrap(),
            gender: Gender::Female,
            phone_number: "555-0100".into(),
            address: "1 Main St".into(),
        }
    }

    fn staff_request() -> CreateStaffRequest {
        CreateStaffRequest {
            first_name: "Sam".into(),
            last_name: "Reyes".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 2, 2).unwrap(),
            address: "2 Elm St".into(),
            phone_number: "555-0142".into(),
            nurse_type: String::new(),
            role_id: "Doctor".into(),
            specialization: "Cardiology".into(),
            status_id: "Active".into(),
        }
    }

    fn task_request() -> CreateAndAssignTaskRequest {
        CreateAndAssignTaskRequest {
            title: "Night rounds".into(),
            description: "Ward 3".into(),
            start_time: Utc.with_ymd_and_hms(2024, 4, 8, 22, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 4, 9, 6, 0, 0).unwrap(),
            priority: None,
            status_id: "Open".into(),
        }
    }

    #[tokio::test]
    async fn test_patient_crud() {
        let store = Store::new();
        let created = store.create_patient(patient_request()).await;
        assert_eq!(store.list_patients().await.len(), 1);

        let mut request = patient_request();
        request.first_name = "Janet".into();
        let updated = store.update_patient(&created.id, request).await.unwrap();
        assert_eq!(updated.first_name, "Janet");
        assert_eq!(updated.created_at, created.created_at);

        assert!(store.delete_patient(&created.id).await);
        assert!(!store.delete_patient(&created.id).await);
        assert!(store.get_patient(&created.id).await.is_none());
    }

    #[tokio::test]
    async fn test_medical_history() {
        let store = Store::new();
        let patient = store.create_patient(patient_request()).await;

        let record = store
            .add_medical_record(
                &patient.id,
                CreateMedicalRecordRequest {
                    date: Utc.with_ymd_and_hms(2024, 4, 8, 14, 0, 0).unwrap(),
                    diagnosis: "Flu".into(),
                    notes: "Fluids".into(),
                    staff_id: "9".into(),
                    treatment: "Rest".into(),
                },
            )
            .await
            .unwrap();

        let history = store.medical_history(&patient.id).await.unwrap();
        assert_eq!(history, vec![record]);
        assert!(store.medical_history("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_assign_task_requires_staff() {
        let store = Store::new();
        assert!(store.assign_task("missing", task_request()).await.is_none());

        let staff = store.create_staff(staff_request()).await;
        let task = store.assign_task(&staff.id, task_request()).await.unwrap();
        assert_eq!(task.assigned_staff_id.as_deref(), Some(staff.id.as_str()));
        assert_eq!(store.tasks_for_staff(&staff.id).await.unwrap().len(), 1);

        store.delete_staff(&staff.id).await;
        assert_eq!(store.list_tasks().await[0].assigned_staff_id, None);
    }

    #[tokio::test]
    async fn test_appointment_resolves_names() {
        let store = Store::new();
        let patient = store.create_patient(patient_request()).await;
        let staff = store.create_staff(staff_request()).await;
        let date = NaiveDate::from_ymd_opt(2024, 4, 8).unwrap();

        let appointment = store
            .create_appointment(CreateAppointmentRequest {
                patient_id: patient.id.clone(),
                staff_id: staff.id.clone(),
                date,
                time: "14:00".into(),
                kind: AppointmentType::Checkup,
                status: AppointmentStatus::Scheduled,
                notes: None,
            })
            .await;

        assert_eq!(appointment.patient.unwrap().name, "Jane Doe");
        assert_eq!(appointment.staff.unwrap().name, "Sam Reyes");
        assert_eq!(store.appointments_on(date).await.len(), 1);
        assert_eq!(store.appointments_for_staff(&staff.id).await.len(), 1);

        store.delete_patient(&patient.id).await;
        assert!(store.appointments_for_patient(&patient.id).await.is_empty());
    }
}
