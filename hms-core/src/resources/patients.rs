use serde_json::Value;

use super::Resource;
use crate::models::{
    CreateMedicalRecordRequest, CreatePatientRequest, MedicalRecord, Patient, UpdatePatientRequest,
};
use crate::query::{CacheKey, Mutation, Query, QueryClient, QueryOptions};
use crate::transport::Method;

const MEDICAL_HISTORY: &str = "medical-history";
const MEDICAL_RECORDS: &str = "medical-records";

/// Patient records and their medical history.
#[derive(Debug, Clone)]
pub struct Patients {
    client: QueryClient,
}

impl Patients {
    pub const RESOURCE: Resource = Resource::PATIENTS;

    pub fn new(client: QueryClient) -> Self {
        Self { client }
    }

    pub fn list(&self) -> Query<Vec<Patient>> {
        let r = Self::RESOURCE;
        self.client.query(r.collection_path(), r.root_key())
    }

    /// Disabled while `id` is empty.
    pub fn get(&self, id: &str) -> Query<Patient> {
        let r = Self::RESOURCE;
        self.client.query_with(
            QueryOptions::new(r.item_path(id), r.item_key(id)).enabled(!id.is_empty()),
        )
    }

    pub fn create(&self) -> Mutation<Patient, CreatePatientRequest> {
        let r = Self::RESOURCE;
        self.client.create(r.collection_path(), r.root_key())
    }

    pub fn update(&self, id: &str) -> Mutation<Patient, UpdatePatientRequest> {
        let r = Self::RESOURCE;
        self.client.update(r.item_path(id), r.root_key())
    }

    pub fn delete(&self, id: &str) -> Mutation<Value> {
        let r = Self::RESOURCE;
        self.client.delete(r.item_path(id), r.root_key())
    }

    /// `[patients, id, medical-history]`
    pub fn medical_history_key(id: &str) -> CacheKey {
        Self::RESOURCE.item_key(id).child(MEDICAL_HISTORY)
    }

    /// Disabled while `id` is empty.
    pub fn medical_history(&self, id: &str) -> Query<Vec<MedicalRecord>> {
        let r = Self::RESOURCE;
        self.client.query_with(
            QueryOptions::new(
                r.nested_path(id, MEDICAL_HISTORY),
                Self::medical_history_key(id),
            )
            .enabled(!id.is_empty()),
        )
    }

    /// Adds a record to a patient's history. Invalidates `[patients, id]`,
    /// which covers both the patient and its medical history.
    pub fn add_medical_record(&self, id: &str) -> Mutation<Value, CreateMedicalRecordRequest> {
        let r = Self::RESOURCE;
        self.client.mutation(
            Method::Post,
            r.nested_path(id, MEDICAL_RECORDS),
            vec![r.item_key(id)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use crate::query::QueryStatus;
    use crate::transport::MockTransport;
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::json;
    use std::sync::Arc;

    fn patient_json(id: &str, first_name: &str) -> Value {
        json!({
            "id": id,
            "firstName": first_name,
            "lastName": "Doe",
            "dateOfBirth": "1985-03-14",
            "gender": "Female",
            "phoneNumber": "555-0100",
            "address": "1 Main St",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        })
    }

    fn setup() -> (Arc<MockTransport>, Patients) {
        let mock = Arc::new(MockTransport::new());
        let patients = Patients::new(QueryClient::new(mock.clone()));
        (mock, patients)
    }

    fn jane() -> CreatePatientRequest {
        CreatePatientRequest {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 3, 14).unwrap(),
            gender: Gender::Female,
            phone_number: "555-0100".into(),
            address: "1 Main St".into(),
        }
    }

    #[tokio::test]
    async fn test_get_unwraps_patient() {
        let (mock, patients) = setup();
        mock.respond_data(Method::Get, "/patients/1", 200, patient_json("1", "Jane"));

        let mut query = patients.get("1");
        let patient = query.settled().await.into_result().unwrap();

        assert_eq!(patient.id, "1");
        assert_eq!(patient.full_name(), "Jane Doe");
        assert_eq!(query.key(), &CacheKey::from(["patients", "1"]));
    }

    #[tokio::test]
    async fn test_get_with_empty_id_is_disabled() {
        let (mock, patients) = setup();

        let mut query = patients.get("");
        let state = query.settled().await;

        assert!(!query.is_enabled());
        assert_eq!(state.status, QueryStatus::Idle);
        assert_eq!(mock.total(), 0);
    }

    #[tokio::test]
    async fn test_create_refreshes_list() {
        let (mock, patients) = setup();
        mock.respond_data(Method::Get, "/patients", 200, json!([]));
        mock.respond_data(Method::Post, "/patients", 201, patient_json("2", "Jane"));

        let mut list = patients.list();
        list.settled().await;

        mock.respond_data(Method::Get, "/patients", 200, json!([patient_json("2", "Jane")]));
        let created = patients.create().mutate_async(jane()).await.unwrap();

        assert_eq!(created.id, "2");
        assert_eq!(list.data().map(|p| p.len()), Some(1));
    }

    #[tokio::test]
    async fn test_update_refreshes_detail_view() {
        let (mock, patients) = setup();
        mock.respond_data(Method::Get, "/patients/1", 200, patient_json("1", "Jane"));
        mock.respond_data(Method::Put, "/patients/1", 200, patient_json("1", "Janet"));

        let mut detail = patients.get("1");
        detail.settled().await;

        mock.respond_data(Method::Get, "/patients/1", 200, patient_json("1", "Janet"));
        let mut request = jane();
        request.first_name = "Janet".into();
        patients.update("1").mutate_async(request).await.unwrap();

        assert_eq!(detail.data().unwrap().first_name, "Janet");
        assert_eq!(mock.count(Method::Put, "/patients/1"), 1);
    }

    #[tokio::test]
    async fn test_delete_sends_no_body() {
        let (mock, patients) = setup();
        mock.respond_data(Method::Delete, "/patients/1", 200, Value::Null);

        patients.delete("1").mutate_async(()).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].method, Method::Delete);
        assert_eq!(requests[0].body, None);
    }

    #[tokio::test]
    async fn test_add_medical_record_refreshes_history() {
        let (mock, patients) = setup();
        let record = json!({
            "id": "r1",
            "patientId": "1",
            "staffId": "9",
            "date": "2024-04-08T14:00:00Z",
            "diagnosis": "Flu",
            "treatment": "Rest",
            "notes": "Fluids",
            "createdAt": "2024-04-08T14:00:00Z",
            "updatedAt": "2024-04-08T14:00:00Z"
        });
        mock.respond_data(Method::Get, "/patients/1/medical-history", 200, json!([]));
        mock.respond_data(Method::Get, "/patients", 200, json!([]));
        mock.respond_data(Method::Post, "/patients/1/medical-records", 201, record.clone());

        let mut history = patients.medical_history("1");
        let mut list = patients.list();
        history.settled().await;
        list.settled().await;
        assert_eq!(
            history.key(),
            &CacheKey::from(["patients", "1", "medical-history"])
        );

        mock.respond_data(Method::Get, "/patients/1/medical-history", 200, json!([record]));
        patients
            .add_medical_record("1")
            .mutate_async(CreateMedicalRecordRequest {
                date: Utc.with_ymd_and_hms(2024, 4, 8, 14, 0, 0).unwrap(),
                diagnosis: "Flu".into(),
                notes: "Fluids".into(),
                staff_id: "9".into(),
                treatment: "Rest".into(),
            })
            .await
            .unwrap();

        assert_eq!(history.data().unwrap()[0].diagnosis, "Flu");
        assert_eq!(mock.count(Method::Get, "/patients/1/medical-history"), 2);
        assert_eq!(mock.count(Method::Get, "/patients"), 1);
    }

    #[tokio::test]
    async fn test_medical_history_with_empty_id_is_disabled() {
        let (mock, patients) = setup();
        let history = patients.medical_history("");
        assert!(history.state().data.is_none());
        assert_eq!(mock.total(), 0);
    }
}
