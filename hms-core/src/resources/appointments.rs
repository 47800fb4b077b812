use chrono::NaiveDate;
use serde_json::Value;

use super::Resource;
use crate::models::{Appointment, CreateAppointmentRequest, UpdateAppointmentRequest};
use crate::query::{Mutation, Query, QueryClient, QueryOptions};

#[derive(Debug, Clone)]
pub struct Appointments {
    client: QueryClient,
}

impl Appointments {
    pub const RESOURCE: Resource = Resource::APPOINTMENTS;

    pub fn new(client: QueryClient) -> Self {
        Self { client }
    }

    pub fn list(&self) -> Query<Vec<Appointment>> {
        let r = Self::RESOURCE;
        self.client.query(r.collection_path(), r.root_key())
    }

    /// Disabled while `id` is empty.
    pub fn get(&self, id: &str) -> Query<Appointment> {
        let r = Self::RESOURCE;
        self.client.query_with(
            QueryOptions::new(r.item_path(id), r.item_key(id)).enabled(!id.is_empty()),
        )
    }

    /// `[appointments, date, YYYY-MM-DD]`
    pub fn by_date(&self, date: NaiveDate) -> Query<Vec<Appointment>> {
        self.filtered("date", &date.format("%Y-%m-%d").to_string())
    }

    /// `[appointments, staff, id]`
    pub fn by_staff(&self, staff_id: &str) -> Query<Vec<Appointment>> {
        self.filtered("staff", staff_id)
    }

    /// `[appointments, patient, id]`
    pub fn by_patient(&self, patient_id: &str) -> Query<Vec<Appointment>> {
        self.filtered("patient", patient_id)
    }

    pub fn create(&self) -> Mutation<Appointment, CreateAppointmentRequest> {
        let r = Self::RESOURCE;
        self.client.create(r.collection_path(), r.root_key())
    }

    pub fn update(&self, id: &str) -> Mutation<Appointment, UpdateAppointmentRequest> {
        let r = Self::RESOURCE;
        self.client.update(r.item_path(id), r.root_key())
    }

    pub fn delete(&self, id: &str) -> Mutation<Value> {
        let r = Self::RESOURCE;
        self.client.delete(r.item_path(id), r.root_key())
    }

    fn filtered(&self, by: &str, value: &str) -> Query<Vec<Appointment>> {
        let r = Self::RESOURCE;
        let key = r.filter_key(by).child(value);
        let path = format!("{}/{}/{}", r.path, by, urlencoding::encode(value));
        self.client
            .query_with(QueryOptions::new(path, key).enabled(!value.is_empty()))
    }
}
