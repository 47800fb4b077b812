use serde_json::Value;

use super::Resource;
use crate::models::{CreateAndAssignTaskRequest, CreateStaffRequest, Staff, Task, UpdateStaffRequest};
use crate::query::{CacheKey, Mutation, Query, QueryClient, QueryError, QueryOptions};
use crate::transport::Method;

const DOCTORS: &str = "doctors";
const TASKS: &str = "tasks";

/// Staff records, the doctor roster, and task assignment.
#[derive(Debug, Clone)]
pub struct StaffMembers {
    client: QueryClient,
}

impl StaffMembers {
    pub const RESOURCE: Resource = Resource::STAFF;

    pub fn new(client: QueryClient) -> Self {
        Self { client }
    }

    pub fn list(&self) -> Query<Vec<Staff>> {
        let r = Self::RESOURCE;
        self.client.query(r.collection_path(), r.root_key())
    }

    /// Disabled while `id` is empty.
    pub fn get(&self, id: &str) -> Query<Staff> {
        let r = Self::RESOURCE;
        self.client.query_with(
            QueryOptions::new(r.item_path(id), r.item_key(id)).enabled(!id.is_empty()),
        )
    }

    /// Staff list filtered to doctors, cached under `[staff, doctors]`.
    pub fn doctors(&self) -> Query<Vec<Staff>> {
        let r = Self::RESOURCE;
        self.client.query_with(
            QueryOptions::new(r.collection_path(), r.filter_key(DOCTORS))
                .select(only_doctors),
        )
    }

    pub fn create(&self) -> Mutation<Staff, CreateStaffRequest> {
        let r = Self::RESOURCE;
        self.client.create(r.collection_path(), r.root_key())
    }

    pub fn update(&self, id: &str) -> Mutation<Staff, UpdateStaffRequest> {
        let r = Self::RESOURCE;
        self.client.update(r.item_path(id), r.root_key())
    }

    pub fn delete(&self, id: &str) -> Mutation<Value> {
        let r = Self::RESOURCE;
        self.client.delete(r.item_path(id), r.root_key())
    }

    /// `[staff, id, tasks]`
    pub fn tasks_key(id: &str) -> CacheKey {
        Self::RESOURCE.item_key(id).child(TASKS)
    }

    /// Tasks assigned to one staff member. Disabled while `id` is empty.
    pub fn tasks(&self, id: &str) -> Query<Vec<Task>> {
        let r = Self::RESOURCE;
        self.client.query_with(
            QueryOptions::new(r.nested_path(id, TASKS), Self::tasks_key(id))
                .enabled(!id.is_empty()),
        )
    }

    /// Creates a task and assigns it to staff member `id`.
    ///
    /// Invalidates the task list and the member's own task list.
    pub fn assign_task(&self, id: &str) -> Mutation<Value, CreateAndAssignTaskRequest> {
        let r = Self::RESOURCE;
        self.client.mutation(
            Method::Post,
            r.nested_path(id, TASKS),
            vec![Resource::TASKS.root_key(), Self::tasks_key(id)],
        )
    }
}

fn only_doctors(value: Value) -> Result<Value, QueryError> {
    let staff: Vec<Staff> =
        serde_json::from_value(value).map_err(|e| QueryError::Decode(e.to_string()))?;
    let doctors: Vec<Staff> = staff.into_iter().filter(|s| s.is_doctor()).collect();
    serde_json::to_value(doctors).map_err(|e| QueryError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::Arc;

    fn staff_json(id: &str, role: &str) -> Value {
        json!({
            "id": id,
            "firstName": "Sam",
            "lastName": "Reyes",
            "dateOfBirth": "1980-02-02",
            "address": "2 Elm St",
            "phoneNumber": "555-0142",
            "roleId": role,
            "statusId": "Active",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        })
    }

    fn setup() -> (Arc<MockTransport>, StaffMembers) {
        let mock = Arc::new(MockTransport::new());
        let staff = StaffMembers::new(QueryClient::new(mock.clone()));
        (mock, staff)
    }

    #[tokio::test]
    async fn test_doctors_filters_by_role() {
        let (mock, staff) = setup();
        mock.respond_data(
            Method::Get,
            "/staff",
            200,
            json!([staff_json("1", "Doctor"), staff_json("2", "Nurse")]),
        );

        let mut doctors = staff.doctors();
        let doctors = doctors.settled().await.into_result().unwrap();

        assert_eq!(doctors.len(), 1);
        assert_eq!(doctors[0].id, "1");
    }

    #[tokio::test]
    async fn test_member_named_like_filter_keeps_own_entry() {
        let (mock, staff) = setup();
        mock.respond_data(Method::Get, "/staff", 200, json!([staff_json("1", "Doctor")]));
        mock.respond_data(Method::Get, "/staff/doctors", 200, staff_json("doctors", "Nurse"));

        let mut roster = staff.doctors();
        let mut member = staff.get("doctors");
        roster.settled().await;
        member.settled().await;

        assert_eq!(roster.data().map(|d| d.len()), Some(1));
        assert_eq!(member.data().map(|m| m.id), Some("doctors".to_string()));
    }

    #[tokio::test]
    async fn test_delete_refreshes_doctor_roster() {
        let (mock, staff) = setup();
        mock.respond_data(Method::Get, "/staff", 200, json!([staff_json("1", "Doctor")]));
        mock.respond_data(Method::Delete, "/staff/1", 200, Value::Null);

        let mut doctors = staff.doctors();
        doctors.settled().await;

        mock.respond_data(Method::Get, "/staff", 200, json!([]));
        staff.delete("1").mutate_async(()).await.unwrap();

        assert_eq!(doctors.data(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_assign_task_invalidates_task_lists() {
        let (mock, staff) = setup();
        mock.respond_data(Method::Get, "/tasks", 200, json!([]));
        mock.respond_data(Method::Get, "/staff/9/tasks", 200, json!([]));
        mock.respond_data(Method::Get, "/staff", 200, json!([]));
        mock.respond_data(Method::Post, "/staff/9/tasks", 201, json!({}));

        let client = staff.client.clone();
        let mut all_tasks = client.query::<Vec<Task>>("/tasks", ["tasks"]);
        let mut own_tasks = staff.tasks("9");
        let mut roster = staff.list();
        all_tasks.settled().await;
        own_tasks.settled().await;
        roster.settled().await;

        staff
            .assign_task("9")
            .mutate_async(CreateAndAssignTaskRequest {
                title: "Night rounds".into(),
                description: "Ward 3".into(),
                start_time: Utc.with_ymd_and_hms(2024, 4, 8, 22, 0, 0).unwrap(),
                end_time: Utc.with_ymd_and_hms(2024, 4, 9, 6, 0, 0).unwrap(),
                priority: Some(2),
                status_id: "Open".into(),
            })
            .await
            .unwrap();

        assert_eq!(mock.count(Method::Get, "/tasks"), 2);
        assert_eq!(mock.count(Method::Get, "/staff/9/tasks"), 2);
        assert_eq!(mock.count(Method::Get, "/staff"), 1);
    }

    #[tokio::test]
    async fn test_invalid_task_is_rejected_locally() {
        let (mock, staff) = setup();
        let start = Utc.with_ymd_and_hms(2024, 4, 8, 22, 0, 0).unwrap();

        let assign = staff.assign_task("9");
        let err = assign
            .mutate_async(CreateAndAssignTaskRequest {
                title: "Night rounds".into(),
                description: "Ward 3".into(),
                start_time: start,
                end_time: start,
                priority: None,
                status_id: "Open".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::Validation(_)));
        assert!(assign.state().is_error());
        assert_eq!(mock.total(), 0);
    }
}
