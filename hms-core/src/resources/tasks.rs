use super::Resource;
use crate::models::Task;
use crate::query::{Query, QueryClient};

/// The hospital-wide task list. Tasks are created through
/// [`StaffMembers::assign_task`](super::StaffMembers::assign_task).
#[derive(Debug, Clone)]
pub struct Tasks {
    client: QueryClient,
}

impl Tasks {
    pub const RESOURCE: Resource = Resource::TASKS;

    pub fn new(client: QueryClient) -> Self {
        Self { client }
    }

    pub fn list(&self) -> Query<Vec<Task>> {
        let r = Self::RESOURCE;
        self.client.query(r.collection_path(), r.root_key())
    }
}
