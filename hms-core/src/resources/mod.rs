//! Per-resource reads and writes over the query client.
//!
//! Every key and path a resource module uses comes from its [`Resource`]
//! descriptor, so all operations on one resource share the same root key and
//! a write always reaches every list and detail view of that resource.

mod appointments;
mod patients;
mod staff;
mod tasks;

pub use appointments::Appointments;
pub use patients::Patients;
pub use staff::StaffMembers;
pub use tasks::Tasks;

use crate::query::CacheKey;

/// Segment that shelters item keys whose id would collide with a filter.
const ITEM_SEGMENT: &str = "by-id";

/// Root cache segment and base path of one REST resource.
///
/// Filter reads (`[staff, doctors]`, `[appointments, date, ..]`) live in the
/// same key space as item reads (`[staff, id]`). Ids equal to a filter name
/// are keyed as `[root, by-id, id]` instead so the two never share an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub root: &'static str,
    pub path: &'static str,
    pub filters: &'static [&'static str],
}

impl Resource {
    pub const PATIENTS: Resource = Resource::new("patients", "/patients");
    pub const STAFF: Resource = Resource::new("staff", "/staff").with_filters(&["doctors"]);
    pub const TASKS: Resource = Resource::new("tasks", "/tasks");
    pub const APPOINTMENTS: Resource = Resource::new("appointments", "/appointments")
        .with_filters(&["date", "staff", "patient"]);

    pub const fn new(root: &'static str, path: &'static str) -> Self {
        Self {
            root,
            path,
            filters: &[],
        }
    }

    /// Declares the filter segments used under this resource's root key.
    pub const fn with_filters(self, filters: &'static [&'static str]) -> Self {
        Self { filters, ..self }
    }

    /// `[root]`, the key every write to this resource invalidates.
    pub fn root_key(&self) -> CacheKey {
        CacheKey::new([self.root])
    }

    /// `[root, id]`, or `[root, by-id, id]` when `id` names a filter.
    pub fn item_key(&self, id: &str) -> CacheKey {
        if id == ITEM_SEGMENT || self.filters.contains(&id) {
            self.root_key().child(ITEM_SEGMENT).child(id)
        } else {
            self.root_key().child(id)
        }
    }

    /// `[root, filter]`
    pub fn filter_key(&self, filter: &str) -> CacheKey {
        debug_assert!(self.filters.contains(&filter), "undeclared filter {filter}");
        self.root_key().child(filter)
    }

    pub fn collection_path(&self) -> String {
        self.path.to_string()
    }

    /// `{path}/{id}`, with the id percent-encoded.
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path, urlencoding::encode(id))
    }

    /// `{path}/{id}/{segment}`
    pub fn nested_path(&self, id: &str, segment: &str) -> String {
        format!("{}/{}", self.item_path(id), segment)
    }
}
