use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::validate::{require, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status_id: String,
    #[serde(default)]
    pub assigned_staff_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub priority: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.len()))?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Status: {}", self.status_id)?;
        if let Some(priority) = self.priority {
            writeln!(f, "Priority: {}", priority)?;
        }
        writeln!(
            f,
            "Shift: {} - {}",
            self.start_time.format("%Y-%m-%d %H:%M"),
            self.end_time.format("%Y-%m-%d %H:%M")
        )?;
        if let Some(staff_id) = &self.assigned_staff_id {
            writeln!(f, "Assigned to: {}", staff_id)?;
        }
        if !self.description.is_empty() {
            writeln!(f, "\n{}", self.description)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAndAssignTaskRequest {
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    pub status_id: String,
}

impl Validate for CreateAndAssignTaskRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        require("description", &self.description)?;
        require("statusId", &self.status_id)?;
        if self.end_time <= self.start_time {
            return Err(ValidationError::new("endTime", "must be after startTime"));
        }
        Ok(())
    }
}
