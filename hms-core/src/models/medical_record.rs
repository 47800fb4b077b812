use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::validate::{require, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub id: String,
    pub patient_id: String,
    pub staff_id: String,
    pub date: DateTime<Utc>,
    pub diagnosis: String,
    pub treatment: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for MedicalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (treatment: {})",
            self.date.format("%Y-%m-%d %H:%M"),
            self.diagnosis,
            self.treatment
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedicalRecordRequest {
    pub date: DateTime<Utc>,
    pub diagnosis: String,
    pub notes: String,
    pub staff_id: String,
    pub treatment: String,
}

impl Validate for CreateMedicalRecordRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require("diagnosis", &self.diagnosis)?;
        require("notes", &self.notes)?;
        require("staffId", &self.staff_id)?;
        require("treatment", &self.treatment)
    }
}
