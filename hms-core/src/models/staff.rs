use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::validate::{require, Validate, ValidationError};

/// Role id the backend uses for physicians.
pub const DOCTOR_ROLE: &str = "Doctor";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub phone_number: String,
    #[serde(default)]
    pub nurse_type: String,
    pub role_id: String,
    #[serde(default)]
    pub specialization: String,
    pub status_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Staff {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_doctor(&self) -> bool {
        self.role_id.eq_ignore_ascii_case(DOCTOR_ROLE)
    }
}

impl fmt::Display for Staff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.full_name();
        writeln!(f, "{}", name)?;
        writeln!(f, "{}", "=".repeat(name.len()))?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Role: {}", self.role_id)?;
        if !self.specialization.is_empty() {
            writeln!(f, "Specialization: {}", self.specialization)?;
        }
        if !self.nurse_type.is_empty() {
            writeln!(f, "Nurse type: {}", self.nurse_type)?;
        }
        writeln!(f, "Status: {}", self.status_id)?;
        writeln!(f, "Date of birth: {}", self.date_of_birth)?;
        writeln!(f, "Phone: {}", self.phone_number)?;
        writeln!(f, "Address: {}", self.address)
    }
}

/// Writable staff fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaffRequest {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub phone_number: String,
    #[serde(default)]
    pub nurse_type: String,
    pub role_id: String,
    #[serde(default)]
    pub specialization: String,
    pub status_id: String,
}

/// Updates replace every writable field.
pub type UpdateStaffRequest = CreateStaffRequest;

impl From<&Staff> for CreateStaffRequest {
    fn from(staff: &Staff) -> Self {
        Self {
            first_name: staff.first_name.clone(),
            last_name: staff.last_name.clone(),
            date_of_birth: staff.date_of_birth,
            address: staff.address.clone(),
            phone_number: staff.phone_number.clone(),
            nurse_type: staff.nurse_type.clone(),
            role_id: staff.role_id.clone(),
            specialization: staff.specialization.clone(),
            status_id: staff.status_id.clone(),
        }
    }
}

impl Validate for CreateStaffRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require("firstName", &self.first_name)?;
        require("lastName", &self.last_name)?;
        require("phoneNumber", &self.phone_number)?;
        require("address", &self.address)?;
        require("roleId", &self.role_id)?;
        require("statusId", &self.status_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_doctor() {
        let staff: Staff = serde_json::from_value(json!({
            "id": "9",
            "firstName": "Gregory",
            "lastName": "House",
            "dateOfBirth": "1959-06-11",
            "address": "221B",
            "phoneNumber": "555-0199",
            "roleId": "doctor",
            "statusId": "Active",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(staff.is_doctor());
        assert!(staff.nurse_type.is_empty());
    }

    #[test]
    fn test_validate_requires_role() {
        let request = CreateStaffRequest {
            first_name: "Carla".into(),
            last_name: "Espinosa".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1975, 2, 1).unwrap(),
            address: "Sacred Heart".into(),
            phone_number: "555-0142".into(),
            nurse_type: "Head Nurse".into(),
            role_id: "".into(),
            specialization: String::new(),
            status_id: "Active".into(),
        };
        assert_eq!(
            request.validate().unwrap_err(),
            ValidationError::required("roleId")
        );
    }
}
