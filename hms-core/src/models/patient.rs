use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::medical_record::MedicalRecord;
use super::validate::{require, Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
            Gender::Other => write!(f, "Other"),
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(format!(
                "Invalid gender '{}'. Valid options: male, female, other",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub phone_number: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub medical_history: Vec<MedicalRecord>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Display for Patient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.full_name();
        writeln!(f, "{}", name)?;
        writeln!(f, "{}", "=".repeat(name.len()))?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Date of birth: {}", self.date_of_birth)?;
        writeln!(f, "Gender: {}", self.gender)?;
        writeln!(f, "Phone: {}", self.phone_number)?;
        writeln!(f, "Address: {}", self.address)?;

        if !self.medical_history.is_empty() {
            writeln!(f, "\nMedical history:")?;
            for record in &self.medical_history {
                writeln!(f, "  - {}", record)?;
            }
        }

        Ok(())
    }
}

/// Writable patient fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRequest {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub phone_number: String,
    pub address: String,
}

/// Updates replace every writable field.
pub type UpdatePatientRequest = CreatePatientRequest;

impl From<&Patient> for CreatePatientRequest {
    fn from(patient: &Patient) -> Self {
        Self {
            first_name: patient.first_name.clone(),
            last_name: patient.last_name.clone(),
            date_of_birth: patient.date_of_birth,
            gender: patient.gender,
            phone_number: patient.phone_number.clone(),
            address: patient.address.clone(),
        }
    }
}

impl Validate for CreatePatientRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require("firstName", &self.first_name)?;
        require("lastName", &self.last_name)?;
        require("phoneNumber", &self.phone_number)?;
        require("address", &self.address)?;
        if self.date_of_birth > Utc::now().date_naive() {
            return Err(ValidationError::new(
                "dateOfBirth",
                "cannot be in the future",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> CreatePatientRequest {
        CreatePatientRequest {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 3, 14).unwrap(),
            gender: Gender::Female,
            phone_number: "555-0100".into(),
            address: "1 Main St".into(),
        }
    }

    #[test]
    fn test_gender_from_str() {
        assert_eq!(Gender::from_str("FEMALE").unwrap(), Gender::Female);
        assert_eq!(Gender::from_str("m").unwrap(), Gender::Male);
        assert!(Gender::from_str("unknown").is_err());
    }

    #[test]
    fn test_request_wire_shape() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(
            json,
            json!({
                "firstName": "Jane",
                "lastName": "Doe",
                "dateOfBirth": "1985-03-14",
                "gender": "Female",
                "phoneNumber": "555-0100",
                "address": "1 Main St"
            })
        );
    }

    #[test]
    fn test_patient_without_history_field() {
        let patient: Patient = serde_json::from_value(json!({
            "id": "1",
            "firstName": "A",
            "lastName": "B",
            "dateOfBirth": "1990-01-01",
            "gender": "Other",
            "phoneNumber": "555",
            "address": "Ward 3",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(patient.full_name(), "A B");
        assert!(patient.medical_history.is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(request().validate().is_ok());

        let mut blank = request();
        blank.last_name = " ".into();
        assert_eq!(
            blank.validate().unwrap_err(),
            ValidationError::required("lastName")
        );

        let mut unborn = request();
        unborn.date_of_birth = Utc::now().date_naive() + chrono::Duration::days(2);
        assert_eq!(unborn.validate().unwrap_err().field, "dateOfBirth");
    }
}
