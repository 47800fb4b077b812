use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::validate::{require, Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentType {
    Checkup,
    Consultation,
    Emergency,
    #[serde(rename = "Follow-up")]
    FollowUp,
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::Checkup => write!(f, "Checkup"),
            AppointmentType::Consultation => write!(f, "Consultation"),
            AppointmentType::Emergency => write!(f, "Emergency"),
            AppointmentType::FollowUp => write!(f, "Follow-up"),
        }
    }
}

impl FromStr for AppointmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "checkup" => Ok(AppointmentType::Checkup),
            "consultation" => Ok(AppointmentType::Consultation),
            "emergency" => Ok(AppointmentType::Emergency),
            "follow-up" | "followup" => Ok(AppointmentType::FollowUp),
            _ => Err(format!(
                "Invalid appointment type '{}'. Valid options: checkup, consultation, emergency, follow-up",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    #[serde(rename = "No-show")]
    NoShow,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "Scheduled"),
            AppointmentStatus::Completed => write!(f, "Completed"),
            AppointmentStatus::Cancelled => write!(f, "Cancelled"),
            AppointmentStatus::NoShow => write!(f, "No-show"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            "no-show" | "noshow" => Ok(AppointmentStatus::NoShow),
            _ => Err(format!(
                "Invalid appointment status '{}'. Valid options: scheduled, completed, cancelled, no-show",
                s
            )),
        }
    }
}

/// Id and display name of a linked patient or staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub staff_id: String,
    pub date: NaiveDate,
    /// Local time of day, `HH:MM`
    pub time: String,
    #[serde(rename = "type")]
    pub kind: AppointmentType,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<PersonRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff: Option<PersonRef>,
}

impl fmt::Display for Appointment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = format!("{} on {} at {}", self.kind, self.date, self.time);
        writeln!(f, "{}", title)?;
        writeln!(f, "{}", "=".repeat(title.len()))?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Status: {}", self.status)?;
        match &self.patient {
            Some(patient) => writeln!(f, "Patient: {} ({})", patient.name, patient.id)?,
            None => writeln!(f, "Patient: {}", self.patient_id)?,
        }
        match &self.staff {
            Some(staff) => writeln!(f, "Staff: {} ({})", staff.name, staff.id)?,
            None => writeln!(f, "Staff: {}", self.staff_id)?,
        }
        if let Some(notes) = &self.notes {
            writeln!(f, "\n{}", notes)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub patient_id: String,
    pub staff_id: String,
    pub date: NaiveDate,
    pub time: String,
    #[serde(rename = "type")]
    pub kind: AppointmentType,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Updates replace every writable field.
pub type UpdateAppointmentRequest = CreateAppointmentRequest;

impl From<&Appointment> for CreateAppointmentRequest {
    fn from(appointment: &Appointment) -> Self {
        Self {
            patient_id: appointment.patient_id.clone(),
            staff_id: appointment.staff_id.clone(),
            date: appointment.date,
            time: appointment.time.clone(),
            kind: appointment.kind,
            status: appointment.status,
            notes: appointment.notes.clone(),
        }
    }
}

impl Validate for CreateAppointmentRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require("patientId", &self.patient_id)?;
        require("staffId", &self.staff_id)?;
        require("time", &self.time)?;
        if NaiveTime::parse_from_str(&self.time, "%H:%M").is_err() {
            return Err(ValidationError::new("time", "must be HH:MM"));
        }
        Ok(())
    }
}
