use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Subcommand};
use hms_core::{CreateMedicalRecordRequest, CreatePatientRequest, Gender, Patients};

use super::{confirm, print_json, settle, truncate, OutputFormat};

#[derive(Args)]
pub struct PatientCommand {
    #[command(subcommand)]
    pub command: PatientSubcommand,
}

#[derive(Subcommand)]
pub enum PatientSubcommand {
    /// List all patients
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a patient's details
    Show {
        /// Patient ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Register a new patient
    Create {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: NaiveDate,

        /// male, female or other
        #[arg(long)]
        gender: Gender,

        #[arg(long)]
        phone: String,

        #[arg(long)]
        address: String,
    },

    /// Update a patient (unspecified fields keep their current values)
    Update {
        /// Patient ID
        id: String,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: Option<NaiveDate>,

        #[arg(long)]
        gender: Option<Gender>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },

    /// Delete a patient
    Delete {
        /// Patient ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Show a patient's medical history
    History {
        /// Patient ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a record to a patient's medical history
    AddRecord {
        /// Patient ID
        id: String,

        /// Attending staff member ID
        #[arg(long)]
        staff_id: String,

        #[arg(long)]
        diagnosis: String,

        #[arg(long)]
        treatment: String,

        #[arg(long)]
        notes: String,

        /// Time of the visit (RFC 3339, defaults to now)
        #[arg(long)]
        date: Option<DateTime<Utc>>,
    },
}

impl PatientCommand {
    pub async fn run(&self, patients: &Patients) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            PatientSubcommand::List { format } => {
                let list = settle(patients.list()).await?;

                if list.is_empty() {
                    println!("No patients found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => print_json(&list)?,
                    OutputFormat::Text => {
                        println!("{:<36}  {:<30}  {:<10}  PHONE", "ID", "NAME", "DOB");
                        println!("{}", "-".repeat(96));
                        for patient in &list {
                            println!(
                                "{:<36}  {:<30}  {:<10}  {}",
                                patient.id,
                                truncate(&patient.full_name(), 30),
                                patient.date_of_birth,
                                patient.phone_number
                            );
                        }
                        println!("\nTotal: {} patient(s)", list.len());
                    }
                }
                Ok(())
            }

            PatientSubcommand::Show { id, format } => {
                let patient = settle(patients.get(id)).await?;
                match format {
                    OutputFormat::Json => print_json(&patient)?,
                    OutputFormat::Text => println!("{}", patient),
                }
                Ok(())
            }

            PatientSubcommand::Create {
                first_name,
                last_name,
                dob,
                gender,
                phone,
                address,
            } => {
                let request = CreatePatientRequest {
                    first_name: first_name.trim().to_string(),
                    last_name: last_name.trim().to_string(),
                    date_of_birth: *dob,
                    gender: *gender,
                    phone_number: phone.clone(),
                    address: address.clone(),
                };

                let created = patients.create().mutate_async(request).await?;
                println!("Created patient:");
                println!("{}", created);
                Ok(())
            }

            PatientSubcommand::Update {
                id,
                first_name,
                last_name,
                dob,
                gender,
                phone,
                address,
            } => {
                let has_updates = first_name.is_some()
                    || last_name.is_some()
                    || dob.is_some()
                    || gender.is_some()
                    || phone.is_some()
                    || address.is_some();

                if !has_updates {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                // Updates replace every field, so start from the current record
                let current = settle(patients.get(id)).await?;
                let mut request = CreatePatientRequest::from(&current);

                if let Some(first_name) = first_name {
                    request.first_name = first_name.clone();
                }
                if let Some(last_name) = last_name {
                    request.last_name = last_name.clone();
                }
                if let Some(dob) = dob {
                    request.date_of_birth = *dob;
                }
                if let Some(gender) = gender {
                    request.gender = *gender;
                }
                if let Some(phone) = phone {
                    request.phone_number = phone.clone();
                }
                if let Some(address) = address {
                    request.address = address.clone();
                }

                let updated = patients.update(id).mutate_async(request).await?;
                println!("Updated patient:");
                println!("{}", updated);
                Ok(())
            }

            PatientSubcommand::Delete { id, force } => {
                let patient = settle(patients.get(id)).await?;

                if !force && !confirm(&format!("Delete patient '{}'?", patient.full_name()))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                patients.delete(id).mutate_async(()).await?;
                println!("Deleted patient: {}", patient.full_name());
                Ok(())
            }

            PatientSubcommand::History { id, format } => {
                let history = settle(patients.medical_history(id)).await?;

                if history.is_empty() {
                    println!("No medical records found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => print_json(&history)?,
                    OutputFormat::Text => {
                        println!("{:<16}  {:<30}  {:<24}  STAFF", "DATE", "DIAGNOSIS", "TREATMENT");
                        println!("{}", "-".repeat(96));
                        for record in &history {
                            println!(
                                "{:<16}  {:<30}  {:<24}  {}",
                                record.date.format("%Y-%m-%d %H:%M"),
                                truncate(&record.diagnosis, 30),
                                truncate(&record.treatment, 24),
                                record.staff_id
                            );
                        }
                        println!("\nTotal: {} record(s)", history.len());
                    }
                }
                Ok(())
            }

            PatientSubcommand::AddRecord {
                id,
                staff_id,
                diagnosis,
                treatment,
                notes,
                date,
            } => {
                let request = CreateMedicalRecordRequest {
                    date: date.unwrap_or_else(Utc::now),
                    diagnosis: diagnosis.clone(),
                    notes: notes.clone(),
                    staff_id: staff_id.clone(),
                    treatment: treatment.clone(),
                };

                patients.add_medical_record(id).mutate_async(request).await?;
                println!("Added medical record: {}", diagnosis);
                Ok(())
            }
        }
    }
}
