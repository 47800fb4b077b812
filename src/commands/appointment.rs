use chrono::NaiveDate;
use clap::{Args, Subcommand};
use hms_core::{
    Appointment, AppointmentStatus, AppointmentType, Appointments, CreateAppointmentRequest,
};

use super::{confirm, print_json, settle, truncate, OutputFormat};

#[derive(Args)]
pub struct AppointmentCommand {
    #[command(subcommand)]
    pub command: AppointmentSubcommand,
}

#[derive(Subcommand)]
pub enum AppointmentSubcommand {
    /// List appointments, optionally filtered
    List {
        /// Only appointments on this date (YYYY-MM-DD)
        #[arg(long, conflicts_with_all = ["staff", "patient"])]
        date: Option<NaiveDate>,

        /// Only appointments with this staff member
        #[arg(long, conflicts_with = "patient")]
        staff: Option<String>,

        /// Only appointments for this patient
        #[arg(long)]
        patient: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show an appointment's details
    Show {
        /// Appointment ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Book an appointment
    Create {
        /// Patient ID
        #[arg(long)]
        patient: String,

        /// Staff member ID
        #[arg(long)]
        staff: String,

        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Time of day (HH:MM)
        #[arg(long)]
        time: String,

        /// checkup, consultation, emergency or follow-up
        #[arg(long = "type", default_value = "checkup")]
        kind: AppointmentType,

        /// scheduled, completed, cancelled or no-show
        #[arg(long, default_value = "scheduled")]
        status: AppointmentStatus,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Update an appointment (unspecified fields keep their current values)
    Update {
        /// Appointment ID
        id: String,

        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        time: Option<String>,

        #[arg(long = "type")]
        kind: Option<AppointmentType>,

        #[arg(long)]
        status: Option<AppointmentStatus>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Cancel and remove an appointment
    Delete {
        /// Appointment ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl AppointmentCommand {
    pub async fn run(&self, appointments: &Appointments) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            AppointmentSubcommand::List {
                date,
                staff,
                patient,
                format,
            } => {
                let query = match (date, staff, patient) {
                    (Some(date), _, _) => appointments.by_date(*date),
                    (_, Some(staff), _) => appointments.by_staff(staff),
                    (_, _, Some(patient)) => appointments.by_patient(patient),
                    _ => appointments.list(),
                };
                let list = settle(query).await?;

                if list.is_empty() {
                    println!("No appointments found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => print_json(&list)?,
                    OutputFormat::Text => print_appointments(&list),
                }
                Ok(())
            }

            AppointmentSubcommand::Show { id, format } => {
                let appointment = settle(appointments.get(id)).await?;
                match format {
                    OutputFormat::Json => print_json(&appointment)?,
                    OutputFormat::Text => println!("{}", appointment),
                }
                Ok(())
            }

            AppointmentSubcommand::Create {
                patient,
                staff,
                date,
                time,
                kind,
                status,
                notes,
            } => {
                let request = CreateAppointmentRequest {
                    patient_id: patient.clone(),
                    staff_id: staff.clone(),
                    date: *date,
                    time: time.clone(),
                    kind: *kind,
                    status: *status,
                    notes: notes.clone(),
                };

                let created = appointments.create().mutate_async(request).await?;
                println!("Booked appointment:");
                println!("{}", created);
                Ok(())
            }

            AppointmentSubcommand::Update {
                id,
                date,
                time,
                kind,
                status,
                notes,
            } => {
                let has_updates = date.is_some()
                    || time.is_some()
                    || kind.is_some()
                    || status.is_some()
                    || notes.is_some();

                if !has_updates {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let current = settle(appointments.get(id)).await?;
                let mut request = CreateAppointmentRequest::from(&current);

                if let Some(date) = date {
                    request.date = *date;
                }
                if let Some(time) = time {
                    request.time = time.clone();
                }
                if let Some(kind) = kind {
                    request.kind = *kind;
                }
                if let Some(status) = status {
                    request.status = *status;
                }
                if let Some(notes) = notes {
                    request.notes = Some(notes.clone()).filter(|n| !n.is_empty());
                }

                let updated = appointments.update(id).mutate_async(request).await?;
                println!("Updated appointment:");
                println!("{}", updated);
                Ok(())
            }

            AppointmentSubcommand::Delete { id, force } => {
                let appointment = settle(appointments.get(id)).await?;
                let label = format!(
                    "{} on {} at {}",
                    appointment.kind, appointment.date, appointment.time
                );

                if !force && !confirm(&format!("Delete appointment '{}'?", label))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                appointments.delete(id).mutate_async(()).await?;
                println!("Deleted appointment: {}", label);
                Ok(())
            }
        }
    }
}

fn print_appointments(list: &[Appointment]) {
    println!(
        "{:<36}  {:<10}  {:<5}  {:<12}  {:<10}  {:<20}  STAFF",
        "ID", "DATE", "TIME", "TYPE", "STATUS", "PATIENT"
    );
    println!("{}", "-".repeat(120));
    for appointment in list {
        let patient = appointment
            .patient
            .as_ref()
            .map_or(appointment.patient_id.as_str(), |p| p.name.as_str());
        let staff = appointment
            .staff
            .as_ref()
            .map_or(appointment.staff_id.as_str(), |s| s.name.as_str());
        println!(
            "{:<36}  {:<10}  {:<5}  {:<12}  {:<10}  {:<20}  {}",
            appointment.id,
            appointment.date,
            appointment.time,
            appointment.kind.to_string(),
            appointment.status.to_string(),
            truncate(patient, 20),
            staff
        );
    }
    println!("\nTotal: {} appointment(s)", list.len());
}
