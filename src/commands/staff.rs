use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Subcommand};
use hms_core::{CreateAndAssignTaskRequest, CreateStaffRequest, Staff, StaffMembers};

use super::task::print_tasks;
use super::{confirm, print_json, settle, truncate, OutputFormat};

#[derive(Args)]
pub struct StaffCommand {
    #[command(subcommand)]
    pub command: StaffSubcommand,
}

#[derive(Subcommand)]
pub enum StaffSubcommand {
    /// List staff members
    List {
        /// Only list doctors
        #[arg(long)]
        doctors: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a staff member's details
    Show {
        /// Staff member ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a staff member
    Create {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: NaiveDate,

        #[arg(long)]
        address: String,

        #[arg(long)]
        phone: String,

        /// Role (e.g. Doctor, Nurse)
        #[arg(long)]
        role: String,

        /// Employment status (e.g. Active)
        #[arg(long, default_value = "Active")]
        status: String,

        #[arg(long, default_value = "")]
        nurse_type: String,

        #[arg(long, default_value = "")]
        specialization: String,
    },

    /// Update a staff member (unspecified fields keep their current values)
    Update {
        /// Staff member ID
        id: String,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: Option<NaiveDate>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        role: Option<String>,

        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        nurse_type: Option<String>,

        #[arg(long)]
        specialization: Option<String>,
    },

    /// Delete a staff member
    Delete {
        /// Staff member ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// List the tasks assigned to a staff member
    Tasks {
        /// Staff member ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a task and assign it to a staff member
    Assign {
        /// Staff member ID
        id: String,

        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,

        /// Shift start (RFC 3339)
        #[arg(long)]
        start: DateTime<Utc>,

        /// Shift end (RFC 3339)
        #[arg(long)]
        end: DateTime<Utc>,

        #[arg(long)]
        priority: Option<i32>,

        #[arg(long, default_value = "Open")]
        status: String,
    },
}

impl StaffCommand {
    pub async fn run(&self, staff: &StaffMembers) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            StaffSubcommand::List { doctors, format } => {
                let query = if *doctors { staff.doctors() } else { staff.list() };
                let list = settle(query).await?;

                if list.is_empty() {
                    println!("No staff members found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => print_json(&list)?,
                    OutputFormat::Text => print_staff(&list),
                }
                Ok(())
            }

            StaffSubcommand::Show { id, format } => {
                let member = settle(staff.get(id)).await?;
                match format {
                    OutputFormat::Json => print_json(&member)?,
                    OutputFormat::Text => println!("{}", member),
                }
                Ok(())
            }

            StaffSubcommand::Create {
                first_name,
                last_name,
                dob,
                address,
                phone,
                role,
                status,
                nurse_type,
                specialization,
            } => {
                let request = CreateStaffRequest {
                    first_name: first_name.trim().to_string(),
                    last_name: last_name.trim().to_string(),
                    date_of_birth: *dob,
                    address: address.clone(),
                    phone_number: phone.clone(),
                    nurse_type: nurse_type.clone(),
                    role_id: role.clone(),
                    specialization: specialization.clone(),
                    status_id: status.clone(),
                };

                let created = staff.create().mutate_async(request).await?;
                println!("Created staff member:");
                println!("{}", created);
                Ok(())
            }

            StaffSubcommand::Update {
                id,
                first_name,
                last_name,
                dob,
                address,
                phone,
                role,
                status,
                nurse_type,
                specialization,
            } => {
                let has_updates = first_name.is_some()
                    || last_name.is_some()
                    || dob.is_some()
                    || address.is_some()
                    || phone.is_some()
                    || role.is_some()
                    || status.is_some()
                    || nurse_type.is_some()
                    || specialization.is_some();

                if !has_updates {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let current = settle(staff.get(id)).await?;
                let mut request = CreateStaffRequest::from(&current);

                if let Some(first_name) = first_name {
                    request.first_name = first_name.clone();
                }
                if let Some(last_name) = last_name {
                    request.last_name = last_name.clone();
                }
                if let Some(dob) = dob {
                    request.date_of_birth = *dob;
                }
                if let Some(address) = address {
                    request.address = address.clone();
                }
                if let Some(phone) = phone {
                    request.phone_number = phone.clone();
                }
                if let Some(role) = role {
                    request.role_id = role.clone();
                }
                if let Some(status) = status {
                    request.status_id = status.clone();
                }
                if let Some(nurse_type) = nurse_type {
                    request.nurse_type = nurse_type.clone();
                }
                if let Some(specialization) = specialization {
                    request.specialization = specialization.clone();
                }

                let updated = staff.update(id).mutate_async(request).await?;
                println!("Updated staff member:");
                println!("{}", updated);
                Ok(())
            }

            StaffSubcommand::Delete { id, force } => {
                let member = settle(staff.get(id)).await?;

                if !force && !confirm(&format!("Delete staff member '{}'?", member.full_name()))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                staff.delete(id).mutate_async(()).await?;
                println!("Deleted staff member: {}", member.full_name());
                Ok(())
            }

            StaffSubcommand::Tasks { id, format } => {
                let tasks = settle(staff.tasks(id)).await?;

                if tasks.is_empty() {
                    println!("No tasks assigned");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => print_json(&tasks)?,
                    OutputFormat::Text => print_tasks(&tasks),
                }
                Ok(())
            }

            StaffSubcommand::Assign {
                id,
                title,
                description,
                start,
                end,
                priority,
                status,
            } => {
                let request = CreateAndAssignTaskRequest {
                    title: title.clone(),
                    description: description.clone(),
                    start_time: *start,
                    end_time: *end,
                    priority: *priority,
                    status_id: status.clone(),
                };

                staff.assign_task(id).mutate_async(request).await?;
                println!("Assigned task '{}' to {}", title, id);
                Ok(())
            }
        }
    }
}

fn print_staff(list: &[Staff]) {
    println!("{:<36}  {:<30}  {:<12}  STATUS", "ID", "NAME", "ROLE");
    println!("{}", "-".repeat(96));
    for member in list {
        println!(
            "{:<36}  {:<30}  {:<12}  {}",
            member.id,
            truncate(&member.full_name(), 30),
            truncate(&member.role_id, 12),
            member.status_id
        );
    }
    println!("\nTotal: {} staff member(s)", list.len());
}
