use clap::{Args, Subcommand};
use hms_core::{Task, Tasks};

use super::{print_json, settle, truncate, OutputFormat};

#[derive(Args)]
pub struct TaskCommand {
    #[command(subcommand)]
    pub command: TaskSubcommand,
}

#[derive(Subcommand)]
pub enum TaskSubcommand {
    /// List all tasks
    List {
        /// Only tasks with no assigned staff member
        #[arg(long)]
        unassigned: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl TaskCommand {
    pub async fn run(&self, tasks: &Tasks) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            TaskSubcommand::List { unassigned, format } => {
                let list = settle(tasks.list()).await?;

                let list: Vec<Task> = if *unassigned {
                    list.into_iter()
                        .filter(|t| t.assigned_staff_id.is_none())
                        .collect()
                } else {
                    list
                };

                if list.is_empty() {
                    println!("No tasks found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => print_json(&list)?,
                    OutputFormat::Text => print_tasks(&list),
                }
                Ok(())
            }
        }
    }
}

pub(super) fn print_tasks(tasks: &[Task]) {
    println!(
        "{:<36}  {:<30}  {:<10}  {:<16}  ASSIGNED",
        "ID", "TITLE", "STATUS", "START"
    );
    println!("{}", "-".repeat(120));
    for task in tasks {
        println!(
            "{:<36}  {:<30}  {:<10}  {:<16}  {}",
            task.id,
            truncate(&task.title, 30),
            truncate(&task.status_id, 10),
            task.start_time.format("%Y-%m-%d %H:%M"),
            task.assigned_staff_id.as_deref().unwrap_or("-")
        );
    }
    println!("\nTotal: {} task(s)", tasks.len());
}
