use clap::{Parser, Subcommand};
use hms::config::Config;
use hms_core::{Appointments, HttpTransport, Patients, QueryClient, StaffMembers, Tasks};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{AppointmentCommand, ConfigCommand, PatientCommand, StaffCommand, TaskCommand};

#[derive(Parser)]
#[command(name = "hms")]
#[command(version)]
#[command(about = "Hospital administration console", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage patient records and medical history
    Patient(PatientCommand),

    /// Manage staff members and their task assignments
    Staff(StaffCommand),

    /// View tasks
    Task(TaskCommand),

    /// Manage appointments
    Appointment(AppointmentCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hms=warn,hms_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn query_client(config: &Config) -> QueryClient {
    let mut transport = HttpTransport::new(config.api_url.value.clone());
    if let Some(token) = &config.api_token.value {
        transport = transport.with_token(token.clone());
    }
    tracing::debug!(api_url = %config.api_url.value, "using backend");
    QueryClient::with_config(Arc::new(transport), config.cache_config())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Patient(cmd)) => {
            let patients = Patients::new(query_client(&config));
            cmd.run(&patients).await?;
        }
        Some(Commands::Staff(cmd)) => {
            let staff = StaffMembers::new(query_client(&config));
            cmd.run(&staff).await?;
        }
        Some(Commands::Task(cmd)) => {
            let tasks = Tasks::new(query_client(&config));
            cmd.run(&tasks).await?;
        }
        Some(Commands::Appointment(cmd)) => {
            let appointments = Appointments::new(query_client(&config));
            cmd.run(&appointments).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
