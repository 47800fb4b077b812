mod appointment;
mod config_cmd;
mod patient;
mod staff;
mod task;

pub use appointment::AppointmentCommand;
pub use config_cmd::ConfigCommand;
pub use patient::PatientCommand;
pub use staff::StaffCommand;
pub use task::TaskCommand;

use clap::ValueEnum;
use hms_core::{Query, QueryError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Waits for a mounted read to settle and returns its data or error.
pub(crate) async fn settle<T: DeserializeOwned>(mut query: Query<T>) -> Result<T, QueryError> {
    query.settled().await.into_result()
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Asks a yes/no question on stdin. Anything but `y` declines.
pub(crate) fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Shortens `s` to at most `max` characters, marking the cut with `...`.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}
