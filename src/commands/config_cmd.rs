use clap::{Args, Subcommand};

use super::{print_json, OutputFormat};
use hms::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => print_json(config)?,
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!("api_url: {}", config.api_url.value);
                        println!("  source: {}", config.api_url.source);
                        println!();

                        let token = if config.api_token.value.is_some() {
                            "********"
                        } else {
                            "(not set)"
                        };
                        println!("api_token: {}", token);
                        println!("  source: {}", config.api_token.source);
                        println!();

                        println!("cache_stale_secs: {}", config.cache_stale_secs.value);
                        println!("  source: {}", config.cache_stale_secs.source);
                        println!();

                        println!("cache_gc_secs: {}", config.cache_gc_secs.value);
                        println!("  source: {}", config.cache_gc_secs.source);
                    }
                }
                Ok(())
            }
        }
    }
}
