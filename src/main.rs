mod config;
mod database;
mod entities;
mod http_server;
mod logging;
mod query_builder;
mod services;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};

use crate::{config::Config, database::Database, logging::setup_logging};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "SHOWBILL_CONFIG")]
    config: Option<PathBuf>,

    /// Console log level (default: info)
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// File log level (default: debug)
    #[arg(long, default_value = "debug", global = true)]
    log_file_level: log::LevelFilter,

    /// Path to log file
    #[arg(long, env = "SHOWBILL_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the booking directory over HTTP
    Serve {
        /// The port to run the server on
        #[arg(short, long, default_value = "3000", env = "SHOWBILL_HTTP_PORT")]
        port: u16,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    if let Some(path) = path {
        Config::from_file(&path)
    } else {
        Config::load()
    }
    .wrap_err("Failed to load showbill config")
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_logging(args.log_level, args.log_file.clone(), args.log_file_level)?;

    log::debug!("Showbill starting");

    match args.command {
        Commands::Serve { port } => {
            let config = load_config(args.config)?;

            log::debug!("Opening database at: {}", config.database_path().display());
            let database = Arc::new(Database::open(&config.database_path()).await?);

            log::info!("Starting HTTP server on port: {}", port);
            http_server::app::start(port, database).await?;
        }
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                log::debug!("Creating default config");
                Config::create_default()?;
                log::info!("Default config created successfully");
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
    }

    Ok(())
}
