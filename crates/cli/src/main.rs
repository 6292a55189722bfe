//! Wardrobe CLI — the main entry point.
//!
//! Commands:
//! - `init`       Write a default config file
//! - `config`     Show, validate, or locate the config
//! - `weather`    Current weather and the stylist's weather report
//! - `scan`       Classify clothing photos and add them to the wardrobe
//! - `list`       List wardrobe items
//! - `remove`     Remove a wardrobe item
//! - `outfit`     Recommend an outfit for today
//! - `chat`       Chat with the stylist (single message or interactive)
//! - `feedback`   Rate the last recommendation
//! - `serve`      Start the HTTP API for the web UI

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "wardrobe",
    about = "Wardrobe — weather-aware outfit assistant",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file to ~/.wardrobe/config.toml
    Init,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show current weather
    Weather {
        /// Latitude (defaults to the configured location)
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude (defaults to the configured location)
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Classify photos and add them to the wardrobe
    Scan {
        /// Image files (png, jpg, webp, gif, heic)
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// List wardrobe items
    List,

    /// Remove a wardrobe item by id
    Remove { id: String },

    /// Recommend an outfit
    Outfit {
        #[arg(short, long, default_value = "")]
        destination: String,

        #[arg(short, long, default_value = "")]
        activity: String,
    },

    /// Chat with the stylist
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Rate a recommendation from 1 to 5
    Feedback {
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
        score: u8,

        #[arg(short, long, default_value = "")]
        comment: String,
    },

    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (API key redacted)
    Show,
    /// Validate the config file
    Validate,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
        },
        Commands::Weather { lat, lon } => commands::weather::run(lat, lon).await?,
        Commands::Scan { images } => commands::wardrobe::scan(images).await?,
        Commands::List => commands::wardrobe::list().await?,
        Commands::Remove { id } => commands::wardrobe::remove(&id).await?,
        Commands::Outfit {
            destination,
            activity,
        } => commands::outfit::run(&destination, &activity).await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Feedback { score, comment } => commands::feedback::run(score, &comment).await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
    }

    Ok(())
}
