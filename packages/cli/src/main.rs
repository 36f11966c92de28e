#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI for reporting cyberbullying incidents and escalating hotspots.
//!
//! ```text
//! cyberguard report [--user <id>]
//! cyberguard list [--user <id>]
//! cyberguard nearby --lat <lat> --lng <lng> [--radius-km <km>]
//! cyberguard areas
//! cyberguard notify --lat <lat> --lng <lng> [--label <text>] [--yes]
//! cyberguard resolve <id>
//! ```
//!
//! Running `cyberguard` with no subcommand enters interactive mode.
//!
//! The database path comes from `--db`, then `CYBERGUARD_DB_PATH`, then
//! `data/reports.db`. Escalation thresholds can be tuned with
//! `CYBERGUARD_RADIUS_KM` and `CYBERGUARD_MIN_REPORTS`.

mod app;
mod commands;
mod intake;
mod interactive;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::app::{App, DB_PATH_VAR, resolve_db_path};

#[derive(Parser)]
#[command(
    name = "cyberguard",
    about = "Report cyberbullying incidents and escalate hotspots"
)]
struct Cli {
    /// Path to the reports database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report an incident through the guided conversation
    Report {
        /// Signed-in user to attribute the report to
        #[arg(long)]
        user: Option<String>,
    },
    /// List stored reports
    List {
        /// Only show reports owned by this user
        #[arg(long)]
        user: Option<String>,
    },
    /// List reports within a radius of a point
    Nearby {
        /// Latitude of the centre
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude of the centre
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Search radius in kilometers (defaults to the escalation radius)
        #[arg(long)]
        radius_km: Option<f64>,
    },
    /// Show cells with three or more reports
    Areas,
    /// Send reports near a point to the cybercrime authorities
    Notify {
        /// Latitude of the centre
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude of the centre
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Location name to include in the notification
        #[arg(long)]
        label: Option<String>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Mark a report resolved
    Resolve {
        /// Report ID
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let db_path = resolve_db_path(cli.db, std::env::var(DB_PATH_VAR).ok());
    let app = App::open(&db_path).await?;

    let Some(command) = cli.command else {
        return interactive::run(&app).await;
    };

    match command {
        Commands::Report { user } => intake::run(&app, user).await?,
        Commands::List { user } => commands::list(&app, user.as_deref()).await?,
        Commands::Nearby {
            lat,
            lng,
            radius_km,
        } => commands::nearby(&app, lat, lng, radius_km).await?,
        Commands::Areas => commands::areas(&app).await?,
        Commands::Notify {
            lat,
            lng,
            label,
            yes,
        } => commands::notify(&app, lat, lng, label, yes).await?,
        Commands::Resolve { id } => {
            if !commands::resolve(&app, &id).await? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
