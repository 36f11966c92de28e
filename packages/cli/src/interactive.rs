//! Menu-driven mode, used when no subcommand is given.

use dialoguer::{Confirm, Input, Select};

use crate::app::App;
use crate::{commands, intake};

/// Top-level actions in the interactive menu.
enum Action {
    Report,
    List,
    Nearby,
    Areas,
    Notify,
    Resolve,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Report,
        Self::List,
        Self::Nearby,
        Self::Areas,
        Self::Notify,
        Self::Resolve,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Report => "Report an incident (talk to Billy)",
            Self::List => "List reports",
            Self::Nearby => "Find reports near a location",
            Self::Areas => "Show critical areas",
            Self::Notify => "Notify cybercrime authorities",
            Self::Resolve => "Resolve a report",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the menu until the user quits.
///
/// # Errors
///
/// Returns an error if a prompt or any selected operation fails.
pub async fn run(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        println!();
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match Action::ALL[idx] {
            Action::Report => {
                let user_id = optional_text("User ID (blank for none)")?;
                intake::run(app, user_id).await?;
            }
            Action::List => {
                let user_id = optional_text("Only reports for user (blank for all)")?;
                commands::list(app, user_id.as_deref()).await?;
            }
            Action::Nearby => {
                let (lat, lng) = coordinates()?;
                let radius_km: f64 = Input::new()
                    .with_prompt("Radius (km)")
                    .default(app.settings().radius_km)
                    .interact_text()?;
                commands::nearby(app, lat, lng, Some(radius_km)).await?;
            }
            Action::Areas => commands::areas(app).await?,
            Action::Notify => {
                let (lat, lng) = coordinates()?;
                let label = optional_text("Location label (blank to derive)")?;
                commands::notify(app, lat, lng, label, false).await?;
            }
            Action::Resolve => {
                let id: String = Input::new().with_prompt("Report ID").interact_text()?;
                if Confirm::new()
                    .with_prompt(format!("Mark {id} resolved?"))
                    .default(false)
                    .interact()?
                {
                    commands::resolve(app, id.trim()).await?;
                }
            }
            Action::Quit => return Ok(()),
        }
    }
}

fn optional_text(prompt: &str) -> Result<Option<String>, dialoguer::Error> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

fn coordinates() -> Result<(f64, f64), dialoguer::Error> {
    let lat: f64 = Input::new().with_prompt("Latitude").interact_text()?;
    let lng: f64 = Input::new().with_prompt("Longitude").interact_text()?;
    Ok((lat, lng))
}
