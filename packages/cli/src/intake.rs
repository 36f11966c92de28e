//! Runs the guided intake conversation in the terminal.
//!
//! Choice prompts become `dialoguer` selects, free text becomes a text
//! input, and the map picker is replaced by coordinate and address
//! inputs.

use cyberguard_escalation::SubmissionReceipt;
use cyberguard_intake::{ConversationEngine, Expectation, Prompt, Turn};
use cyberguard_report_models::Location;
use dialoguer::{Input, Select};

use crate::app::App;

/// Walks one reporter through the intake and submits the report.
///
/// # Errors
///
/// Returns an error if a terminal prompt fails. A failed submission is
/// reported and the reporter may retry the last answer.
pub async fn run(app: &App, user_id: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let submitter = app.submitter();
    let mut engine = match user_id {
        Some(user_id) => ConversationEngine::for_user(submitter, user_id),
        None => ConversationEngine::new(submitter),
    };

    let mut prompt = engine.prompt();

    loop {
        println!();
        println!("Billy: {}", prompt.text);

        let turn = match prompt.expects {
            Expectation::Nothing => break,
            Expectation::Location => engine.select_location(read_location()?).await,
            Expectation::Text { optional } => {
                let answer = read_answer(&prompt, optional)?;
                engine.answer(&answer).await
            }
        };

        match turn {
            Ok(Turn::Prompt(next)) => prompt = next,
            Ok(Turn::Rejected { reason, prompt: again }) => {
                println!("  {reason}");
                prompt = again;
            }
            Ok(Turn::Submitted { receipt, prompt: closing }) => {
                print_receipt(&receipt);
                prompt = closing;
            }
            Ok(Turn::Ignored) => break,
            Err(e) => {
                println!("  Sorry, your report could not be saved: {e}");
                println!("  Please try answering again.");
            }
        }
    }

    Ok(())
}

fn read_answer(prompt: &Prompt, optional: bool) -> Result<String, Box<dyn std::error::Error>> {
    if !prompt.options.is_empty() {
        let idx = Select::new()
            .items(&prompt.options)
            .default(0)
            .interact()?;
        return Ok(prompt.options[idx].to_string());
    }

    let answer: String = Input::new()
        .with_prompt(if optional { "You (optional)" } else { "You" })
        .allow_empty(true)
        .interact_text()?;
    Ok(answer)
}

fn read_location() -> Result<Location, Box<dyn std::error::Error>> {
    let lat: f64 = Input::new().with_prompt("Latitude").interact_text()?;
    let lng: f64 = Input::new().with_prompt("Longitude").interact_text()?;

    let text = |label: &str| -> Result<String, dialoguer::Error> {
        Input::new()
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()
    };

    Ok(Location {
        address: text("Address")?,
        state: text("State")?,
        district: text("District")?,
        city: text("City")?,
        ..Location::at(lat, lng)
    })
}

fn print_receipt(receipt: &SubmissionReceipt) {
    println!();
    println!("Report {} saved.", receipt.report_id);

    match &receipt.area {
        Ok(area) if area.is_critical => println!(
            "This area now has {} reports nearby (tier: {}). They have been escalated.",
            area.count, area.tier
        ),
        Ok(_) => {}
        Err(e) => println!("The nearby-area check could not be completed: {e}"),
    }
}
