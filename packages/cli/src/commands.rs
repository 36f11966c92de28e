//! Non-interactive command handlers.

use cyberguard_aggregate::Cluster;
use cyberguard_escalation::should_report_to_authority;
use cyberguard_report_models::{Report, ReportChanges, ReportStatus};
use cyberguard_store::ReportStore as _;
use dialoguer::Confirm;

use crate::app::App;

/// Widest location label shown in the report table.
const MAX_LABEL_WIDTH: usize = 28;

/// Prints stored reports, optionally only those owned by `user_id`.
///
/// # Errors
///
/// Returns an error if the store can't be read.
pub async fn list(app: &App, user_id: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let store = app.store();
    let reports = match user_id {
        Some(user_id) => store.get_reports_by_user(user_id).await?,
        None => store.get_all_reports().await?,
    };

    if reports.is_empty() {
        println!("No reports found.");
        return Ok(());
    }

    print_reports(&reports);
    Ok(())
}

/// Prints reports within `radius_km` of a point.
///
/// # Errors
///
/// Returns an error if the store can't be read.
pub async fn nearby(
    app: &App,
    lat: f64,
    lng: f64,
    radius_km: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let radius_km = radius_km.unwrap_or(app.settings().radius_km);
    let reports = app
        .aggregator()
        .reports_near(lat, lng, Some(radius_km))
        .await?;

    if reports.is_empty() {
        println!("No reports within {radius_km} km of ({lat}, {lng}).");
        return Ok(());
    }

    print_reports(&reports);
    Ok(())
}

/// Prints every critical area with its tier.
///
/// # Errors
///
/// Returns an error if the store can't be read.
pub async fn areas(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let areas = app.aggregator().critical_areas().await?;

    if areas.is_empty() {
        println!("No critical areas.");
        return Ok(());
    }

    println!("{:<22} {:<6} {:<9} LOCATION", "CELL", "COUNT", "TIER");
    println!("{}", "-".repeat(80));
    for area in &areas {
        println!(
            "{:<22} {:<6} {:<9} {}",
            area.cell.to_string(),
            area.count,
            area.severity.to_string(),
            area_label(area)
        );
    }
    println!("\n{} critical area(s)", areas.len());

    Ok(())
}

/// Previews the reports near a point and, once confirmed, sends them to
/// the authority channel.
///
/// # Errors
///
/// Returns an error if the store can't be read, the confirmation prompt
/// fails, or the batch can't be sent.
pub async fn notify(
    app: &App,
    lat: f64,
    lng: f64,
    label: Option<String>,
    skip_confirm: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let reports = notify_candidates(app, lat, lng).await?;
    let label = label.unwrap_or_else(|| {
        reports.first().map_or_else(
            || format!("{lat:.4},{lng:.4}"),
            |r| r.location.label(),
        )
    });

    let unreported = reports
        .iter()
        .filter(|r| r.status != ReportStatus::Reported)
        .count();
    println!(
        "{} report(s) near {label}, {unreported} not yet reported.",
        reports.len()
    );

    if !should_report_to_authority(&reports) {
        println!("Not enough unreported incidents to notify the authorities.");
        return Ok(());
    }

    if !skip_confirm
        && !Confirm::new()
            .with_prompt(format!("Report these incidents from {label} to the authorities?"))
            .default(false)
            .interact()?
    {
        println!("Cancelled.");
        return Ok(());
    }

    let outcome = app.escalation().report_to_authority(&reports, &label).await?;
    println!("{}", outcome.message);

    Ok(())
}

/// Reports a `notify` would send: everything within the escalation
/// radius of the point.
///
/// # Errors
///
/// Returns an error if the store can't be read.
pub async fn notify_candidates(
    app: &App,
    lat: f64,
    lng: f64,
) -> Result<Vec<Report>, Box<dyn std::error::Error>> {
    let radius_km = app.settings().radius_km;
    Ok(app
        .aggregator()
        .reports_near(lat, lng, Some(radius_km))
        .await?)
}

/// Marks a report resolved.
///
/// # Errors
///
/// Returns an error if the update can't be written.
pub async fn resolve(app: &App, id: &str) -> Result<bool, Box<dyn std::error::Error>> {
    let updated = app
        .store()
        .update_report(id, ReportChanges::status(ReportStatus::Resolved))
        .await?;

    if updated == 0 {
        eprintln!("Report not found: {id}");
        return Ok(false);
    }

    println!("Resolved report {id}");
    Ok(true)
}

fn print_reports(reports: &[Report]) {
    println!(
        "{:<38} {:<9} {:<9} {:<14} {:<width$} REPORTED AT",
        "ID",
        "STATUS",
        "SEVERITY",
        "TYPE",
        "LOCATION",
        width = MAX_LABEL_WIDTH
    );
    println!("{}", "-".repeat(130));

    for report in reports {
        println!("{}", format_report_row(report));
    }

    println!("\n{} report(s)", reports.len());
}

fn format_report_row(report: &Report) -> String {
    format!(
        "{:<38} {:<9} {:<9} {:<14} {:<width$} {}",
        report.id,
        report.status.to_string(),
        report.severity.to_string(),
        report.bullying_type.to_string(),
        truncate(&report.location.label(), MAX_LABEL_WIDTH),
        report.timestamp.format("%Y-%m-%d %H:%M"),
        width = MAX_LABEL_WIDTH
    )
}

fn area_label(area: &Cluster) -> String {
    area.reports
        .first()
        .map_or_else(|| area.cell.to_string(), |r| r.location.label())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
