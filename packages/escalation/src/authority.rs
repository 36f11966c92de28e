//! Authority notification channel.

use async_trait::async_trait;
use cyberguard_report_models::Report;
use serde::Serialize;

use crate::EscalationError;

/// What the authority channel reports back for a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorityReport {
    /// Whether the channel accepted the batch.
    pub success: bool,
    /// How many reports were in the batch.
    pub reported_count: usize,
    /// Human-readable outcome.
    pub message: String,
}

/// Transport to the cybercrime authority.
#[async_trait]
pub trait AuthorityChannel: Send + Sync {
    /// Delivers a batch of reports for the area named by `location_label`.
    ///
    /// # Errors
    ///
    /// Returns [`EscalationError::Channel`] if the batch could not be
    /// delivered.
    async fn notify(
        &self,
        reports: &[Report],
        location_label: &str,
    ) -> Result<AuthorityReport, EscalationError>;
}

/// Channel that only logs the batch and always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingAuthorityChannel;

#[async_trait]
impl AuthorityChannel for LoggingAuthorityChannel {
    async fn notify(
        &self,
        reports: &[Report],
        location_label: &str,
    ) -> Result<AuthorityReport, EscalationError> {
        log::info!(
            "Reporting {} incidents from {location_label} to cybercrime authorities",
            reports.len()
        );
        for report in reports {
            log::debug!(
                "  {} [{}] {} on {}",
                report.id,
                report.severity,
                report.bullying_type,
                report.perpetrator_info.platform
            );
        }

        Ok(AuthorityReport {
            success: true,
            reported_count: reports.len(),
            message: format!(
                "Successfully reported {} incidents from {location_label} to cybercrime authorities",
                reports.len()
            ),
        })
    }
}
