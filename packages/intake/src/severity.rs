//! Initial severity of a freshly finalized report.

use cyberguard_report_models::{PerpetratorInfo, Severity};

/// Severity from how much identifying detail the reporter supplied:
/// both a username and evidence is `high`, one of them is `medium`,
/// neither is `low`.
#[must_use]
pub const fn initial_severity(has_username: bool, has_evidence: bool) -> Severity {
    match (has_username, has_evidence) {
        (true, true) => Severity::High,
        (true, false) | (false, true) => Severity::Medium,
        (false, false) => Severity::Low,
    }
}

/// [`initial_severity`] applied to collected perpetrator details and
/// evidence.
#[must_use]
pub fn severity_for(perpetrator: &PerpetratorInfo, evidence_links: &[String]) -> Severity {
    let has_evidence = evidence_links.iter().any(|link| !link.trim().is_empty());
    initial_severity(perpetrator.has_username(), has_evidence)
}
