#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Cyberbullying incident report types.
//!
//! This crate defines the canonical report record shared by the intake
//! conversation, the report store, and the aggregation/escalation engine,
//! together with the category, severity, and status enums and their
//! ordering rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Category of cyberbullying described by the reporter.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum BullyingType {
    /// Repeated hostile or abusive messages
    Harassment,
    /// Persistent monitoring or following someone online
    Cyberstalking,
    /// Pretending to be the victim or someone else
    Impersonation,
    /// Abuse targeting identity (religion, caste, gender, ...)
    #[serde(rename = "Hate Speech")]
    #[strum(to_string = "Hate Speech", serialize = "HateSpeech", serialize = "hate_speech")]
    HateSpeech,
    /// Threats of violence or exposure
    Threats,
    /// Anything not covered above
    Other,
}

impl BullyingType {
    /// Returns all variants of this enum, in the order they are offered to
    /// the reporter.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Harassment,
            Self::Cyberstalking,
            Self::Impersonation,
            Self::HateSpeech,
            Self::Threats,
            Self::Other,
        ]
    }
}

/// Severity of a report or of a cluster of reports.
///
/// Ordered from least to most severe, so `max()` picks the stronger one.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    /// Neither a perpetrator handle nor evidence, or an isolated report
    Low,
    /// Partial detail, or a cluster of 3+ reports
    Medium,
    /// Handle and evidence both present, or a cluster of 7+ reports
    High,
    /// Cluster of 10+ reports
    Critical,
}

/// Lifecycle status of a report.
///
/// Transitions are monotonic: `pending -> reported -> resolved`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ReportStatus {
    /// Stored but not yet escalated
    #[default]
    Pending,
    /// Escalated to the authority channel
    Reported,
    /// Closed by an administrator
    Resolved,
}

impl ReportStatus {
    /// Whether moving from `self` to `next` respects the monotonic order.
    ///
    /// Re-assigning the current status is allowed so status writes stay
    /// idempotent.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        next >= self
    }

    /// Position in the lifecycle, starting at 0 for `pending`.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Reported => 1,
            Self::Resolved => 2,
        }
    }
}

/// Error returned when a coordinate pair is not a usable WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("invalid coordinates ({lat}, {lng}): expected finite lat in -90..=90 and lng in -180..=180")]
pub struct InvalidCoordinates {
    /// The rejected latitude.
    pub lat: f64,
    /// The rejected longitude.
    pub lng: f64,
}

/// Where the incident happened, as picked on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
    /// Free-form street address.
    #[serde(default)]
    pub address: String,
    /// State name.
    #[serde(default)]
    pub state: String,
    /// District name.
    #[serde(default)]
    pub district: String,
    /// City name.
    #[serde(default)]
    pub city: String,
}

impl Location {
    /// Creates a location with only coordinates set.
    #[must_use]
    pub const fn at(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            address: String::new(),
            state: String::new(),
            district: String::new(),
            city: String::new(),
        }
    }

    /// Checks that `lat`/`lng` are finite and within WGS84 ranges.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinates`] if either value is NaN, infinite, or
    /// out of range.
    pub fn validate(&self) -> Result<(), InvalidCoordinates> {
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lng_ok = self.lng.is_finite() && (-180.0..=180.0).contains(&self.lng);

        if lat_ok && lng_ok {
            Ok(())
        } else {
            Err(InvalidCoordinates {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }

    /// Human-readable `"city, district, state"` label, skipping blank
    /// parts. Falls back to the raw coordinates when no names are known.
    #[must_use]
    pub fn label(&self) -> String {
        let parts: Vec<&str> = [&self.city, &self.district, &self.state]
            .into_iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.is_empty() {
            format!("{:.4},{:.4}", self.lat, self.lng)
        } else {
            parts.join(", ")
        }
    }
}

/// Who filed the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Reporter {
    /// Reporter chose to give their name.
    Named {
        /// Reporter's name.
        name: String,
        /// Reporter's age in years.
        age: u8,
    },
    /// Reporter chose to stay anonymous.
    Anonymous {
        /// Reporter's age in years.
        age: u8,
    },
}

impl Reporter {
    /// Whether the reporter chose anonymity.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous { .. })
    }

    /// Reporter's age in years.
    #[must_use]
    pub const fn age(&self) -> u8 {
        match self {
            Self::Named { age, .. } | Self::Anonymous { age } => *age,
        }
    }

    /// Reporter's name, if they gave one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named { name, .. } => Some(name),
            Self::Anonymous { .. } => None,
        }
    }
}

/// What is known about the person doing the bullying.
///
/// The guided intake only fills `platform` and `username`; the rest is
/// best-effort detail an administrator may add later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerpetratorInfo {
    /// Platform where the incident occurred (Instagram, `WhatsApp`, ...).
    pub platform: String,
    /// Username or handle, if known.
    pub username: Option<String>,
    /// Profile URL, if known.
    pub profile_url: Option<String>,
    /// Real name, if known.
    pub real_name: Option<String>,
    /// Approximate age, if known.
    pub approximate_age: Option<String>,
    /// Anything else the reporter shared.
    pub additional_details: Option<String>,
}

impl PerpetratorInfo {
    /// Whether a non-blank username is present.
    #[must_use]
    pub fn has_username(&self) -> bool {
        self.username.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

/// A finalized intake draft, ready to be persisted.
///
/// Carries everything a [`Report`] does except the `id` and `timestamp`,
/// which the store assigns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    /// Owning user account, if the reporter is signed in.
    pub user_id: Option<String>,
    /// Who filed the report.
    pub reporter: Reporter,
    /// Where it happened.
    pub location: Location,
    /// What kind of bullying it is.
    pub bullying_type: BullyingType,
    /// Who did it.
    pub perpetrator_info: PerpetratorInfo,
    /// Links or descriptions of evidence, in the order given.
    pub evidence_links: Vec<String>,
    /// Initial severity derived at intake.
    pub severity: Severity,
    /// Initial status (always [`ReportStatus::Pending`] from intake).
    pub status: ReportStatus,
}

impl NewReport {
    /// Hydrates this draft into a stored [`Report`].
    #[must_use]
    pub fn into_report(self, id: String, timestamp: DateTime<Utc>) -> Report {
        Report {
            id,
            user_id: self.user_id,
            reporter: self.reporter,
            location: self.location,
            bullying_type: self.bullying_type,
            perpetrator_info: self.perpetrator_info,
            evidence_links: self.evidence_links,
            severity: self.severity,
            status: self.status,
            timestamp,
        }
    }
}

/// A persisted cyberbullying incident report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Unique identifier assigned by the store.
    pub id: String,
    /// Owning user account, if any.
    pub user_id: Option<String>,
    /// Who filed the report.
    pub reporter: Reporter,
    /// Where it happened.
    pub location: Location,
    /// What kind of bullying it is.
    pub bullying_type: BullyingType,
    /// Who did it.
    pub perpetrator_info: PerpetratorInfo,
    /// Links or descriptions of evidence, in the order given.
    pub evidence_links: Vec<String>,
    /// Current severity.
    pub severity: Severity,
    /// Current lifecycle status.
    pub status: ReportStatus,
    /// When the report was stored.
    pub timestamp: DateTime<Utc>,
}

impl Report {
    /// Whether the reporter chose anonymity.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.reporter.is_anonymous()
    }

    /// Applies a partial update in place, ignoring a status change that
    /// would move backwards.
    ///
    /// Returns `true` if any field actually changed.
    pub fn apply(&mut self, changes: &ReportChanges) -> bool {
        let mut changed = false;

        if let Some(status) = changes.status
            && status != self.status
            && self.status.can_transition_to(status)
        {
            self.status = status;
            changed = true;
        }

        if let Some(severity) = changes.severity
            && severity != self.severity
        {
            self.severity = severity;
            changed = true;
        }

        changed
    }
}

/// Partial update to a stored report. `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportChanges {
    /// New status, if changing.
    pub status: Option<ReportStatus>,
    /// New severity, if changing.
    pub severity: Option<Severity>,
}

impl ReportChanges {
    /// A change that only sets the status.
    #[must_use]
    pub const fn status(status: ReportStatus) -> Self {
        Self {
            status: Some(status),
            severity: None,
        }
    }

    /// Whether this change touches no fields.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.severity.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report(status: ReportStatus) -> Report {
        NewReport {
            user_id: None,
            reporter: Reporter::Anonymous { age: 15 },
            location: Location::at(12.97, 77.59),
            bullying_type: BullyingType::Harassment,
            perpetrator_info: PerpetratorInfo {
                platform: "Instagram".to_string(),
                ..PerpetratorInfo::default()
            },
            evidence_links: Vec::new(),
            severity: Severity::Low,
            status,
        }
        .into_report("r1".to_string(), Utc::now())
    }

    #[test]
    fn bullying_type_parses_display_labels() {
        for ty in BullyingType::all() {
            let parsed: BullyingType = ty.to_string().parse().unwrap();
            assert_eq!(parsed, *ty);
        }
        assert_eq!(
            "hate speech".parse::<BullyingType>().unwrap(),
            BullyingType::HateSpeech
        );
        assert_eq!(
            "HARASSMENT".parse::<BullyingType>().unwrap(),
            BullyingType::Harassment
        );
        assert!("Spam".parse::<BullyingType>().is_err());
    }

    #[test]
    fn bullying_type_serializes_as_label() {
        let json = serde_json::to_string(&BullyingType::HateSpeech).unwrap();
        assert_eq!(json, "\"Hate Speech\"");
    }

    #[test]
    fn severity_is_ordered() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
        assert_eq!(Severity::Critical.to_string(), "critical");
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::High);
    }

    #[test]
    fn status_transitions_are_monotonic() {
        use ReportStatus::{Pending, Reported, Resolved};

        assert!(Pending.can_transition_to(Reported));
        assert!(Reported.can_transition_to(Resolved));
        assert!(Reported.can_transition_to(Reported));
        assert!(!Reported.can_transition_to(Pending));
        assert!(!Resolved.can_transition_to(Reported));
    }

    #[test]
    fn location_validation_rejects_bad_coordinates() {
        assert!(Location::at(12.97, 77.59).validate().is_ok());
        assert!(Location::at(90.0, -180.0).validate().is_ok());
        assert!(Location::at(f64::NAN, 77.59).validate().is_err());
        assert!(Location::at(12.97, f64::INFINITY).validate().is_err());
        assert!(Location::at(91.0, 0.0).validate().is_err());
        assert!(Location::at(0.0, 180.5).validate().is_err());
    }

    #[test]
    fn location_label_skips_blank_parts() {
        let location = Location {
            city: "Bengaluru".to_string(),
            district: " ".to_string(),
            state: "Karnataka".to_string(),
            ..Location::at(12.97, 77.59)
        };
        assert_eq!(location.label(), "Bengaluru, Karnataka");
        assert_eq!(Location::at(12.97, 77.59).label(), "12.9700,77.5900");
    }

    #[test]
    fn apply_never_regresses_status() {
        let mut report = sample_report(ReportStatus::Resolved);
        assert!(!report.apply(&ReportChanges::status(ReportStatus::Reported)));
        assert_eq!(report.status, ReportStatus::Resolved);

        let mut report = sample_report(ReportStatus::Pending);
        assert!(report.apply(&ReportChanges::status(ReportStatus::Reported)));
        assert!(!report.apply(&ReportChanges::status(ReportStatus::Reported)));
        assert_eq!(report.status, ReportStatus::Reported);
    }

    #[test]
    fn reporter_serializes_tagged() {
        let json = serde_json::to_value(Reporter::Anonymous { age: 15 }).unwrap();
        assert_eq!(json["kind"], "anonymous");
        assert_eq!(json["age"], 15);
    }
}
