#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Escalation of incident clusters.
//!
//! Two separate paths mark reports as `reported`:
//!
//! - After every submission, [`EscalationService::check_critical_area`]
//!   looks at reports near the new one and escalates the whole group once
//!   it reaches the configured size.
//! - [`EscalationService::report_to_authority`] sends an explicit batch to
//!   an [`AuthorityChannel`]. Callers preview with
//!   [`should_report_to_authority`] first.
//!
//! [`ReportSubmitter`] plugs the store and the first path into the intake
//! conversation.

mod authority;
mod service;
mod settings;
mod submitter;

use cyberguard_report_models::InvalidCoordinates;
use cyberguard_store::StoreError;

pub use authority::{AuthorityChannel, AuthorityReport, LoggingAuthorityChannel};
pub use service::{AreaCheck, EscalationService, should_report_to_authority};
pub use settings::{EscalationSettings, MIN_REPORTS_VAR, RADIUS_KM_VAR, SettingsError};
pub use submitter::{ReportSubmitter, SubmissionReceipt};

/// Errors from escalation and submission.
#[derive(Debug, thiserror::Error)]
pub enum EscalationError {
    /// Reading or writing reports failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The submitted report has unusable coordinates.
    #[error(transparent)]
    InvalidLocation(#[from] InvalidCoordinates),

    /// The authority channel rejected or failed to deliver a batch.
    #[error("Authority channel error: {0}")]
    Channel(String),
}
