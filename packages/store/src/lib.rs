#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report persistence.
//!
//! [`ReportStore`] is the narrow contract the aggregation and escalation
//! engine reads and writes through. Two implementations ship here:
//!
//! - [`MemoryReportStore`] keeps reports in process, for tests and
//!   throwaway sessions.
//! - [`SqliteReportStore`] persists to a `SQLite` file via
//!   `switchy_database`.
//!
//! Both preserve insertion order and refuse to move a report's status
//! backwards.

mod memory;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use cyberguard_report_models::{NewReport, Report, ReportChanges};

pub use memory::MemoryReportStore;
pub use sqlite::{DEFAULT_DB_PATH, SqliteReportStore};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from report storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A database query or command failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed (e.g., creating the database directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization of a stored column failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored row could not be converted back into a report.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },

    /// The in-memory store's lock was poisoned by a panicking writer.
    #[error("report store lock poisoned")]
    Poisoned,
}

// ---------------------------------------------------------------------------
// Store contract
// ---------------------------------------------------------------------------

/// Persistence for incident reports.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Stores a finalized draft, assigning its id and timestamp. Returns
    /// the new id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    async fn add_report(&self, report: NewReport) -> Result<String, StoreError>;

    /// Every stored report, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    async fn get_all_reports(&self) -> Result<Vec<Report>, StoreError>;

    /// Reports owned by `user_id`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    async fn get_reports_by_user(&self, user_id: &str) -> Result<Vec<Report>, StoreError>;

    /// Applies a partial update. Returns how many reports matched `id`
    /// (0 or 1).
    ///
    /// A status change that would move backwards is skipped; the
    /// severity part of the change still applies.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    async fn update_report(&self, id: &str, changes: ReportChanges) -> Result<u64, StoreError>;
}

#[async_trait]
impl<T: ReportStore + ?Sized> ReportStore for Arc<T> {
    async fn add_report(&self, report: NewReport) -> Result<String, StoreError> {
        (**self).add_report(report).await
    }

    async fn get_all_reports(&self) -> Result<Vec<Report>, StoreError> {
        (**self).get_all_reports().await
    }

    async fn get_reports_by_user(&self, user_id: &str) -> Result<Vec<Report>, StoreError> {
        (**self).get_reports_by_user(user_id).await
    }

    async fn update_report(&self, id: &str, changes: ReportChanges) -> Result<u64, StoreError> {
        (**self).update_report(id, changes).await
    }
}

/// Generates a fresh report id.
fn new_report_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
