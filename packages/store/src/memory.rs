//! In-process report store.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use cyberguard_report_models::{NewReport, Report, ReportChanges};

use crate::{ReportStore, StoreError, new_report_id};

/// Keeps reports in a `Vec`, in insertion order.
#[derive(Default)]
pub struct MemoryReportStore {
    reports: Mutex<Vec<Report>>,
}

impl MemoryReportStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with already-hydrated reports.
    #[must_use]
    pub const fn with_reports(reports: Vec<Report>) -> Self {
        Self {
            reports: Mutex::new(reports),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Report>>, StoreError> {
        self.reports.lock().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn add_report(&self, report: NewReport) -> Result<String, StoreError> {
        let id = new_report_id();
        let report = report.into_report(id.clone(), chrono::Utc::now());
        self.lock()?.push(report);
        log::debug!("Stored report {id} in memory");
        Ok(id)
    }

    async fn get_all_reports(&self) -> Result<Vec<Report>, StoreError> {
        Ok(self.lock()?.clone())
    }

    async fn get_reports_by_user(&self, user_id: &str) -> Result<Vec<Report>, StoreError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|r| r.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect())
    }

    async fn update_report(&self, id: &str, changes: ReportChanges) -> Result<u64, StoreError> {
        let mut reports = self.lock()?;
        let Some(report) = reports.iter_mut().find(|r| r.id == id) else {
            return Ok(0);
        };

        if let Some(status) = changes.status
            && !report.status.can_transition_to(status)
        {
            log::warn!(
                "Ignoring status change {} -> {status} for report {id}",
                report.status
            );
        }

        report.apply(&changes);
        Ok(1)
    }
}
