//! Shared handles for every command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cyberguard_aggregate::GeoAggregator;
use cyberguard_escalation::{EscalationService, EscalationSettings, ReportSubmitter};
use cyberguard_store::{DEFAULT_DB_PATH, SqliteReportStore};

/// Environment variable naming the reports database file.
pub const DB_PATH_VAR: &str = "CYBERGUARD_DB_PATH";

/// Picks the database path: explicit flag, then environment, then the
/// default.
#[must_use]
pub fn resolve_db_path(flag: Option<PathBuf>, env: Option<String>) -> PathBuf {
    flag.or_else(|| env.filter(|v| !v.trim().is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
}

/// Opened store plus the thresholds everything runs with.
pub struct App {
    store: Arc<SqliteReportStore>,
    settings: EscalationSettings,
}

impl App {
    /// Opens the database at `db_path` and loads escalation settings from
    /// the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or the database can't
    /// be opened.
    pub async fn open(db_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Self::open_with_settings(db_path, EscalationSettings::from_env()?).await
    }

    /// Opens the database at `db_path` with explicit thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if the database can't be opened.
    pub async fn open_with_settings(
        db_path: &Path,
        settings: EscalationSettings,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        log::debug!(
            "Escalation radius {} km, threshold {} report(s)",
            settings.radius_km,
            settings.min_reports
        );

        let store = SqliteReportStore::open(db_path).await?;
        log::info!("Opened report database at {}", db_path.display());

        Ok(Self {
            store: Arc::new(store),
            settings,
        })
    }

    #[must_use]
    pub const fn settings(&self) -> EscalationSettings {
        self.settings
    }

    #[must_use]
    pub fn store(&self) -> Arc<SqliteReportStore> {
        Arc::clone(&self.store)
    }

    #[must_use]
    pub fn aggregator(&self) -> GeoAggregator<Arc<SqliteReportStore>> {
        GeoAggregator::new(self.store())
    }

    #[must_use]
    pub fn escalation(&self) -> EscalationService<Arc<SqliteReportStore>> {
        EscalationService::with_logging_channel(self.store(), self.settings)
    }

    #[must_use]
    pub fn submitter(&self) -> ReportSubmitter<Arc<SqliteReportStore>> {
        ReportSubmitter::with_logging_channel(self.store(), self.settings)
    }
}
