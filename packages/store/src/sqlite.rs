//! `SQLite`-backed report store.
//!
//! Uses `switchy_database` with raw SQL. Reporter, location, and status
//! fields live in their own columns; perpetrator info and evidence links
//! are stored as JSON text.

use std::fmt::Display;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use cyberguard_report_models::{
    BullyingType, Location, NewReport, Report, ReportChanges, ReportStatus, Reporter, Severity,
};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue, Row};
use switchy_database_connection::init_sqlite_rusqlite;

use crate::{ReportStore, StoreError, new_report_id};

/// Default path for the reports database.
pub const DEFAULT_DB_PATH: &str = "data/reports.db";

const SELECT_COLUMNS: &str = "id, user_id, is_anonymous, reporter_name, reporter_age,
    lat, lng, address, state, district, city,
    bullying_type, perpetrator_info, evidence_links, severity, status, created_at";

/// Persists reports to a `SQLite` database file.
pub struct SqliteReportStore {
    db: Box<dyn Database>,
}

impl SqliteReportStore {
    /// Opens (or creates) the database at `path` and ensures the schema
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the parent directory cannot be created,
    /// the database cannot be opened, or schema creation fails.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let db = init_sqlite_rusqlite(Some(path)).map_err(|e| StoreError::Database(e.to_string()))?;

        Self::from_db(db).await
    }

    /// Wraps an already-open connection, ensuring the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if schema creation fails.
    pub async fn from_db(db: Box<dyn Database>) -> Result<Self, StoreError> {
        ensure_schema(db.as_ref()).await?;
        log::debug!("Report store schema ready");
        Ok(Self { db })
    }

    async fn query_reports(
        &self,
        sql: &str,
        params: &[DatabaseValue],
    ) -> Result<Vec<Report>, StoreError> {
        let rows = self
            .db
            .query_raw_params(sql, params)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.iter().map(row_to_report).collect()
    }
}

/// Creates the reports table and its indexes if they don't already exist.
async fn ensure_schema(db: &dyn Database) -> Result<(), StoreError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS reports (
            id               TEXT PRIMARY KEY,
            user_id          TEXT,
            is_anonymous     INTEGER NOT NULL,
            reporter_name    TEXT,
            reporter_age     INTEGER NOT NULL,
            lat              REAL NOT NULL,
            lng              REAL NOT NULL,
            address          TEXT NOT NULL DEFAULT '',
            state            TEXT NOT NULL DEFAULT '',
            district         TEXT NOT NULL DEFAULT '',
            city             TEXT NOT NULL DEFAULT '',
            bullying_type    TEXT NOT NULL,
            perpetrator_info TEXT NOT NULL,
            evidence_links   TEXT NOT NULL,
            severity         TEXT NOT NULL,
            status           TEXT NOT NULL,
            created_at       TEXT NOT NULL
        )",
    )
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    for (name, column) in [
        ("idx_reports_user", "user_id"),
        ("idx_reports_status", "status"),
        ("idx_reports_severity", "severity"),
        ("idx_reports_created", "created_at"),
    ] {
        db.exec_raw(&format!(
            "CREATE INDEX IF NOT EXISTS {name} ON reports ({column})"
        ))
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;
    }

    Ok(())
}

fn conversion(column: &str, e: impl Display) -> StoreError {
    StoreError::Conversion {
        message: format!("Failed to read column {column}: {e}"),
    }
}

/// Rebuilds a [`Report`] from a row selected with [`SELECT_COLUMNS`].
fn row_to_report(row: &Row) -> Result<Report, StoreError> {
    let id: String = row.to_value("id").map_err(|e| conversion("id", e))?;

    let is_anonymous: i64 = row
        .to_value("is_anonymous")
        .map_err(|e| conversion("is_anonymous", e))?;
    let age: i64 = row
        .to_value("reporter_age")
        .map_err(|e| conversion("reporter_age", e))?;
    let age = u8::try_from(age).map_err(|e| conversion("reporter_age", e))?;
    let reporter = if is_anonymous != 0 {
        Reporter::Anonymous { age }
    } else {
        Reporter::Named {
            name: row
                .to_value("reporter_name")
                .map_err(|e| conversion("reporter_name", e))?,
            age,
        }
    };

    let location = Location {
        lat: row.to_value("lat").map_err(|e| conversion("lat", e))?,
        lng: row.to_value("lng").map_err(|e| conversion("lng", e))?,
        address: row.to_value("address").map_err(|e| conversion("address", e))?,
        state: row.to_value("state").map_err(|e| conversion("state", e))?,
        district: row.to_value("district").map_err(|e| conversion("district", e))?,
        city: row.to_value("city").map_err(|e| conversion("city", e))?,
    };

    let bullying_type: String = row
        .to_value("bullying_type")
        .map_err(|e| conversion("bullying_type", e))?;
    let bullying_type = bullying_type
        .parse::<BullyingType>()
        .map_err(|e| conversion("bullying_type", e))?;

    let severity: String = row
        .to_value("severity")
        .map_err(|e| conversion("severity", e))?;
    let severity = severity
        .parse::<Severity>()
        .map_err(|e| conversion("severity", e))?;

    let status: String = row.to_value("status").map_err(|e| conversion("status", e))?;
    let status = status
        .parse::<ReportStatus>()
        .map_err(|e| conversion("status", e))?;

    let perpetrator_json: String = row
        .to_value("perpetrator_info")
        .map_err(|e| conversion("perpetrator_info", e))?;
    let evidence_json: String = row
        .to_value("evidence_links")
        .map_err(|e| conversion("evidence_links", e))?;

    let created_at: String = row
        .to_value("created_at")
        .map_err(|e| conversion("created_at", e))?;
    let timestamp = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| conversion("created_at", e))?
        .with_timezone(&Utc);

    let user_id: Option<String> = row
        .to_value("user_id")
        .map_err(|e| conversion("user_id", e))?;

    Ok(Report {
        id,
        user_id,
        reporter,
        location,
        bullying_type,
        perpetrator_info: serde_json::from_str(&perpetrator_json)?,
        evidence_links: serde_json::from_str(&evidence_json)?,
        severity,
        status,
        timestamp,
    })
}

#[async_trait]
impl ReportStore for SqliteReportStore {
    async fn add_report(&self, report: NewReport) -> Result<String, StoreError> {
        let id = new_report_id();
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        self.db
            .exec_raw_params(
                "INSERT INTO reports (
                    id, user_id, is_anonymous, reporter_name, reporter_age,
                    lat, lng, address, state, district, city,
                    bullying_type, perpetrator_info, evidence_links,
                    severity, status, created_at
                 ) VALUES (
                    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17
                 )",
                &[
                    DatabaseValue::String(id.clone()),
                    report
                        .user_id
                        .map_or(DatabaseValue::Null, DatabaseValue::String),
                    DatabaseValue::Int32(i32::from(report.reporter.is_anonymous())),
                    report.reporter.name().map_or(DatabaseValue::Null, |name| {
                        DatabaseValue::String(name.to_string())
                    }),
                    DatabaseValue::Int32(i32::from(report.reporter.age())),
                    DatabaseValue::Real64(report.location.lat),
                    DatabaseValue::Real64(report.location.lng),
                    DatabaseValue::String(report.location.address),
                    DatabaseValue::String(report.location.state),
                    DatabaseValue::String(report.location.district),
                    DatabaseValue::String(report.location.city),
                    DatabaseValue::String(report.bullying_type.to_string()),
                    DatabaseValue::String(serde_json::to_string(&report.perpetrator_info)?),
                    DatabaseValue::String(serde_json::to_string(&report.evidence_links)?),
                    DatabaseValue::String(report.severity.to_string()),
                    DatabaseValue::String(report.status.to_string()),
                    DatabaseValue::String(created_at),
                ],
            )
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        log::debug!("Stored report {id}");
        Ok(id)
    }

    async fn get_all_reports(&self) -> Result<Vec<Report>, StoreError> {
        self.query_reports(
            &format!("SELECT {SELECT_COLUMNS} FROM reports ORDER BY rowid"),
            &[],
        )
        .await
    }

    async fn get_reports_by_user(&self, user_id: &str) -> Result<Vec<Report>, StoreError> {
        self.query_reports(
            &format!("SELECT {SELECT_COLUMNS} FROM reports WHERE user_id = $1 ORDER BY rowid"),
            &[DatabaseValue::String(user_id.to_string())],
        )
        .await
    }

    async fn update_report(&self, id: &str, changes: ReportChanges) -> Result<u64, StoreError> {
        if changes.is_empty() {
            return Ok(0);
        }

        let mut assignments = Vec::new();
        let mut params = vec![DatabaseValue::String(id.to_string())];

        if let Some(status) = changes.status {
            params.push(DatabaseValue::String(status.to_string()));
            let value = params.len();
            params.push(DatabaseValue::Int32(i32::from(status.rank())));
            let rank = params.len();
            assignments.push(format!(
                "status = CASE
                    WHEN (CASE status WHEN 'pending' THEN 0 WHEN 'reported' THEN 1 ELSE 2 END) <= ${rank}
                    THEN ${value}
                    ELSE status
                 END"
            ));
        }

        if let Some(severity) = changes.severity {
            params.push(DatabaseValue::String(severity.to_string()));
            assignments.push(format!("severity = ${}", params.len()));
        }

        let sql = format!(
            "UPDATE reports SET {} WHERE id = $1",
            assignments.join(", ")
        );

        let updated = self
            .db
            .exec_raw_params(&sql, &params)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if updated == 0 {
            log::debug!("No report with id {id} to update");
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use cyberguard_report_models::PerpetratorInfo;

    use super::*;

    fn temp_db_path() -> PathBuf {
        std::env::temp_dir().join(format!("cyberguard-test-{}.db", uuid::Uuid::new_v4()))
    }

    fn named_report(user: &str) -> NewReport {
        NewReport {
            user_id: Some(user.to_string()),
            reporter: Reporter::Named {
                name: "Asha".to_string(),
                age: 16,
            },
            location: Location {
                city: "Bengaluru".to_string(),
                state: "Karnataka".to_string(),
                ..Location::at(12.9716, 77.5946)
            },
            bullying_type: BullyingType::HateSpeech,
            perpetrator_info: PerpetratorInfo {
                platform: "WhatsApp".to_string(),
                username: Some("@troll".to_string()),
                ..PerpetratorInfo::default()
            },
            evidence_links: vec!["http://a".to_string(), "screenshot of chat".to_string()],
            severity: Severity::High,
            status: ReportStatus::Pending,
        }
    }

    #[tokio::test]
    async fn stored_report_reads_back_intact() {
        let path = temp_db_path();
        let store = SqliteReportStore::open(&path).await.unwrap();

        let draft = named_report("u1");
        let id = store.add_report(draft.clone()).await.unwrap();

        let all = store.get_all_reports().await.unwrap();
        assert_eq!(all.len(), 1);
        let report = &all[0];
        assert_eq!(report.id, id);
        assert_eq!(report.user_id, draft.user_id);
        assert_eq!(report.reporter, draft.reporter);
        assert_eq!(report.location, draft.location);
        assert_eq!(report.bullying_type, BullyingType::HateSpeech);
        assert_eq!(report.perpetrator_info, draft.perpetrator_info);
        assert_eq!(report.evidence_links, draft.evidence_links);
        assert_eq!(report.severity, Severity::High);
        assert_eq!(report.status, ReportStatus::Pending);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn reports_keep_insertion_order_and_filter_by_user() {
        let path = temp_db_path();
        let store = SqliteReportStore::open(&path).await.unwrap();

        let first = store.add_report(named_report("u1")).await.unwrap();
        let second = store.add_report(named_report("u2")).await.unwrap();
        let third = store.add_report(named_report("u1")).await.unwrap();

        let ids: Vec<String> = store
            .get_all_reports()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![first.clone(), second, third.clone()]);

        let mine: Vec<String> = store
            .get_reports_by_user("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(mine, vec![first, third]);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn update_guards_status_and_reports_matches() {
        let path = temp_db_path();
        let store = SqliteReportStore::open(&path).await.unwrap();
        let id = store.add_report(named_report("u1")).await.unwrap();

        let updated = store
            .update_report(
                &id,
                ReportChanges {
                    status: Some(ReportStatus::Resolved),
                    severity: Some(Severity::Critical),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated, 1);

        store
            .update_report(&id, ReportChanges::status(ReportStatus::Pending))
            .await
            .unwrap();

        let report = &store.get_all_reports().await.unwrap()[0];
        assert_eq!(report.status, ReportStatus::Resolved);
        assert_eq!(report.severity, Severity::Critical);

        assert_eq!(
            store
                .update_report("missing", ReportChanges::status(ReportStatus::Reported))
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            store
                .update_report(&id, ReportChanges::default())
                .await
                .unwrap(),
            0
        );

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn unreadable_column_is_a_conversion_error() {
        let path = temp_db_path();
        let store = SqliteReportStore::open(&path).await.unwrap();
        store.add_report(named_report("u1")).await.unwrap();

        store
            .db
            .exec_raw("UPDATE reports SET reporter_name = NULL")
            .await
            .unwrap();

        let err = store.get_all_reports().await.unwrap_err();
        assert!(
            matches!(&err, StoreError::Conversion { message } if message.contains("reporter_name")),
            "unexpected error: {err}"
        );

        let _ = std::fs::remove_file(path);
    }
}
