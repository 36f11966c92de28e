//! Submission sink that stores intake reports and checks their area.

use async_trait::async_trait;
use cyberguard_intake::SubmissionSink;
use cyberguard_report_models::NewReport;
use cyberguard_store::ReportStore;

use crate::{
    AreaCheck, AuthorityChannel, EscalationError, EscalationService, EscalationSettings,
    LoggingAuthorityChannel,
};

/// What a successful submission returns to the intake caller.
///
/// The report is stored even when `area` is an error; the check is not
/// retried.
#[derive(Debug)]
pub struct SubmissionReceipt {
    /// Id assigned by the store.
    pub report_id: String,
    /// Outcome of the area check run right after storing.
    pub area: Result<AreaCheck, EscalationError>,
}

/// Stores finalized intake reports, then runs the local critical-area
/// check around each one.
pub struct ReportSubmitter<S, C = LoggingAuthorityChannel> {
    service: EscalationService<S, C>,
}

impl<S: ReportStore> ReportSubmitter<S> {
    /// Submitter whose service logs authority batches.
    pub const fn with_logging_channel(store: S, settings: EscalationSettings) -> Self {
        Self::new(EscalationService::with_logging_channel(store, settings))
    }
}

impl<S: ReportStore, C: AuthorityChannel> ReportSubmitter<S, C> {
    /// Wraps an escalation service.
    pub const fn new(service: EscalationService<S, C>) -> Self {
        Self { service }
    }

    /// The wrapped service.
    pub const fn service(&self) -> &EscalationService<S, C> {
        &self.service
    }
}

#[async_trait]
impl<S: ReportStore, C: AuthorityChannel> SubmissionSink for ReportSubmitter<S, C> {
    type Receipt = SubmissionReceipt;
    type Error = EscalationError;

    async fn submit(&self, report: NewReport) -> Result<SubmissionReceipt, EscalationError> {
        report.location.validate()?;

        let (lat, lng) = (report.location.lat, report.location.lng);
        let report_id = self.service.store().add_report(report).await?;
        log::info!("Stored report {report_id}");

        let area = self.service.check_critical_area(lat, lng).await;
        match &area {
            Ok(check) if check.is_critical => log::info!(
                "Report {report_id} joined a critical area of {} report(s)",
                check.count
            ),
            Ok(_) => {}
            Err(e) => log::error!("Report {report_id} stored but its area check failed: {e}"),
        }

        Ok(SubmissionReceipt { report_id, area })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cyberguard_intake::{ConversationEngine, IntakeStep, Turn};
    use cyberguard_report_models::{
        BullyingType, Location, PerpetratorInfo, Report, ReportChanges, ReportStatus, Reporter,
        Severity,
    };
    use cyberguard_store::{MemoryReportStore, StoreError};

    use super::*;

    fn pending_at(lat: f64, lng: f64) -> NewReport {
        NewReport {
            user_id: None,
            reporter: Reporter::Anonymous { age: 16 },
            location: Location::at(lat, lng),
            bullying_type: BullyingType::Threats,
            perpetrator_info: PerpetratorInfo {
                platform: "WhatsApp".to_string(),
                ..PerpetratorInfo::default()
            },
            evidence_links: Vec::new(),
            severity: Severity::Low,
            status: ReportStatus::Pending,
        }
    }

    #[tokio::test]
    async fn fourth_nearby_report_escalates_all_four() {
        let store = Arc::new(MemoryReportStore::new());
        for (lat, lng) in [(12.9700, 77.5900), (12.9705, 77.5903), (12.9696, 77.5897)] {
            store.add_report(pending_at(lat, lng)).await.unwrap();
        }

        let submitter =
            ReportSubmitter::with_logging_channel(Arc::clone(&store), EscalationSettings::default());
        let receipt = submitter.submit(pending_at(12.9702, 77.5901)).await.unwrap();

        let area = receipt.area.unwrap();
        assert!(area.is_critical);
        assert_eq!(area.count, 4);
        assert_eq!(area.updated, 4);

        let all = store.get_all_reports().await.unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.iter().all(|r| r.status == ReportStatus::Reported));
        assert!(all.iter().any(|r| r.id == receipt.report_id));
    }

    #[tokio::test]
    async fn invalid_location_is_not_stored() {
        let store = Arc::new(MemoryReportStore::new());
        let submitter =
            ReportSubmitter::with_logging_channel(Arc::clone(&store), EscalationSettings::default());

        let err = submitter
            .submit(pending_at(f64::NAN, 77.59))
            .await
            .unwrap_err();
        assert!(matches!(err, EscalationError::InvalidLocation(_)));
        assert!(store.get_all_reports().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn intake_conversation_lands_in_the_store() {
        let store = Arc::new(MemoryReportStore::new());
        let submitter =
            ReportSubmitter::with_logging_channel(Arc::clone(&store), EscalationSettings::default());
        let mut engine = ConversationEngine::for_user(submitter, "user-7");

        engine.answer("No, I'll provide my name").await.unwrap();
        engine.answer("Asha").await.unwrap();
        engine.answer("16").await.unwrap();
        engine
            .select_location(Location {
                city: "Bengaluru".to_string(),
                ..Location::at(12.97, 77.59)
            })
            .await
            .unwrap();
        engine.answer("Impersonation").await.unwrap();
        engine.answer("Instagram").await.unwrap();
        engine.answer("@abc").await.unwrap();
        let turn = engine.answer("http://x").await.unwrap();

        let receipt = match turn {
            Turn::Submitted { receipt, .. } => receipt,
            other => panic!("expected submission, got {other:?}"),
        };
        assert!(!receipt.area.unwrap().is_critical);

        let mine = store.get_reports_by_user("user-7").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, receipt.report_id);
        assert_eq!(mine[0].reporter.name(), Some("Asha"));
        assert_eq!(mine[0].severity, Severity::High);
        assert_eq!(mine[0].status, ReportStatus::Pending);
    }

    /// Accepts new reports but refuses every update.
    struct NoUpdates(MemoryReportStore);

    #[async_trait]
    impl ReportStore for NoUpdates {
        async fn add_report(&self, report: NewReport) -> Result<String, StoreError> {
            self.0.add_report(report).await
        }

        async fn get_all_reports(&self) -> Result<Vec<Report>, StoreError> {
            self.0.get_all_reports().await
        }

        async fn get_reports_by_user(&self, user_id: &str) -> Result<Vec<Report>, StoreError> {
            self.0.get_reports_by_user(user_id).await
        }

        async fn update_report(
            &self,
            _id: &str,
            _changes: ReportChanges,
        ) -> Result<u64, StoreError> {
            Err(StoreError::Database("updates disabled".to_string()))
        }
    }

    #[tokio::test]
    async fn failed_area_check_still_completes_the_session_once() {
        let store = Arc::new(NoUpdates(MemoryReportStore::new()));
        for (lat, lng) in [(12.9700, 77.5900), (12.9705, 77.5903)] {
            store.add_report(pending_at(lat, lng)).await.unwrap();
        }

        let submitter =
            ReportSubmitter::with_logging_channel(Arc::clone(&store), EscalationSettings::default());
        let mut engine = ConversationEngine::new(submitter);

        engine.answer("Yes, keep me anonymous").await.unwrap();
        engine.answer("15").await.unwrap();
        engine
            .select_location(Location::at(12.9702, 77.5901))
            .await
            .unwrap();
        engine.answer("Harassment").await.unwrap();
        engine.answer("Instagram").await.unwrap();
        engine.answer("").await.unwrap();
        assert_eq!(engine.step(), IntakeStep::Evidence);

        let turn = engine.answer("").await.unwrap();
        let receipt = match turn {
            Turn::Submitted { receipt, .. } => receipt,
            other => panic!("expected submission, got {other:?}"),
        };
        assert!(matches!(
            receipt.area,
            Err(EscalationError::Store(StoreError::Database(_)))
        ));
        assert!(engine.is_complete());

        let turn = engine.answer("").await.unwrap();
        assert!(matches!(turn, Turn::Ignored));

        let all = store.get_all_reports().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all.iter().filter(|r| r.id == receipt.report_id).count(), 1);
    }
}
