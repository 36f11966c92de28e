//! Critical-area checks and authority batches.

use cyberguard_aggregate::{cluster_severity, reports_within};
use cyberguard_report_models::{Report, ReportChanges, ReportStatus, Severity};
use cyberguard_store::ReportStore;
use serde::Serialize;

use crate::{
    AuthorityChannel, AuthorityReport, EscalationError, EscalationSettings,
    LoggingAuthorityChannel,
};

/// Fewest not-yet-reported reports worth sending to the authority.
const AUTHORITY_MIN_UNREPORTED: usize = 3;

/// Result of checking the area around a new report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaCheck {
    /// Whether enough reports were nearby to escalate.
    pub is_critical: bool,
    /// How many reports were within the radius, the new one included.
    pub count: usize,
    /// Cluster tier for `count`.
    pub tier: Severity,
    /// The nearby reports, with any escalation already applied.
    pub reports: Vec<Report>,
    /// How many reports were actually written.
    pub updated: usize,
}

/// Whether a batch is worth sending to the authority: at least three
/// reports, at least three of which are not already `reported`.
#[must_use]
pub fn should_report_to_authority(reports: &[Report]) -> bool {
    if reports.len() < AUTHORITY_MIN_UNREPORTED {
        return false;
    }

    let unreported = reports
        .iter()
        .filter(|r| r.status != ReportStatus::Reported)
        .count();
    unreported >= AUTHORITY_MIN_UNREPORTED
}

/// Changes that escalate `report` into a cluster of tier `tier`.
///
/// Resolved reports are left alone and severity is only ever raised.
fn escalation_changes(report: &Report, tier: Severity) -> ReportChanges {
    if report.status == ReportStatus::Resolved {
        return ReportChanges::default();
    }

    ReportChanges {
        status: (report.status != ReportStatus::Reported).then_some(ReportStatus::Reported),
        severity: (tier > report.severity).then_some(tier),
    }
}

/// Applies escalation decisions through a [`ReportStore`].
pub struct EscalationService<S, C = LoggingAuthorityChannel> {
    store: S,
    channel: C,
    settings: EscalationSettings,
}

impl<S: ReportStore> EscalationService<S> {
    /// Service that sends authority batches to the log.
    pub const fn with_logging_channel(store: S, settings: EscalationSettings) -> Self {
        Self::new(store, LoggingAuthorityChannel, settings)
    }
}

impl<S: ReportStore, C: AuthorityChannel> EscalationService<S, C> {
    /// Creates a service.
    pub const fn new(store: S, channel: C, settings: EscalationSettings) -> Self {
        Self {
            store,
            channel,
            settings,
        }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Active thresholds.
    pub const fn settings(&self) -> EscalationSettings {
        self.settings
    }

    /// Looks at reports near `(lat, lng)` and, if there are at least
    /// `min_reports`, marks every one of them `reported` and raises its
    /// severity to the cluster tier.
    ///
    /// # Errors
    ///
    /// Returns [`EscalationError::Store`] if the snapshot can't be read or
    /// an update fails. Updates written before the failure stay written.
    pub async fn check_critical_area(
        &self,
        lat: f64,
        lng: f64,
    ) -> Result<AreaCheck, EscalationError> {
        let snapshot = self.store.get_all_reports().await?;
        let mut nearby = reports_within(&snapshot, lat, lng, self.settings.radius_km);

        let count = nearby.len();
        let tier = cluster_severity(count);
        let is_critical = count >= self.settings.min_reports;
        let mut updated = 0;

        if is_critical {
            log::info!(
                "Critical area at ({lat:.4}, {lng:.4}): {count} report(s) within {} km, tier {tier}",
                self.settings.radius_km
            );

            for report in &mut nearby {
                let changes = escalation_changes(report, tier);
                if changes.is_empty() {
                    continue;
                }

                if let Err(e) = self.store.update_report(&report.id, changes).await {
                    log::error!("Failed to escalate report {}: {e}", report.id);
                    return Err(e.into());
                }
                report.apply(&changes);
                updated += 1;
            }
        }

        Ok(AreaCheck {
            is_critical,
            count,
            tier,
            reports: nearby,
            updated,
        })
    }

    /// Sends `reports` to the authority channel for `location_label`, then
    /// marks each still-pending one `reported`.
    ///
    /// Doesn't re-check [`should_report_to_authority`]; callers preview
    /// with it first.
    ///
    /// # Errors
    ///
    /// Returns [`EscalationError`] if the channel fails or a status update
    /// can't be written.
    pub async fn report_to_authority(
        &self,
        reports: &[Report],
        location_label: &str,
    ) -> Result<AuthorityReport, EscalationError> {
        let outcome = self.channel.notify(reports, location_label).await?;

        if !outcome.success {
            log::warn!(
                "Authority channel declined batch for {location_label}: {}",
                outcome.message
            );
            return Ok(outcome);
        }

        for report in reports {
            if report.status != ReportStatus::Pending {
                continue;
            }
            if let Err(e) = self
                .store
                .update_report(&report.id, ReportChanges::status(ReportStatus::Reported))
                .await
            {
                log::error!("Failed to mark report {} reported: {e}", report.id);
                return Err(e.into());
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use cyberguard_report_models::{
        BullyingType, Location, NewReport, PerpetratorInfo, Reporter,
    };
    use cyberguard_store::{MemoryReportStore, StoreError};

    use super::*;

    fn draft_at(lat: f64, lng: f64) -> NewReport {
        NewReport {
            user_id: None,
            reporter: Reporter::Anonymous { age: 15 },
            location: Location::at(lat, lng),
            bullying_type: BullyingType::Harassment,
            perpetrator_info: PerpetratorInfo {
                platform: "Instagram".to_string(),
                ..PerpetratorInfo::default()
            },
            evidence_links: Vec::new(),
            severity: Severity::Low,
            status: ReportStatus::Pending,
        }
    }

    async fn seeded(points: &[(f64, f64)]) -> Arc<MemoryReportStore> {
        let store = Arc::new(MemoryReportStore::new());
        for &(lat, lng) in points {
            store.add_report(draft_at(lat, lng)).await.unwrap();
        }
        store
    }

    fn with_status(status: ReportStatus) -> Report {
        NewReport {
            status,
            ..draft_at(12.97, 77.59)
        }
        .into_report(format!("{status}"), chrono::Utc::now())
    }

    #[test]
    fn predicate_needs_three_unreported() {
        use ReportStatus::{Pending, Reported, Resolved};

        let batch = |statuses: &[ReportStatus]| -> Vec<Report> {
            statuses.iter().map(|s| with_status(*s)).collect()
        };

        assert!(!should_report_to_authority(&[]));
        assert!(!should_report_to_authority(&batch(&[Pending, Pending])));
        assert!(should_report_to_authority(&batch(&[Pending, Pending, Pending])));
        assert!(!should_report_to_authority(&batch(&[
            Pending, Pending, Reported, Reported
        ])));
        assert!(should_report_to_authority(&batch(&[
            Pending, Reported, Pending, Resolved
        ])));
        assert!(!should_report_to_authority(&batch(&[Reported; 5])));
    }

    #[tokio::test]
    async fn small_area_is_not_escalated() {
        let store = seeded(&[(12.9700, 77.5900), (12.9710, 77.5900)]).await;
        let service =
            EscalationService::with_logging_channel(Arc::clone(&store), EscalationSettings::default());

        let check = service.check_critical_area(12.97, 77.59).await.unwrap();
        assert!(!check.is_critical);
        assert_eq!(check.count, 2);
        assert_eq!(check.updated, 0);
        assert!(
            store
                .get_all_reports()
                .await
                .unwrap()
                .iter()
                .all(|r| r.status == ReportStatus::Pending)
        );
    }

    #[tokio::test]
    async fn critical_area_marks_nearby_reports_only() {
        let store = seeded(&[
            (12.9700, 77.5900),
            (12.9720, 77.5910),
            (12.9690, 77.5880),
            (13.0500, 77.5900),
        ])
        .await;
        let service =
            EscalationService::with_logging_channel(Arc::clone(&store), EscalationSettings::default());

        let check = service.check_critical_area(12.97, 77.59).await.unwrap();
        assert!(check.is_critical);
        assert_eq!(check.count, 3);
        assert_eq!(check.tier, Severity::Medium);
        assert_eq!(check.updated, 3);

        let statuses: Vec<ReportStatus> = store
            .get_all_reports()
            .await
            .unwrap()
            .iter()
            .map(|r| r.status)
            .collect();
        assert_eq!(
            statuses,
            vec![
                ReportStatus::Reported,
                ReportStatus::Reported,
                ReportStatus::Reported,
                ReportStatus::Pending,
            ]
        );

        let again = service.check_critical_area(12.97, 77.59).await.unwrap();
        assert!(again.is_critical);
        assert_eq!(again.updated, 0);
    }

    #[tokio::test]
    async fn escalation_skips_resolved_and_never_downgrades() {
        let store = seeded(&[(12.97, 77.59), (12.97, 77.59), (12.97, 77.59)]).await;
        let ids: Vec<String> = store
            .get_all_reports()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();

        store
            .update_report(&ids[0], ReportChanges::status(ReportStatus::Resolved))
            .await
            .unwrap();
        store
            .update_report(
                &ids[1],
                ReportChanges {
                    status: None,
                    severity: Some(Severity::High),
                },
            )
            .await
            .unwrap();

        let service =
            EscalationService::with_logging_channel(Arc::clone(&store), EscalationSettings::default());
        service.check_critical_area(12.97, 77.59).await.unwrap();

        let reports = store.get_all_reports().await.unwrap();
        assert_eq!(reports[0].status, ReportStatus::Resolved);
        assert_eq!(reports[0].severity, Severity::Low);
        assert_eq!(reports[1].status, ReportStatus::Reported);
        assert_eq!(reports[1].severity, Severity::High);
        assert_eq!(reports[2].status, ReportStatus::Reported);
        assert_eq!(reports[2].severity, Severity::Medium);
    }

    #[tokio::test]
    async fn authority_batch_is_idempotent() {
        let store = seeded(&[(12.97, 77.59), (12.97, 77.59), (12.97, 77.59)]).await;
        let service =
            EscalationService::with_logging_channel(Arc::clone(&store), EscalationSettings::default());

        let batch = store.get_all_reports().await.unwrap();
        assert!(should_report_to_authority(&batch));

        let first = service
            .report_to_authority(&batch, "Bengaluru, Karnataka")
            .await
            .unwrap();
        assert!(first.success);
        assert_eq!(first.reported_count, 3);
        assert_eq!(
            first.message,
            "Successfully reported 3 incidents from Bengaluru, Karnataka to cybercrime authorities"
        );

        let second = service
            .report_to_authority(&batch, "Bengaluru, Karnataka")
            .await
            .unwrap();
        assert!(second.success);

        let after = store.get_all_reports().await.unwrap();
        assert_eq!(after.len(), 3);
        assert!(after.iter().all(|r| r.status == ReportStatus::Reported));
        assert!(!should_report_to_authority(&after));
    }

    /// Channel that either declines every batch or fails to deliver it.
    enum RefusingChannel {
        Declines,
        Fails,
    }

    #[async_trait]
    impl AuthorityChannel for RefusingChannel {
        async fn notify(
            &self,
            reports: &[Report],
            _location_label: &str,
        ) -> Result<AuthorityReport, EscalationError> {
            match self {
                Self::Declines => Ok(AuthorityReport {
                    success: false,
                    reported_count: 0,
                    message: format!("Declined {} incidents", reports.len()),
                }),
                Self::Fails => Err(EscalationError::Channel("connection refused".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn declined_batch_leaves_statuses_alone() {
        let store = seeded(&[(12.97, 77.59), (12.9701, 77.5901), (12.9702, 77.5902)]).await;
        let service = EscalationService::new(
            Arc::clone(&store),
            RefusingChannel::Declines,
            EscalationSettings::default(),
        );

        let batch = store.get_all_reports().await.unwrap();
        let outcome = service.report_to_authority(&batch, "Bengaluru").await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Declined 3 incidents");

        let after = store.get_all_reports().await.unwrap();
        assert!(after.iter().all(|r| r.status == ReportStatus::Pending));
    }

    #[tokio::test]
    async fn channel_error_passes_through_without_marking() {
        let store = seeded(&[(12.97, 77.59), (12.9701, 77.5901), (12.9702, 77.5902)]).await;
        let service = EscalationService::new(
            Arc::clone(&store),
            RefusingChannel::Fails,
            EscalationSettings::default(),
        );

        let batch = store.get_all_reports().await.unwrap();
        let err = service
            .report_to_authority(&batch, "Bengaluru")
            .await
            .unwrap_err();
        assert!(matches!(err, EscalationError::Channel(ref m) if m == "connection refused"));

        let after = store.get_all_reports().await.unwrap();
        assert!(after.iter().all(|r| r.status == ReportStatus::Pending));
    }

    struct ReadOnlyStore(MemoryReportStore);

    #[async_trait]
    impl ReportStore for ReadOnlyStore {
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
            Err(StoreError::Database("read-only".to_string()))
        }
    }

    #[tokio::test]
    async fn failed_write_surfaces_store_error() {
        let inner = MemoryReportStore::new();
        for _ in 0..3 {
            inner.add_report(draft_at(12.97, 77.59)).await.unwrap();
        }
        let service = EscalationService::with_logging_channel(
            ReadOnlyStore(inner),
            EscalationSettings::default(),
        );

        let err = service.check_critical_area(12.97, 77.59).await.unwrap_err();
        assert!(matches!(err, EscalationError::Store(StoreError::Database(_))));

        let batch = service.store().get_all_reports().await.unwrap();
        let err = service
            .report_to_authority(&batch, "Bengaluru")
            .await
            .unwrap_err();
        assert!(matches!(err, EscalationError::Store(_)));
    }
}
