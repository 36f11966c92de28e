#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic aggregation of incident reports.
//!
//! Reports are bucketed into rounded coordinate cells (see
//! [`CellKey`]) to find areas with repeated incidents, and looked up by
//! great-circle radius around a point. Cluster severity is derived from
//! how many reports share a cell or radius.
//!
//! The free functions work over a slice of reports. [`GeoAggregator`]
//! fetches a fresh snapshot from a [`ReportStore`] for each call and runs
//! them over it.

use std::collections::BTreeMap;

use cyberguard_geo::{CellKey, ProximityIndex};
use cyberguard_report_models::{Report, Severity};
use cyberguard_store::{ReportStore, StoreError};
use serde::Serialize;

/// Radius used when a caller doesn't specify one.
pub const DEFAULT_RADIUS_KM: f64 = 1.0;

/// Fewest reports a cell needs to be surfaced as a critical area.
pub const CRITICAL_AREA_MIN_REPORTS: usize = 3;

/// Severity tier for a cluster of `count` reports.
///
/// `10+` critical, `7+` high, `3+` medium, otherwise low.
#[must_use]
pub const fn cluster_severity(count: usize) -> Severity {
    match count {
        10.. => Severity::Critical,
        7..=9 => Severity::High,
        3..=6 => Severity::Medium,
        _ => Severity::Low,
    }
}

/// Reports sharing one coordinate cell.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// The shared cell.
    pub cell: CellKey,
    /// Number of member reports.
    pub count: usize,
    /// Tier derived from `count`.
    pub severity: Severity,
    /// Member reports, in store order.
    pub reports: Vec<Report>,
}

impl Cluster {
    /// Builds a cluster from its members, deriving count and tier.
    #[must_use]
    pub fn new(cell: CellKey, reports: Vec<Report>) -> Self {
        let count = reports.len();
        Self {
            cell,
            count,
            severity: cluster_severity(count),
            reports,
        }
    }
}

/// Buckets reports by their rounded coordinates.
///
/// Reports with non-finite or out-of-range coordinates are logged and left
/// out. Members keep their input order.
#[must_use]
pub fn group_by_cell(reports: &[Report]) -> BTreeMap<CellKey, Vec<Report>> {
    let mut cells: BTreeMap<CellKey, Vec<Report>> = BTreeMap::new();

    for report in reports {
        let Some(cell) = CellKey::new(report.location.lat, report.location.lng) else {
            log::warn!(
                "Excluding report {} from aggregation: invalid coordinates ({}, {})",
                report.id,
                report.location.lat,
                report.location.lng
            );
            continue;
        };
        cells.entry(cell).or_default().push(report.clone());
    }

    cells
}

/// Every cell holding at least [`CRITICAL_AREA_MIN_REPORTS`] reports,
/// largest first (ties ordered by cell).
#[must_use]
pub fn critical_areas_of(reports: &[Report]) -> Vec<Cluster> {
    let mut areas: Vec<Cluster> = group_by_cell(reports)
        .into_iter()
        .filter(|(_, members)| members.len() >= CRITICAL_AREA_MIN_REPORTS)
        .map(|(cell, members)| Cluster::new(cell, members))
        .collect();

    areas.sort_by(|a, b| b.count.cmp(&a.count).then(a.cell.cmp(&b.cell)));
    areas
}

/// Reports whose distance from `(lat, lng)` is at most `radius_km`, in
/// input order.
///
/// Reports with invalid coordinates never match.
#[must_use]
pub fn reports_within(reports: &[Report], lat: f64, lng: f64, radius_km: f64) -> Vec<Report> {
    let index = ProximityIndex::build(reports.iter().map(|r| (r.location.lat, r.location.lng)));

    if index.skipped() > 0 {
        log::warn!(
            "Excluded {} report(s) with invalid coordinates from radius query",
            index.skipped()
        );
    }

    index
        .within(lat, lng, radius_km)
        .into_iter()
        .map(|i| reports[i].clone())
        .collect()
}

/// Runs aggregation queries against the current contents of a store.
pub struct GeoAggregator<S> {
    store: S,
}

impl<S: ReportStore> GeoAggregator<S> {
    /// Wraps a store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Cells with at least [`CRITICAL_AREA_MIN_REPORTS`] reports, tagged
    /// with their tier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the snapshot cannot be read.
    pub async fn critical_areas(&self) -> Result<Vec<Cluster>, StoreError> {
        let reports = self.store.get_all_reports().await?;
        let areas = critical_areas_of(&reports);
        log::debug!(
            "Found {} critical area(s) among {} report(s)",
            areas.len(),
            reports.len()
        );
        Ok(areas)
    }

    /// Reports within `radius_km` (default [`DEFAULT_RADIUS_KM`]) of a
    /// point.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the snapshot cannot be read.
    pub async fn reports_near(
        &self,
        lat: f64,
        lng: f64,
        radius_km: Option<f64>,
    ) -> Result<Vec<Report>, StoreError> {
        let reports = self.store.get_all_reports().await?;
        Ok(reports_within(
            &reports,
            lat,
            lng,
            radius_km.unwrap_or(DEFAULT_RADIUS_KM),
        ))
    }
}
