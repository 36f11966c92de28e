//! Rounded coordinate buckets.
//!
//! Reports whose coordinates round to the same 4-decimal position
//! (roughly 11 m) share a cell. This is a coarse proxy for "same place":
//! two reports a few meters apart across a rounding boundary land in
//! different cells.

use serde::{Deserialize, Serialize};

/// Number of decimal places kept when bucketing coordinates.
pub const CELL_PRECISION: i32 = 4;

const SCALE: f64 = 10_000.0;

/// A coordinate bucket, stored as scaled integers so it hashes and orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellKey {
    lat_e4: i64,
    lng_e4: i64,
}

impl CellKey {
    /// Buckets a coordinate pair.
    ///
    /// Returns `None` for coordinates that are not finite or out of range,
    /// since they have no meaningful cell.
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        if !crate::is_valid_coordinate(lat, lng) {
            return None;
        }

        #[allow(clippy::cast_possible_truncation)]
        Some(Self {
            lat_e4: (lat * SCALE).round() as i64,
            lng_e4: (lng * SCALE).round() as i64,
        })
    }

    /// Latitude of the cell centre.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn lat(self) -> f64 {
        self.lat_e4 as f64 / SCALE
    }

    /// Longitude of the cell centre.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn lng(self) -> f64 {
        self.lng_e4 as f64 / SCALE
    }
}

impl std::fmt::Display for CellKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4},{:.4}", self.lat(), self.lng())
    }
}
