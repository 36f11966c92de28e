//! R-tree backed radius queries.
//!
//! Candidates are pulled from a lat/lng envelope that fully contains the
//! search circle, then filtered by exact haversine distance, so results
//! match a linear scan over all points.

use rstar::{AABB, RTree, RTreeObject};

use crate::{EARTH_RADIUS_KM, distance_km, is_valid_coordinate};

/// Slack added to search envelopes to absorb floating point error.
const ENVELOPE_EPSILON_DEG: f64 = 1e-9;

/// A point stored in the R-tree, tagged with the caller's item index.
struct PointEntry {
    item: usize,
    lat: f64,
    lng: f64,
}

impl RTreeObject for PointEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lng, self.lat])
    }
}

/// Spatial index over a fixed set of points.
///
/// Items are identified by their position in the iterator passed to
/// [`ProximityIndex::build`]. Points with invalid coordinates are skipped
/// and never returned.
pub struct ProximityIndex {
    tree: RTree<PointEntry>,
    skipped: usize,
}

impl ProximityIndex {
    /// Builds an index from `(lat, lng)` pairs.
    #[must_use]
    pub fn build(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut entries = Vec::new();
        let mut skipped = 0;

        for (item, (lat, lng)) in points.into_iter().enumerate() {
            if is_valid_coordinate(lat, lng) {
                entries.push(PointEntry { item, lat, lng });
            } else {
                skipped += 1;
            }
        }

        if skipped > 0 {
            log::debug!("Skipped {skipped} point(s) with invalid coordinates");
        }

        Self {
            tree: RTree::bulk_load(entries),
            skipped,
        }
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Number of input points rejected for invalid coordinates.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// Returns the item indices of every point within `radius_km` of
    /// `(lat, lng)` (inclusive), in ascending item order.
    ///
    /// An invalid centre or a negative/NaN radius matches nothing.
    #[must_use]
    pub fn within(&self, lat: f64, lng: f64, radius_km: f64) -> Vec<usize> {
        if !is_valid_coordinate(lat, lng) || radius_km.is_nan() || radius_km < 0.0 {
            return Vec::new();
        }

        let envelope = search_envelope(lat, lng, radius_km);

        let mut items: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|entry| distance_km(lat, lng, entry.lat, entry.lng) <= radius_km)
            .map(|entry| entry.item)
            .collect();

        items.sort_unstable();
        items
    }
}

/// Computes a `[lng, lat]` box that contains every point within
/// `radius_km` of the centre.
///
/// Circles that reach a pole or wrap the antimeridian use the full
/// longitude range.
fn search_envelope(lat: f64, lng: f64, radius_km: f64) -> AABB<[f64; 2]> {
    let angular = radius_km / EARTH_RADIUS_KM;
    let lat_delta = angular.to_degrees() + ENVELOPE_EPSILON_DEG;

    let south = (lat - lat_delta).max(-90.0);
    let north = (lat + lat_delta).min(90.0);

    let full = AABB::from_corners([-180.0, south], [180.0, north]);

    if south <= -90.0 || north >= 90.0 || angular >= std::f64::consts::FRAC_PI_2 {
        return full;
    }

    let ratio = angular.sin() / lat.to_radians().cos();
    if ratio >= 1.0 {
        return full;
    }

    let lng_delta = ratio.asin().to_degrees() + ENVELOPE_EPSILON_DEG;
    let west = lng - lng_delta;
    let east = lng + lng_delta;

    if west < -180.0 || east > 180.0 {
        return full;
    }

    AABB::from_corners([west, south], [east, north])
}
