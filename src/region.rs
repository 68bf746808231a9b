//! Geographic gate for forecast requests.
//!
//! Every call site that ends up fetching a forecast (map click, search
//! selection) asks [`is_in_region`] first.

use serde::{Deserialize, Serialize};

use crate::models::LatLng;

/// Axis-aligned bounding box given by two opposite corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// South-west corner `[lat, lon]`
    pub south_west: [f64; 2],
    /// North-east corner `[lat, lon]`
    pub north_east: [f64; 2],
}

impl Region {
    /// Bounding box of Austria.
    pub const AUSTRIA: Region = Region {
        south_west: [46.372_276, 9.530_952],
        north_east: [49.020_608, 17.160_776],
    };

    #[must_use]
    pub fn new(south_west: [f64; 2], north_east: [f64; 2]) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    #[must_use]
    pub fn min_lat(&self) -> f64 {
        self.south_west[0].min(self.north_east[0])
    }

    #[must_use]
    pub fn max_lat(&self) -> f64 {
        self.south_west[0].max(self.north_east[0])
    }

    #[must_use]
    pub fn min_lon(&self) -> f64 {
        self.south_west[1].min(self.north_east[1])
    }

    #[must_use]
    pub fn max_lon(&self) -> f64 {
        self.south_west[1].max(self.north_east[1])
    }

    /// Inclusive containment test, see [`is_in_region`].
    #[must_use]
    pub fn contains(&self, point: &LatLng) -> bool {
        is_in_region(point, self)
    }

    /// True when all four corner values are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.south_west
            .iter()
            .chain(self.north_east.iter())
            .all(|v| v.is_finite())
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::AUSTRIA
    }
}

/// Returns true iff `point` lies inside `region`, bounds included.
/// NaN coordinates are never inside.
#[must_use]
pub fn is_in_region(point: &LatLng, region: &Region) -> bool {
    if point.lat.is_nan() || point.lon.is_nan() {
        return false;
    }

    point.lat >= region.min_lat()
        && point.lat <= region.max_lat()
        && point.lon >= region.min_lon()
        && point.lon <= region.max_lon()
}
