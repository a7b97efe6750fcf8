//! Geographic input types
//!
//! Regions arrive as an outer ring of latitude/longitude points plus zero or
//! more holes (enclaves, lakes). Rings are open: the first point closes the
//! ring implicitly.

use glam::DVec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use crate::error::Result;

/// A latitude/longitude pair in degrees
///
/// Latitude is expected in `[-90, 90]`. Longitude is taken as given and never
/// wrapped into `[-180, 180]`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoPoint {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
}

impl GeoPoint {
    /// Create a point from latitude and longitude in degrees
    #[inline]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Position in the 2D chart plane used for triangulation (`x = lon`, `y = lat`)
    #[inline]
    pub fn chart(self) -> DVec2 {
        DVec2::new(self.lon, self.lat)
    }

    /// Inverse of [`GeoPoint::chart`]
    #[inline]
    pub fn from_chart(p: DVec2) -> Self {
        Self::new(p.y, p.x)
    }

    /// Whether both coordinates are within `epsilon` degrees of `other`
    #[inline]
    pub fn approx_eq(self, other: GeoPoint, epsilon: f64) -> bool {
        (self.lat - other.lat).abs() <= epsilon && (self.lon - other.lon).abs() <= epsilon
    }
}

impl From<[f64; 2]> for GeoPoint {
    /// `[lat, lon]`, the dataset pair order
    fn from(pair: [f64; 2]) -> Self {
        GeoPoint::new(pair[0], pair[1])
    }
}

/// A region outline with optional holes
///
/// Holes are assumed to lie inside `outer`; containment is not verified.
/// Only a hole's own outer ring is used, holes nested inside holes are ignored.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon2D {
    /// Outer ring, open (no repeated closing point required)
    pub outer: Vec<GeoPoint>,
    /// Enclaves and lakes cut out of the fill
    pub holes: Vec<Polygon2D>,
}

impl Polygon2D {
    /// Create a polygon without holes
    pub fn new(outer: Vec<GeoPoint>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Add a hole ring
    pub fn with_hole(mut self, ring: Vec<GeoPoint>) -> Self {
        self.holes.push(Polygon2D::new(ring));
        self
    }

    /// Build from `(lat, lon)` tuples
    pub fn from_lat_lon(points: &[(f64, f64)]) -> Self {
        Self::new(points.iter().map(|&(lat, lon)| GeoPoint::new(lat, lon)).collect())
    }

    /// Number of hole rings
    #[inline]
    pub fn hole_count(&self) -> usize {
        self.holes.len()
    }
}

/// One region as stored in a region dataset
///
/// Rings are lists of `[lat, lon]` pairs:
///
/// ```json
/// { "outer": [[0, 0], [0, 1], [1, 1], [1, 0]], "holes": [] }
/// ```
#[cfg(feature = "serde")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    /// Outer ring as `[lat, lon]` pairs
    pub outer: Vec<[f64; 2]>,
    /// Hole rings as `[lat, lon]` pairs
    #[serde(default)]
    pub holes: Vec<Vec<[f64; 2]>>,
}

#[cfg(feature = "serde")]
impl RegionRecord {
    /// Convert to a [`Polygon2D`], rejecting rings that cross the antimeridian
    pub fn into_polygon(self) -> Result<Polygon2D> {
        let outer: Vec<GeoPoint> = self.outer.into_iter().map(GeoPoint::from).collect();
        crate::preprocess::check_antimeridian(&outer)?;

        let mut polygon = Polygon2D::new(outer);
        for hole in self.holes {
            let ring: Vec<GeoPoint> = hole.into_iter().map(GeoPoint::from).collect();
            crate::preprocess::check_antimeridian(&ring)?;
            polygon = polygon.with_hole(ring);
        }
        Ok(polygon)
    }
}
