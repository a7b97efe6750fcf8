//! Polygon preprocessing
//!
//! Normalizes raw region rings before triangulation: drops near-duplicate
//! consecutive points, opens closed rings, rejects degenerate outlines and
//! orients every ring the same way so border walls face predictably.

use log::warn;

use crate::error::{RegionMeshError, Result};
use crate::geo::{GeoPoint, Polygon2D};
use crate::triangulation::area::signed_area;

/// Tolerance in degrees under which two consecutive points are the same point
///
/// Large enough to absorb noise in simplified country outlines, small enough
/// to keep genuinely short coastline segments.
pub const EPSILON: f64 = 0.002;

/// A polygon ready for triangulation
///
/// Every ring is open, has at least 3 points, and winds counter-clockwise in
/// the chart plane (`x = lon`, `y = lat`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreparedPolygon {
    /// Outer ring
    pub outer: Vec<GeoPoint>,
    /// Hole rings that survived cleaning
    pub holes: Vec<Vec<GeoPoint>>,
}

impl PreparedPolygon {
    /// Total number of ring vertices (outer plus holes)
    pub fn vertex_count(&self) -> usize {
        self.outer.len() + self.holes.iter().map(Vec::len).sum::<usize>()
    }
}

/// Remove consecutive duplicates and the closing point of a ring
///
/// # Errors
///
/// Returns `InvalidPolygon` when fewer than 3 points remain.
///
/// # Example
///
/// ```
/// use globe_region_mesh::geo::GeoPoint;
/// use globe_region_mesh::preprocess::clean;
///
/// let ring = vec![
///     GeoPoint::new(0.0, 0.0),
///     GeoPoint::new(0.0, 0.0),
///     GeoPoint::new(1.0, 1.0),
/// ];
/// assert!(clean(&ring).is_err());
/// ```
pub fn clean(ring: &[GeoPoint]) -> Result<Vec<GeoPoint>> {
    let mut cleaned: Vec<GeoPoint> = Vec::with_capacity(ring.len());
    for &point in ring {
        match cleaned.last() {
            Some(&last) if last.approx_eq(point, EPSILON) => {}
            _ => cleaned.push(point),
        }
    }

    // Rings are represented open
    while cleaned.len() > 1 {
        let first = cleaned[0];
        let last = cleaned[cleaned.len() - 1];
        if first.approx_eq(last, EPSILON) {
            cleaned.pop();
        } else {
            break;
        }
    }

    if cleaned.len() < 3 {
        return Err(RegionMeshError::invalid_polygon(format!(
            "ring has {} distinct points after cleaning (need at least 3)",
            cleaned.len()
        )));
    }

    Ok(cleaned)
}

/// Reject rings with a longitude jump over 180 degrees between consecutive points
///
/// Such rings cross the antimeridian and have to be split before they reach
/// the triangulator.
pub fn check_antimeridian(ring: &[GeoPoint]) -> Result<()> {
    let n = ring.len();
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        if (b.lon - a.lon).abs() > 180.0 {
            return Err(RegionMeshError::invalid_polygon(format!(
                "ring crosses the antimeridian between points {} and {}",
                i,
                (i + 1) % n
            )));
        }
    }
    Ok(())
}

/// Reverse `ring` in place if it winds clockwise in the chart plane
pub fn orient_counter_clockwise(ring: &mut [GeoPoint]) {
    if signed_area(ring) < 0.0 {
        ring.reverse();
    }
}

/// Clean and orient a polygon and its holes
///
/// The outer ring must survive cleaning and enclose a non-zero area. Holes
/// that degenerate during cleaning are dropped with a warning; losing a lake
/// is preferable to losing the whole region.
pub fn prepare_polygon(polygon: &Polygon2D) -> Result<PreparedPolygon> {
    let mut outer = clean(&polygon.outer)?;
    if signed_area(&outer).abs() <= f64::EPSILON {
        return Err(RegionMeshError::invalid_polygon(
            "outer ring encloses no area",
        ));
    }
    orient_counter_clockwise(&mut outer);

    let mut holes = Vec::with_capacity(polygon.holes.len());
    for (i, hole) in polygon.holes.iter().enumerate() {
        match clean(&hole.outer) {
            Ok(mut ring) if signed_area(&ring).abs() > f64::EPSILON => {
                orient_counter_clockwise(&mut ring);
                holes.push(ring);
            }
            Ok(_) => warn!("skipping hole {}: ring encloses no area", i),
            Err(err) => warn!("skipping hole {}: {}", i, err),
        }
    }

    Ok(PreparedPolygon { outer, holes })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[(f64, f64)]) -> Vec<GeoPoint> {
        points.iter().map(|&(lat, lon)| GeoPoint::new(lat, lon)).collect()
    }

    #[test]
    fn test_clean_removes_consecutive_duplicates() {
        let cleaned = clean(&ring(&[
            (0.0, 0.0),
            (0.0005, 0.0),
            (0.0, 1.0),
            (1.0, 1.0),
            (1.0, 1.001),
            (1.0, 0.0),
        ]))
        .unwrap();
        assert_eq!(cleaned, ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]));
    }

    #[test]
    fn test_clean_drops_closing_point() {
        let cleaned = clean(&ring(&[
            (0.0, 0.0),
            (0.0, 1.0),
            (1.0, 1.0),
            (0.0, 0.0),
        ]))
        .unwrap();
        assert_eq!(cleaned.len(), 3);
    }

    #[test]
    fn test_clean_keeps_short_genuine_segments() {
        let cleaned = clean(&ring(&[(0.0, 0.0), (0.0, 0.01), (1.0, 0.01)])).unwrap();
        assert_eq!(cleaned.len(), 3);
    }

    #[test]
    fn test_degenerate_ring_is_invalid() {
        let result = clean(&ring(&[(0.0, 0.0), (0.0, 0.0), (1.0, 1.0)]));
        assert!(matches!(result, Err(RegionMeshError::InvalidPolygon(_))));
    }

    #[test]
    fn test_antimeridian_detection() {
        assert!(check_antimeridian(&ring(&[(0.0, 170.0), (0.0, 179.0), (5.0, 175.0)])).is_ok());
        assert!(check_antimeridian(&ring(&[(0.0, 170.0), (0.0, -170.0), (5.0, 175.0)])).is_err());
    }

    #[test]
    fn test_prepare_orients_rings() {
        // Clockwise in the chart plane (x = lon, y = lat)
        let polygon = Polygon2D::new(ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]))
            .with_hole(ring(&[(0.4, 0.4), (0.4, 0.6), (0.6, 0.6), (0.6, 0.4)]));

        let prepared = prepare_polygon(&polygon).unwrap();
        assert!(signed_area(&prepared.outer) > 0.0);
        assert!(signed_area(&prepared.holes[0]) > 0.0);
        assert_eq!(prepared.vertex_count(), 8);
    }

    #[test]
    fn test_prepare_skips_degenerate_hole() {
        let polygon = Polygon2D::new(ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]))
            .with_hole(ring(&[(0.5, 0.5), (0.5, 0.5005), (0.5, 0.5)]));

        let prepared = prepare_polygon(&polygon).unwrap();
        assert!(prepared.holes.is_empty());
    }

    #[test]
    fn test_prepare_rejects_collinear_outer() {
        let polygon = Polygon2D::new(ring(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]));
        assert!(matches!(
            prepare_polygon(&polygon),
            Err(RegionMeshError::InvalidPolygon(_))
        ));
    }
}
