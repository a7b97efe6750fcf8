//! Area measures used by the refinement loop
//!
//! All areas are in square degrees of the chart plane (`x = lon`, `y = lat`).

use glam::DVec2;

use crate::geo::GeoPoint;
use crate::preprocess::PreparedPolygon;

/// Signed shoelace area of a ring of chart points (positive when counter-clockwise)
pub fn chart_signed_area(ring: &[DVec2]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        twice_area += a.x * b.y - b.x * a.y;
    }
    twice_area * 0.5
}

/// Signed shoelace area of a geographic ring in the chart plane
pub fn signed_area(ring: &[GeoPoint]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..n {
        let a = ring[i].chart();
        let b = ring[(i + 1) % n].chart();
        twice_area += a.x * b.y - b.x * a.y;
    }
    twice_area * 0.5
}

/// Unsigned shoelace area of a ring
#[inline]
pub fn shoelace_area(ring: &[GeoPoint]) -> f64 {
    signed_area(ring).abs()
}

/// Outer ring area minus the area of every hole
pub fn polygon_area(polygon: &PreparedPolygon) -> f64 {
    let holes: f64 = polygon.holes.iter().map(|h| shoelace_area(h)).sum();
    shoelace_area(&polygon.outer) - holes
}

/// Triangle area from its side lengths (Heron's formula)
///
/// Rounding can push the radicand slightly negative for slivers; those
/// count as zero area.
pub fn heron_area(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    let ab = a.distance(b);
    let bc = b.distance(c);
    let ca = c.distance(a);
    let s = (ab + bc + ca) * 0.5;
    let radicand = s * (s - ab) * (s - bc) * (s - ca);
    radicand.max(0.0).sqrt()
}

/// Sum of triangle areas over a triangulation
pub fn triangulated_area(points: &[GeoPoint], triangles: &[[u32; 3]]) -> f64 {
    triangles
        .iter()
        .map(|t| {
            heron_area(
                points[t[0] as usize].chart(),
                points[t[1] as usize].chart(),
                points[t[2] as usize].chart(),
            )
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn unit_square() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(1.0, 0.0),
        ]
    }

    #[test]
    fn test_shoelace_square() {
        assert_abs_diff_eq!(shoelace_area(&unit_square()), 1.0, epsilon = 1e-12);
        // (lat, lon) order (0,0) (0,1) (1,1) (1,0) runs east, north, west: CCW in the chart
        assert!(signed_area(&unit_square()) > 0.0);
    }

    #[test]
    fn test_chart_area_matches_geo_area() {
        let chart: Vec<DVec2> = unit_square().iter().map(|p| p.chart()).collect();
        assert_abs_diff_eq!(chart_signed_area(&chart), signed_area(&unit_square()), epsilon = 1e-12);
    }

    #[test]
    fn test_polygon_area_subtracts_holes() {
        let polygon = PreparedPolygon {
            outer: unit_square(),
            holes: vec![vec![
                GeoPoint::new(0.4, 0.4),
                GeoPoint::new(0.4, 0.6),
                GeoPoint::new(0.6, 0.6),
                GeoPoint::new(0.6, 0.4),
            ]],
        };
        assert_abs_diff_eq!(polygon_area(&polygon), 0.96, epsilon = 1e-12);
    }

    #[test]
    fn test_heron_right_triangle() {
        let area = heron_area(DVec2::ZERO, DVec2::new(3.0, 0.0), DVec2::new(0.0, 4.0));
        assert_abs_diff_eq!(area, 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_heron_degenerate() {
        let area = heron_area(DVec2::ZERO, DVec2::new(1.0, 1.0), DVec2::new(2.0, 2.0));
        assert_abs_diff_eq!(area, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_triangulated_area() {
        let points = unit_square();
        let triangles = [[0, 1, 2], [0, 2, 3]];
        assert_abs_diff_eq!(triangulated_area(&points, &triangles), 1.0, epsilon = 1e-9);
    }
}
