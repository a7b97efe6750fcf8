//! Adaptive Steiner-refined triangulation
//!
//! Triangulates a prepared polygon with interior grid samples and compares
//! the triangulated area with the polygon's shoelace area. While the two
//! disagree by more than the tolerance, the grid spacing is halved and the
//! polygon is triangulated again, up to `ttl` refinements.

pub mod area;
mod backend;
pub mod steiner;

pub use backend::{EarcutBackend, TriangulationBackend};

use glam::DVec2;
use log::{debug, trace, warn};

use crate::config::TriangulationParams;
use crate::error::{RegionMeshError, Result};
use crate::geo::{GeoPoint, Polygon2D};
use crate::preprocess::{self, PreparedPolygon};
use steiner::ChartBounds;

/// Output of one triangulation attempt
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriangulatedPolygon {
    /// Ring vertices (outer, then holes) followed by the accepted Steiner points
    pub points: Vec<GeoPoint>,
    /// Index triples into `points`, counter-clockwise in the chart plane
    pub triangles: Vec<[u32; 3]>,
    /// Shoelace area of the outer ring minus its holes
    pub polygon_area: f64,
    /// Sum of the triangle areas
    pub triangulated_area: f64,
    /// Number of Steiner points appended after the ring vertices
    pub steiner_count: usize,
    /// Grid spacing `(step_x, step_y)` used for this attempt
    pub step: (f64, f64),
}

impl TriangulatedPolygon {
    /// `|polygon_area - triangulated_area|`
    #[inline]
    pub fn residual(&self) -> f64 {
        (self.polygon_area - self.triangulated_area).abs()
    }

    /// Number of triangles
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

/// Result of the refinement loop
#[derive(Debug, Clone, PartialEq)]
pub enum TriangulationOutcome {
    /// Area residual is within tolerance
    Converged {
        polygon: TriangulatedPolygon,
        attempts: u32,
    },
    /// Refinement budget ran out; this is the finest attempt
    BestEffort {
        polygon: TriangulatedPolygon,
        attempts: u32,
    },
}

impl TriangulationOutcome {
    /// The triangulation, converged or not
    pub fn polygon(&self) -> &TriangulatedPolygon {
        match self {
            TriangulationOutcome::Converged { polygon, .. }
            | TriangulationOutcome::BestEffort { polygon, .. } => polygon,
        }
    }

    /// Take the triangulation out of the outcome
    pub fn into_polygon(self) -> TriangulatedPolygon {
        match self {
            TriangulationOutcome::Converged { polygon, .. }
            | TriangulationOutcome::BestEffort { polygon, .. } => polygon,
        }
    }

    /// Whether the tolerance was met
    pub fn is_converged(&self) -> bool {
        matches!(self, TriangulationOutcome::Converged { .. })
    }

    /// Number of backend invocations
    pub fn attempts(&self) -> u32 {
        match self {
            TriangulationOutcome::Converged { attempts, .. }
            | TriangulationOutcome::BestEffort { attempts, .. } => *attempts,
        }
    }

    /// The non-fatal warning a best-effort result carries
    pub fn warning(&self, tolerance: f64) -> Option<RegionMeshError> {
        match self {
            TriangulationOutcome::Converged { .. } => None,
            TriangulationOutcome::BestEffort { polygon, .. } => {
                Some(RegionMeshError::QualityNotConverged {
                    residual: polygon.residual(),
                    tolerance,
                })
            }
        }
    }
}

/// Reusable buffers for the refinement loop
///
/// Cleared between regions, never shrunk.
#[derive(Debug, Default)]
pub struct TriangulationScratch {
    outer: Vec<DVec2>,
    holes: Vec<Vec<DVec2>>,
    hole_count: usize,
    steiner: Vec<DVec2>,
}

impl TriangulationScratch {
    /// Empty every buffer, keeping capacity
    pub fn clear(&mut self) {
        self.outer.clear();
        for hole in &mut self.holes {
            hole.clear();
        }
        self.hole_count = 0;
        self.steiner.clear();
    }

    fn load(&mut self, polygon: &PreparedPolygon) {
        self.clear();
        self.outer.extend(polygon.outer.iter().map(|p| p.chart()));
        if self.holes.len() < polygon.holes.len() {
            self.holes.resize_with(polygon.holes.len(), Vec::new);
        }
        for (buffer, ring) in self.holes.iter_mut().zip(&polygon.holes) {
            buffer.extend(ring.iter().map(|p| p.chart()));
        }
        self.hole_count = polygon.holes.len();
    }

    fn holes(&self) -> &[Vec<DVec2>] {
        &self.holes[..self.hole_count]
    }
}

/// Triangulate a raw polygon with the default earcut backend
///
/// Cleans and orients the rings first. See [`triangulate`] for the loop itself.
///
/// # Example
///
/// ```
/// use globe_region_mesh::config::TriangulationParams;
/// use globe_region_mesh::geo::Polygon2D;
/// use globe_region_mesh::triangulation::triangulate_polygon;
///
/// let square = Polygon2D::from_lat_lon(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
/// let params = TriangulationParams {
///     step_x: 1.0,
///     step_y: 1.0,
///     tolerance: 0.1,
///     ttl: 2,
///     ..TriangulationParams::default()
/// };
/// let outcome = triangulate_polygon(&square, &params).unwrap();
/// assert!(outcome.is_converged());
/// assert_eq!(outcome.polygon().triangle_count(), 2);
/// ```
pub fn triangulate_polygon(
    polygon: &Polygon2D,
    params: &TriangulationParams,
) -> Result<TriangulationOutcome> {
    let prepared = preprocess::prepare_polygon(polygon)?;
    triangulate(&EarcutBackend, &prepared, params)
}

/// Run the refinement loop with fresh scratch buffers
pub fn triangulate<B>(
    backend: &B,
    polygon: &PreparedPolygon,
    params: &TriangulationParams,
) -> Result<TriangulationOutcome>
where
    B: TriangulationBackend + ?Sized,
{
    let mut scratch = TriangulationScratch::default();
    triangulate_with_scratch(backend, polygon, params, &mut scratch)
}

/// Run the refinement loop using caller-owned scratch buffers
///
/// # Algorithm
///
/// For each attempt, up to `ttl + 1` of them:
/// 1. Sample a grid at the current spacing over the outer ring's bounds
/// 2. Keep samples strictly inside the fill area
/// 3. Triangulate rings plus samples
/// 4. Stop if `|polygon area - triangulated area| <= tolerance`
/// 5. Otherwise halve both spacings and go again
///
/// When the budget runs out the last (finest) attempt is returned as
/// [`TriangulationOutcome::BestEffort`]. A grid larger than
/// `max_steiner_points` ends refinement early the same way; if even the
/// first grid is too large the polygon is triangulated from its rings alone.
///
/// # Errors
///
/// `InvalidConfig` when `params` do not validate. `TriangulationFailed` when
/// the first attempt yields no triangles. A later failing attempt falls back
/// to the previous one.
pub fn triangulate_with_scratch<B>(
    backend: &B,
    polygon: &PreparedPolygon,
    params: &TriangulationParams,
    scratch: &mut TriangulationScratch,
) -> Result<TriangulationOutcome>
where
    B: TriangulationBackend + ?Sized,
{
    params.validate()?;
    scratch.load(polygon);
    let bounds = ChartBounds::of(&scratch.outer)
        .ok_or_else(|| RegionMeshError::invalid_polygon("outer ring is empty"))?;
    let polygon_area = area::polygon_area(polygon);

    let mut step_x = params.step_x;
    let mut step_y = params.step_y;
    let mut best: Option<TriangulatedPolygon> = None;
    let mut attempts = 0u32;

    for depth in 0..=params.ttl {
        let mut use_grid = true;
        let nodes = bounds.grid_node_count(step_x, step_y);
        if nodes.is_nan() || nodes > params.max_steiner_points as f64 {
            if best.is_some() {
                debug!(
                    "stopping refinement at depth {}: grid at step ({}, {}) exceeds {} points",
                    depth, step_x, step_y, params.max_steiner_points
                );
                break;
            }
            warn!(
                "initial grid at step ({}, {}) exceeds {} points, triangulating rings only",
                step_x, step_y, params.max_steiner_points
            );
            use_grid = false;
        }

        attempts += 1;
        let attempt = match run_attempt(backend, scratch, polygon_area, step_x, step_y, use_grid) {
            Ok(attempt) => attempt,
            Err(err) => match best {
                Some(previous) => {
                    warn!("refinement attempt {} failed ({}), keeping previous attempt", depth, err);
                    return Ok(TriangulationOutcome::BestEffort {
                        polygon: previous,
                        attempts,
                    });
                }
                None => return Err(err),
            },
        };

        let residual = attempt.residual();
        trace!(
            "attempt {}: step ({}, {}), {} steiner points, {} triangles, residual {}",
            depth,
            step_x,
            step_y,
            attempt.steiner_count,
            attempt.triangles.len(),
            residual
        );

        if residual <= params.tolerance {
            return Ok(TriangulationOutcome::Converged {
                polygon: attempt,
                attempts,
            });
        }

        best = Some(attempt);
        if !use_grid {
            break;
        }
        step_x *= 0.5;
        step_y *= 0.5;
    }

    let polygon = best.ok_or_else(|| RegionMeshError::triangulation("no attempt was made"))?;
    Ok(TriangulationOutcome::BestEffort { polygon, attempts })
}

fn run_attempt<B>(
    backend: &B,
    scratch: &mut TriangulationScratch,
    polygon_area: f64,
    step_x: f64,
    step_y: f64,
    use_grid: bool,
) -> Result<TriangulatedPolygon>
where
    B: TriangulationBackend + ?Sized,
{
    scratch.steiner.clear();
    if use_grid {
        steiner::collect_steiner_points(
            &scratch.outer,
            &scratch.holes[..scratch.hole_count],
            step_x,
            step_y,
            preprocess::EPSILON,
            &mut scratch.steiner,
        );
    }

    let triangles = backend.triangulate(&scratch.outer, scratch.holes(), &scratch.steiner)?;
    if triangles.is_empty() {
        return Err(RegionMeshError::triangulation(format!(
            "backend returned no triangles for {} ring vertices",
            scratch.outer.len()
        )));
    }

    let points: Vec<GeoPoint> = scratch
        .outer
        .iter()
        .chain(scratch.holes().iter().flatten())
        .chain(scratch.steiner.iter())
        .map(|p| GeoPoint::from_chart(*p))
        .collect();

    if let Some(bad) = triangles.iter().flatten().find(|&&i| i as usize >= points.len()) {
        return Err(RegionMeshError::triangulation(format!(
            "index {} out of range for {} points",
            bad,
            points.len()
        )));
    }

    let triangulated_area = area::triangulated_area(&points, &triangles);
    Ok(TriangulatedPolygon {
        points,
        triangles,
        polygon_area,
        triangulated_area,
        steiner_count: scratch.steiner.len(),
        step: (step_x, step_y),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::cell::Cell;

    fn params(step: f64, tolerance: f64, ttl: u32) -> TriangulationParams {
        TriangulationParams {
            step_x: step,
            step_y: step,
            tolerance,
            ttl,
            ..TriangulationParams::default()
        }
    }

    fn unit_square() -> Polygon2D {
        Polygon2D::from_lat_lon(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)])
    }

    #[test]
    fn test_square_two_triangles() {
        let outcome = triangulate_polygon(&unit_square(), &params(1.0, 0.1, 2)).unwrap();
        assert!(outcome.is_converged());
        assert_eq!(outcome.attempts(), 1);
        let polygon = outcome.polygon();
        assert_eq!(polygon.triangle_count(), 2);
        assert_eq!(polygon.steiner_count, 0);
        assert_abs_diff_eq!(polygon.triangulated_area, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_square_with_hole() {
        let polygon = unit_square().with_hole(vec![
            GeoPoint::new(0.4, 0.4),
            GeoPoint::new(0.4, 0.6),
            GeoPoint::new(0.6, 0.6),
            GeoPoint::new(0.6, 0.4),
        ]);
        let outcome = triangulate_polygon(&polygon, &params(1.0, 0.1, 2)).unwrap();
        assert!(outcome.is_converged());
        assert_abs_diff_eq!(outcome.polygon().triangulated_area, 0.96, epsilon = 1e-9);
        assert_eq!(outcome.polygon().points.len(), 8);
    }

    #[test]
    fn test_convex_area_conservation() {
        // Hexagon-ish convex outline spanning several grid cells
        let polygon = Polygon2D::from_lat_lon(&[
            (0.0, 2.0),
            (0.0, 6.0),
            (3.0, 8.0),
            (6.0, 6.0),
            (6.0, 2.0),
            (3.0, 0.0),
        ]);
        let p = params(1.0, 0.01, 3);
        let outcome = triangulate_polygon(&polygon, &p).unwrap();
        assert!(outcome.is_converged());
        let tri = outcome.polygon();
        assert!(tri.steiner_count > 0);
        assert!(tri.residual() <= p.tolerance);
        for t in &tri.triangles {
            assert!(t.iter().all(|&i| (i as usize) < tri.points.len()));
        }
    }

    #[test]
    fn test_steiner_points_inside_polygon() {
        let polygon = Polygon2D::from_lat_lon(&[(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0)]);
        let outcome = triangulate_polygon(&polygon, &params(1.0, 0.01, 1)).unwrap();
        let tri = outcome.polygon();
        assert_eq!(tri.steiner_count, 9);
        for p in &tri.points[4..] {
            assert!(p.lat > 0.0 && p.lat < 4.0 && p.lon > 0.0 && p.lon < 4.0);
        }
    }

    /// Backend that drops the last triangle, so the area never matches
    struct LossyBackend {
        calls: Cell<u32>,
    }

    impl TriangulationBackend for LossyBackend {
        fn triangulate(
            &self,
            outer: &[DVec2],
            holes: &[Vec<DVec2>],
            extra: &[DVec2],
        ) -> Result<Vec<[u32; 3]>> {
            self.calls.set(self.calls.get() + 1);
            let mut triangles = EarcutBackend.triangulate(outer, holes, extra)?;
            triangles.pop();
            Ok(triangles)
        }
    }

    #[test]
    fn test_best_effort_after_ttl() {
        let prepared = preprocess::prepare_polygon(&unit_square()).unwrap();
        let backend = LossyBackend { calls: Cell::new(0) };
        let outcome = triangulate(&backend, &prepared, &params(1.0, 1e-6, 2)).unwrap();

        assert!(!outcome.is_converged());
        assert_eq!(outcome.attempts(), 3);
        assert_eq!(backend.calls.get(), 3);
        // Finest attempt is kept
        assert_abs_diff_eq!(outcome.polygon().step.0, 0.25, epsilon = 1e-12);
        assert!(matches!(
            outcome.warning(1e-6),
            Some(RegionMeshError::QualityNotConverged { .. })
        ));
    }

    #[test]
    fn test_ttl_zero_single_attempt() {
        let prepared = preprocess::prepare_polygon(&unit_square()).unwrap();
        let backend = LossyBackend { calls: Cell::new(0) };
        let outcome = triangulate(&backend, &prepared, &params(1.0, 1e-6, 0)).unwrap();
        assert_eq!(outcome.attempts(), 1);
        assert!(!outcome.is_converged());
    }

    struct EmptyBackend;

    impl TriangulationBackend for EmptyBackend {
        fn triangulate(&self, _: &[DVec2], _: &[Vec<DVec2>], _: &[DVec2]) -> Result<Vec<[u32; 3]>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_empty_backend_fails() {
        let prepared = preprocess::prepare_polygon(&unit_square()).unwrap();
        let result = triangulate(&EmptyBackend, &prepared, &params(1.0, 0.1, 2));
        assert!(matches!(result, Err(RegionMeshError::TriangulationFailed(_))));
    }

    #[test]
    fn test_grid_cap_stops_refinement() {
        let prepared = preprocess::prepare_polygon(&unit_square()).unwrap();
        let backend = LossyBackend { calls: Cell::new(0) };
        let mut p = params(1.0, 1e-6, 4);
        // 2x2 nodes at step 1, 3x3 at step 0.5
        p.max_steiner_points = 4;
        let outcome = triangulate(&backend, &prepared, &p).unwrap();
        assert_eq!(outcome.attempts(), 1);
        assert!(!outcome.is_converged());
    }

    #[test]
    fn test_tiny_step_triangulates_rings_only() {
        let prepared = preprocess::prepare_polygon(&unit_square()).unwrap();
        let outcome = triangulate(&EarcutBackend, &prepared, &params(1e-20, 0.1, 4)).unwrap();
        assert_eq!(outcome.attempts(), 1);
        let polygon = outcome.polygon();
        assert_eq!(polygon.steiner_count, 0);
        assert_eq!(polygon.triangle_count(), 2);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let prepared = preprocess::prepare_polygon(&unit_square()).unwrap();
        for step in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = triangulate(&EarcutBackend, &prepared, &params(step, 0.1, 2));
            assert!(matches!(result, Err(RegionMeshError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_scratch_reuse_is_deterministic() {
        let polygon = Polygon2D::from_lat_lon(&[(0.0, 0.0), (0.0, 3.0), (3.0, 3.0), (3.0, 0.0)])
            .with_hole(vec![
                GeoPoint::new(1.2, 1.2),
                GeoPoint::new(1.2, 1.8),
                GeoPoint::new(1.8, 1.8),
                GeoPoint::new(1.8, 1.2),
            ]);
        let prepared = preprocess::prepare_polygon(&polygon).unwrap();
        let mut scratch = TriangulationScratch::default();
        let p = params(1.0, 0.01, 2);

        let first = triangulate_with_scratch(&EarcutBackend, &prepared, &p, &mut scratch).unwrap();
        let second = triangulate_with_scratch(&EarcutBackend, &prepared, &p, &mut scratch).unwrap();
        assert_eq!(first, second);
    }
}
