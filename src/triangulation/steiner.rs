//! Steiner point sampling
//!
//! A uniform grid over the outer ring's bounding box, filtered down to the
//! points that lie strictly inside the fill area.

use glam::DVec2;

/// Largest grid a single sampling pass walks, in nodes
///
/// Output indices are `u32`, so no triangulation can use more points.
pub const MAX_GRID_NODES: f64 = u32::MAX as f64;

/// Axis-aligned bounds of a chart ring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartBounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl ChartBounds {
    /// Bounds of `ring`, `None` when empty
    pub fn of(ring: &[DVec2]) -> Option<Self> {
        let first = *ring.first()?;
        let (min, max) = ring
            .iter()
            .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p)));
        Some(Self { min, max })
    }

    /// Number of grid nodes at the given spacing
    ///
    /// Computed in floating point so tiny steps cannot overflow; a NaN or
    /// infinite result means the grid cannot be sampled at all.
    pub fn grid_node_count(&self, step_x: f64, step_y: f64) -> f64 {
        let extent = self.max - self.min;
        let nx = (extent.x / step_x).floor() + 1.0;
        let ny = (extent.y / step_y).floor() + 1.0;
        nx * ny
    }

    /// Nodes per axis, `None` unless the grid is finite and at most [`MAX_GRID_NODES`]
    pub fn grid_dims(&self, step_x: f64, step_y: f64) -> Option<(usize, usize)> {
        let extent = self.max - self.min;
        let nx = (extent.x / step_x).floor() + 1.0;
        let ny = (extent.y / step_y).floor() + 1.0;
        let count = nx * ny;
        let sized = nx >= 1.0 && ny >= 1.0 && count <= MAX_GRID_NODES;
        if !sized {
            return None;
        }
        Some((nx as usize, ny as usize))
    }
}

/// Ray-casting point-in-ring test
pub fn point_in_ring(p: DVec2, ring: &[DVec2]) -> bool {
    let n = ring.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let a = ring[i];
        let b = ring[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Distance from `p` to segment `ab`
pub fn distance_to_segment(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Whether `p` lies within `clearance` of any edge of `ring`
pub fn near_ring_edge(p: DVec2, ring: &[DVec2], clearance: f64) -> bool {
    let n = ring.len();
    (0..n).any(|i| distance_to_segment(p, ring[i], ring[(i + 1) % n]) < clearance)
}

/// Append grid points strictly inside `outer` and outside every hole to `out`
///
/// Candidates closer than `clearance` to any ring edge are rejected so that
/// Steiner points never sit on a constraint edge. Nothing is sampled when the
/// grid is larger than [`MAX_GRID_NODES`] or the steps are not positive.
pub fn collect_steiner_points(
    outer: &[DVec2],
    holes: &[Vec<DVec2>],
    step_x: f64,
    step_y: f64,
    clearance: f64,
    out: &mut Vec<DVec2>,
) {
    let Some(bounds) = ChartBounds::of(outer) else {
        return;
    };
    let Some((nx, ny)) = bounds.grid_dims(step_x, step_y) else {
        return;
    };

    for iy in 0..ny {
        let y = bounds.min.y + iy as f64 * step_y;
        for ix in 0..nx {
            let candidate = DVec2::new(bounds.min.x + ix as f64 * step_x, y);
            if !point_in_ring(candidate, outer) || near_ring_edge(candidate, outer, clearance) {
                continue;
            }
            let in_hole = holes.iter().any(|hole| {
                point_in_ring(candidate, hole) || near_ring_edge(candidate, hole, clearance)
            });
            if !in_hole {
                out.push(candidate);
            }
        }
    }
}
