//! Border wall extrusion
//!
//! Walls run from a region's outline down toward the globe center so the
//! region reads as a raised slab. Each outline edge becomes one quad.

use glam::DVec3;

use super::BorderMesh;
use crate::error::{RegionMeshError, Result};

/// Extrude a closed outline into a wall
///
/// For every edge `i -> i + 1` (including the wrap edge `N - 1 -> 0`) four
/// vertices are emitted, `bottom_i, top_i, bottom_next, top_next`, where
/// `bottom = top * ratio`, followed by the triangles
/// `(bottom_i, top_i, bottom_next)` and `(top_i, top_next, bottom_next)`.
///
/// `u` is the distance walked along the outline, `v` is 0 at the bottom and
/// 1 at the top. With `flip` set every triangle is reversed and normals are
/// negated, for walls around holes.
///
/// # Errors
///
/// `InvalidPolygon` for fewer than 2 points, `InvalidConfig` unless
/// `0 < ratio < 1`.
///
/// # Example
///
/// ```
/// use glam::DVec3;
/// use globe_region_mesh::mesh::extrude;
///
/// let outline = [
///     DVec3::new(10.0, 0.0, 0.0),
///     DVec3::new(0.0, 10.0, 0.0),
///     DVec3::new(0.0, 0.0, 10.0),
/// ];
/// let wall = extrude(&outline, 0.9, false).unwrap();
/// assert_eq!(wall.triangle_count(), 6);
/// assert_eq!(wall.vertex_count(), 12);
/// ```
pub fn extrude(outline: &[DVec3], ratio: f64, flip: bool) -> Result<BorderMesh> {
    if outline.len() < 2 {
        return Err(RegionMeshError::invalid_polygon(format!(
            "border outline has {} points (need at least 2)",
            outline.len()
        )));
    }
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(RegionMeshError::invalid_config(format!(
            "extrude ratio must be in (0, 1) (got {})",
            ratio
        )));
    }

    let n = outline.len();
    let mut mesh = BorderMesh::with_capacity(n * 4, n * 2);
    let mut walked = 0.0f64;

    for i in 0..n {
        let top = outline[i];
        let top_next = outline[(i + 1) % n];
        let bottom = top * ratio;
        let bottom_next = top_next * ratio;

        let mut normal = (top_next - top).cross(bottom - top).normalize_or_zero();
        if flip {
            normal = -normal;
        }
        let normal = to_f32(normal);

        let u = walked as f32;
        walked += top.distance(top_next);
        let u_next = walked as f32;

        let b0 = mesh.push_vertex(to_f32(bottom), normal, [u, 0.0]);
        let t0 = mesh.push_vertex(to_f32(top), normal, [u, 1.0]);
        let b1 = mesh.push_vertex(to_f32(bottom_next), normal, [u_next, 0.0]);
        let t1 = mesh.push_vertex(to_f32(top_next), normal, [u_next, 1.0]);

        if flip {
            mesh.push_triangle([b1, t0, b0]);
            mesh.push_triangle([b1, t1, t0]);
        } else {
            mesh.push_triangle([b0, t0, b1]);
            mesh.push_triangle([t0, t1, b1]);
        }
    }

    Ok(mesh)
}

/// [`extrude`] for single-precision outlines, as stored in a border cache
pub fn extrude_points(outline: &[[f32; 3]], ratio: f64, flip: bool) -> Result<BorderMesh> {
    let points: Vec<DVec3> = outline
        .iter()
        .map(|p| DVec3::new(p[0] as f64, p[1] as f64, p[2] as f64))
        .collect();
    extrude(&points, ratio, flip)
}

#[inline]
fn to_f32(p: DVec3) -> [f32; 3] {
    [p.x as f32, p.y as f32, p.z as f32]
}
