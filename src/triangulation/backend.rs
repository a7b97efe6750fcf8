//! Pluggable triangulation capability
//!
//! The refinement loop only needs "points and constraint rings in, triangle
//! indices out". Any constrained triangulator can sit behind this trait.

use glam::DVec2;

use crate::error::{RegionMeshError, Result};

/// A 2D triangulator for polygons with holes and extra interior sites
pub trait TriangulationBackend {
    /// Triangulate `outer` minus `holes`, using `extra` as additional interior vertices
    ///
    /// Returned indices address the concatenation `outer ++ holes[0] ++ ... ++ extra`.
    /// Triangles wind counter-clockwise in the chart plane.
    fn triangulate(
        &self,
        outer: &[DVec2],
        holes: &[Vec<DVec2>],
        extra: &[DVec2],
    ) -> Result<Vec<[u32; 3]>>;
}

/// Ear-clipping backend built on `earcutr`
///
/// Steiner points are handed to earcut as single-vertex holes, which it
/// bridges into the outline like any other hole.
#[derive(Debug, Clone, Copy, Default)]
pub struct EarcutBackend;

impl TriangulationBackend for EarcutBackend {
    fn triangulate(
        &self,
        outer: &[DVec2],
        holes: &[Vec<DVec2>],
        extra: &[DVec2],
    ) -> Result<Vec<[u32; 3]>> {
        if outer.len() < 3 {
            return Err(RegionMeshError::triangulation(
                "need at least 3 points in outer ring",
            ));
        }

        let total = outer.len() + holes.iter().map(Vec::len).sum::<usize>() + extra.len();
        let mut vertices = Vec::with_capacity(total * 2);
        let mut hole_indices = Vec::with_capacity(holes.len() + extra.len());

        for p in outer {
            vertices.push(p.x);
            vertices.push(p.y);
        }
        for hole in holes {
            hole_indices.push(vertices.len() / 2);
            for p in hole {
                vertices.push(p.x);
                vertices.push(p.y);
            }
        }
        for p in extra {
            hole_indices.push(vertices.len() / 2);
            vertices.push(p.x);
            vertices.push(p.y);
        }

        let indices = earcutr::earcut(&vertices, &hole_indices, 2)
            .map_err(|e| RegionMeshError::triangulation(format!("{:?}", e)))?;

        let mut triangles = Vec::with_capacity(indices.len() / 3);
        for tri in indices.chunks_exact(3) {
            if tri.iter().any(|&i| i >= total) {
                return Err(RegionMeshError::triangulation(format!(
                    "backend emitted index outside {} vertices",
                    total
                )));
            }
            triangles.push([tri[0] as u32, tri[1] as u32, tri[2] as u32]);
        }

        Ok(triangles)
    }
}
