//! Mesh buffers for region surfaces and border walls
//!
//! Turns triangulated polygons into engine-agnostic vertex data on the
//! globe, and extrudes ring outlines into border walls.

mod assemble;
mod border;
mod dedup;
pub mod uv;

pub use assemble::{assemble, assemble_with};
pub use border::{extrude, extrude_points};
pub use dedup::VertexDeduplicator;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Engine-agnostic mesh data output
///
/// Contains raw vertex data suitable for any rendering engine:
/// - Bevy: Convert to `Mesh` with attributes
/// - Godot: Convert to `ArrayMesh`
/// - wgpu: Use the flat views directly as vertex buffers
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshBuffers {
    /// Vertex positions in world units
    pub positions: Vec<[f32; 3]>,
    /// Unit vertex normals
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates
    pub uvs: Vec<[f32; 2]>,
    /// Triangle indices, three per triangle
    pub indices: Vec<u32>,
}

/// A border wall. Same layout as the fill surface.
pub type BorderMesh = MeshBuffers;

impl MeshBuffers {
    /// Preallocate for a known vertex and triangle count
    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            uvs: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(triangles * 3),
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Append a vertex and return its index
    pub fn push_vertex(&mut self, position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        self.uvs.push(uv);
        index
    }

    /// Append a triangle
    #[inline]
    pub fn push_triangle(&mut self, triangle: [u32; 3]) {
        self.indices.extend_from_slice(&triangle);
    }

    /// Iterate over index triples
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Positions as `x, y, z, x, y, z, ...`
    pub fn flat_positions(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Normals as `x, y, z, x, y, z, ...`
    pub fn flat_normals(&self) -> &[f32] {
        bytemuck::cast_slice(&self.normals)
    }

    /// UVs as `u, v, u, v, ...`
    pub fn flat_uvs(&self) -> &[f32] {
        bytemuck::cast_slice(&self.uvs)
    }

    /// Index buffer as raw little-endian-in-memory bytes, for upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Whether every index refers to an existing vertex
    pub fn indices_in_bounds(&self) -> bool {
        let count = self.positions.len();
        self.indices.iter().all(|&i| (i as usize) < count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshBuffers {
        let mut mesh = MeshBuffers::with_capacity(4, 2);
        let a = mesh.push_vertex([0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0]);
        let b = mesh.push_vertex([1.0, 0.0, 1.0], [0.0, 0.0, 1.0], [1.0, 0.0]);
        let c = mesh.push_vertex([1.0, 1.0, 1.0], [0.0, 0.0, 1.0], [1.0, 1.0]);
        let d = mesh.push_vertex([0.0, 1.0, 1.0], [0.0, 0.0, 1.0], [0.0, 1.0]);
        mesh.push_triangle([a, b, c]);
        mesh.push_triangle([a, c, d]);
        mesh
    }

    #[test]
    fn test_counts() {
        let mesh = quad();
        assert!(!mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.indices_in_bounds());
        assert!(MeshBuffers::default().is_empty());
    }

    #[test]
    fn test_flat_views() {
        let mesh = quad();
        assert_eq!(mesh.flat_positions().len(), 12);
        assert_eq!(&mesh.flat_positions()[3..6], &[1.0, 0.0, 1.0]);
        assert_eq!(mesh.flat_normals().len(), 12);
        assert_eq!(mesh.flat_uvs().len(), 8);
        assert_eq!(mesh.index_bytes().len(), 6 * 4);
    }

    #[test]
    fn test_triangles_iterator() {
        let mesh = quad();
        let triangles: Vec<[u32; 3]> = mesh.triangles().collect();
        assert_eq!(triangles, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_out_of_bounds_detected() {
        let mut mesh = quad();
        mesh.push_triangle([0, 1, 9]);
        assert!(!mesh.indices_in_bounds());
    }
}
