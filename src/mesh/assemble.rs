//! Fill surface assembly
//!
//! Projects a triangulated polygon onto the globe, welds coincident vertices
//! and fixes the winding so faces point away from the globe center.

#[cfg(test)]
use glam::DVec3;
use log::debug;

use super::dedup::VertexDeduplicator;
use super::uv;
use super::MeshBuffers;
use crate::config::{dedup_epsilon_at, UvParams};
use crate::error::{RegionMeshError, Result};
use crate::projection;
use crate::triangulation::TriangulatedPolygon;

/// Assemble a fill surface with a fresh deduplicator
///
/// Vertices closer than the cleaning tolerance at `altitude` are welded.
/// See [`assemble_with`].
pub fn assemble(
    triangulated: &TriangulatedPolygon,
    altitude: f64,
    uv_params: &UvParams,
) -> Result<MeshBuffers> {
    let mut dedup = VertexDeduplicator::new(dedup_epsilon_at(altitude));
    assemble_with(triangulated, altitude, uv_params, &mut dedup)
}

/// Assemble a fill surface reusing the given deduplicator
///
/// Every triangle's winding is reversed once: the chart plane is mirrored
/// when seen from outside the globe. Triangles that collapse during welding
/// are dropped.
///
/// # Errors
///
/// `EmptyMesh` when no triangle survives welding.
pub fn assemble_with(
    triangulated: &TriangulatedPolygon,
    altitude: f64,
    uv_params: &UvParams,
    dedup: &mut VertexDeduplicator,
) -> Result<MeshBuffers> {
    dedup.clear();
    let mut sources = Vec::with_capacity(triangulated.points.len());
    for point in &triangulated.points {
        let index = dedup.insert(projection::project(*point, altitude));
        if index as usize == sources.len() {
            sources.push(*point);
        }
    }
    let remap = dedup.remap();
    let unique = dedup.unique();

    let mut mesh = MeshBuffers::with_capacity(unique.len(), triangulated.triangles.len());
    let mut dropped = 0usize;
    for &[a, b, c] in &triangulated.triangles {
        let (a, b, c) = (remap[a as usize], remap[b as usize], remap[c as usize]);
        if a == b || b == c || a == c {
            dropped += 1;
            continue;
        }
        mesh.push_triangle([a, c, b]);
    }

    if mesh.indices.is_empty() {
        return Err(RegionMeshError::EmptyMesh);
    }
    if dropped > 0 {
        debug!("dropped {} degenerate triangles after welding", dropped);
    }

    mesh.positions
        .extend(unique.iter().map(|p| [p.x as f32, p.y as f32, p.z as f32]));
    mesh.normals.extend(unique.iter().map(|p| {
        let n = p.normalize_or_zero();
        [n.x as f32, n.y as f32, n.z as f32]
    }));
    uv::compute_uvs(unique, &sources, uv_params, &mut mesh.uvs);

    Ok(mesh)
}

/// Face normal of a triangle in double precision
#[cfg(test)]
pub(crate) fn face_normal(mesh: &MeshBuffers, triangle: [u32; 3]) -> DVec3 {
    let p = |i: u32| DVec3::from(mesh.positions[i as usize].map(f64::from));
    let (a, b, c) = (p(triangle[0]), p(triangle[1]), p(triangle[2]));
    (b - a).cross(c - a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TriangulationParams;
    use crate::geo::{GeoPoint, Polygon2D};
    use crate::projection::EARTH_RADIUS;
    use crate::triangulation::triangulate_polygon;
    use approx::assert_abs_diff_eq;

    fn triangulated(polygon: &Polygon2D) -> TriangulatedPolygon {
        let params = TriangulationParams {
            step_x: 1.0,
            step_y: 1.0,
            tolerance: 0.01,
            ttl: 2,
            ..TriangulationParams::default()
        };
        triangulate_polygon(polygon, &params).unwrap().into_polygon()
    }

    fn square(lat: f64, lon: f64, size: f64) -> Polygon2D {
        Polygon2D::from_lat_lon(&[
            (lat, lon),
            (lat, lon + size),
            (lat + size, lon + size),
            (lat + size, lon),
        ])
    }

    fn assert_outward(mesh: &MeshBuffers) {
        for t in mesh.triangles() {
            let normal = face_normal(mesh, t);
            let centroid = DVec3::from(mesh.positions[t[0] as usize].map(f64::from));
            assert!(normal.dot(centroid) > 0.0, "triangle {:?} faces inward", t);
        }
    }

    #[test]
    fn test_assemble_square() {
        let tri = triangulated(&square(0.0, 0.0, 1.0));
        let mesh = assemble(&tri, 10.0, &UvParams::default()).unwrap();

        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.positions.len(), mesh.normals.len());
        assert_eq!(mesh.positions.len(), mesh.uvs.len());
        assert!(mesh.indices_in_bounds());

        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            let p = DVec3::from(p.map(f64::from));
            let n = DVec3::from(n.map(f64::from));
            assert_abs_diff_eq!(p.length(), EARTH_RADIUS + 10.0, epsilon = 1e-2);
            assert_abs_diff_eq!(n.length(), 1.0, epsilon = 1e-6);
            assert!(n.dot(p.normalize()) > 0.9999);
        }
    }

    #[test]
    fn test_winding_is_outward_everywhere() {
        for (lat, lon) in [(40.0, 10.0), (-60.0, -120.0), (-2.0, 100.0), (80.0, 170.0)] {
            let mesh = assemble(&triangulated(&square(lat, lon, 4.0)), 0.0, &UvParams::default())
                .unwrap();
            assert_outward(&mesh);
        }
    }

    #[test]
    fn test_concave_equator_straddling_outward() {
        // U shape across the equator
        let polygon = Polygon2D::from_lat_lon(&[
            (-3.0, 0.0),
            (-3.0, 6.0),
            (3.0, 6.0),
            (3.0, 4.0),
            (-1.0, 4.0),
            (-1.0, 2.0),
            (3.0, 2.0),
            (3.0, 0.0),
        ]);
        let mesh = assemble(&triangulated(&polygon), 5.0, &UvParams::default()).unwrap();
        assert_outward(&mesh);
    }

    #[test]
    fn test_duplicate_points_are_welded() {
        let mut tri = triangulated(&square(0.0, 0.0, 1.0));
        // Duplicate vertex 0 and route one triangle through the copy
        tri.points.push(tri.points[0]);
        let copy = (tri.points.len() - 1) as u32;
        for index in tri.triangles[0].iter_mut() {
            if *index == 0 {
                *index = copy;
            }
        }
        let mesh = assemble(&tri, 0.0, &UvParams::default()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_near_duplicates_within_tolerance_are_welded() {
        let tri = TriangulatedPolygon {
            points: vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 1.0),
                GeoPoint::new(1.0, 1.0),
                GeoPoint::new(1.0, 0.0),
                // 0.0007 degrees from the first corner
                GeoPoint::new(0.0, 0.0007),
            ],
            triangles: vec![[0, 1, 2], [4, 2, 3]],
            ..TriangulatedPolygon::default()
        };
        let mesh = assemble(&tri, 20.0, &UvParams::default()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.indices_in_bounds());
    }

    #[test]
    fn test_local_uvs_past_antimeridian() {
        let tri = triangulated(&square(0.0, 176.0, 8.0));
        let uv = UvParams {
            mode: crate::config::UvMode::Local,
            ..UvParams::default()
        };
        let mesh = assemble(&tri, 0.0, &uv).unwrap();
        let east = crate::projection::to_sphere(0.0, 184.0, 0.0);
        let (index, _) = mesh
            .positions
            .iter()
            .enumerate()
            .map(|(i, p)| (i, DVec3::from(p.map(f64::from)).distance(east)))
            .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best });
        // Default center pivot with no rotation keeps local corners in place
        assert_abs_diff_eq!(mesh.uvs[index][0], 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(mesh.uvs[index][1], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_all_degenerate_is_empty_mesh() {
        let tri = TriangulatedPolygon {
            points: vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(1.0, 1.0),
            ],
            triangles: vec![[0, 1, 2]],
            ..TriangulatedPolygon::default()
        };
        assert!(matches!(
            assemble(&tri, 0.0, &UvParams::default()),
            Err(RegionMeshError::EmptyMesh)
        ));
    }

    #[test]
    fn test_assemble_is_idempotent() {
        let polygon = square(10.0, 10.0, 3.0).with_hole(vec![
            GeoPoint::new(11.0, 11.0),
            GeoPoint::new(11.0, 12.0),
            GeoPoint::new(12.0, 12.0),
            GeoPoint::new(12.0, 11.0),
        ]);
        let tri = triangulated(&polygon);
        let mut dedup = VertexDeduplicator::default();
        let first = assemble_with(&tri, 2.0, &UvParams::default(), &mut dedup).unwrap();
        let second = assemble_with(&tri, 2.0, &UvParams::default(), &mut dedup).unwrap();
        assert_eq!(first, second);
    }
}
