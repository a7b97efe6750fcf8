//! Spatial indexing for position-to-region lookups
//!
//! This module is only available with the `spatial-index` feature.

use glam::Vec3;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

use crate::surface::RegionSurface;

/// KD-tree over the fill vertices of generated regions
///
/// Answers "which region is under this globe position", for picking and
/// hover highlighting. A query returns the region owning the nearest fill
/// vertex, which is exact for points well inside a region and may pick a
/// neighbor within one triangle of a shared border.
///
/// # Performance
///
/// - Construction: O(n log n) in the total number of fill vertices
/// - Query: O(log n)
#[derive(Clone)]
pub struct RegionLocator {
    tree: Option<ImmutableKdTree<f32, usize, 3, 32>>,
    owners: Vec<usize>,
}

impl RegionLocator {
    /// Build from `(region index, surface)` pairs as produced by a batch run
    ///
    /// # Example
    ///
    /// ```
    /// use globe_region_mesh::*;
    ///
    /// let config = SurfaceConfigBuilder::new().step(1.0, 1.0).unwrap().build().unwrap();
    /// let generator = RegionSurfaceGenerator::new(config).unwrap();
    /// let west = Polygon2D::from_lat_lon(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
    /// let east = Polygon2D::from_lat_lon(&[(0.0, 5.0), (0.0, 6.0), (1.0, 6.0), (1.0, 5.0)]);
    /// let batch = generator.generate_batch(&[west, east]);
    ///
    /// let locator = RegionLocator::new(&batch.surfaces);
    /// let query = projection::to_sphere(0.5, 5.6, 0.0).as_vec3();
    /// assert_eq!(locator.find_nearest(query), Some(1));
    /// ```
    pub fn new<'a, I>(surfaces: I) -> Self
    where
        I: IntoIterator<Item = &'a (usize, RegionSurface)>,
    {
        let mut points: Vec<[f32; 3]> = Vec::new();
        let mut owners = Vec::new();
        for (index, surface) in surfaces {
            points.extend_from_slice(&surface.fill.positions);
            owners.extend(std::iter::repeat(*index).take(surface.fill.positions.len()));
        }

        let tree = if points.is_empty() {
            None
        } else {
            Some(ImmutableKdTree::new_from_slice(&points))
        };
        Self { tree, owners }
    }

    /// Number of indexed vertices
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether no vertex is indexed
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Region owning the fill vertex nearest to `position`
    pub fn find_nearest(&self, position: Vec3) -> Option<usize> {
        let tree = self.tree.as_ref()?;
        let query = [position.x, position.y, position.z];
        let result = tree.nearest_one::<SquaredEuclidean>(&query);
        self.owners.get(result.item as usize).copied()
    }

    /// Like [`find_nearest`](Self::find_nearest), ignoring vertices farther than `max_distance`
    pub fn find_within(&self, position: Vec3, max_distance: f32) -> Option<usize> {
        let tree = self.tree.as_ref()?;
        let query = [position.x, position.y, position.z];
        let result = tree.nearest_one::<SquaredEuclidean>(&query);
        if result.distance > max_distance * max_distance {
            return None;
        }
        self.owners.get(result.item as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SurfaceConfigBuilder;
    use crate::geo::Polygon2D;
    use crate::projection::to_sphere;
    use crate::surface::RegionSurfaceGenerator;

    fn surfaces() -> Vec<(usize, RegionSurface)> {
        let config = SurfaceConfigBuilder::new()
            .step(1.0, 1.0)
            .unwrap()
            .altitude(0.0)
            .unwrap()
            .border_depth(10.0)
            .unwrap()
            .build()
            .unwrap();
        let generator = RegionSurfaceGenerator::new(config).unwrap();
        let regions = [
            Polygon2D::from_lat_lon(&[(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0)]),
            Polygon2D::from_lat_lon(&[(20.0, 20.0), (20.0, 24.0), (24.0, 24.0), (24.0, 20.0)]),
            Polygon2D::from_lat_lon(&[(-30.0, -40.0), (-30.0, -36.0), (-26.0, -36.0), (-26.0, -40.0)]),
        ];
        generator.generate_batch(&regions).surfaces
    }

    #[test]
    fn test_locates_regions() {
        let surfaces = surfaces();
        let locator = RegionLocator::new(&surfaces);
        assert!(!locator.is_empty());

        assert_eq!(locator.find_nearest(to_sphere(2.0, 2.0, 0.0).as_vec3()), Some(0));
        assert_eq!(locator.find_nearest(to_sphere(22.0, 22.5, 0.0).as_vec3()), Some(1));
        assert_eq!(locator.find_nearest(to_sphere(-28.0, -38.0, 0.0).as_vec3()), Some(2));
    }

    #[test]
    fn test_exact_vertex() {
        let surfaces = surfaces();
        let locator = RegionLocator::new(&surfaces);
        let vertex = surfaces[1].1.fill.positions[0];
        assert_eq!(locator.find_nearest(Vec3::from(vertex)), Some(1));
    }

    #[test]
    fn test_find_within() {
        let surfaces = surfaces();
        let locator = RegionLocator::new(&surfaces);
        assert_eq!(
            locator.find_within(to_sphere(2.0, 2.0, 0.0).as_vec3(), 500.0),
            Some(0)
        );
        // Far from every region
        assert_eq!(
            locator.find_within(to_sphere(60.0, 120.0, 0.0).as_vec3(), 50.0),
            None
        );
    }

    #[test]
    fn test_empty_locator() {
        let none: Vec<(usize, RegionSurface)> = Vec::new();
        let locator = RegionLocator::new(&none);
        assert!(locator.is_empty());
        assert_eq!(locator.find_nearest(Vec3::X), None);
    }
}
