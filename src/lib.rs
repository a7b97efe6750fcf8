//! Region surface meshes for globe maps
//!
//! Turns latitude/longitude region outlines (countries, provinces, with
//! enclaves and lakes as holes) into sphere-conforming meshes: a
//! Steiner-refined fill surface with texture coordinates, plus extruded
//! border walls. Output is engine-agnostic vertex data usable from any
//! renderer (Bevy, Godot, wgpu, ...).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use globe_region_mesh::*;
//!
//! let config = SurfaceConfigBuilder::new()
//!     .preset(TriangulationPreset::Production)
//!     .altitude(20.0).unwrap()
//!     .border_depth(20.0).unwrap()
//!     .build().unwrap();
//!
//! let generator = RegionSurfaceGenerator::new(config).unwrap();
//!
//! let region = Polygon2D::from_lat_lon(&[(47.0, 5.0), (47.0, 15.0), (55.0, 15.0), (55.0, 5.0)])
//!     .with_hole(vec![
//!         GeoPoint::new(50.0, 9.0),
//!         GeoPoint::new(50.0, 10.0),
//!         GeoPoint::new(51.0, 10.0),
//!         GeoPoint::new(51.0, 9.0),
//!     ]);
//!
//! let surface = generator.generate(&region).unwrap();
//! println!(
//!     "{} fill triangles, {} border walls",
//!     surface.fill.triangle_count(),
//!     surface.borders.len()
//! );
//! ```
//!
//! # Features
//!
//! - `spatial-index` (default): position-to-region lookups using a KD-tree
//! - `parallel` (default): batch generation on the rayon thread pool
//! - `serde`: serialization for configuration, input records and mesh buffers

// Modules
pub mod error;
pub mod config;
pub mod geo;
pub mod projection;
pub mod preprocess;
pub mod triangulation;
pub mod mesh;
pub mod scratch;
pub mod surface;
pub mod border_cache;
pub mod region_state;

#[cfg(feature = "spatial-index")]
pub mod spatial;

// Re-export core types for convenience
pub use error::{RegionMeshError, Result};
pub use config::{
    BorderParams, SurfaceConfig, SurfaceConfigBuilder, TriangulationParams, TriangulationPreset,
    UvMode, UvParams, UvPivot,
};
pub use geo::{GeoPoint, Polygon2D};
#[cfg(feature = "serde")]
pub use geo::RegionRecord;
pub use projection::{to_geo, to_sphere, SpherePoint, EARTH_RADIUS};
pub use preprocess::{clean, prepare_polygon, PreparedPolygon};
pub use triangulation::{
    triangulate_polygon, EarcutBackend, TriangulatedPolygon, TriangulationBackend,
    TriangulationOutcome,
};
pub use mesh::{assemble, extrude, BorderMesh, MeshBuffers};
pub use scratch::{ScratchBuffers, ScratchPool};
pub use surface::{BatchOutput, PipelineStage, RegionFailure, RegionSurface, RegionSurfaceGenerator};
pub use border_cache::{BorderCache, CachedRegion};
pub use region_state::RegionStates;

#[cfg(feature = "spatial-index")]
pub use spatial::RegionLocator;

// Re-export glam vector types for convenience
pub use glam::{DVec3, Vec3};
