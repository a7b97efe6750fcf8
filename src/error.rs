//! Error types for region mesh generation

use thiserror::Error;

/// Errors that can occur while turning a region polygon into sphere geometry
///
/// A batch treats every variant except `QualityNotConverged` as a per-region
/// failure: the region is skipped and processing continues with the next one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegionMeshError {
    /// Ring has fewer than 3 points after cleaning, zero area, or crosses the antimeridian
    #[error("invalid polygon: {0}")]
    InvalidPolygon(String),

    /// The triangulation backend produced no triangles for a non-degenerate input
    #[error("triangulation failed: {0}")]
    TriangulationFailed(String),

    /// Every triangle collapsed during vertex deduplication
    #[error("mesh is empty after removing degenerate triangles")]
    EmptyMesh,

    /// Refinement budget ran out before the area residual met the tolerance
    ///
    /// Never returned as an `Err` by the surface generator; it is attached to
    /// the produced surface as a warning instead.
    #[error("triangulation did not converge: area residual {residual} exceeds tolerance {tolerance}")]
    QualityNotConverged {
        /// `|polygon area - triangulated area|` of the returned attempt
        residual: f64,
        /// Tolerance the attempt was measured against
        tolerance: f64,
    },

    /// Border cache blob failed validation
    #[error("malformed border cache: {0}")]
    MalformedBorderCache(String),

    /// Configuration validation failed
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RegionMeshError {
    /// Create an invalid polygon error
    pub fn invalid_polygon(msg: impl Into<String>) -> Self {
        RegionMeshError::InvalidPolygon(msg.into())
    }

    /// Create a triangulation failure
    pub fn triangulation(msg: impl Into<String>) -> Self {
        RegionMeshError::TriangulationFailed(msg.into())
    }

    /// Create a border cache error
    pub fn malformed_cache(msg: impl Into<String>) -> Self {
        RegionMeshError::MalformedBorderCache(msg.into())
    }

    /// Create a configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        RegionMeshError::InvalidConfig(msg.into())
    }

    /// Whether the region that produced this error still yields a usable mesh
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RegionMeshError::QualityNotConverged { .. })
    }
}

/// Result type alias for region mesh operations
pub type Result<T> = std::result::Result<T, RegionMeshError>;
