//! Surface generation configuration and builder
//!
//! This module provides the parameter sets for triangulation, texture
//! mapping and border walls, plus a validating builder.

use glam::DVec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{RegionMeshError, Result};
use crate::preprocess::EPSILON;
use crate::projection::EARTH_RADIUS;

/// Upper bound on refinement retries
pub const MAX_TTL: u32 = 16;

/// Default height of region surfaces above the globe, in world units
pub const DEFAULT_ALTITUDE: f64 = 20.0;

/// Default grid budget per refinement attempt
pub const DEFAULT_MAX_STEINER_POINTS: usize = 250_000;

/// Vertex merge distance for a surface at `altitude`, in world units
///
/// The arc length of [`EPSILON`] degrees on a sphere of radius
/// `EARTH_RADIUS + altitude`, so welding matches the cleaning tolerance.
pub fn dedup_epsilon_at(altitude: f64) -> f64 {
    (EARTH_RADIUS + altitude) * EPSILON.to_radians()
}

/// Triangulation quality presets
///
/// `Production` is meant for final renders, `Preview` for fast iteration.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TriangulationPreset {
    /// 0.5 degree grid, tolerance 0.5, 4 refinements
    #[default]
    Production,
    /// 2 degree grid, tolerance 0.5, 2 refinements
    Preview,
    /// Explicit grid spacing, tolerance and refinement budget
    Custom {
        /// Grid spacing in degrees (both axes)
        step: f64,
        /// Allowed area residual in square degrees
        tolerance: f64,
        /// Number of refinements
        ttl: u32,
    },
}

impl TriangulationPreset {
    /// Grid spacing in degrees
    pub fn step(self) -> f64 {
        match self {
            TriangulationPreset::Production => 0.5,
            TriangulationPreset::Preview => 2.0,
            TriangulationPreset::Custom { step, .. } => step,
        }
    }

    /// Allowed area residual
    pub fn tolerance(self) -> f64 {
        match self {
            TriangulationPreset::Production | TriangulationPreset::Preview => 0.5,
            TriangulationPreset::Custom { tolerance, .. } => tolerance,
        }
    }

    /// Refinement budget
    pub fn ttl(self) -> u32 {
        match self {
            TriangulationPreset::Production => 4,
            TriangulationPreset::Preview => 2,
            TriangulationPreset::Custom { ttl, .. } => ttl,
        }
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            TriangulationPreset::Production => "Production",
            TriangulationPreset::Preview => "Preview",
            TriangulationPreset::Custom { .. } => "Custom",
        }
    }
}

/// Parameters of the adaptive triangulator
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangulationParams {
    /// Longitude spacing of the Steiner grid, in degrees
    pub step_x: f64,
    /// Latitude spacing of the Steiner grid, in degrees
    pub step_y: f64,
    /// Allowed `|polygon area - triangulated area|`, in square degrees
    pub tolerance: f64,
    /// Number of times the grid may be halved
    pub ttl: u32,
    /// Height of the surface above the globe, in world units
    pub altitude: f64,
    /// Largest grid (in nodes) a single attempt may sample
    pub max_steiner_points: usize,
}

impl TriangulationParams {
    /// Parameters for a preset at the default altitude
    pub fn from_preset(preset: TriangulationPreset) -> Self {
        Self {
            step_x: preset.step(),
            step_y: preset.step(),
            tolerance: preset.tolerance(),
            ttl: preset.ttl(),
            altitude: DEFAULT_ALTITUDE,
            max_steiner_points: DEFAULT_MAX_STEINER_POINTS,
        }
    }

    /// Check ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.step_x.is_finite() && self.step_x > 0.0 && self.step_y.is_finite() && self.step_y > 0.0) {
            return Err(RegionMeshError::invalid_config(format!(
                "grid steps must be positive (got {}, {})",
                self.step_x, self.step_y
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(RegionMeshError::invalid_config(format!(
                "tolerance must be >= 0 (got {})",
                self.tolerance
            )));
        }
        if self.ttl > MAX_TTL {
            return Err(RegionMeshError::invalid_config(format!(
                "ttl must be <= {} (got {})",
                MAX_TTL, self.ttl
            )));
        }
        if !(self.altitude.is_finite() && self.altitude > -EARTH_RADIUS) {
            return Err(RegionMeshError::invalid_config(format!(
                "altitude must keep the surface outside the globe center (got {})",
                self.altitude
            )));
        }
        if self.max_steiner_points == 0 {
            return Err(RegionMeshError::invalid_config(
                "max_steiner_points must be positive",
            ));
        }
        Ok(())
    }
}

impl Default for TriangulationParams {
    fn default() -> Self {
        Self::from_preset(TriangulationPreset::default())
    }
}

/// How texture coordinates are derived
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UvMode {
    /// Absolute lat/lon mapping, so one texture lines up across neighboring regions
    #[default]
    Global,
    /// Normalized to the region's own bounds, for a dedicated per-region texture
    Local,
}

/// Center of the texture rotation
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UvPivot {
    /// Rotate about `(0, 0)`
    Origin,
    /// Rotate about `(0.5, 0.5)`
    #[default]
    Center,
}

impl UvPivot {
    /// Pivot point in UV space
    pub fn point(self) -> DVec2 {
        match self {
            UvPivot::Origin => DVec2::ZERO,
            UvPivot::Center => DVec2::splat(0.5),
        }
    }
}

/// Texture coordinate transform
///
/// Applied in order: divide by `scale`, rotate by `rotation` about the pivot,
/// add `offset`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvParams {
    pub mode: UvMode,
    pub scale: f64,
    /// Radians
    pub rotation: f64,
    pub offset: DVec2,
    pub pivot: UvPivot,
}

impl Default for UvParams {
    fn default() -> Self {
        Self {
            mode: UvMode::Global,
            scale: 1.0,
            rotation: 0.0,
            offset: DVec2::ZERO,
            pivot: UvPivot::Center,
        }
    }
}

/// Border wall ("soil") parameters
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderParams {
    /// Wall height below the surface, in world units
    pub depth: f64,
    /// Explicit bottom/top scale; derived from `depth` when `None`
    pub extrude_ratio: Option<f64>,
}

impl BorderParams {
    /// Scale applied to outline points to get the wall bottom
    ///
    /// `(EARTH_RADIUS + altitude - depth) / (EARTH_RADIUS + altitude)` unless
    /// an explicit ratio is set.
    pub fn ratio_for(&self, altitude: f64) -> f64 {
        self.extrude_ratio.unwrap_or_else(|| {
            let top = EARTH_RADIUS + altitude;
            (top - self.depth) / top
        })
    }
}

impl Default for BorderParams {
    fn default() -> Self {
        Self {
            depth: DEFAULT_ALTITUDE,
            extrude_ratio: None,
        }
    }
}

/// Complete configuration for the region surface generator
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceConfig {
    pub triangulation: TriangulationParams,
    pub uv: UvParams,
    pub border: BorderParams,
    /// Explicit vertex merge distance in world units; derived from the
    /// altitude with [`dedup_epsilon_at`] when `None`
    pub dedup_epsilon: Option<f64>,
}

impl SurfaceConfig {
    /// Extrude ratio for this configuration's altitude
    #[inline]
    pub fn extrude_ratio(&self) -> f64 {
        self.border.ratio_for(self.triangulation.altitude)
    }

    /// Vertex merge distance for this configuration's altitude
    #[inline]
    pub fn weld_distance(&self) -> f64 {
        self.dedup_epsilon
            .unwrap_or_else(|| dedup_epsilon_at(self.triangulation.altitude))
    }

    /// Check every parameter set and the constraints between them
    pub fn validate(&self) -> Result<()> {
        self.triangulation.validate()?;

        if !(self.uv.scale.is_finite() && self.uv.scale != 0.0) {
            return Err(RegionMeshError::invalid_config(format!(
                "texture scale must be finite and non-zero (got {})",
                self.uv.scale
            )));
        }
        let weld = self.weld_distance();
        if !(weld.is_finite() && weld > 0.0) {
            return Err(RegionMeshError::invalid_config(format!(
                "dedup epsilon must be positive (got {})",
                weld
            )));
        }

        let ratio = self.extrude_ratio();
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(RegionMeshError::invalid_config(format!(
                "extrude ratio must be in (0, 1) (got {}; depth {} at altitude {})",
                ratio, self.border.depth, self.triangulation.altitude
            )));
        }
        Ok(())
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            triangulation: TriangulationParams::default(),
            uv: UvParams::default(),
            border: BorderParams::default(),
            dedup_epsilon: None,
        }
    }
}

/// Builder for creating SurfaceConfig with validation
///
/// # Example
///
/// ```rust
/// use globe_region_mesh::*;
///
/// let config = SurfaceConfigBuilder::new()
///     .preset(TriangulationPreset::Preview)
///     .altitude(10.0)
///     .unwrap()
///     .uv_mode(UvMode::Local)
///     .border_depth(5.0)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(config.triangulation.ttl, 2);
/// assert!(config.extrude_ratio() < 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct SurfaceConfigBuilder {
    config: SurfaceConfig,
}

impl SurfaceConfigBuilder {
    /// Create a builder with production defaults
    ///
    /// Defaults:
    /// - grid: 0.5 degrees, tolerance 0.5, ttl 4
    /// - altitude: 20 world units, border depth 20 (walls reach the globe)
    /// - UV: global mode, unit scale, no rotation or offset
    pub fn new() -> Self {
        Self {
            config: SurfaceConfig::default(),
        }
    }

    /// Apply a triangulation preset (keeps altitude and grid budget)
    pub fn preset(mut self, preset: TriangulationPreset) -> Self {
        let t = &mut self.config.triangulation;
        t.step_x = preset.step();
        t.step_y = preset.step();
        t.tolerance = preset.tolerance();
        t.ttl = preset.ttl();
        self
    }

    /// Set the Steiner grid spacing in degrees
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` unless both steps are positive and finite
    pub fn step(mut self, step_x: f64, step_y: f64) -> Result<Self> {
        if !(step_x.is_finite() && step_x > 0.0 && step_y.is_finite() && step_y > 0.0) {
            return Err(RegionMeshError::invalid_config(format!(
                "grid steps must be positive (got {}, {})",
                step_x, step_y
            )));
        }
        self.config.triangulation.step_x = step_x;
        self.config.triangulation.step_y = step_y;
        Ok(self)
    }

    /// Set the area tolerance
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if negative
    pub fn tolerance(mut self, tolerance: f64) -> Result<Self> {
        if !(tolerance.is_finite() && tolerance >= 0.0) {
            return Err(RegionMeshError::invalid_config(format!(
                "tolerance must be >= 0 (got {})",
                tolerance
            )));
        }
        self.config.triangulation.tolerance = tolerance;
        Ok(self)
    }

    /// Set the refinement budget
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `ttl > MAX_TTL`
    pub fn ttl(mut self, ttl: u32) -> Result<Self> {
        if ttl > MAX_TTL {
            return Err(RegionMeshError::invalid_config(format!(
                "ttl must be <= {} (got {})",
                MAX_TTL, ttl
            )));
        }
        self.config.triangulation.ttl = ttl;
        Ok(self)
    }

    /// Set the surface altitude
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the surface would pass through the globe center
    pub fn altitude(mut self, altitude: f64) -> Result<Self> {
        if !(altitude.is_finite() && altitude > -EARTH_RADIUS) {
            return Err(RegionMeshError::invalid_config(format!(
                "altitude must be > {} (got {})",
                -EARTH_RADIUS, altitude
            )));
        }
        self.config.triangulation.altitude = altitude;
        Ok(self)
    }

    /// Cap the number of grid nodes a refinement attempt may sample
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if zero
    pub fn max_steiner_points(mut self, max: usize) -> Result<Self> {
        if max == 0 {
            return Err(RegionMeshError::invalid_config(
                "max_steiner_points must be positive",
            ));
        }
        self.config.triangulation.max_steiner_points = max;
        Ok(self)
    }

    /// Choose global or per-region texture coordinates
    pub fn uv_mode(mut self, mode: UvMode) -> Self {
        self.config.uv.mode = mode;
        self
    }

    /// Set the texture scale divisor
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if zero or not finite
    pub fn texture_scale(mut self, scale: f64) -> Result<Self> {
        if !(scale.is_finite() && scale != 0.0) {
            return Err(RegionMeshError::invalid_config(format!(
                "texture scale must be finite and non-zero (got {})",
                scale
            )));
        }
        self.config.uv.scale = scale;
        Ok(self)
    }

    /// Set the texture rotation in radians
    pub fn texture_rotation(mut self, radians: f64) -> Self {
        self.config.uv.rotation = radians;
        self
    }

    /// Set the texture offset
    pub fn texture_offset(mut self, u: f64, v: f64) -> Self {
        self.config.uv.offset = DVec2::new(u, v);
        self
    }

    /// Set the rotation pivot
    pub fn uv_pivot(mut self, pivot: UvPivot) -> Self {
        self.config.uv.pivot = pivot;
        self
    }

    /// Set the border wall depth
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` unless positive
    pub fn border_depth(mut self, depth: f64) -> Result<Self> {
        if !(depth.is_finite() && depth > 0.0) {
            return Err(RegionMeshError::invalid_config(format!(
                "border depth must be positive (got {})",
                depth
            )));
        }
        self.config.border.depth = depth;
        Ok(self)
    }

    /// Override the extrude ratio instead of deriving it from the depth
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` unless `0 < ratio < 1`
    pub fn extrude_ratio(mut self, ratio: f64) -> Result<Self> {
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(RegionMeshError::invalid_config(format!(
                "extrude ratio must be in (0, 1) (got {})",
                ratio
            )));
        }
        self.config.border.extrude_ratio = Some(ratio);
        Ok(self)
    }

    /// Override the vertex merge distance instead of deriving it from the altitude
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` unless positive
    pub fn dedup_epsilon(mut self, epsilon: f64) -> Result<Self> {
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(RegionMeshError::invalid_config(format!(
                "dedup epsilon must be positive (got {})",
                epsilon
            )));
        }
        self.config.dedup_epsilon = Some(epsilon);
        Ok(self)
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the border depth reaches the globe center
    pub fn build(self) -> Result<SurfaceConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for SurfaceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
