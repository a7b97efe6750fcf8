//! Region surface generation
//!
//! Runs one region through the full pipeline:
//! `Preprocess -> Triangulate -> Assemble -> ExtrudeOutline -> ExtrudeHole* -> Done`.
//! A failing stage ends that region's pipeline; batches record the failure
//! and move on to the next region.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};

use crate::config::SurfaceConfig;
use crate::error::{RegionMeshError, Result};
use crate::geo::Polygon2D;
use crate::mesh::{self, BorderMesh, MeshBuffers};
use crate::preprocess;
use crate::projection;
use crate::scratch::ScratchBuffers;
#[cfg(feature = "parallel")]
use crate::scratch::ScratchPool;
use crate::triangulation::{self, EarcutBackend, TriangulationBackend, TriangulationOutcome};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Pipeline stages of one region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Preprocess,
    Triangulate,
    Assemble,
    ExtrudeOutline,
    /// Wall around the hole with this index (among holes that survived cleaning)
    ExtrudeHole(usize),
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Preprocess => write!(f, "preprocess"),
            PipelineStage::Triangulate => write!(f, "triangulate"),
            PipelineStage::Assemble => write!(f, "assemble"),
            PipelineStage::ExtrudeOutline => write!(f, "extrude outline"),
            PipelineStage::ExtrudeHole(i) => write!(f, "extrude hole {}", i),
            PipelineStage::Done => write!(f, "done"),
        }
    }
}

/// Geometry generated for one region
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSurface {
    /// Fill surface at the configured altitude
    pub fill: MeshBuffers,
    /// Outer wall first, then one flipped wall per hole
    pub borders: Vec<BorderMesh>,
    /// Projected rings the walls were built from, same order as `borders`
    pub outlines: Vec<Vec<[f32; 3]>>,
    /// Refinement result behind `fill`
    pub outcome: TriangulationOutcome,
    /// `QualityNotConverged` when refinement ran out of budget
    pub warning: Option<RegionMeshError>,
}

impl RegionSurface {
    /// Wall along the outer ring
    pub fn outer_border(&self) -> Option<&BorderMesh> {
        self.borders.first()
    }

    /// Walls around holes
    pub fn hole_borders(&self) -> &[BorderMesh] {
        self.borders.get(1..).unwrap_or(&[])
    }

    /// Whether the triangulation met its tolerance
    pub fn is_converged(&self) -> bool {
        self.outcome.is_converged()
    }

    /// Triangles in the fill and all walls
    pub fn triangle_count(&self) -> usize {
        self.fill.triangle_count() + self.borders.iter().map(MeshBuffers::triangle_count).sum::<usize>()
    }
}

/// A region that could not be generated
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFailure {
    /// Position of the region in the batch input
    pub index: usize,
    /// Stage that failed
    pub stage: PipelineStage,
    pub error: RegionMeshError,
}

/// Result of a batch run
///
/// Surfaces and failures are both in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    /// `(input index, surface)` for every generated region
    pub surfaces: Vec<(usize, RegionSurface)>,
    pub failures: Vec<RegionFailure>,
    /// Set when the batch stopped early on request
    pub cancelled: bool,
}

impl BatchOutput {
    /// Number of generated regions
    pub fn success_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Number of skipped regions
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Number of generated regions that did not converge
    pub fn warning_count(&self) -> usize {
        self.surfaces.iter().filter(|(_, s)| s.warning.is_some()).count()
    }

    fn record(&mut self, index: usize, result: StageResult) {
        match result {
            Ok(surface) => self.surfaces.push((index, surface)),
            Err((stage, error)) => {
                warn!("region {} skipped at {}: {}", index, stage, error);
                self.failures.push(RegionFailure { index, stage, error });
            }
        }
    }
}

type StageResult = std::result::Result<RegionSurface, (PipelineStage, RegionMeshError)>;

/// Turns region polygons into fill surfaces and border walls
///
/// # Example
///
/// ```rust
/// use globe_region_mesh::*;
///
/// let config = SurfaceConfigBuilder::new()
///     .step(1.0, 1.0)
///     .unwrap()
///     .tolerance(0.1)
///     .unwrap()
///     .ttl(2)
///     .unwrap()
///     .build()
///     .unwrap();
/// let generator = RegionSurfaceGenerator::new(config).unwrap();
///
/// let square = Polygon2D::from_lat_lon(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
/// let surface = generator.generate(&square).unwrap();
/// assert_eq!(surface.fill.triangle_count(), 2);
/// assert_eq!(surface.borders.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct RegionSurfaceGenerator<B = EarcutBackend> {
    config: SurfaceConfig,
    backend: B,
}

impl RegionSurfaceGenerator<EarcutBackend> {
    /// Generator with the earcut backend
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration does not validate
    pub fn new(config: SurfaceConfig) -> Result<Self> {
        Self::with_backend(config, EarcutBackend)
    }
}

impl<B: TriangulationBackend> RegionSurfaceGenerator<B> {
    /// Generator with a custom triangulation backend
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration does not validate
    pub fn with_backend(config: SurfaceConfig, backend: B) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, backend })
    }

    /// Configuration in use
    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Backend in use
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Generate one region with fresh scratch buffers
    pub fn generate(&self, polygon: &Polygon2D) -> Result<RegionSurface> {
        let mut scratch = ScratchBuffers::new(self.config.weld_distance());
        self.generate_with_scratch(polygon, &mut scratch)
    }

    /// Generate one region reusing caller-owned scratch buffers
    ///
    /// # Errors
    ///
    /// The first stage error. `QualityNotConverged` is never returned here;
    /// it ends up in [`RegionSurface::warning`].
    pub fn generate_with_scratch(
        &self,
        polygon: &Polygon2D,
        scratch: &mut ScratchBuffers,
    ) -> Result<RegionSurface> {
        self.run(polygon, scratch).map_err(|(_, err)| err)
    }

    /// Generate every region in order, skipping failures
    pub fn generate_batch(&self, polygons: &[Polygon2D]) -> BatchOutput {
        self.generate_batch_cancellable(polygons, &AtomicBool::new(false))
    }

    /// Like [`generate_batch`](Self::generate_batch), checking `cancel` before each region
    ///
    /// A region that has started always runs to completion.
    pub fn generate_batch_cancellable(
        &self,
        polygons: &[Polygon2D],
        cancel: &AtomicBool,
    ) -> BatchOutput {
        let mut output = BatchOutput::default();
        let mut scratch = ScratchBuffers::new(self.config.weld_distance());

        for (index, polygon) in polygons.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                debug!("batch cancelled after {} of {} regions", index, polygons.len());
                output.cancelled = true;
                break;
            }
            let result = self.run(polygon, &mut scratch);
            output.record(index, result);
        }

        debug!(
            "batch done: {} generated, {} failed",
            output.success_count(),
            output.failure_count()
        );
        output
    }

    fn run(&self, polygon: &Polygon2D, scratch: &mut ScratchBuffers) -> StageResult {
        let params = &self.config.triangulation;
        let altitude = params.altitude;

        let prepared =
            preprocess::prepare_polygon(polygon).map_err(|e| (PipelineStage::Preprocess, e))?;
        debug!(
            "preprocessed {} ring vertices, {} holes",
            prepared.vertex_count(),
            prepared.holes.len()
        );

        let outcome = triangulation::triangulate_with_scratch(
            &self.backend,
            &prepared,
            params,
            &mut scratch.triangulation,
        )
        .map_err(|e| (PipelineStage::Triangulate, e))?;
        let warning = outcome.warning(params.tolerance);
        if let Some(w) = &warning {
            warn!("{} after {} attempts, keeping finest mesh", w, outcome.attempts());
        }
        debug!(
            "triangulated {} triangles in {} attempts",
            outcome.polygon().triangle_count(),
            outcome.attempts()
        );

        let weld = self.config.weld_distance();
        if scratch.dedup.epsilon() != weld {
            scratch.dedup.set_epsilon(weld);
        }
        let fill = mesh::assemble_with(outcome.polygon(), altitude, &self.config.uv, &mut scratch.dedup)
            .map_err(|e| (PipelineStage::Assemble, e))?;
        debug!(
            "assembled {} vertices, {} triangles",
            fill.vertex_count(),
            fill.triangle_count()
        );

        let ratio = self.config.extrude_ratio();
        let mut borders = Vec::with_capacity(prepared.holes.len() + 1);
        let mut outlines = Vec::with_capacity(prepared.holes.len() + 1);

        let outline = projection::project_ring(&prepared.outer, altitude);
        borders.push(
            mesh::extrude(&outline, ratio, false).map_err(|e| (PipelineStage::ExtrudeOutline, e))?,
        );
        outlines.push(to_f32_ring(&outline));

        for (i, hole) in prepared.holes.iter().enumerate() {
            let outline = projection::project_ring(hole, altitude);
            borders.push(
                mesh::extrude(&outline, ratio, true).map_err(|e| (PipelineStage::ExtrudeHole(i), e))?,
            );
            outlines.push(to_f32_ring(&outline));
        }
        debug!("extruded {} border walls", borders.len());

        Ok(RegionSurface {
            fill,
            borders,
            outlines,
            outcome,
            warning,
        })
    }
}

#[cfg(feature = "parallel")]
impl<B: TriangulationBackend + Sync> RegionSurfaceGenerator<B> {
    /// Generate every region on the rayon thread pool
    ///
    /// Each region checks a buffer set out of `pool` for the length of its
    /// pipeline. Output is in input order, same as [`generate_batch`](Self::generate_batch).
    pub fn par_generate_batch(&self, polygons: &[Polygon2D], pool: &ScratchPool) -> BatchOutput {
        let results: Vec<StageResult> = polygons
            .par_iter()
            .map(|polygon| {
                let mut scratch = pool.checkout();
                self.run(polygon, &mut scratch)
            })
            .collect();

        let mut output = BatchOutput::default();
        for (index, result) in results.into_iter().enumerate() {
            output.record(index, result);
        }
        debug!(
            "parallel batch done: {} generated, {} failed",
            output.success_count(),
            output.failure_count()
        );
        output
    }
}

fn to_f32_ring(ring: &[projection::SpherePoint]) -> Vec<[f32; 3]> {
    ring.iter().map(|p| [p.x as f32, p.y as f32, p.z as f32]).collect()
}
