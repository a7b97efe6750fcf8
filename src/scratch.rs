//! Reusable per-region scratch buffers
//!
//! A full dataset has thousands of regions. Workers check a buffer set out
//! of a [`ScratchPool`], run one region's pipeline with it, and hand it back
//! when the guard drops, so grids and hash tables are cleared instead of
//! reallocated.

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;

use crate::config::{dedup_epsilon_at, DEFAULT_ALTITUDE};
use crate::mesh::VertexDeduplicator;
use crate::triangulation::TriangulationScratch;

/// Buffers one region's pipeline needs
#[derive(Debug, Default)]
pub struct ScratchBuffers {
    /// Chart-plane rings and Steiner samples
    pub triangulation: TriangulationScratch,
    /// Vertex welding table
    pub dedup: VertexDeduplicator,
}

impl ScratchBuffers {
    /// Buffers with the given weld distance
    pub fn new(dedup_epsilon: f64) -> Self {
        Self {
            triangulation: TriangulationScratch::default(),
            dedup: VertexDeduplicator::new(dedup_epsilon),
        }
    }

    /// Empty every buffer, keeping capacity
    pub fn clear(&mut self) {
        self.triangulation.clear();
        self.dedup.clear();
    }
}

/// Shared pool of [`ScratchBuffers`]
///
/// A checked-out set belongs to exactly one region until its guard drops.
#[derive(Debug)]
pub struct ScratchPool {
    free: Mutex<Vec<ScratchBuffers>>,
    dedup_epsilon: f64,
}

impl ScratchPool {
    /// Empty pool; buffer sets are created on demand
    pub fn new(dedup_epsilon: f64) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            dedup_epsilon,
        }
    }

    /// Pool with `count` sets allocated up front
    pub fn with_capacity(dedup_epsilon: f64, count: usize) -> Self {
        let buffers = (0..count).map(|_| ScratchBuffers::new(dedup_epsilon)).collect();
        Self {
            free: Mutex::new(buffers),
            dedup_epsilon,
        }
    }

    /// Take a buffer set, creating one if the pool is empty
    pub fn checkout(&self) -> PooledScratch<'_> {
        let buffers = self
            .free
            .lock()
            .pop()
            .unwrap_or_else(|| ScratchBuffers::new(self.dedup_epsilon));
        PooledScratch {
            pool: self,
            buffers,
        }
    }

    /// Number of idle buffer sets
    pub fn available(&self) -> usize {
        self.free.lock().len()
    }

    fn release(&self, mut buffers: ScratchBuffers) {
        buffers.clear();
        self.free.lock().push(buffers);
    }
}

impl Default for ScratchPool {
    fn default() -> Self {
        Self::new(dedup_epsilon_at(DEFAULT_ALTITUDE))
    }
}

/// Guard for a checked-out buffer set; returns it to the pool on drop
#[derive(Debug)]
pub struct PooledScratch<'a> {
    pool: &'a ScratchPool,
    buffers: ScratchBuffers,
}

impl Deref for PooledScratch<'_> {
    type Target = ScratchBuffers;

    fn deref(&self) -> &ScratchBuffers {
        &self.buffers
    }
}

impl DerefMut for PooledScratch<'_> {
    fn deref_mut(&mut self) -> &mut ScratchBuffers {
        &mut self.buffers
    }
}

impl Drop for PooledScratch<'_> {
    fn drop(&mut self) {
        let buffers = std::mem::take(&mut self.buffers);
        self.pool.release(buffers);
    }
}
