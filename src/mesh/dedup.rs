//! Vertex welding on fixed-precision integer keys

use glam::DVec3;
use rustc_hash::FxHashMap;

use crate::config::{dedup_epsilon_at, DEFAULT_ALTITUDE};

/// Merges projected points that lie within `epsilon` of each other
///
/// Keys are integer bucket coordinates, so the result does not depend on
/// float hashing. A point joins the canonical point of its own bucket, or
/// else the lowest-indexed canonical point within `epsilon` in a neighboring
/// bucket, so near pairs split by a bucket boundary still merge. The first
/// point seen becomes canonical, which makes the output depend only on input
/// order.
///
/// Buffers are kept between uses; call [`VertexDeduplicator::clear`] before
/// welding a new point set.
#[derive(Debug, Clone)]
pub struct VertexDeduplicator {
    epsilon: f64,
    buckets: FxHashMap<[i64; 3], u32>,
    unique: Vec<DVec3>,
    remap: Vec<u32>,
}

impl VertexDeduplicator {
    /// Create a deduplicator with the given bucket size in world units
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            buckets: FxHashMap::default(),
            unique: Vec::new(),
            remap: Vec::new(),
        }
    }

    /// Bucket size in world units
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Change the bucket size; clears all state
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon;
        self.clear();
    }

    /// Forget every point, keeping allocations
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.unique.clear();
        self.remap.clear();
    }

    #[inline]
    fn key(&self, p: DVec3) -> [i64; 3] {
        let inv = 1.0 / self.epsilon;
        [
            (p.x * inv).round() as i64,
            (p.y * inv).round() as i64,
            (p.z * inv).round() as i64,
        ]
    }

    fn near_neighbor(&self, key: [i64; 3], p: DVec3) -> Option<u32> {
        let max_sq = self.epsilon * self.epsilon;
        let mut found: Option<u32> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let neighbor = [key[0] + dx, key[1] + dy, key[2] + dz];
                    let Some(&index) = self.buckets.get(&neighbor) else {
                        continue;
                    };
                    if self.unique[index as usize].distance_squared(p) <= max_sq {
                        found = Some(found.map_or(index, |f| f.min(index)));
                    }
                }
            }
        }
        found
    }

    /// Insert a point, returning its canonical index
    pub fn insert(&mut self, p: DVec3) -> u32 {
        let key = self.key(p);
        let index = match self.buckets.get(&key) {
            Some(&index) => index,
            None => match self.near_neighbor(key, p) {
                Some(index) => index,
                None => {
                    let index = self.unique.len() as u32;
                    self.buckets.insert(key, index);
                    self.unique.push(p);
                    index
                }
            },
        };
        self.remap.push(index);
        index
    }

    /// Weld a whole point set, replacing any previous state
    pub fn weld(&mut self, points: &[DVec3]) {
        self.clear();
        self.unique.reserve(points.len());
        self.remap.reserve(points.len());
        for &p in points {
            self.insert(p);
        }
    }

    /// Canonical points in first-seen order
    pub fn unique(&self) -> &[DVec3] {
        &self.unique
    }

    /// Canonical index of every inserted point, in insertion order
    pub fn remap(&self) -> &[u32] {
        &self.remap
    }
}

impl Default for VertexDeduplicator {
    fn default() -> Self {
        Self::new(dedup_epsilon_at(DEFAULT_ALTITUDE))
    }
}
