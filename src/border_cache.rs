//! Precomputed border outlines
//!
//! Border walls are cheap to rebuild from their outlines, but the outlines
//! themselves need the full preprocessing and projection pipeline. The cache
//! stores projected outlines so a loader can skip straight to extrusion.
//!
//! ## Binary Layout
//!
//! All fields little-endian.
//!
//! | Size | Field |
//! |------|-------|
//! | 4 | Magic `b"BRDC"` |
//! | 4 | Format version (`u32`, currently 1) |
//! | 4 | Region count |
//! | 4 | Total border count |
//! | per region: 4 | Region index |
//! | per region: 4 | Border count |
//! | per border: 4 | Point count |
//! | per border: N×12 | Points (`f32` x, y, z) |
//!
//! Borders with fewer than 2 points are skipped on decode. A skipped outer
//! border is remembered so hole walls keep facing into their holes; such a
//! region encodes its outer slot as a 0-point border.

use log::{debug, warn};

use crate::error::{RegionMeshError, Result};
use crate::mesh::{self, BorderMesh};
use crate::surface::RegionSurface;

/// Magic number identifying a border cache, `b"BRDC"` read little-endian
pub const MAGIC: u32 = u32::from_le_bytes(*b"BRDC");

/// Current format version
pub const FORMAT_VERSION: u32 = 1;

const HEADER_LEN: usize = 16;
const POINT_LEN: usize = 12;

/// Outlines of one region
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CachedRegion {
    /// Index of the region in its dataset
    pub region_index: u32,
    /// Outer outline first, then hole outlines
    pub borders: Vec<Vec<[f32; 3]>>,
    /// Set when the outer outline was dropped on decode; every entry in
    /// `borders` is then a hole
    pub missing_outer: bool,
}

impl CachedRegion {
    /// Whether `borders[i]` outlines a hole
    pub fn is_hole(&self, i: usize) -> bool {
        i > 0 || self.missing_outer
    }

    /// Rebuild the border walls: outer wall as is, hole walls flipped
    pub fn extrude(&self, ratio: f64) -> Result<Vec<BorderMesh>> {
        self.borders
            .iter()
            .enumerate()
            .map(|(i, outline)| mesh::extrude_points(outline, ratio, self.is_hole(i)))
            .collect()
    }

    /// Borders as written to the binary format, outer placeholder included
    fn encoded_border_count(&self) -> usize {
        self.borders.len() + usize::from(self.missing_outer)
    }
}

/// A decoded or to-be-encoded border cache
#[derive(Debug, Clone, PartialEq)]
pub struct BorderCache {
    pub version: u32,
    pub regions: Vec<CachedRegion>,
}

impl Default for BorderCache {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            regions: Vec::new(),
        }
    }
}

impl BorderCache {
    /// Collect outlines from generated surfaces
    ///
    /// Takes `(region index, surface)` pairs as produced by a batch run.
    pub fn from_surfaces<'a, I>(surfaces: I) -> Self
    where
        I: IntoIterator<Item = &'a (usize, RegionSurface)>,
    {
        let regions = surfaces
            .into_iter()
            .map(|(index, surface)| CachedRegion {
                region_index: *index as u32,
                borders: surface.outlines.clone(),
                missing_outer: false,
            })
            .collect();
        Self {
            version: FORMAT_VERSION,
            regions,
        }
    }

    /// Total number of borders over all regions
    pub fn border_count(&self) -> usize {
        self.regions.iter().map(|r| r.borders.len()).sum()
    }

    fn encoded_border_count(&self) -> usize {
        self.regions.iter().map(CachedRegion::encoded_border_count).sum()
    }

    /// Look up a region by its dataset index
    pub fn region(&self, region_index: u32) -> Option<&CachedRegion> {
        self.regions.iter().find(|r| r.region_index == region_index)
    }

    /// Serialize to the binary format
    pub fn encode(&self) -> Vec<u8> {
        let points: usize = self
            .regions
            .iter()
            .flat_map(|r| &r.borders)
            .map(Vec::len)
            .sum();
        let borders = self.encoded_border_count();
        let total = HEADER_LEN + self.regions.len() * 8 + borders * 4 + points * POINT_LEN;
        let mut buf = Vec::with_capacity(total);

        buf.extend_from_slice(&MAGIC.to_le_bytes());
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&(self.regions.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(borders as u32).to_le_bytes());

        for region in &self.regions {
            buf.extend_from_slice(&region.region_index.to_le_bytes());
            buf.extend_from_slice(&(region.encoded_border_count() as u32).to_le_bytes());
            if region.missing_outer {
                buf.extend_from_slice(&0u32.to_le_bytes());
            }
            for border in &region.borders {
                buf.extend_from_slice(&(border.len() as u32).to_le_bytes());
                for p in border {
                    for c in p {
                        buf.extend_from_slice(&c.to_le_bytes());
                    }
                }
            }
        }

        buf
    }

    /// Parse the binary format
    ///
    /// Nothing is returned unless the whole buffer validates.
    ///
    /// # Errors
    ///
    /// `MalformedBorderCache` on a wrong magic number, unknown version,
    /// truncated data, trailing bytes, or a total border count that does not
    /// match the per-region counts.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);

        let magic = reader.u32()?;
        if magic != MAGIC {
            return Err(RegionMeshError::malformed_cache(format!(
                "bad magic {:#010x}",
                magic
            )));
        }
        let version = reader.u32()?;
        if version != FORMAT_VERSION {
            return Err(RegionMeshError::malformed_cache(format!(
                "unsupported version {}",
                version
            )));
        }

        let region_count = reader.u32()? as usize;
        let total_borders = reader.u32()? as usize;

        let mut regions = Vec::with_capacity(region_count.min(reader.remaining() / 8));
        let mut seen_borders = 0usize;
        let mut skipped = 0usize;

        for _ in 0..region_count {
            let region_index = reader.u32()?;
            let border_count = reader.u32()? as usize;
            seen_borders = seen_borders.saturating_add(border_count);

            let mut borders = Vec::with_capacity(border_count.min(reader.remaining() / 4));
            let mut missing_outer = false;
            for slot in 0..border_count {
                let point_count = reader.u32()? as usize;
                let bytes = reader.take_points(point_count)?;
                if point_count < 2 {
                    missing_outer |= slot == 0;
                    skipped += 1;
                    continue;
                }
                borders.push(
                    bytes
                        .chunks_exact(POINT_LEN)
                        .map(|p| [f32_at(p, 0), f32_at(p, 4), f32_at(p, 8)])
                        .collect(),
                );
            }
            regions.push(CachedRegion {
                region_index,
                borders,
                missing_outer,
            });
        }

        if reader.remaining() != 0 {
            return Err(RegionMeshError::malformed_cache(format!(
                "{} trailing bytes",
                reader.remaining()
            )));
        }
        if seen_borders != total_borders {
            return Err(RegionMeshError::malformed_cache(format!(
                "header declares {} borders, regions hold {}",
                total_borders, seen_borders
            )));
        }
        if skipped > 0 {
            warn!("skipped {} borders with fewer than 2 points", skipped);
        }
        debug!(
            "decoded border cache: {} regions, {} borders",
            regions.len(),
            total_borders - skipped
        );

        Ok(Self { version, regions })
    }
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(RegionMeshError::malformed_cache(format!(
                "truncated: expected {} more bytes at offset {}, got {}",
                len,
                self.offset,
                self.remaining()
            )));
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn take_points(&mut self, count: usize) -> Result<&'a [u8]> {
        let len = count
            .checked_mul(POINT_LEN)
            .ok_or_else(|| RegionMeshError::malformed_cache("point count overflows"))?;
        self.take(len)
    }
}

#[inline]
fn f32_at(bytes: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
