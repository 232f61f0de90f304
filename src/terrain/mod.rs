//! Procedural terrain.
//!
//! Generation is a pure function of the seed and the chunk coordinate:
//! layered simplex noise produces a height field, the column is filled with
//! cement / sand / dirt / grass layers, and further independent noise
//! channels scatter tall grass, flowers, trees and a cloud shelf.
//!
//! The generator writes one cell of padding on each horizontal side of the
//! chunk. Padding cells carry *negated* ids — the shadow-copy convention
//! that lets the mesher cull faces across seams — while cells inside the
//! chunk carry positive ids.

use crate::block::{material, BlockId};
use crate::chunk::{CHUNK_SIZE, WorkItem};
use crate::map::BlockMap;
use noise::{NoiseFn, Simplex};

/// Ground level: columns never generate lower than this many solid blocks.
pub const BASELINE: i32 = 12;

const CLOUD_FLOOR: i32 = 64;
const CLOUD_CEILING: i32 = 72;

/// Seeded fractal simplex sampler. All channels derive from one simplex
/// permutation; callers pick octave count, persistence and lacunarity per
/// use, and pre-scale coordinates.
#[derive(Clone)]
pub struct TerrainNoise {
    simplex: Simplex,
}

impl TerrainNoise {
    #[must_use]
    pub fn new(seed: u32) -> Self {
        TerrainNoise { simplex: Simplex::new(seed) }
    }

    /// Fractal 2-D sample in `[-1, 1]`.
    #[must_use]
    pub fn simplex2(&self, x: f64, z: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        let mut frequency = 1.0;
        let mut amplitude = 1.0;
        let mut max = 0.0;
        let mut total = 0.0;
        for _ in 0..octaves.max(1) {
            total += self.simplex.get([x * frequency, z * frequency]) * amplitude;
            max += amplitude;
            frequency *= lacunarity;
            amplitude *= persistence;
        }
        total / max
    }

    /// Fractal 3-D sample in `[-1, 1]`.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn simplex3(
        &self,
        x: f64,
        y: f64,
        z: f64,
        octaves: u32,
        persistence: f64,
        lacunarity: f64,
    ) -> f64 {
        let mut frequency = 1.0;
        let mut amplitude = 1.0;
        let mut max = 0.0;
        let mut total = 0.0;
        for _ in 0..octaves.max(1) {
            total += self.simplex.get([x * frequency, y * frequency, z * frequency]) * amplitude;
            max += amplitude;
            frequency *= lacunarity;
            amplitude *= persistence;
        }
        total / max
    }
}

/// Deterministic world generator.
pub struct TerrainGenerator {
    noise: TerrainNoise,
}

impl TerrainGenerator {
    #[must_use]
    pub fn new(seed: u32) -> Self {
        TerrainGenerator { noise: TerrainNoise::new(seed) }
    }

    #[must_use]
    pub fn noise(&self) -> &TerrainNoise {
        &self.noise
    }

    /// Surface height for world column `(x, z)`: the first empty `y`.
    #[must_use]
    pub fn column_height(&self, x: i32, z: i32) -> i32 {
        let xf = f64::from(x);
        let zf = f64::from(z);
        let f = self.noise.simplex2(xf * 0.01, zf * 0.01, 4, 0.5, 2.0);
        let g = self.noise.simplex2(-xf * 0.01, -zf * 0.01, 2, 0.9, 2.0);
        let mh = g * 32.0 + 16.0;
        let h = (f * mh) as i32;
        h.max(BASELINE)
    }

    /// Fill `blocks` with the terrain of chunk `(p, q)`, including the
    /// one-cell shadow pad.
    pub fn generate(&self, blocks: &mut BlockMap, p: i32, q: i32) {
        for dx in -1..=CHUNK_SIZE {
            for dz in -1..=CHUNK_SIZE {
                let inside = (0..CHUNK_SIZE).contains(&dx) && (0..CHUNK_SIZE).contains(&dz);
                let flag: BlockId = if inside { 1 } else { -1 };
                let x = p * CHUNK_SIZE + dx;
                let z = q * CHUNK_SIZE + dz;
                self.column(blocks, x, z, dx, dz, flag);
            }
        }
    }

    fn column(&self, blocks: &mut BlockMap, x: i32, z: i32, dx: i32, dz: i32, flag: BlockId) {
        let xf = f64::from(x);
        let zf = f64::from(z);
        let h = self.column_height(x, z);

        for y in 0..10.min(h) {
            blocks.set(x, y, z, material::CEMENT * flag);
        }
        for y in 10..BASELINE.min(h) {
            blocks.set(x, y, z, material::SAND * flag);
        }
        if h > BASELINE {
            for y in BASELINE..h - 1 {
                blocks.set(x, y, z, material::DIRT * flag);
            }
            blocks.set(x, h - 1, z, material::GRASS * flag);

            if self.noise.simplex2(-xf * 0.1, zf * 0.1, 4, 0.8, 2.0) > 0.6 {
                blocks.set(x, h, z, material::TALL_GRASS * flag);
            }
            if self.noise.simplex2(xf * 0.05, -zf * 0.05, 4, 0.8, 2.0) > 0.7 {
                let color = self.noise.simplex2(xf * 0.1, zf * 0.1, 4, 0.8, 2.0);
                let w = (f64::from(material::YELLOW_FLOWER) + color * 7.0) as BlockId;
                let w = w.clamp(material::YELLOW_FLOWER, material::BLUE_FLOWER);
                blocks.set(x, h, z, w * flag);
            }

            // Trees stay clear of the seam so the canopy never leaves the
            // map's 8-bit window.
            let clear = dx - 4 >= 0 && dz - 4 >= 0 && dx + 4 < CHUNK_SIZE && dz + 4 < CHUNK_SIZE;
            if clear && self.noise.simplex2(xf, zf, 6, 0.5, 2.0) > 0.84 {
                self.tree(blocks, x, h, z);
            }
        }

        for y in CLOUD_FLOOR..CLOUD_CEILING {
            let sample =
                self.noise.simplex3(xf * 0.01, f64::from(y) * 0.1, zf * 0.01, 8, 0.5, 2.0);
            if sample > 0.75 {
                blocks.set(x, y, z, material::CLOUD * flag);
            }
        }
    }

    fn tree(&self, blocks: &mut BlockMap, x: i32, h: i32, z: i32) {
        for y in h + 3..h + 8 {
            for ox in -3..=3 {
                for oz in -3..=3 {
                    let dy = y - (h + 4);
                    let d = ox * ox + oz * oz + dy * dy;
                    if d < 11 {
                        blocks.set(x + ox, y, z + oz, material::LEAVES);
                    }
                }
            }
        }
        for y in h..h + 7 {
            blocks.set(x, y, z, material::WOOD);
        }
    }

    /// Run terrain generation into a work item's center maps.
    pub fn load(&self, item: &mut WorkItem) {
        let blocks = item.block_maps[1][1]
            .as_mut()
            .expect("load item carries its center block map");
        self.generate(blocks, item.p, item.q);
    }
}
