//! Chunk storage and the mesh build pipeline.
//!
//! The world is split into `CHUNK_SIZE`-square columns of full world height,
//! addressed by `(p, q)`. Each chunk owns two sparse maps — block ids and
//! light sources — plus the metadata produced by its last mesh build. A
//! chunk whose `dirty` flag is set has stale mesh data; the streaming
//! scheduler (`streaming`) picks dirty chunks up and rebuilds them on the
//! async compute pool.

use crate::map::BlockMap;
use bevy::prelude::*;

pub mod frustum;
pub mod geometry;
pub mod light;
pub mod mesh;
pub mod streaming;

pub use streaming::*;

/// Horizontal chunk extent in blocks.
pub const CHUNK_SIZE: i32 = 32;
/// World height in blocks (exclusive upper bound for `y`).
pub const CHUNK_HEIGHT: i32 = 256;
/// Hard cap on simultaneously resident chunks.
pub const MAX_CHUNKS: usize = 8192;
/// Number of background mesh workers.
pub const WORKERS: usize = 4;

// Padded scratch window used by the mesher and the light fill: the 3×3
// chunk neighborhood plus one cell on each side, and one cell above/below
// the column.
pub const XZ_SIZE: i32 = CHUNK_SIZE * 3 + 2;
pub const XZ_LO: i32 = CHUNK_SIZE;
pub const XZ_HI: i32 = CHUNK_SIZE * 2 + 1;
pub const Y_SIZE: i32 = CHUNK_HEIGHT + 2;

/// Index into a `XZ_SIZE × XZ_SIZE × Y_SIZE` scratch array.
#[inline]
#[must_use]
pub fn xyz(x: i32, y: i32, z: i32) -> usize {
    (y * XZ_SIZE * XZ_SIZE + x * XZ_SIZE + z) as usize
}

/// Index into a `XZ_SIZE × XZ_SIZE` column array.
#[inline]
#[must_use]
pub fn xz(x: i32, z: i32) -> usize {
    (x * XZ_SIZE + z) as usize
}

/// Chunk coordinate owning world coordinate `x` (blocks are centered on
/// integers, so the cell is resolved by rounding first).
#[must_use]
pub fn chunked(x: f32) -> i32 {
    (x.round() / CHUNK_SIZE as f32).floor() as i32
}

/// Marker component for a spawned chunk entity.
#[derive(Component)]
pub struct ChunkEntity {
    pub p: i32,
    pub q: i32,
}

/// One column of voxels plus its mesh metadata.
pub struct Chunk {
    pub p: i32,
    pub q: i32,
    pub blocks: BlockMap,
    pub lights: BlockMap,
    /// Mesh data is out of date with the maps.
    pub dirty: bool,
    /// Whether a mesh has ever been uploaded for this chunk.
    pub meshed: bool,
    pub miny: i32,
    pub maxy: i32,
    pub faces: usize,
}

impl Chunk {
    /// Create an empty chunk at `(p, q)`. The maps' base offsets leave room
    /// for the one-cell shadow pad on each horizontal side.
    #[must_use]
    pub fn new(p: i32, q: i32) -> Self {
        let dx = p * CHUNK_SIZE - 1;
        let dz = q * CHUNK_SIZE - 1;
        Chunk {
            p,
            q,
            blocks: BlockMap::new(dx, 0, dz, 0x7fff),
            lights: BlockMap::new(dx, 0, dz, 0xf),
            dirty: true,
            meshed: false,
            miny: 0,
            maxy: 0,
            faces: 0,
        }
    }

    /// Chebyshev distance to chunk coordinate `(p, q)`.
    #[must_use]
    pub fn distance(&self, p: i32, q: i32) -> i32 {
        (self.p - p).abs().max((self.q - q).abs())
    }
}

/// Flat index of resident chunks. Lookup is a linear scan: the live count
/// stays around `(2r + 1)²` for view radius `r`, where a scan beats hash
/// overhead and keeps eviction a trivial swap-remove.
#[derive(Default)]
pub struct ChunkIndex {
    chunks: Vec<Chunk>,
}

impl ChunkIndex {
    #[must_use]
    pub fn new() -> Self {
        ChunkIndex { chunks: Vec::new() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[must_use]
    pub fn find(&self, p: i32, q: i32) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.p == p && c.q == q)
    }

    pub fn find_mut(&mut self, p: i32, q: i32) -> Option<&mut Chunk> {
        self.chunks.iter_mut().find(|c| c.p == p && c.q == q)
    }

    /// Insert a freshly created chunk. Returns `None` when the index is at
    /// `MAX_CHUNKS`, which callers treat as "skip creation this frame".
    pub fn insert(&mut self, chunk: Chunk) -> Option<&mut Chunk> {
        if self.chunks.len() >= MAX_CHUNKS {
            return None;
        }
        self.chunks.push(chunk);
        self.chunks.last_mut()
    }

    /// Remove every chunk `f` rejects, yielding the removed chunks to `g`.
    /// Order is not preserved.
    pub fn retain_or_else(&mut self, mut f: impl FnMut(&Chunk) -> bool, mut g: impl FnMut(Chunk)) {
        let mut i = 0;
        while i < self.chunks.len() {
            if f(&self.chunks[i]) {
                i += 1;
            } else {
                g(self.chunks.swap_remove(i));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Chunk> {
        self.chunks.iter_mut()
    }
}

/// Self-contained mesh job handed to a worker: the target coordinate, deep
/// copies of the 3×3 map neighborhood, and (after the build) the finished
/// vertex buffer. `load` asks the worker to run terrain generation into the
/// center maps before meshing.
pub struct WorkItem {
    pub p: i32,
    pub q: i32,
    pub load: bool,
    pub block_maps: [[Option<BlockMap>; 3]; 3],
    pub light_maps: [[Option<BlockMap>; 3]; 3],
    pub miny: i32,
    pub maxy: i32,
    pub faces: usize,
    pub data: Vec<f32>,
}

impl WorkItem {
    /// A job with only the center maps populated, used for synchronous
    /// generation of brand-new chunks.
    #[must_use]
    pub fn for_load(p: i32, q: i32, blocks: BlockMap, lights: BlockMap) -> Self {
        let mut item = WorkItem {
            p,
            q,
            load: true,
            block_maps: Default::default(),
            light_maps: Default::default(),
            miny: 0,
            maxy: 0,
            faces: 0,
            data: Vec::new(),
        };
        item.block_maps[1][1] = Some(blocks);
        item.light_maps[1][1] = Some(lights);
        item
    }

    pub fn center_blocks(&self) -> &BlockMap {
        self.block_maps[1][1].as_ref().expect("work item has a center map")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunked_rounds_before_dividing() {
        assert_eq!(chunked(0.0), 0);
        assert_eq!(chunked(31.4), 0);
        assert_eq!(chunked(31.6), 1);
        assert_eq!(chunked(-0.4), 0);
        assert_eq!(chunked(-0.6), -1);
        assert_eq!(chunked(-32.5), -2);
    }

    #[test]
    fn index_finds_and_evicts() {
        let mut index = ChunkIndex::new();
        index.insert(Chunk::new(0, 0));
        index.insert(Chunk::new(1, 0));
        index.insert(Chunk::new(0, 1));
        assert!(index.find(1, 0).is_some());
        assert!(index.find(2, 2).is_none());

        let mut removed = Vec::new();
        index.retain_or_else(|c| c.distance(0, 0) < 1, |c| removed.push((c.p, c.q)));
        assert_eq!(index.len(), 1);
        assert_eq!(removed.len(), 2);
        assert!(index.find(0, 0).is_some());
    }
}
