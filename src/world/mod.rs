//! World state and edit propagation.
//!
//! The `World` resource owns the chunk index and the terrain generator and
//! is only ever mutated on the main thread. Its responsibilities: block
//! edits (including the shadow copies mirrored across chunk seams), light
//! source toggling, dirty marking with light-aware spill, the raycast
//! picker, and distance-based chunk eviction.

use crate::block::{is_obstacle, is_plant, BlockId};
use crate::chunk::{chunked, Chunk, ChunkIndex, CHUNK_HEIGHT, CHUNK_SIZE};
use crate::terrain::TerrainGenerator;
use bevy::math::{IVec3, Vec3};
use bevy::prelude::Resource;
use std::sync::Arc;

/// Chunk coordinate owning integer world coordinate `x`.
#[inline]
#[must_use]
pub fn chunked_at(x: i32) -> i32 {
    x.div_euclid(CHUNK_SIZE)
}

/// The block world. One per app.
#[derive(Resource)]
pub struct World {
    pub chunks: ChunkIndex,
    terrain: Arc<TerrainGenerator>,
}

impl World {
    #[must_use]
    pub fn new(seed: u32) -> Self {
        World {
            chunks: ChunkIndex::new(),
            terrain: Arc::new(TerrainGenerator::new(seed)),
        }
    }

    /// Shared handle to the generator, for handing to worker tasks.
    #[must_use]
    pub fn terrain(&self) -> Arc<TerrainGenerator> {
        Arc::clone(&self.terrain)
    }

    #[must_use]
    pub fn find_chunk(&self, p: i32, q: i32) -> Option<&Chunk> {
        self.chunks.find(p, q)
    }

    pub fn find_chunk_mut(&mut self, p: i32, q: i32) -> Option<&mut Chunk> {
        self.chunks.find_mut(p, q)
    }

    /// Block id at integer world coordinates, `0` outside loaded chunks.
    #[must_use]
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockId {
        self.find_chunk(chunked_at(x), chunked_at(z))
            .map_or(0, |chunk| chunk.blocks.get(x, y, z))
    }

    /// Write `w` at `(x, y, z)`: the owning chunk receives `w`, and every
    /// existing neighbor within one block of the seam receives the negated
    /// shadow copy. All touched chunks are dirty-marked. Removal also clears
    /// any light source at the cell and prunes a plant resting on top.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, w: BlockId) {
        if !(0..CHUNK_HEIGHT).contains(&y) {
            return;
        }
        let p = chunked_at(x);
        let q = chunked_at(z);
        self.set_block_in(p, q, x, y, z, w);
        for dx in -1..=1 {
            for dz in -1..=1 {
                if dx == 0 && dz == 0 {
                    continue;
                }
                if dx != 0 && chunked_at(x + dx) == p {
                    continue;
                }
                if dz != 0 && chunked_at(z + dz) == q {
                    continue;
                }
                self.set_block_in(p + dx, q + dz, x, y, z, -w);
            }
        }
        if w == 0 && is_plant(self.get_block(x, y + 1, z)) {
            self.set_block(x, y + 1, z, 0);
        }
    }

    fn set_block_in(&mut self, p: i32, q: i32, x: i32, y: i32, z: i32, w: BlockId) {
        let Some(chunk) = self.chunks.find_mut(p, q) else {
            return;
        };
        let mut changed = chunk.blocks.set(x, y, z, w);
        if w == 0 && chunked_at(x) == p && chunked_at(z) == q {
            changed |= chunk.lights.set(x, y, z, 0);
        }
        if changed {
            self.dirty_chunk(p, q);
        }
    }

    /// Toggle a full-intensity light source on the block at `(x, y, z)`.
    pub fn toggle_light(&mut self, x: i32, y: i32, z: i32) {
        let p = chunked_at(x);
        let q = chunked_at(z);
        let Some(chunk) = self.chunks.find_mut(p, q) else {
            return;
        };
        let w = if chunk.lights.get(x, y, z) == 0 { 15 } else { 0 };
        chunk.lights.set(x, y, z, w);
        self.dirty_chunk(p, q);
    }

    /// Whether any chunk in the 3×3 neighborhood of `(p, q)` holds a light
    /// source.
    #[must_use]
    pub fn has_lights(&self, p: i32, q: i32) -> bool {
        for dp in -1..=1 {
            for dq in -1..=1 {
                if let Some(other) = self.find_chunk(p + dp, q + dq) {
                    if !other.lights.is_empty() {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Mark `(p, q)` dirty. When a light source exists nearby the spill
    /// crosses seams, so the whole 3×3 neighborhood is re-meshed too.
    pub fn dirty_chunk(&mut self, p: i32, q: i32) {
        if let Some(chunk) = self.chunks.find_mut(p, q) {
            chunk.dirty = true;
        }
        if self.has_lights(p, q) {
            for dp in -1..=1 {
                for dq in -1..=1 {
                    if let Some(other) = self.chunks.find_mut(p + dp, q + dq) {
                        other.dirty = true;
                    }
                }
            }
        }
    }

    /// Topmost obstacle `y` in the column at world `(x, z)`, or `-1` when
    /// the column is empty or unloaded.
    #[must_use]
    pub fn highest_block(&self, x: f32, z: f32) -> i32 {
        let nx = x.round() as i32;
        let nz = z.round() as i32;
        let mut result = -1;
        if let Some(chunk) = self.find_chunk(chunked(x), chunked(z)) {
            for (ex, ey, ez, ew) in chunk.blocks.iter() {
                if ex == nx && ez == nz && is_obstacle(ew) && ew > 0 {
                    result = result.max(ey);
                }
            }
        }
        result
    }

    /// Walk a ray from `origin` along `direction` and return the first
    /// occupied cell within range, or with `previous` the last empty cell
    /// before it (the "place against this face" target). Only chunks within
    /// chunk-distance 1 of the origin are considered; the nearest hit wins.
    #[must_use]
    pub fn hit_test(
        &self,
        origin: Vec3,
        direction: Vec3,
        previous: bool,
    ) -> Option<(IVec3, BlockId)> {
        const MAX_DISTANCE: f32 = 8.0;
        const STEPS_PER_BLOCK: i32 = 32;

        let p = chunked(origin.x);
        let q = chunked(origin.z);
        let mut best = f32::MAX;
        let mut result = None;
        for chunk in self.chunks.iter() {
            if chunk.distance(p, q) > 1 {
                continue;
            }
            if let Some((hit, hw)) = ray_walk(
                &chunk.blocks,
                origin,
                direction,
                MAX_DISTANCE,
                STEPS_PER_BLOCK,
                previous,
            ) {
                let d = (hit.as_vec3() - origin).length();
                if d < best {
                    best = d;
                    result = Some((hit, hw));
                }
            }
        }
        result
    }

    /// Evict every chunk farther than `delete_radius` from the player's
    /// chunk, handing each evicted chunk to `on_evict` so the caller can
    /// release its entity and mesh asset.
    pub fn delete_chunks(&mut self, player: Vec3, delete_radius: i32, mut on_evict: impl FnMut(&Chunk)) {
        let p = chunked(player.x);
        let q = chunked(player.z);
        self.chunks.retain_or_else(
            |chunk| chunk.distance(p, q) < delete_radius,
            |chunk| on_evict(&chunk),
        );
    }
}

/// Fixed-step voxel walk through one chunk's map. The cell lookup happens
/// only when the rounded cell changes; shadow entries (negative ids) never
/// register as hits.
fn ray_walk(
    map: &crate::map::BlockMap,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    steps_per_block: i32,
    previous: bool,
) -> Option<(IVec3, BlockId)> {
    let step = direction / steps_per_block as f32;
    let mut pos = origin;
    let mut last = IVec3::new(0, 0, 0);
    for _ in 0..(max_distance * steps_per_block as f32) as i32 {
        let cell = IVec3::new(
            pos.x.round() as i32,
            pos.y.round() as i32,
            pos.z.round() as i32,
        );
        if cell != last {
            let hw = map.get(cell.x, cell.y, cell.z);
            if hw > 0 {
                return Some(if previous { (last, hw) } else { (cell, hw) });
            }
            last = cell;
        }
        pos += step;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::material;
    use crate::terrain::BASELINE;

    fn world_with_chunks(coords: &[(i32, i32)]) -> World {
        let mut world = World::new(1234);
        for &(p, q) in coords {
            let mut chunk = Chunk::new(p, q);
            let terrain = world.terrain();
            terrain.generate(&mut chunk.blocks, p, q);
            world.chunks.insert(chunk);
        }
        world
    }

    #[test]
    fn ground_baseline_at_origin() {
        let world = world_with_chunks(&[(0, 0)]);
        assert!(world.highest_block(0.0, 0.0) >= BASELINE - 1);
    }

    #[test]
    fn edits_mirror_across_the_seam() {
        let mut world = world_with_chunks(&[(0, 0), (1, 0)]);
        let h = world.highest_block(31.0, 0.0);
        world.set_block(31, h + 1, 0, material::STONE);

        let owner = world.find_chunk(0, 0).unwrap();
        assert_eq!(owner.blocks.get(31, h + 1, 0), material::STONE);
        let neighbor = world.find_chunk(1, 0).unwrap();
        assert_eq!(neighbor.blocks.get(31, h + 1, 0), -material::STONE);
        assert!(owner.dirty && neighbor.dirty);
    }

    #[test]
    fn corner_edits_reach_the_diagonal_neighbor() {
        let mut world = world_with_chunks(&[(0, 0), (1, 0), (0, 1), (1, 1)]);
        world.set_block(31, 40, 31, material::BRICK);
        for (p, q) in [(1, 0), (0, 1), (1, 1)] {
            let chunk = world.find_chunk(p, q).unwrap();
            assert_eq!(chunk.blocks.get(31, 40, 31), -material::BRICK, "chunk {p},{q}");
        }
    }

    #[test]
    fn interior_edits_stay_in_their_chunk() {
        let mut world = world_with_chunks(&[(0, 0), (1, 0)]);
        world.set_block(16, 40, 16, material::STONE);
        let neighbor = world.find_chunk(1, 0).unwrap();
        assert_eq!(neighbor.blocks.get(16, 40, 16), 0);
    }

    #[test]
    fn removal_clears_lights_and_prunes_plants() {
        let mut world = world_with_chunks(&[(0, 0)]);
        let h = world.highest_block(10.0, 10.0);
        world.set_block(10, h + 1, 10, material::STONE);
        world.toggle_light(10, h + 1, 10);
        world.set_block(10, h + 2, 10, material::RED_FLOWER);

        world.set_block(10, h + 1, 10, 0);
        assert_eq!(world.get_block(10, h + 1, 10), 0);
        assert_eq!(world.get_block(10, h + 2, 10), 0, "plant should be pruned");
        let chunk = world.find_chunk(0, 0).unwrap();
        assert_eq!(chunk.lights.get(10, h + 1, 10), 0);
    }

    #[test]
    fn light_toggle_flips_and_dirties() {
        let mut world = world_with_chunks(&[(0, 0)]);
        world.find_chunk_mut(0, 0).unwrap().dirty = false;
        world.toggle_light(5, 20, 5);
        let chunk = world.find_chunk(0, 0).unwrap();
        assert_eq!(chunk.lights.get(5, 20, 5), 15);
        assert!(chunk.dirty);

        world.toggle_light(5, 20, 5);
        assert_eq!(world.find_chunk(0, 0).unwrap().lights.get(5, 20, 5), 0);
    }

    #[test]
    fn dirty_spreads_to_neighbors_only_near_lights() {
        let mut world = world_with_chunks(&[(0, 0), (1, 0)]);
        for chunk in world.chunks.iter_mut() {
            chunk.dirty = false;
        }
        world.set_block(5, 40, 5, material::STONE);
        assert!(world.find_chunk(0, 0).unwrap().dirty);
        assert!(!world.find_chunk(1, 0).unwrap().dirty);

        world.toggle_light(5, 41, 5);
        for chunk in world.chunks.iter_mut() {
            chunk.dirty = false;
        }
        world.set_block(8, 40, 8, material::STONE);
        assert!(world.find_chunk(1, 0).unwrap().dirty, "light spill re-meshes neighbors");
    }

    #[test]
    fn raycast_straight_down_hits_and_steps_back() {
        let mut world = world_with_chunks(&[(0, 0)]);
        let h = world.highest_block(0.0, 0.0);
        world.set_block(0, h + 1, 0, material::STONE);

        let origin = Vec3::new(0.0, h as f32 + 4.0, 0.0);
        let down = Vec3::new(0.0, -1.0, 0.0);
        let (hit, hw) = world.hit_test(origin, down, false).unwrap();
        assert_eq!(hit, IVec3::new(0, h + 1, 0));
        assert_eq!(hw, material::STONE);

        let (prev, _) = world.hit_test(origin, down, true).unwrap();
        assert_eq!(prev, IVec3::new(0, h + 2, 0));
    }

    #[test]
    fn raycast_misses_beyond_range() {
        let mut world = world_with_chunks(&[(0, 0)]);
        world.set_block(0, 100, 0, material::STONE);
        let origin = Vec3::new(0.0, 120.0, 0.0);
        let down = Vec3::new(0.0, -1.0, 0.0);
        assert!(world.hit_test(origin, down, false).is_none());
    }

    #[test]
    fn far_chunks_are_evicted() {
        let mut world = world_with_chunks(&[(0, 0), (6, 6)]);
        let mut evicted = Vec::new();
        world.delete_chunks(Vec3::new(0.5, 20.0, 0.5), 4, |c| evicted.push((c.p, c.q)));
        assert_eq!(evicted, vec![(6, 6)]);
        assert!(world.find_chunk(0, 0).is_some());
        assert!(world.find_chunk(6, 6).is_none());
    }
}
