//! Chunk streaming: the background mesh worker pool.
//!
//! A fixed set of worker slots runs mesh (and, for brand-new chunks,
//! terrain generation) jobs on the async compute pool. The main thread
//! owns all chunk state: it deep-copies the 3×3 map neighborhood into a
//! `WorkItem` at dispatch, so a running job shares nothing with the world,
//! and it alone touches mesh assets at harvest.
//!
//! Scheduling is scored. For each idle slot, every chunk coordinate within
//! the create radius that hashes to the slot (so two slots never race for
//! the same coordinate) is scored by visibility, rebuild priority and
//! distance; the lowest score wins. The chosen chunk is marked clean at
//! dispatch time — an edit arriving while the job runs re-marks it dirty
//! and the next pass rebuilds it.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use std::collections::HashMap;
use std::sync::Arc;

use super::frustum::chunk_visible;
use super::mesh::build_mesh;
use super::{chunked, Chunk, ChunkEntity, WorkItem, CHUNK_HEIGHT, CHUNK_SIZE, WORKERS};
use crate::material::VoxelMaterialHandle;
use crate::player::{sight_vector, Player};
use crate::terrain::TerrainGenerator;
use crate::world::World;

/// Concentric chunk radii around the player: generation, drawing, eviction.
#[derive(Resource, Clone, Copy)]
pub struct ViewConfig {
    pub create_radius: i32,
    pub render_radius: i32,
    pub delete_radius: i32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            create_radius: 8,
            render_radius: 8,
            delete_radius: 12,
        }
    }
}

/// Per-frame render statistics for the HUD.
#[derive(Resource, Default)]
pub struct RenderStats {
    pub faces: usize,
}

/// One background worker: at most one in-flight job.
pub struct WorkerSlot {
    pub index: usize,
    pub task: Option<Task<WorkItem>>,
}

/// The fixed worker pool.
#[derive(Resource)]
pub struct MeshWorkers {
    pub slots: Vec<WorkerSlot>,
}

impl Default for MeshWorkers {
    fn default() -> Self {
        MeshWorkers {
            slots: (0..WORKERS).map(|index| WorkerSlot { index, task: None }).collect(),
        }
    }
}

/// Spawned chunk entities and their live mesh handle, keyed by `(p, q)`.
/// Exactly one mesh asset is live per chunk; re-meshing replaces it in
/// place.
#[derive(Resource, Default)]
pub struct ChunkEntities {
    pub map: HashMap<(i32, i32), (Entity, Handle<Mesh>)>,
}

/// Throttle state for the once-per-second streaming log line.
#[derive(Resource, Default)]
pub struct StreamingDiagnostics {
    pub last_log_seconds: f64,
}

#[derive(SystemParam)]
pub struct StreamingCtx<'w, 's> {
    pub commands: Commands<'w, 's>,
    pub meshes: ResMut<'w, Assets<Mesh>>,
    pub world: ResMut<'w, World>,
    pub view: Res<'w, ViewConfig>,
    pub workers: ResMut<'w, MeshWorkers>,
    pub entities: ResMut<'w, ChunkEntities>,
    pub material: Option<Res<'w, VoxelMaterialHandle>>,
    pub player: Query<'w, 's, (&'static Transform, &'static Player)>,
    pub time: Res<'w, Time>,
    pub diag: ResMut<'w, StreamingDiagnostics>,
}

/// Per-frame streaming entry point: harvest finished jobs, guarantee the
/// chunks the physics step needs, dispatch new jobs, evict far chunks.
pub fn stream_chunks(mut ctx: StreamingCtx) {
    if ctx.material.is_none() {
        return;
    }
    let Ok((transform, state)) = ctx.player.get_single() else { return };
    let position = transform.translation;
    let forward = sight_vector(state.yaw, state.pitch);

    harvest_workers(&mut ctx);
    force_chunks(&mut ctx, position);
    dispatch_workers(&mut ctx, position, forward);
    evict_chunks(&mut ctx, position);

    let now = ctx.time.elapsed_seconds_f64();
    if now - ctx.diag.last_log_seconds > 1.0 {
        ctx.diag.last_log_seconds = now;
        let busy = ctx.workers.slots.iter().filter(|s| s.task.is_some()).count();
        debug!(
            "streaming: chunks={} busy_workers={}/{} entities={}",
            ctx.world.chunks.len(),
            busy,
            WORKERS,
            ctx.entities.map.len(),
        );
    }
}

/// Collect finished jobs and apply them. A job whose chunk was evicted
/// while it ran is discarded.
fn harvest_workers(ctx: &mut StreamingCtx) {
    for i in 0..WORKERS {
        let finished = ctx.workers.slots[i]
            .task
            .as_ref()
            .is_some_and(Task::is_finished);
        if !finished {
            continue;
        }
        let task = ctx.workers.slots[i].task.take().expect("slot checked above");
        let item = futures::executor::block_on(task);
        apply_work_item(ctx, item);
    }
}

/// Fold a finished job back into the chunk and swap its render mesh.
fn apply_work_item(ctx: &mut StreamingCtx, mut item: WorkItem) {
    let Some(chunk) = ctx.world.chunks.find_mut(item.p, item.q) else {
        return;
    };
    if item.load {
        chunk.blocks = item.block_maps[1][1].take().expect("load item carries maps");
        chunk.lights = item.light_maps[1][1].take().expect("load item carries maps");
    }
    chunk.miny = item.miny;
    chunk.maxy = item.maxy;
    chunk.faces = item.faces;
    chunk.meshed = true;

    let material = ctx.material.as_ref().expect("checked in stream_chunks").0.clone();
    let key = (item.p, item.q);
    if item.faces == 0 {
        if let Some((entity, handle)) = ctx.entities.map.remove(&key) {
            ctx.commands.entity(entity).despawn();
            ctx.meshes.remove(&handle);
        }
        return;
    }

    let mesh = build_render_mesh(&item.data);
    if let Some((_, handle)) = ctx.entities.map.get(&key) {
        if let Some(existing) = ctx.meshes.get_mut(handle) {
            *existing = mesh;
        }
    } else {
        let handle = ctx.meshes.add(mesh);
        let entity = ctx
            .commands
            .spawn((
                MaterialMeshBundle {
                    mesh: handle.clone(),
                    material,
                    ..default()
                },
                ChunkEntity { p: item.p, q: item.q },
            ))
            .id();
        ctx.entities.map.insert(key, (entity, handle));
    }
}

/// The chunks under and immediately around the player must exist and be
/// meshed before physics runs; build them synchronously when needed.
fn force_chunks(ctx: &mut StreamingCtx, position: Vec3) {
    let p = chunked(position.x);
    let q = chunked(position.z);
    let terrain = ctx.world.terrain();
    for dp in -1..=1 {
        for dq in -1..=1 {
            let (a, b) = (p + dp, q + dq);
            let missing = ctx.world.find_chunk(a, b).is_none();
            if missing && ctx.world.chunks.insert(Chunk::new(a, b)).is_none() {
                continue;
            }
            let chunk = ctx.world.find_chunk(a, b).expect("just ensured");
            if !chunk.dirty && !missing {
                continue;
            }
            let mut item = snapshot_neighborhood(&ctx.world, a, b, missing);
            if item.load {
                terrain.load(&mut item);
            }
            build_mesh(&mut item, terrain.noise());
            if let Some(chunk) = ctx.world.chunks.find_mut(a, b) {
                chunk.dirty = false;
            }
            apply_work_item(ctx, item);
        }
    }
}

/// Give every idle worker its best-scoring chunk.
fn dispatch_workers(ctx: &mut StreamingCtx, position: Vec3, forward: Vec3) {
    let p = chunked(position.x);
    let q = chunked(position.z);
    let r = ctx.view.create_radius;
    let visibility_range = (r * CHUNK_SIZE) as f32 * 2.0;
    let pool = AsyncComputeTaskPool::get();

    for i in 0..WORKERS {
        if ctx.workers.slots[i].task.is_some() {
            continue;
        }
        let mut best: Option<(u32, i32, i32)> = None;
        for dp in -r..=r {
            for dq in -r..=r {
                let (a, b) = (p + dp, q + dq);
                if (a.abs() ^ b.abs()) as usize % WORKERS != i {
                    continue;
                }
                let chunk = ctx.world.find_chunk(a, b);
                if chunk.is_some_and(|c| !c.dirty) {
                    continue;
                }
                let distance = dp.abs().max(dq.abs()) as u32;
                let invisible =
                    !chunk_visible(position, forward, a, b, 0, CHUNK_HEIGHT, visibility_range);
                let priority = chunk.is_some_and(|c| c.meshed && c.dirty);
                let score =
                    (u32::from(invisible) << 24) | (u32::from(priority) << 16) | distance;
                if best.is_none_or(|(s, _, _)| score < s) {
                    best = Some((score, a, b));
                }
            }
        }
        let Some((_, a, b)) = best else { continue };

        let load = ctx.world.find_chunk(a, b).is_none();
        if load && ctx.world.chunks.insert(Chunk::new(a, b)).is_none() {
            continue;
        }
        let item = snapshot_neighborhood(&ctx.world, a, b, load);
        if let Some(chunk) = ctx.world.chunks.find_mut(a, b) {
            chunk.dirty = false;
        }
        let terrain: Arc<TerrainGenerator> = ctx.world.terrain();
        let task = pool.spawn(async move {
            let mut item = item;
            if item.load {
                terrain.load(&mut item);
            }
            build_mesh(&mut item, terrain.noise());
            item
        });
        ctx.workers.slots[i].task = Some(task);
    }
}

/// Deep-copy the 3×3 map neighborhood of `(a, b)` into a fresh `WorkItem`.
fn snapshot_neighborhood(world: &World, a: i32, b: i32, load: bool) -> WorkItem {
    let mut item = WorkItem {
        p: a,
        q: b,
        load,
        block_maps: Default::default(),
        light_maps: Default::default(),
        miny: 0,
        maxy: 0,
        faces: 0,
        data: Vec::new(),
    };
    for dp in -1..=1i32 {
        for dq in -1..=1i32 {
            if let Some(other) = world.find_chunk(a + dp, b + dq) {
                let (x, z) = ((dp + 1) as usize, (dq + 1) as usize);
                item.block_maps[x][z] = Some(other.blocks.clone());
                item.light_maps[x][z] = Some(other.lights.clone());
            }
        }
    }
    if load {
        // A brand-new chunk has empty maps; give the worker fresh ones with
        // the right base offsets to generate into.
        let chunk = Chunk::new(a, b);
        item.block_maps[1][1] = Some(chunk.blocks);
        item.light_maps[1][1] = Some(chunk.lights);
    }
    item
}

/// Drop chunks beyond the delete radius, with their entities and meshes.
fn evict_chunks(ctx: &mut StreamingCtx, position: Vec3) {
    let delete_radius = ctx.view.delete_radius;
    let mut evicted: Vec<(i32, i32)> = Vec::new();
    ctx.world
        .delete_chunks(position, delete_radius, |chunk| evicted.push((chunk.p, chunk.q)));
    for key in evicted {
        if let Some((entity, handle)) = ctx.entities.map.remove(&key) {
            ctx.commands.entity(entity).despawn();
            ctx.meshes.remove(&handle);
        }
    }
}

/// Convert the worker's flat vertex buffer into a render mesh. Components
/// per vertex: position, normal, atlas uv, then (ao, light) packed into a
/// second UV channel for the voxel material.
#[must_use]
pub fn build_render_mesh(data: &[f32]) -> Mesh {
    let count = data.len() / 10;
    let mut positions = Vec::with_capacity(count);
    let mut normals = Vec::with_capacity(count);
    let mut uvs = Vec::with_capacity(count);
    let mut shading = Vec::with_capacity(count);
    for v in data.chunks_exact(10) {
        positions.push([v[0], v[1], v[2]]);
        normals.push([v[3], v[4], v[5]]);
        uvs.push([v[6], v[7]]);
        shading.push([v[8], v[9]]);
    }
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_1, shading);
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::material;

    #[test]
    fn snapshots_are_deep_copies() {
        let mut world = World::new(5);
        world.chunks.insert(Chunk::new(0, 0));
        world
            .chunks
            .find_mut(0, 0)
            .unwrap()
            .blocks
            .set(4, 20, 4, material::STONE);

        let mut item = snapshot_neighborhood(&world, 0, 0, false);
        // Mutating the snapshot leaves the chunk untouched.
        item.block_maps[1][1].as_mut().unwrap().set(4, 20, 4, 0);
        assert_eq!(world.find_chunk(0, 0).unwrap().blocks.get(4, 20, 4), material::STONE);
    }

    #[test]
    fn snapshot_skips_absent_neighbors() {
        let mut world = World::new(5);
        world.chunks.insert(Chunk::new(0, 0));
        world.chunks.insert(Chunk::new(1, 0));
        let item = snapshot_neighborhood(&world, 0, 0, false);
        assert!(item.block_maps[1][1].is_some());
        assert!(item.block_maps[2][1].is_some());
        assert!(item.block_maps[0][1].is_none());
        assert!(item.block_maps[1][0].is_none());
    }

    #[test]
    fn worker_affinity_partitions_coordinates() {
        // Every coordinate maps to exactly one worker slot.
        for a in -20..20i32 {
            for b in -20..20i32 {
                let owners: Vec<usize> = (0..WORKERS)
                    .filter(|&i| (a.abs() ^ b.abs()) as usize % WORKERS == i)
                    .collect();
                assert_eq!(owners.len(), 1);
            }
        }
    }

    #[test]
    fn render_mesh_round_trips_vertex_count() {
        let mut world = World::new(1234);
        let mut chunk = Chunk::new(0, 0);
        world.terrain().generate(&mut chunk.blocks, 0, 0);
        world.chunks.insert(chunk);
        let mut item = snapshot_neighborhood(&world, 0, 0, false);
        build_mesh(&mut item, world.terrain().noise());
        assert!(item.faces > 0);
        let mesh = build_render_mesh(&item.data);
        assert_eq!(mesh.count_vertices(), item.faces * 6);
    }
}
