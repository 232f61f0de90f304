use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bevy::math::{Vec2, Vec3};
use regolith::block::material;
use regolith::chunk::light::light_fill;
use regolith::chunk::mesh::build_mesh;
use regolith::chunk::{Chunk, WorkItem, CHUNK_SIZE, XZ_SIZE, Y_SIZE};
use regolith::map::BlockMap;
use regolith::player::physics::movement_step;
use regolith::player::{apply_look_delta, Player};
use regolith::terrain::TerrainGenerator;
use regolith::world::World;

/// Generate a block of chunks from scratch.
fn bench_terrain_generate(c: &mut Criterion) {
    let generator = TerrainGenerator::new(1234);
    c.bench_function("terrain_generate", |b| {
        b.iter(|| {
            for i in 0..16 {
                let mut map = BlockMap::new((i % 4) * CHUNK_SIZE - 1, 0, (i / 4) * CHUNK_SIZE - 1, 0x7fff);
                generator.generate(&mut map, i % 4, i / 4);
                black_box(map.len());
            }
        })
    });
}

/// Mesh a generated chunk, and for contrast a sparse hand-built one.
fn bench_mesh_build(c: &mut Criterion) {
    let generator = TerrainGenerator::new(1234);

    let mut terrain_blocks = BlockMap::new(-1, 0, -1, 0x7fff);
    generator.generate(&mut terrain_blocks, 0, 0);
    let lights = BlockMap::new(-1, 0, -1, 0xf);

    c.bench_function("mesh_terrain_chunk", |b| {
        b.iter(|| {
            let mut item =
                WorkItem::for_load(0, 0, terrain_blocks.clone(), lights.clone());
            item.load = false;
            build_mesh(&mut item, generator.noise());
            black_box(item.faces);
        })
    });

    let mut sparse = BlockMap::new(-1, 0, -1, 0x7fff);
    for i in 0..64 {
        sparse.set(i % 8 * 4, 20 + i / 8, i / 8 * 4, material::STONE);
    }
    c.bench_function("mesh_sparse_chunk", |b| {
        b.iter(|| {
            let mut item = WorkItem::for_load(0, 0, sparse.clone(), lights.clone());
            item.load = false;
            build_mesh(&mut item, generator.noise());
            black_box(item.faces);
        })
    });
}

/// Flood a full-intensity light through an empty window.
fn bench_light_fill(c: &mut Criterion) {
    let cells = (XZ_SIZE * XZ_SIZE * Y_SIZE) as usize;
    let opaque = vec![false; cells];
    c.bench_function("light_fill", |b| {
        b.iter(|| {
            let mut light = vec![0u8; cells];
            light_fill(
                &opaque,
                &mut light,
                black_box(CHUNK_SIZE + 16),
                black_box(64),
                black_box(CHUNK_SIZE + 16),
                15,
                true,
            );
            black_box(light[0]);
        })
    });
}

/// A second of walking into terrain with gravity and collisions.
fn bench_collision_step(c: &mut Criterion) {
    let mut world = World::new(1234);
    let terrain = world.terrain();
    for p in -1..=1 {
        for q in -1..=1 {
            let mut chunk = Chunk::new(p, q);
            terrain.generate(&mut chunk.blocks, p, q);
            world.chunks.insert(chunk);
        }
    }
    let spawn_y = world.highest_block(8.0, 8.0) as f32 + 2.0;

    c.bench_function("collision_step", |b| {
        b.iter(|| {
            let mut position = Vec3::new(8.0, spawn_y, 8.0);
            let mut vy = 0.0;
            let motion = Vec3::new(0.7, 0.0, 0.7).normalize();
            for _ in 0..60 {
                movement_step(&world, &mut position, motion, false, false, &mut vy, 1.0 / 60.0);
            }
            black_box(position);
        })
    });
}

/// Mouse-look math under a stream of deltas.
fn bench_camera_look(c: &mut Criterion) {
    c.bench_function("camera_look", |b| {
        b.iter(|| {
            let mut player = Player::default();
            let mut state: u32 = 0x1234_5678;
            for _ in 0..1_000usize {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                let dx = ((state >> 16) & 0x7fff) as f32 / 32767.0 * 200.0 - 100.0;
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                let dy = ((state >> 16) & 0x7fff) as f32 / 32767.0 * 200.0 - 100.0;
                apply_look_delta(&mut player, black_box(Vec2::new(dx, dy)), 1.0);
            }
            black_box((player.yaw, player.pitch));
        })
    });
}

criterion_group!(
    benches,
    bench_terrain_generate,
    bench_mesh_build,
    bench_light_fill,
    bench_collision_step,
    bench_camera_look,
);
criterion_main!(benches);
