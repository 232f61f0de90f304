//! Startup wiring: world creation, player spawn, sun, material.

use bevy::pbr::{ExtendedMaterial, StandardMaterial};
use bevy::prelude::*;
use bevy_atmosphere::prelude::AtmosphereCamera;

use regolith::chunk::Chunk;
use regolith::lighting::Sun;
use regolith::material::{VoxelMaterial, VoxelMaterialHandle};
use regolith::player::Player;
use regolith::settings::Settings;
use regolith::world::World;

/// Handle to the block texture atlas image.
#[derive(Resource)]
pub struct AtlasTextureHandle(pub Handle<Image>);

/// Create the world, generate the spawn chunks synchronously so the player
/// has ground under them on the first physics step, and spawn the core
/// entities.
#[allow(clippy::needless_pass_by_value, clippy::cast_precision_loss)]
pub fn setup(mut commands: Commands, asset_server: Res<AssetServer>, settings: Res<Settings>) {
    let mut world = World::new(settings.world.seed);
    let terrain = world.terrain();
    for p in -1..=1 {
        for q in -1..=1 {
            let mut chunk = Chunk::new(p, q);
            terrain.generate(&mut chunk.blocks, p, q);
            world.chunks.insert(chunk);
        }
    }
    let spawn_y = world.highest_block(0.0, 0.0) as f32 + 2.0;
    commands.insert_resource(world);

    commands.spawn((
        Camera3dBundle {
            transform: Transform::from_xyz(0.0, spawn_y, 0.0),
            projection: PerspectiveProjection {
                fov: settings.graphics.fov.to_radians(),
                ..default()
            }
            .into(),
            ..default()
        },
        Player::default(),
        AtmosphereCamera::default(),
    ));

    commands.spawn((
        DirectionalLightBundle {
            directional_light: DirectionalLight {
                illuminance: 10_000.0,
                shadows_enabled: false,
                ..default()
            },
            transform: Transform::from_xyz(0.0, 500.0, 0.0).looking_at(Vec3::ZERO, Vec3::Y),
            ..default()
        },
        Sun,
    ));

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 400.0,
    });

    commands.insert_resource(AtlasTextureHandle(asset_server.load("textures/terrain.png")));
}

/// Create the shared voxel material once the atlas handle exists. Runs
/// every frame until it succeeds, then becomes a no-op.
#[allow(clippy::needless_pass_by_value)]
pub fn setup_voxel_material(
    mut commands: Commands,
    mut materials: ResMut<Assets<ExtendedMaterial<StandardMaterial, VoxelMaterial>>>,
    atlas: Option<Res<AtlasTextureHandle>>,
    existing: Option<Res<VoxelMaterialHandle>>,
) {
    if existing.is_some() {
        return;
    }
    let Some(atlas) = atlas else { return };

    let material = ExtendedMaterial {
        base: StandardMaterial {
            base_color: Color::WHITE,
            perceptual_roughness: 1.0,
            metallic: 0.0,
            reflectance: 0.0,
            ..default()
        },
        extension: VoxelMaterial {
            atlas: atlas.0.clone(),
            daylight: 1.0,
            fog_distance: 256.0,
        },
    };
    commands.insert_resource(VoxelMaterialHandle(materials.add(material)));
}
