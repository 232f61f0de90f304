//! Render material for chunk meshes.
//!
//! Chunk vertices carry the atlas UV in the first UV channel and the baked
//! (ao, light) pair in the second. The material extension samples the
//! atlas and folds ambient occlusion, point-light intensity and the global
//! daylight factor into the fragment color; distant fragments fade toward
//! the fog color at the edge of the render radius.

use bevy::asset::Asset;
use bevy::pbr::{ExtendedMaterial, MaterialExtension, StandardMaterial};
use bevy::prelude::*;
use bevy::render::render_resource::{AsBindGroup, ShaderRef};

/// Extension over `StandardMaterial` applied to every chunk mesh.
///
/// Binding slots are fixed; `shaders/voxel_material.wgsl` relies on them.
#[derive(AsBindGroup, Asset, TypePath, Clone, Default)]
pub struct VoxelMaterial {
    /// The 16×16-tile block texture atlas.
    #[texture(100, dimension = "2d")]
    #[sampler(101)]
    pub atlas: Handle<Image>,

    /// Current daylight factor in `[0, 1]`.
    #[uniform(102)]
    pub daylight: f32,

    /// Distance at which fragments are fully fogged, in blocks.
    #[uniform(103)]
    pub fog_distance: f32,
}

impl MaterialExtension for VoxelMaterial {
    fn fragment_shader() -> ShaderRef {
        "shaders/voxel_material.wgsl".into()
    }
}

/// Shared handle to the one voxel material all chunk entities use.
#[derive(Resource)]
pub struct VoxelMaterialHandle(pub Handle<ExtendedMaterial<StandardMaterial, VoxelMaterial>>);
