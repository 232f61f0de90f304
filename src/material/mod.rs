pub mod voxel_material;

pub use voxel_material::*;
