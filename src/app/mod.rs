pub mod setup;
pub mod sync;

pub use setup::{setup, setup_voxel_material, AtlasTextureHandle};
pub use sync::{sync_clock_settings, sync_view_settings};
