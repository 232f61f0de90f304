//! Player state and systems (look, movement input, physics).

pub mod camera;
pub mod movement;
pub mod physics;

pub use camera::*;
pub use movement::*;
pub use physics::*;

use bevy::prelude::*;

/// Walking speed in blocks per second.
pub const WALK_SPEED: f32 = 5.0;
/// Flying speed in blocks per second.
pub const FLY_SPEED: f32 = 20.0;

/// Component tracking player state used by the movement and physics systems.
/// The entity's `Transform` holds the position; orientation is kept here as
/// yaw/pitch so the sight vector and the render rotation stay in lockstep.
#[derive(Component, Default)]
pub struct Player {
    /// Horizontal view angle in radians, wrapped to `[0, 2π)`.
    pub yaw: f32,
    /// Vertical view angle in radians, clamped to `±90°`.
    pub pitch: f32,
    /// Accumulated vertical velocity from gravity and jumps.
    pub velocity_y: f32,
    pub flying: bool,
    pub grounded: bool,
}
