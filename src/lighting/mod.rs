//! Day/night cycle.
//!
//! Pure time-of-day math plus the per-frame system that applies it to the
//! sun light, the atmosphere dome and the shared voxel material. One full
//! day lasts `DAY_LENGTH` seconds; the clock starts a third of the way in
//! so a fresh world opens in morning light.

use bevy::pbr::{ExtendedMaterial, StandardMaterial};
use bevy::prelude::*;
use bevy_atmosphere::prelude::*;

use crate::chunk::streaming::ViewConfig;
use crate::chunk::CHUNK_SIZE;
use crate::material::{VoxelMaterial, VoxelMaterialHandle};

/// Seconds per in-game day.
pub const DAY_LENGTH: f32 = 600.0;

/// In-game clock. `elapsed` advances with real time; a non-positive
/// `day_length` pins the world at permanent noon.
#[derive(Resource)]
pub struct GameClock {
    pub elapsed: f32,
    pub day_length: f32,
}

impl Default for GameClock {
    fn default() -> Self {
        GameClock {
            // Start mid-morning rather than at midnight.
            elapsed: DAY_LENGTH / 3.0,
            day_length: DAY_LENGTH,
        }
    }
}

impl GameClock {
    /// Fraction of the day in `[0, 1)`.
    #[must_use]
    pub fn time_of_day(&self) -> f32 {
        if self.day_length <= 0.0 {
            return 0.5;
        }
        (self.elapsed / self.day_length).fract()
    }
}

/// Daylight factor in `[0, 1]` for a time-of-day fraction: a steep logistic
/// ramp up at dawn (t ≈ 0.25) and down at dusk (t ≈ 0.85).
#[must_use]
pub fn daylight(t: f32) -> f32 {
    if t < 0.5 {
        let x = (t - 0.25) * 100.0;
        1.0 / (1.0 + 2f32.powf(-x))
    } else {
        let x = (t - 0.85) * 100.0;
        1.0 - 1.0 / (1.0 + 2f32.powf(-x))
    }
}

/// Marker for the sun's directional light.
#[derive(Component)]
pub struct Sun;

/// Advance the clock and apply the daylight factor to the sun, the
/// atmosphere and the voxel material uniforms.
#[allow(clippy::needless_pass_by_value)]
pub fn daylight_cycle(
    time: Res<Time>,
    mut clock: ResMut<GameClock>,
    view: Res<ViewConfig>,
    mut atmosphere: AtmosphereMut<Nishita>,
    mut suns: Query<(&mut Transform, &mut DirectionalLight), With<Sun>>,
    materials: Option<ResMut<Assets<ExtendedMaterial<StandardMaterial, VoxelMaterial>>>>,
    handle: Option<Res<VoxelMaterialHandle>>,
) {
    clock.elapsed += time.delta_seconds();
    let t = clock.time_of_day();
    let light = daylight(t);

    // Sun sweeps from the dawn horizon (t = 0.25) over the sky.
    let angle = (t - 0.25) * std::f32::consts::TAU;
    let sun_position = Vec3::new(0.0, angle.sin(), angle.cos());
    atmosphere.sun_position = sun_position;

    if let Ok((mut transform, mut directional)) = suns.get_single_mut() {
        *transform =
            Transform::from_translation(sun_position * 500.0).looking_at(Vec3::ZERO, Vec3::Y);
        directional.illuminance = 1_000.0 + light * 9_000.0;
    }

    if let (Some(mut materials), Some(handle)) = (materials, handle) {
        if let Some(material) = materials.get_mut(&handle.0) {
            material.extension.daylight = light;
            material.extension.fog_distance = (view.render_radius * CHUNK_SIZE) as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daylight_is_bright_at_noon_and_dark_at_midnight() {
        assert!(daylight(0.5) > 0.99);
        assert!(daylight(0.0) < 0.01);
        assert!(daylight(0.99) < 0.01);
    }

    #[test]
    fn dawn_and_dusk_are_transitions() {
        assert!((daylight(0.25) - 0.5).abs() < 1e-3);
        assert!((daylight(0.85) - 0.5).abs() < 1e-3);
        assert!(daylight(0.3) > 0.9);
        assert!(daylight(0.9) < 0.1);
    }

    #[test]
    fn clock_wraps_and_supports_frozen_time() {
        let mut clock = GameClock::default();
        clock.elapsed = clock.day_length * 2.25;
        assert!((clock.time_of_day() - 0.25).abs() < 1e-6);
        clock.day_length = 0.0;
        assert_eq!(clock.time_of_day(), 0.5);
    }
}
