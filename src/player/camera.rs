//! Mouse look and cursor capture.

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};
use std::f32::consts::{FRAC_PI_2, TAU};

use crate::chat::TypingState;
use crate::player::Player;
use crate::settings::Settings;

const LOOK_SENSITIVITY: f32 = 0.0025;

/// Direction the player is looking, from yaw and pitch.
#[must_use]
pub fn sight_vector(yaw: f32, pitch: f32) -> Vec3 {
    let m = pitch.cos();
    Vec3::new(
        (yaw - FRAC_PI_2).cos() * m,
        pitch.sin(),
        (yaw - FRAC_PI_2).sin() * m,
    )
}

/// Apply a mouse delta to a player's orientation, wrapping yaw and clamping
/// pitch. Shared between the look system and the benchmarks.
pub fn apply_look_delta(player: &mut Player, delta: Vec2, sensitivity: f32) {
    player.yaw += delta.x * LOOK_SENSITIVITY * sensitivity;
    player.pitch -= delta.y * LOOK_SENSITIVITY * sensitivity;
    player.yaw = player.yaw.rem_euclid(TAU);
    player.pitch = player.pitch.clamp(-FRAC_PI_2, FRAC_PI_2);
}

/// Accumulate mouse motion into yaw/pitch and rotate the camera to match.
#[allow(clippy::needless_pass_by_value)]
pub fn camera_look(
    windows: Query<&Window, With<PrimaryWindow>>,
    motion_events: Res<Events<MouseMotion>>,
    settings: Res<Settings>,
    mut query: Query<(&mut Transform, &mut Player)>,
) {
    let mut delta = Vec2::ZERO;
    for ev in motion_events.iter_current_update_events() {
        let mut axis = ev.delta;
        if settings.controls.invert_x {
            axis.x = -axis.x;
        }
        if settings.controls.invert_y {
            axis.y = -axis.y;
        }
        delta += axis;
    }
    if delta == Vec2::ZERO {
        return;
    }

    let Ok(window) = windows.get_single() else { return };
    if window.cursor.visible {
        return;
    }

    for (mut transform, mut player) in &mut query {
        apply_look_delta(&mut player, delta, settings.controls.mouse_sensitivity);
        transform.rotation = Quat::from_euler(EulerRot::YXZ, -player.yaw, player.pitch, 0.0);
    }
}

/// Narrow the field of view while the zoom key is held.
#[allow(clippy::needless_pass_by_value)]
pub fn camera_zoom(
    keys: Res<ButtonInput<KeyCode>>,
    settings: Res<Settings>,
    typing: Res<TypingState>,
    mut projections: Query<&mut Projection, With<Player>>,
) {
    let Ok(mut projection) = projections.get_single_mut() else { return };
    let zoomed = !typing.active && keys.pressed(KeyCode::KeyZ);
    let fov = if zoomed { 15.0 } else { settings.graphics.fov };
    if let Projection::Perspective(perspective) = projection.as_mut() {
        perspective.fov = fov.to_radians();
    }
}

/// Capture the cursor on click, release it on Escape. While the chat prompt
/// is open, Escape closes the prompt instead.
#[allow(clippy::needless_pass_by_value)]
pub fn cursor_grab(
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mouse: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    typing: Res<TypingState>,
) {
    let Ok(mut window) = windows.get_single_mut() else { return };
    if mouse.just_pressed(MouseButton::Left) && !typing.active {
        window.cursor.grab_mode = CursorGrabMode::Locked;
        window.cursor.visible = false;
    }
    if keys.just_pressed(KeyCode::Escape) && !typing.active {
        window.cursor.grab_mode = CursorGrabMode::None;
        window.cursor.visible = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sight_vector_matches_axes() {
        let forward = sight_vector(0.0, 0.0);
        assert!((forward - Vec3::NEG_Z).length() < 1e-6);

        let right = sight_vector(FRAC_PI_2, 0.0);
        assert!((right - Vec3::X).length() < 1e-6);

        let down = sight_vector(0.3, -FRAC_PI_2);
        assert!((down - Vec3::NEG_Y).length() < 1e-5);
    }

    #[test]
    fn pitch_clamps_and_yaw_wraps() {
        let mut player = Player::default();
        apply_look_delta(&mut player, Vec2::new(10_000.0, -10_000.0), 1.0);
        assert!(player.pitch <= FRAC_PI_2);
        assert!((0.0..TAU).contains(&player.yaw));
    }
}
