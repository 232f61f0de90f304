//! Keyboard movement input.
//!
//! Reads the strafe keys into a motion vector and advances the physics step.
//! While flying, vertical motion follows the view pitch the way the walk
//! direction follows yaw.

use bevy::prelude::*;

use crate::chat::TypingState;
use crate::player::physics::movement_step;
use crate::player::Player;
use crate::settings::Settings;
use crate::world::World;

/// Unit motion direction from strafe inputs `sx`/`sz` (-1, 0, 1) and the
/// current view angles. Grounded movement is horizontal only; flying tilts
/// forward motion along the pitch.
#[must_use]
pub fn motion_vector(flying: bool, sz: i32, sx: i32, yaw: f32, pitch: f32) -> Vec3 {
    if sz == 0 && sx == 0 {
        return Vec3::ZERO;
    }
    let strafe = (sz as f32).atan2(sx as f32);
    if flying {
        let mut m = pitch.cos();
        let mut y = pitch.sin();
        if sx != 0 {
            if sz == 0 {
                y = 0.0;
            }
            m = 1.0;
        }
        if sz > 0 {
            y = -y;
        }
        Vec3::new((yaw + strafe).cos() * m, y, (yaw + strafe).sin() * m)
    } else {
        Vec3::new((yaw + strafe).cos(), 0.0, (yaw + strafe).sin())
    }
}

/// Per-frame movement: sample the keys, build the motion vector, and run the
/// collision-resolved physics step.
#[allow(clippy::needless_pass_by_value)]
pub fn player_movement(
    time: Res<Time>,
    world: Res<World>,
    keys: Res<ButtonInput<KeyCode>>,
    settings: Res<Settings>,
    typing: Res<TypingState>,
    mut query: Query<(&mut Transform, &mut Player)>,
) {
    let Ok((mut transform, mut player)) = query.get_single_mut() else { return };

    let mut sx = 0;
    let mut sz = 0;
    let mut jumping = false;
    if !typing.active {
        let key = |name: &str, default| {
            settings
                .controls
                .keybinds
                .get(name)
                .and_then(|s| Settings::keycode_from_str(s))
                .unwrap_or(default)
        };
        if keys.pressed(key("forward", KeyCode::KeyW)) {
            sz -= 1;
        }
        if keys.pressed(key("back", KeyCode::KeyS)) {
            sz += 1;
        }
        if keys.pressed(key("left", KeyCode::KeyA)) {
            sx -= 1;
        }
        if keys.pressed(key("right", KeyCode::KeyD)) {
            sx += 1;
        }
        if keys.just_pressed(key("fly", KeyCode::Tab)) {
            player.flying = !player.flying;
        }
        jumping = keys.pressed(key("jump", KeyCode::Space));
    }

    // dt is clamped so a long hitch can't fling the player through walls.
    let dt = time.delta_seconds().min(0.2);
    let motion = motion_vector(player.flying, sz, sx, player.yaw, player.pitch);
    let flying = player.flying;
    let grounded = movement_step(
        &world,
        &mut transform.translation,
        motion,
        jumping,
        flying,
        &mut player.velocity_y,
        dt,
    );
    player.grounded = grounded;
}
