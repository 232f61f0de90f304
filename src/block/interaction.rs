//! Player ↔ block interaction.
//!
//! Left click removes the targeted block, right click places the selected
//! material against the targeted face, ctrl+right toggles a light source on
//! the target, middle click picks the target's material into the hotbar.
//! All edits go through `World::set_block`, which handles seam shadows and
//! dirty marking; the streaming scheduler picks the re-mesh up on its own.

use bevy::input::mouse::MouseWheel;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};

use crate::block::{is_destructable, is_obstacle, BlockId, ITEMS};
use crate::chat::TypingState;
use crate::chunk::CHUNK_HEIGHT;
use crate::player::{sight_vector, Player};
use crate::world::World;

/// Accumulated scroll needed before the hotbar steps one slot.
pub const SCROLL_THRESHOLD: f32 = 0.1;

/// Currently selected inventory slot.
#[derive(Resource, Default)]
pub struct Hotbar {
    pub index: usize,
}

impl Hotbar {
    #[must_use]
    pub fn selected(&self) -> BlockId {
        ITEMS[self.index % ITEMS.len()]
    }
}

/// Handle block clicks while the cursor is captured.
#[allow(clippy::needless_pass_by_value)]
pub fn block_interaction(
    mouse: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut hotbar: ResMut<Hotbar>,
    mut world: ResMut<World>,
    player: Query<(&Transform, &Player)>,
) {
    let Ok(window) = windows.get_single() else { return };
    if window.cursor.grab_mode != CursorGrabMode::Locked {
        return;
    }
    let Ok((transform, state)) = player.get_single() else { return };
    let origin = transform.translation;
    let direction = sight_vector(state.yaw, state.pitch);
    let control =
        keys.pressed(KeyCode::ControlLeft) || keys.pressed(KeyCode::ControlRight);

    if mouse.just_pressed(MouseButton::Left) {
        if let Some((hit, hw)) = world.hit_test(origin, direction, false) {
            if hit.y > 0 && hit.y < CHUNK_HEIGHT && is_destructable(hw) {
                world.set_block(hit.x, hit.y, hit.z, 0);
            }
        }
    }

    if mouse.just_pressed(MouseButton::Right) {
        if control {
            if let Some((hit, hw)) = world.hit_test(origin, direction, false) {
                if hit.y > 0 && hit.y < CHUNK_HEIGHT && is_destructable(hw) {
                    world.toggle_light(hit.x, hit.y, hit.z);
                }
            }
        } else if let Some((place, hw)) = world.hit_test(origin, direction, true) {
            let body = IVec3::new(
                origin.x.round() as i32,
                origin.y.round() as i32,
                origin.z.round() as i32,
            );
            if place.y > 0 && place.y < CHUNK_HEIGHT && is_obstacle(hw) && place != body {
                world.set_block(place.x, place.y, place.z, hotbar.selected());
            }
        }
    }

    if mouse.just_pressed(MouseButton::Middle) {
        if let Some((_, hw)) = world.hit_test(origin, direction, false) {
            if let Some(slot) = ITEMS.iter().position(|&w| w == hw) {
                hotbar.index = slot;
            }
        }
    }
}

/// Hotbar selection: number keys, next/prev keys and the scroll wheel.
#[allow(clippy::needless_pass_by_value)]
pub fn hotbar_select(
    mut wheel: EventReader<MouseWheel>,
    keys: Res<ButtonInput<KeyCode>>,
    typing: Res<TypingState>,
    mut hotbar: ResMut<Hotbar>,
    mut accumulated: Local<f32>,
) {
    if !typing.active {
        const DIGITS: [KeyCode; 10] = [
            KeyCode::Digit1,
            KeyCode::Digit2,
            KeyCode::Digit3,
            KeyCode::Digit4,
            KeyCode::Digit5,
            KeyCode::Digit6,
            KeyCode::Digit7,
            KeyCode::Digit8,
            KeyCode::Digit9,
            KeyCode::Digit0,
        ];
        for (slot, key) in DIGITS.iter().enumerate() {
            if keys.just_pressed(*key) && slot < ITEMS.len() {
                hotbar.index = slot;
            }
        }
        if keys.just_pressed(KeyCode::KeyE) {
            hotbar.index = (hotbar.index + 1) % ITEMS.len();
        }
        if keys.just_pressed(KeyCode::KeyR) {
            hotbar.index = hotbar.index.checked_sub(1).unwrap_or(ITEMS.len() - 1);
        }
    }

    for ev in wheel.read() {
        *accumulated += ev.y;
    }
    if *accumulated < -SCROLL_THRESHOLD {
        hotbar.index = (hotbar.index + 1) % ITEMS.len();
        *accumulated = 0.0;
    }
    if *accumulated > SCROLL_THRESHOLD {
        hotbar.index = hotbar.index.checked_sub(1).unwrap_or(ITEMS.len() - 1);
        *accumulated = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hotbar_wraps_in_both_directions() {
        let mut hotbar = Hotbar::default();
        hotbar.index = ITEMS.len() - 1;
        hotbar.index = (hotbar.index + 1) % ITEMS.len();
        assert_eq!(hotbar.index, 0);
        hotbar.index = hotbar.index.checked_sub(1).unwrap_or(ITEMS.len() - 1);
        assert_eq!(hotbar.index, ITEMS.len() - 1);
    }

    #[test]
    fn selected_item_is_always_valid() {
        let mut hotbar = Hotbar::default();
        for i in 0..ITEMS.len() * 2 {
            hotbar.index = i % ITEMS.len();
            assert!(hotbar.selected() > 0);
        }
    }
}
