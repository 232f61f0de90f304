//! Runtime re-configuration from the hot-reloaded settings.

use bevy::prelude::*;

use regolith::chunk::streaming::ViewConfig;
use regolith::lighting::GameClock;
use regolith::settings::Settings;

/// Push `graphics.render_distance` into the live view radii. Only applies
/// when the setting itself changes, so `/view` keeps working between
/// settings edits.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_view_settings(
    settings: Res<Settings>,
    mut view: ResMut<ViewConfig>,
    mut last: Local<Option<u32>>,
) {
    let r = settings.graphics.render_distance;
    if *last == Some(r) {
        return;
    }
    let radius = (r as i32).clamp(1, 24);
    view.create_radius = radius;
    view.render_radius = radius;
    view.delete_radius = radius + 4;
    *last = Some(r);
}

/// Keep the in-game clock's day length in sync with the settings file.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_clock_settings(settings: Res<Settings>, mut clock: ResMut<GameClock>) {
    if (clock.day_length - settings.world.day_length).abs() > f32::EPSILON {
        clock.day_length = settings.world.day_length;
    }
}
