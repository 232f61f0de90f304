//! HUD: info line, chat log, typing prompt and crosshair.

use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;

use crate::chat::{Messages, TypingState};
use crate::chunk::chunked;
use crate::chunk::streaming::RenderStats;
use crate::lighting::GameClock;
use crate::player::Player;
use crate::world::World;

/// Marker for the top-left status line.
#[derive(Component)]
pub struct InfoText;

/// Marker for the chat log + typing prompt block.
#[derive(Component)]
pub struct ChatText;

#[derive(Resource)]
pub struct HudTimer(pub Timer);

impl Default for HudTimer {
    fn default() -> Self {
        HudTimer(Timer::from_seconds(0.25, TimerMode::Repeating))
    }
}

/// Spawn the HUD nodes.
pub fn setup_hud(mut commands: Commands) {
    commands.insert_resource(HudTimer::default());

    let style = TextStyle {
        font_size: 16.0,
        color: Color::WHITE,
        ..default()
    };

    commands.spawn((
        TextBundle::from_section(String::new(), style.clone()).with_style(Style {
            position_type: PositionType::Absolute,
            top: Val::Px(6.0),
            left: Val::Px(8.0),
            ..default()
        }),
        InfoText,
    ));

    commands.spawn((
        TextBundle::from_section(String::new(), style.clone()).with_style(Style {
            position_type: PositionType::Absolute,
            bottom: Val::Px(8.0),
            left: Val::Px(8.0),
            ..default()
        }),
        ChatText,
    ));

    // Text crosshair; cheap and resolution independent.
    commands.spawn(
        TextBundle::from_section("+", TextStyle { font_size: 22.0, ..style })
            .with_style(Style {
                position_type: PositionType::Absolute,
                top: Val::Percent(50.0),
                left: Val::Percent(50.0),
                ..default()
            }),
    );
}

/// Format the in-game clock as an hour with an am/pm suffix.
#[must_use]
pub fn clock_label(time_of_day: f32) -> String {
    let hour = (time_of_day * 24.0) as i32;
    let suffix = if hour < 12 { 'a' } else { 'p' };
    let hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{hour}{suffix}m")
}

/// Refresh the status line a few times per second.
#[allow(clippy::needless_pass_by_value)]
pub fn update_info_text(
    time: Res<Time>,
    mut timer: ResMut<HudTimer>,
    diagnostics: Res<DiagnosticsStore>,
    world: Res<World>,
    stats: Res<RenderStats>,
    clock: Res<GameClock>,
    player: Query<&Transform, With<Player>>,
    mut query: Query<&mut Text, With<InfoText>>,
) {
    if !timer.0.tick(time.delta()).just_finished() {
        return;
    }
    let Ok(mut text) = query.get_single_mut() else { return };
    let Ok(transform) = player.get_single() else { return };

    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(bevy::diagnostic::Diagnostic::smoothed)
        .unwrap_or(0.0);
    let pos = transform.translation;
    text.sections[0].value = format!(
        "({}, {}) ({:.2}, {:.2}, {:.2}) [{}, {}] {} {:.0}fps",
        chunked(pos.x),
        chunked(pos.z),
        pos.x,
        pos.y,
        pos.z,
        world.chunks.len(),
        stats.faces * 2,
        clock_label(clock.time_of_day()),
        fps,
    );
}

/// Mirror the chat log and the typing prompt into the HUD.
#[allow(clippy::needless_pass_by_value)]
pub fn update_chat_text(
    messages: Res<Messages>,
    typing: Res<TypingState>,
    mut query: Query<&mut Text, With<ChatText>>,
) {
    let Ok(mut text) = query.get_single_mut() else { return };
    let mut lines: Vec<&str> = messages.iter().collect();
    let prompt;
    if typing.active {
        prompt = format!("> {}", typing.buffer);
        lines.push(&prompt);
    }
    text.sections[0].value = lines.join("\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_label_covers_the_day() {
        assert_eq!(clock_label(0.0), "12am");
        assert_eq!(clock_label(0.25), "6am");
        assert_eq!(clock_label(0.5), "12pm");
        assert_eq!(clock_label(0.75), "6pm");
    }
}
