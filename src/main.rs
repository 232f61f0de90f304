use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::pbr::{ExtendedMaterial, MaterialPlugin, StandardMaterial};
use bevy::prelude::*;
use bevy::window::{PresentMode, Window, WindowPlugin};
use bevy_atmosphere::prelude::AtmospherePlugin;
use bevy_atmosphere::model::AtmosphereModel;

use regolith::block::{block_interaction, hotbar_select, Hotbar};
use regolith::chat::{chat_input, Messages, TypingState};
use regolith::chunk::frustum::cull_chunk_entities;
use regolith::chunk::streaming::{
    stream_chunks, ChunkEntities, MeshWorkers, RenderStats, StreamingDiagnostics, ViewConfig,
};
use regolith::lighting::{daylight_cycle, GameClock};
use regolith::material::VoxelMaterial;
use regolith::player::{camera_look, camera_zoom, cursor_grab, player_movement};
use regolith::settings::loader as settings_loader;
use regolith::ui::{setup_hud, update_chat_text, update_info_text};

mod app;
use app::{setup, setup_voxel_material, sync_clock_settings, sync_view_settings};

fn main() {
    let settings = settings_loader::load_settings();
    let settings_watcher = settings_loader::setup_settings_watcher()
        .unwrap_or_else(|_| settings_loader::SettingsWatcher::stub());

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "regolith".to_string(),
            present_mode: if settings.graphics.vsync {
                PresentMode::AutoVsync
            } else {
                PresentMode::AutoNoVsync
            },
            ..default()
        }),
        ..default()
    }))
    .add_plugins(MaterialPlugin::<ExtendedMaterial<StandardMaterial, VoxelMaterial>>::default())
    .add_plugins(FrameTimeDiagnosticsPlugin);

    app.insert_resource(AtmosphereModel::default());
    if settings.atmosphere.enabled {
        app.add_plugins(AtmospherePlugin)
            .insert_resource(bevy_atmosphere::settings::AtmosphereSettings {
                resolution: settings.atmosphere.resolution,
                dithering: settings.atmosphere.dithering,
                ..default()
            });
    }

    app.insert_resource(settings.clone());
    app.insert_resource(settings_watcher);
    app.insert_resource(ViewConfig::default());
    app.insert_resource(MeshWorkers::default());
    app.insert_resource(ChunkEntities::default());
    app.insert_resource(RenderStats::default());
    app.insert_resource(StreamingDiagnostics::default());
    app.insert_resource(Messages::default());
    app.insert_resource(TypingState::default());
    app.insert_resource(Hotbar::default());
    app.insert_resource(GameClock {
        day_length: settings.world.day_length,
        ..default()
    });

    app.add_systems(Startup, (setup, setup_hud));
    app.add_systems(Update, setup_voxel_material);
    // Streaming runs first so the forced spawn-area chunks exist before the
    // physics step reads them.
    app.add_systems(
        Update,
        (stream_chunks, player_movement, block_interaction).chain(),
    );
    app.add_systems(Update, (camera_look, camera_zoom, cursor_grab, hotbar_select));
    app.add_systems(Update, cull_chunk_entities.after(stream_chunks));
    app.add_systems(Update, daylight_cycle);
    app.add_systems(Update, chat_input);
    app.add_systems(Update, (update_info_text, update_chat_text));
    app.add_systems(
        Update,
        (sync_view_settings, sync_clock_settings, settings_loader::check_settings_changes),
    );

    app.run();
}
