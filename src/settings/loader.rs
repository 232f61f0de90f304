//! Settings loading and hot-reloading.
//!
//! Settings come from RON files in `data/settings`. When several files are
//! present the first that parses wins; when none do, defaults apply.

use bevy::prelude::{Res, ResMut, Resource};

use crate::ron::{load_ron_files, setup_ron_watcher, RonWatcher};
use crate::settings::Settings;

const SETTINGS_DIR: &str = "data/settings";

#[derive(Resource)]
pub struct SettingsWatcher(pub RonWatcher);

impl SettingsWatcher {
    #[must_use]
    pub fn stub() -> Self {
        SettingsWatcher(RonWatcher::stub())
    }
}

/// Load settings from the settings directory, falling back to defaults.
#[must_use]
pub fn load_settings() -> Settings {
    load_ron_files::<Settings>(SETTINGS_DIR)
        .into_iter()
        .next()
        .unwrap_or_default()
}

/// Create the hot-reload watcher for the settings directory.
///
/// # Errors
/// Propagates the `notify` error when the directory can't be watched.
pub fn setup_settings_watcher() -> Result<SettingsWatcher, notify::Error> {
    setup_ron_watcher(SETTINGS_DIR).map(SettingsWatcher)
}

/// Reload the settings resource when the watcher reports a change.
#[allow(clippy::needless_pass_by_value)]
pub fn check_settings_changes(watcher: Res<SettingsWatcher>, mut settings: ResMut<Settings>) {
    let Ok(mut flag) = watcher.0.changed.lock() else {
        return;
    };
    if *flag {
        bevy::log::info!("settings changed, reloading");
        *settings = load_settings();
        *flag = false;
    }
}
