//! Pinewalk - first-person walk over a heightmap forest
//!
//! Bevy 0.17

mod forest;
mod input;
mod loading;
mod player;
mod rendering;
mod states;
mod terrain;

use bevy::asset::io::file::FileAssetReader;
use bevy::asset::AssetPlugin;
use bevy::input::InputSystems;
use bevy::prelude::*;
use bevy::window::WindowResolution;
use pinewalk_shared::{InputState, WalkConfig, FIXED_TIMESTEP_HZ};
use pinewalk_shared::config::CONFIG_FILE;
use states::SceneState;

/// Get the asset path - for bundled macOS apps, use path relative to executable
fn get_asset_path() -> String {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let bundled_assets = exe_dir.join("assets");
            if bundled_assets.exists() {
                info!("Using bundled assets at: {:?}", bundled_assets);
                return bundled_assets.to_string_lossy().to_string();
            }
        }
    }
    // Development: resolved against the crate directory like the asset server does
    "assets".to_string()
}

fn main() {
    let asset_path = get_asset_path();
    let config_path = FileAssetReader::get_base_path()
        .join(&asset_path)
        .join(CONFIG_FILE);

    let mut app = App::new();

    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Pinewalk".to_string(),
                    resolution: WindowResolution::new(1280, 720),
                    ..default()
                }),
                ..default()
            })
            .set(AssetPlugin {
                file_path: asset_path,
                ..default()
            }),
    );

    // Logging is up once the plugins are added.
    app.insert_resource(WalkConfig::load_or_default(&config_path));

    app.init_state::<SceneState>();
    app.init_resource::<InputState>();
    app.insert_resource(Time::<Fixed>::from_hz(FIXED_TIMESTEP_HZ));

    app.add_plugins(terrain::TerrainPlugin);
    app.add_plugins(forest::ForestPlugin);
    app.add_plugins(loading::LoadingPlugin);
    app.add_plugins(player::WalkerPlugin);

    app.add_systems(Startup, rendering::setup_rendering);

    // Key state is sampled before the fixed loop so each step sees this frame's keys.
    app.add_systems(PreUpdate, input::handle_keyboard_input.after(InputSystems));

    app.add_systems(
        Update,
        (
            input::grab_cursor,
            input::release_cursor,
            (input::handle_mouse_input, player::sync_camera).chain(),
        )
            .run_if(in_state(SceneState::Ready)),
    );

    app.run();
}
