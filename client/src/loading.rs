//! Scene startup gating and status messages.

use bevy::prelude::*;
use pinewalk_shared::{ObstacleSet, WorldTerrain};

use crate::states::SceneState;

/// Marker for the centered status text.
#[derive(Component)]
pub struct StatusText;

pub struct LoadingPlugin;

impl Plugin for LoadingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(SceneState::Loading), |commands: Commands| {
            spawn_status(commands, "Loading...")
        });
        app.add_systems(OnExit(SceneState::Loading), despawn_status);
        app.add_systems(OnEnter(SceneState::Failed), report_failure);
        app.add_systems(Update, finish_loading.run_if(in_state(SceneState::Loading)));
    }
}

/// Move to `Ready` once the terrain and the forest exist.
pub fn finish_loading(
    terrain: Option<Res<WorldTerrain>>,
    obstacles: Option<Res<ObstacleSet>>,
    mut next_state: ResMut<NextState<SceneState>>,
) {
    if let (Some(_), Some(obstacles)) = (terrain, obstacles) {
        info!("Scene ready with {} obstacles", obstacles.len());
        next_state.set(SceneState::Ready);
    }
}

fn report_failure(commands: Commands) {
    error!("Scene failed to load; see errors above");
    spawn_status(commands, "Failed to load the scene. Check the log for details.");
}

fn spawn_status(mut commands: Commands, message: &str) {
    commands.spawn((
        Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            ..default()
        },
        StatusText,
        children![(
            Text::new(message),
            TextFont {
                font_size: 28.0,
                ..default()
            },
            TextColor(Color::srgb(0.15, 0.2, 0.25)),
        )],
    ));
}

fn despawn_status(mut commands: Commands, status: Query<Entity, With<StatusText>>) {
    for entity in &status {
        commands.entity(entity).despawn();
    }
}
