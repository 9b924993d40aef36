//! Lights, sky color and the scene camera.

use bevy::prelude::*;
use pinewalk_shared::WalkConfig;

/// Pale sky behind everything.
pub const SKY_COLOR: Color = Color::srgb(0.9, 0.95, 1.0);

/// Marker for the sun directional light
#[derive(Component)]
pub struct SunLight;

/// One-time rendering setup.
pub fn setup_rendering(mut commands: Commands, config: Res<WalkConfig>) {
    commands.insert_resource(ClearColor(SKY_COLOR));

    // Soft sky fill from above.
    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.95, 0.97, 1.0),
        brightness: 600.0,
        affects_lightmapped_meshes: true,
    });

    commands.spawn((
        DirectionalLight {
            illuminance: 3_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(1.0, 1.0, 1.0).looking_at(Vec3::ZERO, Vec3::Y),
        SunLight,
    ));

    // Becomes the walker once the scene is ready.
    let spawn = Vec3::from_array(config.movement.spawn);
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            far: 4_000.0,
            ..default()
        }),
        Transform::from_translation(spawn),
    ));
}
