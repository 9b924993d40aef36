//! The walking camera

use bevy::prelude::*;
use pinewalk_shared::{
    step_frame, ActorState, CylinderProbe, FrameEnv, InputState, ObstacleSet, WalkConfig,
    WorldTerrain,
};

use crate::states::SceneState;

/// Marks the camera driven by the movement loop.
#[derive(Component)]
pub struct Walker;

/// Walker spawn and the fixed-rate step. Nothing moves before the scene is `Ready`.
pub struct WalkerPlugin;

impl Plugin for WalkerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(SceneState::Ready), attach_walker);
        app.add_systems(FixedUpdate, step_walker.run_if(in_state(SceneState::Ready)));
    }
}

/// Turn the scene camera into the walker once everything is loaded.
pub fn attach_walker(
    mut commands: Commands,
    config: Res<WalkConfig>,
    camera: Query<Entity, (With<Camera3d>, Without<Walker>)>,
) {
    let Ok(entity) = camera.single() else {
        warn!("No scene camera to attach the walker to");
        return;
    };

    let actor = ActorState::at(Vec3::from_array(config.movement.spawn));
    info!("Walker spawned at {:?}", actor.position);
    commands.entity(entity).insert((
        Walker,
        actor,
        Transform::from_translation(actor.position).with_rotation(actor.view_rotation()),
    ));
}

/// Advance the walker by one fixed frame.
pub fn step_walker(
    input: Res<InputState>,
    config: Res<WalkConfig>,
    terrain: Res<WorldTerrain>,
    obstacles: Res<ObstacleSet>,
    mut walker: Query<&mut ActorState, With<Walker>>,
) {
    let Ok(mut actor) = walker.single_mut() else {
        return;
    };

    let env = FrameEnv {
        movement: &config.movement,
        collision: &config.collision,
        surface: &*terrain,
        obstacles: &obstacles,
        probe: &CylinderProbe,
    };
    *actor = step_frame(&input, *actor, &env);
}

/// Copy the walker state onto its camera transform.
pub fn sync_camera(mut walker: Query<(&ActorState, &mut Transform), (With<Walker>, Changed<ActorState>)>) {
    for (actor, mut transform) in &mut walker {
        transform.translation = actor.position;
        transform.rotation = actor.view_rotation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use bevy::state::app::StatesPlugin;
    use pinewalk_shared::{HeightField, HeightFieldSettings, Obstacle};

    fn flat_terrain(height: f32) -> WorldTerrain {
        let settings = HeightFieldSettings {
            width: 100.0,
            length: 100.0,
            subdivisions: 4,
            min_height: 0.0,
            max_height: 10.0,
        };
        let side = settings.vertices_per_side();
        let field = HeightField::from_heights(settings, vec![height; side * side])
            .expect("valid flat field");
        WorldTerrain { field }
    }

    fn walker_world(start: Vec3) -> (World, Entity) {
        let mut world = World::new();
        world.insert_resource(InputState::default());
        world.insert_resource(WalkConfig::default());
        world.insert_resource(flat_terrain(1.0));
        world.insert_resource(ObstacleSet::new());
        let entity = world
            .spawn((Walker, ActorState::at(start), Transform::default()))
            .id();
        (world, entity)
    }

    #[test]
    fn test_walker_falls_and_lands() {
        let (mut world, entity) = walker_world(Vec3::new(0.0, 30.0, 0.0));
        for _ in 0..400 {
            world.run_system_once(step_walker).expect("step runs");
        }
        let actor = *world.get::<ActorState>(entity).expect("walker state");
        let eye = WalkConfig::default().movement.eye_height;
        assert!(actor.grounded);
        assert_eq!(actor.position.y, 1.0 + eye);
        assert_eq!(actor.vertical_velocity, 0.0);
    }

    #[test]
    fn test_walker_is_pushed_out_of_trunk() {
        let (mut world, entity) = walker_world(Vec3::new(4.0, 3.0, 0.0));
        world.insert_resource(ObstacleSet::from_obstacles([Obstacle::new(
            Vec3::new(0.0, 1.0, 0.0),
            3.0,
            16.0,
        )]));
        world.run_system_once(step_walker).expect("step runs");
        let actor = *world.get::<ActorState>(entity).expect("walker state");
        assert!(actor.position.x > 4.0);
        assert!(actor.position.z.abs() < 1e-6);
    }

    #[test]
    fn test_walker_frozen_until_ready() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin));
        app.init_state::<SceneState>();
        app.add_plugins(WalkerPlugin);
        app.init_resource::<InputState>();
        app.insert_resource(WalkConfig::default());
        app.insert_resource(flat_terrain(1.0));
        app.insert_resource(ObstacleSet::new());
        let start = ActorState::at(Vec3::new(0.0, 30.0, 0.0));
        let entity = app.world_mut().spawn((Walker, start, Transform::default())).id();

        app.update();
        for _ in 0..10 {
            app.world_mut().run_schedule(FixedUpdate);
        }
        assert_eq!(*app.world().get::<ActorState>(entity).expect("walker state"), start);

        app.world_mut()
            .resource_mut::<NextState<SceneState>>()
            .set(SceneState::Ready);
        app.update();
        app.world_mut().run_schedule(FixedUpdate);
        let actor = *app.world().get::<ActorState>(entity).expect("walker state");
        assert!(actor.position.y < start.position.y);
    }

    #[test]
    fn test_sync_camera_follows_actor() {
        let (mut world, entity) = walker_world(Vec3::new(0.0, 30.0, 0.0));
        {
            let mut actor = world.get_mut::<ActorState>(entity).expect("walker state");
            actor.position = Vec3::new(1.0, 2.0, 3.0);
            actor.yaw = 0.5;
        }
        world.run_system_once(sync_camera).expect("sync runs");
        let transform = world.get::<Transform>(entity).expect("transform");
        assert_eq!(transform.translation, Vec3::new(1.0, 2.0, 3.0));
        assert!(transform.rotation.angle_between(Quat::from_rotation_y(0.5)) < 1e-5);
    }
}
