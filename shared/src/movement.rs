//! Per-frame walker update.
//!
//! The frame is an ordered pipeline of named stages. Every stage reads the result of the
//! previous one, so the obstacle pass always sees this frame's horizontal move and ground
//! clamp.

use bevy::prelude::*;

use crate::actor::ActorState;
use crate::config::{CollisionConfig, MovementConfig};
use crate::input::InputState;
use crate::physics::{apply_jump, clamp_to_ground, integrate_vertical};
use crate::props::CollisionProbe;
use crate::spatial::ObstacleSet;
use crate::terrain::HeightSurface;

/// Everything outside the walker that a frame step reads.
pub struct FrameEnv<'a> {
    pub movement: &'a MovementConfig,
    pub collision: &'a CollisionConfig,
    pub surface: &'a dyn HeightSurface,
    pub obstacles: &'a ObstacleSet,
    pub probe: &'a dyn CollisionProbe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    HorizontalMove,
    Jump,
    Integrate,
    GroundClamp,
    ResolveObstacles,
}

impl FrameStage {
    /// Execution order within one frame.
    pub const ORDER: [FrameStage; 5] = [
        FrameStage::HorizontalMove,
        FrameStage::Jump,
        FrameStage::Integrate,
        FrameStage::GroundClamp,
        FrameStage::ResolveObstacles,
    ];

    pub fn run(self, input: &InputState, actor: &mut ActorState, env: &FrameEnv) {
        match self {
            FrameStage::HorizontalMove => apply_horizontal_move(input, actor, env.movement),
            FrameStage::Jump => apply_jump(input, actor, env.movement),
            FrameStage::Integrate => integrate_vertical(actor, env.movement),
            FrameStage::GroundClamp => {
                clamp_to_ground(actor, env.surface, env.movement);
            }
            FrameStage::ResolveObstacles => {
                resolve_obstacles(actor, env.obstacles, env.probe, env.collision);
            }
        }
    }
}

/// Advance the walker by one frame.
pub fn step_frame(input: &InputState, actor: ActorState, env: &FrameEnv) -> ActorState {
    let mut next = actor;
    for stage in FrameStage::ORDER {
        stage.run(input, &mut next, env);
    }
    next
}

/// Rotate a vector about +Y.
#[inline]
pub fn rotate_y(vector: Vec3, angle: f32) -> Vec3 {
    Quat::from_rotation_y(angle) * vector
}

/// World-space walk displacement for this frame; zero when no net direction is held.
pub fn walk_displacement(input: &InputState, yaw: f32, walk_speed: f32) -> Vec3 {
    let world = rotate_y(input.local_direction(), yaw);
    if world.length_squared() > 0.0 {
        world.normalize() * walk_speed
    } else {
        Vec3::ZERO
    }
}

pub fn apply_horizontal_move(input: &InputState, actor: &mut ActorState, movement: &MovementConfig) {
    actor.position += walk_displacement(input, actor.yaw, movement.walk_speed);
}

/// Overlap of two circles whose centers are `planar_distance` apart.
#[inline]
pub fn penetration_depth(obstacle_radius: f32, actor_radius: f32, planar_distance: f32) -> f32 {
    (obstacle_radius + actor_radius - planar_distance).max(0.0)
}

/// Push the walker out of any trunk it overlaps.
///
/// All obstacles are tested against the walker as it stood at the start of this stage and
/// their corrections are summed. Each correction is only a `damping` share of the depth,
/// so a walker wedged between trunks settles over a few frames instead of jittering.
/// Returns the total displacement applied.
pub fn resolve_obstacles(
    actor: &mut ActorState,
    obstacles: &ObstacleSet,
    probe: &dyn CollisionProbe,
    collision: &CollisionConfig,
) -> Vec3 {
    let start = actor.position;
    let sphere = actor.probe(collision.actor_radius);
    let start_xz = Vec2::new(start.x, start.z);

    let mut correction = Vec3::ZERO;
    for obstacle in obstacles.near(start_xz, collision.actor_radius) {
        if !probe.intersects(&sphere, obstacle, false) {
            continue;
        }
        if !probe.intersects(&sphere, obstacle, true) {
            continue;
        }

        let away = start_xz - obstacle.center_xz();
        let distance = away.length();
        if distance <= f32::EPSILON {
            // Dead center: no direction to push along.
            continue;
        }

        let depth = penetration_depth(obstacle.radius, collision.actor_radius, distance);
        let push = away / distance * depth * collision.damping;
        correction += Vec3::new(push.x, 0.0, push.y);
    }

    if correction != Vec3::ZERO {
        debug!("Obstacle push {:?} at {:?}", correction, start);
    }
    actor.position += correction;
    correction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::{CylinderProbe, Obstacle};
    use crate::MoveKey;
    use std::f32::consts::FRAC_PI_2;

    const EPS: f32 = 1e-5;

    struct Fixture {
        movement: MovementConfig,
        collision: CollisionConfig,
        obstacles: ObstacleSet,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                movement: MovementConfig::default(),
                collision: CollisionConfig::default(),
                obstacles: ObstacleSet::new(),
            }
        }

        fn step(&self, surface: &dyn HeightSurface, input: &InputState, actor: ActorState) -> ActorState {
            let env = FrameEnv {
                movement: &self.movement,
                collision: &self.collision,
                surface,
                obstacles: &self.obstacles,
                probe: &CylinderProbe,
            };
            step_frame(input, actor, &env)
        }
    }

    fn no_ground(_: f32, _: f32) -> Option<f32> {
        None
    }

    fn held(keys: &[MoveKey]) -> InputState {
        let mut input = InputState::default();
        for key in keys {
            input.set(*key, true);
        }
        input
    }

    fn horizontal(v: Vec3) -> Vec2 {
        Vec2::new(v.x, v.z)
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(
            FrameStage::ORDER,
            [
                FrameStage::HorizontalMove,
                FrameStage::Jump,
                FrameStage::Integrate,
                FrameStage::GroundClamp,
                FrameStage::ResolveObstacles,
            ]
        );
    }

    #[test]
    fn test_zero_net_direction_keeps_position() {
        let fx = Fixture::new();
        let combos: [&[MoveKey]; 5] = [
            &[],
            &[MoveKey::Forward, MoveKey::Backward],
            &[MoveKey::Left, MoveKey::Right],
            &[MoveKey::Forward, MoveKey::Backward, MoveKey::Left, MoveKey::Right],
            &[MoveKey::Jump],
        ];
        for keys in combos {
            let mut actor = ActorState::at(Vec3::new(3.0, 100.0, -7.0));
            actor.yaw = 0.7;
            let next = fx.step(&no_ground, &held(keys), actor);
            assert_eq!(horizontal(next.position), horizontal(actor.position), "{keys:?}");
        }
    }

    #[test]
    fn test_single_key_follows_world_axis_at_zero_yaw() {
        let fx = Fixture::new();
        let speed = fx.movement.walk_speed;
        let cases = [
            (MoveKey::Forward, Vec2::new(0.0, -speed)),
            (MoveKey::Backward, Vec2::new(0.0, speed)),
            (MoveKey::Left, Vec2::new(-speed, 0.0)),
            (MoveKey::Right, Vec2::new(speed, 0.0)),
        ];
        for (key, expected) in cases {
            let actor = ActorState::at(Vec3::new(0.0, 100.0, 0.0));
            let next = fx.step(&no_ground, &held(&[key]), actor);
            assert!((horizontal(next.position) - expected).length() < EPS, "{key:?}");
        }
    }

    #[test]
    fn test_yaw_rotates_movement() {
        // Quarter turn left: forward now points along -X.
        let d = walk_displacement(&held(&[MoveKey::Forward]), FRAC_PI_2, 1.0);
        assert!((d - Vec3::NEG_X).length() < EPS);
    }

    #[test]
    fn test_diagonal_is_normalized() {
        let d = walk_displacement(&held(&[MoveKey::Forward, MoveKey::Right]), 0.0, 0.2);
        assert!((d.length() - 0.2).abs() < EPS);
        assert_eq!(d.y, 0.0);
    }

    #[test]
    fn test_velocity_after_airborne_frames() {
        let fx = Fixture::new();
        let mut actor = ActorState::at(Vec3::new(0.0, 500.0, 0.0));
        let input = InputState::default();
        for _ in 0..10 {
            actor = fx.step(&no_ground, &input, actor);
        }
        assert!((actor.vertical_velocity - -fx.movement.gravity * 10.0).abs() < EPS);
        assert!(!actor.grounded);
    }

    #[test]
    fn test_clamp_scenario() {
        let fx = Fixture::new();
        let ground = |_: f32, _: f32| Some(3.0_f32);
        let actor = ActorState::at(Vec3::new(0.0, 5.0, 0.0));
        let next = fx.step(&ground, &InputState::default(), actor);
        assert_eq!(next.position.y, 5.0);
        assert_eq!(next.vertical_velocity, 0.0);
        assert!(next.grounded);
    }

    #[test]
    fn test_jump_then_land() {
        let fx = Fixture::new();
        let ground = |_: f32, _: f32| Some(0.0_f32);
        let jump = held(&[MoveKey::Jump]);

        let mut actor = ActorState::at(Vec3::new(0.0, fx.movement.eye_height, 0.0));
        actor.grounded = true;

        actor = fx.step(&ground, &jump, actor);
        assert!(!actor.grounded);
        let expected = fx.movement.jump_impulse - fx.movement.gravity;
        assert!((actor.vertical_velocity - expected).abs() < EPS);

        // Keep holding jump: rises once, comes back down, lands.
        let mut peak = actor.position.y;
        let mut landed = false;
        for _ in 0..200 {
            actor = fx.step(&ground, &jump, actor);
            peak = peak.max(actor.position.y);
            if actor.grounded {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert!(peak < fx.movement.eye_height + 5.0);
        assert_eq!(actor.position.y, fx.movement.eye_height);
    }

    #[test]
    fn test_walking_off_ledge_clears_grounded() {
        let fx = Fixture::new();
        // Drops twenty units past x = 1.
        let ledge = |x: f32, _: f32| Some(if x < 1.0 { 0.0_f32 } else { -20.0 });

        let mut actor = ActorState::at(Vec3::new(0.9, fx.movement.eye_height, 0.0));
        actor.grounded = true;

        actor = fx.step(&ledge, &held(&[MoveKey::Right]), actor);
        assert!(actor.position.x > 1.0);
        assert!(!actor.grounded);

        // Jump held over the drop: no impulse, still falling.
        actor = fx.step(&ledge, &held(&[MoveKey::Right, MoveKey::Jump]), actor);
        assert!(!actor.grounded);
        assert!((actor.vertical_velocity - -2.0 * fx.movement.gravity).abs() < EPS);
    }

    #[test]
    fn test_obstacle_push_scenario() {
        let collision = CollisionConfig {
            actor_radius: 2.0,
            damping: 0.2,
        };
        let obstacles = ObstacleSet::from_obstacles([Obstacle::new(Vec3::ZERO, 3.0, 16.0)]);
        let mut actor = ActorState::at(Vec3::new(4.0, 2.0, 0.0));

        let push = resolve_obstacles(&mut actor, &obstacles, &CylinderProbe, &collision);
        assert!((push - Vec3::new(0.2, 0.0, 0.0)).length() < EPS);
        assert!((actor.position - Vec3::new(4.2, 2.0, 0.0)).length() < EPS);
    }

    #[test]
    fn test_push_scales_with_penetration() {
        let collision = CollisionConfig::default();
        let radius = 3.0;
        let obstacles = ObstacleSet::from_obstacles([Obstacle::new(Vec3::ZERO, radius, 16.0)]);

        for d in [0.5_f32, 1.5, 3.0, 4.5, 4.99, 5.0, 6.0] {
            // Approach from an arbitrary planar direction.
            let dir = Vec2::new(0.6, -0.8);
            let start = Vec3::new(dir.x * d, 2.0, dir.y * d);
            let mut actor = ActorState::at(start);
            let push = resolve_obstacles(&mut actor, &obstacles, &CylinderProbe, &collision);

            let expected = collision.damping * penetration_depth(radius, collision.actor_radius, d);
            let along = Vec2::new(push.x, push.z).dot(dir);
            assert!((along - expected).abs() < 1e-4, "d = {d}");
            assert!((Vec2::new(push.x, push.z) - dir * along).length() < 1e-4);
            assert_eq!(push.y, 0.0);
        }
    }

    #[test]
    fn test_dead_center_is_noop() {
        let collision = CollisionConfig::default();
        let obstacles = ObstacleSet::from_obstacles([Obstacle::new(Vec3::ZERO, 3.0, 16.0)]);
        let mut actor = ActorState::at(Vec3::new(0.0, 2.0, 0.0));
        let push = resolve_obstacles(&mut actor, &obstacles, &CylinderProbe, &collision);
        assert_eq!(push, Vec3::ZERO);
    }

    #[test]
    fn test_corrections_between_two_trunks_cancel() {
        let collision = CollisionConfig::default();
        let obstacles = ObstacleSet::from_obstacles([
            Obstacle::new(Vec3::new(-4.0, 0.0, 0.0), 3.0, 16.0),
            Obstacle::new(Vec3::new(4.0, 0.0, 0.0), 3.0, 16.0),
        ]);
        let mut actor = ActorState::at(Vec3::new(0.0, 2.0, 0.0));
        let push = resolve_obstacles(&mut actor, &obstacles, &CylinderProbe, &collision);
        assert!(push.length() < EPS);
    }

    #[test]
    fn test_walking_into_trunk_is_held_back() {
        let mut fx = Fixture::new();
        fx.obstacles = ObstacleSet::from_obstacles([Obstacle::new(Vec3::new(0.0, 0.0, -10.0), 2.5, 16.0)]);
        let ground = |_: f32, _: f32| Some(0.0_f32);
        let forward = held(&[MoveKey::Forward]);

        let mut actor = ActorState::at(Vec3::new(0.0, fx.movement.eye_height, 0.0));
        for _ in 0..600 {
            actor = fx.step(&ground, &forward, actor);
        }
        // Never ends up on the far side of the trunk.
        assert!(actor.position.z > -10.0);
    }
}
