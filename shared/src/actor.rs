//! The walker's camera state.

use bevy::prelude::*;

use crate::props::ActorProbe;

/// Position, look angles and vertical motion of the walker.
///
/// `position` is the eye (camera) position; the feet are `eye_height` below it.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ActorState {
    pub position: Vec3,
    /// Rotation around +Y in radians.
    pub yaw: f32,
    /// Rotation around the local X axis in radians.
    pub pitch: f32,
    pub vertical_velocity: f32,
    /// True when the last ground clamp stage found ground contact. Cleared by a jump.
    pub grounded: bool,
}

impl ActorState {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            vertical_velocity: 0.0,
            grounded: false,
        }
    }

    /// Apply one pointer-motion event to the look angles.
    ///
    /// Applied immediately and without smoothing. Pitch is only clamped when a limit is given.
    pub fn apply_look(&mut self, delta: Vec2, sensitivity: f32, pitch_limit: Option<f32>) {
        self.yaw -= delta.x * sensitivity;
        self.pitch -= delta.y * sensitivity;
        if let Some(limit) = pitch_limit {
            self.pitch = self.pitch.clamp(-limit, limit);
        }
    }

    /// Camera orientation for the current look angles.
    pub fn view_rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Collision sphere centered on the eye.
    pub fn probe(&self, radius: f32) -> ActorProbe {
        ActorProbe {
            center: self.position,
            radius,
        }
    }
}

impl Default for ActorState {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_look_accumulates() {
        let mut actor = ActorState::default();
        actor.apply_look(Vec2::new(100.0, -50.0), 0.002, None);
        actor.apply_look(Vec2::new(100.0, -50.0), 0.002, None);
        assert!((actor.yaw - -0.4).abs() < 1e-6);
        assert!((actor.pitch - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_pitch_unclamped_by_default() {
        let mut actor = ActorState::default();
        actor.apply_look(Vec2::new(0.0, -1000.0), 0.002, None);
        assert!(actor.pitch > FRAC_PI_2);
    }

    #[test]
    fn test_pitch_limit() {
        let mut actor = ActorState::default();
        actor.apply_look(Vec2::new(0.0, -1000.0), 0.002, Some(1.5));
        assert_eq!(actor.pitch, 1.5);
        actor.apply_look(Vec2::new(0.0, 5000.0), 0.002, Some(1.5));
        assert_eq!(actor.pitch, -1.5);
    }

    #[test]
    fn test_view_rotation_faces_forward_at_rest() {
        let actor = ActorState::default();
        let forward = actor.view_rotation() * Vec3::NEG_Z;
        assert!((forward - Vec3::NEG_Z).length() < 1e-6);
    }
}
