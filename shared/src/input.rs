//! Held-key snapshot read by the frame step.

use bevy::prelude::*;

/// Keys the walker reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKey {
    Forward,
    Backward,
    Left,
    Right,
    Jump,
}

/// Which movement keys are currently held.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl InputState {
    pub fn set(&mut self, key: MoveKey, held: bool) {
        match key {
            MoveKey::Forward => self.forward = held,
            MoveKey::Backward => self.backward = held,
            MoveKey::Left => self.left = held,
            MoveKey::Right => self.right = held,
            MoveKey::Jump => self.jump = held,
        }
    }

    pub fn is_held(&self, key: MoveKey) -> bool {
        match key {
            MoveKey::Forward => self.forward,
            MoveKey::Backward => self.backward,
            MoveKey::Left => self.left,
            MoveKey::Right => self.right,
            MoveKey::Jump => self.jump,
        }
    }

    /// Un-normalized movement direction in the walker's local frame.
    ///
    /// In Bevy: +X is right, +Y is up, -Z is forward. Opposing keys cancel out.
    pub fn local_direction(&self) -> Vec3 {
        let mut direction = Vec3::ZERO;
        if self.forward {
            direction.z -= 1.0;
        }
        if self.backward {
            direction.z += 1.0;
        }
        if self.right {
            direction.x += 1.0;
        }
        if self.left {
            direction.x -= 1.0;
        }
        direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_query() {
        let mut input = InputState::default();
        input.set(MoveKey::Jump, true);
        input.set(MoveKey::Left, true);
        assert!(input.is_held(MoveKey::Jump));
        assert!(input.is_held(MoveKey::Left));
        assert!(!input.is_held(MoveKey::Forward));

        input.set(MoveKey::Jump, false);
        assert!(!input.jump);
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let mut input = InputState::default();
        input.set(MoveKey::Forward, true);
        input.set(MoveKey::Backward, true);
        input.set(MoveKey::Left, true);
        input.set(MoveKey::Right, true);
        assert_eq!(input.local_direction(), Vec3::ZERO);
    }

    #[test]
    fn test_diagonal_direction() {
        let input = InputState {
            forward: true,
            right: true,
            ..default()
        };
        assert_eq!(input.local_direction(), Vec3::new(1.0, 0.0, -1.0));
    }
}
