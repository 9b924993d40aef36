//! Vertical motion: jump impulse, gravity, and clamping to the terrain.
//!
//! This is intentionally lightweight (height-sampled terrain, per-frame Euler steps).
//! Units are per fixed frame; see `player::FIXED_TIMESTEP_HZ`.

use crate::actor::ActorState;
use crate::config::MovementConfig;
use crate::input::InputState;
use crate::terrain::HeightSurface;

/// Start a jump if the key is held and the walker is standing on something.
///
/// Holding jump in the air does nothing, so keeping the key down can't climb forever.
pub fn apply_jump(input: &InputState, actor: &mut ActorState, movement: &MovementConfig) {
    if input.jump && actor.grounded {
        actor.vertical_velocity = movement.jump_impulse;
        actor.grounded = false;
    }
}

/// One Euler step under constant gravity.
pub fn integrate_vertical(actor: &mut ActorState, movement: &MovementConfig) {
    actor.vertical_velocity -= movement.gravity;
    actor.position.y += actor.vertical_velocity;
}

/// Snap the walker onto the ground if its feet are at or below the surface.
///
/// Returns whether a clamp happened. `grounded` ends up true only on a clamp, so the jump
/// stage of the next frame sees whether this frame touched ground. No height data at the
/// current position means no correction and counts as no contact.
pub fn clamp_to_ground(
    actor: &mut ActorState,
    surface: &dyn HeightSurface,
    movement: &MovementConfig,
) -> bool {
    let touching = surface
        .height_at(actor.position.x, actor.position.z)
        .filter(|ground| actor.position.y - movement.eye_height <= *ground);

    match touching {
        Some(ground) => {
            actor.vertical_velocity = 0.0;
            actor.position.y = ground + movement.eye_height;
            actor.grounded = true;
            true
        }
        None => {
            actor.grounded = false;
            false
        }
    }
}
