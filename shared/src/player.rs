//! Walker tuning defaults.
//!
//! All movement values are per fixed frame (the simulation runs at `FIXED_TIMESTEP_HZ`),
//! so a walk speed of 0.2 means 0.2 units every 1/60 s.

/// Fixed simulation rate the per-frame constants are tuned for.
pub const FIXED_TIMESTEP_HZ: f64 = 60.0;

/// Horizontal distance covered per frame while a movement key is held.
pub const WALK_SPEED: f32 = 0.2;

/// Subtracted from vertical velocity every frame.
pub const GRAVITY: f32 = 0.03;

/// Upward velocity set when jumping from the ground.
pub const JUMP_IMPULSE: f32 = 0.5;

/// Camera height above the terrain surface when standing.
pub const EYE_HEIGHT: f32 = 2.0;

/// Radius of the walker's collision sphere.
pub const ACTOR_RADIUS: f32 = 2.0;

/// Fraction of the penetration depth corrected per frame.
pub const COLLISION_DAMPING: f32 = 0.2;

/// Radians of look rotation per pixel of mouse motion.
pub const MOUSE_SENSITIVITY: f32 = 0.002;

/// Spawn position (dropped from above so the first frames fall onto the terrain).
pub const SPAWN_POSITION: [f32; 3] = [0.0, 30.0, 0.0];
