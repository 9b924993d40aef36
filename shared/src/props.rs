//! Tree obstacles: collider shapes, the two-phase intersection test, and random placement.
//!
//! The client uses the generated `TreeSpawn`s to instance pine scenes; the frame step
//! only ever sees the `Obstacle` cylinders.

use bevy::math::bounding::{Aabb3d, IntersectsVolume};
use bevy::prelude::*;
use rand::Rng;

use crate::config::ForestConfig;
use crate::terrain::HeightSurface;

/// Vertical cylinder standing on `base` and reaching `height` above it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub base: Vec3,
    pub radius: f32,
    pub height: f32,
}

impl Obstacle {
    pub fn new(base: Vec3, radius: f32, height: f32) -> Self {
        Self { base, radius, height }
    }

    /// Trunk axis position on the XZ plane.
    #[inline]
    pub fn center_xz(&self) -> Vec2 {
        Vec2::new(self.base.x, self.base.z)
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.base.y + self.height
    }

    /// Axis-aligned box around the cylinder.
    pub fn bounds(&self) -> Aabb3d {
        let half = Vec3::new(self.radius, self.height * 0.5, self.radius);
        Aabb3d::new(self.base + Vec3::Y * self.height * 0.5, half)
    }
}

/// The walker's collision sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorProbe {
    pub center: Vec3,
    pub radius: f32,
}

impl ActorProbe {
    pub fn bounds(&self) -> Aabb3d {
        Aabb3d::new(self.center, Vec3::splat(self.radius))
    }
}

/// Two-phase intersection predicate between the walker and an obstacle.
///
/// `precise = false` is the cheap bounding-volume check; `precise = true` tests the
/// actual shapes. Callers only ask for the precise answer after the cheap one passed.
pub trait CollisionProbe {
    fn intersects(&self, probe: &ActorProbe, obstacle: &Obstacle, precise: bool) -> bool;
}

/// Sphere against capped vertical cylinder.
#[derive(Debug, Clone, Copy, Default)]
pub struct CylinderProbe;

impl CollisionProbe for CylinderProbe {
    fn intersects(&self, probe: &ActorProbe, obstacle: &Obstacle, precise: bool) -> bool {
        if !precise {
            return probe.bounds().intersects(&obstacle.bounds());
        }

        // Closest point on the cylinder to the sphere center.
        let center_xz = Vec2::new(probe.center.x, probe.center.z);
        let offset = center_xz - obstacle.center_xz();
        let planar = offset.length();
        let closest_xz = if planar > obstacle.radius {
            obstacle.center_xz() + offset / planar * obstacle.radius
        } else {
            center_xz
        };
        let closest_y = probe.center.y.clamp(obstacle.base.y, obstacle.top());
        let closest = Vec3::new(closest_xz.x, closest_y, closest_xz.y);

        closest.distance_squared(probe.center) < probe.radius * probe.radius
    }
}

/// A placed tree: its collider plus a visual yaw so the forest doesn't look stamped.
#[derive(Debug, Clone, Copy)]
pub struct TreeSpawn {
    pub obstacle: Obstacle,
    pub rotation: Quat,
}

/// Scatter trees uniformly over a `extent`-sized area centered on the origin.
///
/// Each tree is seated at the surface height under it. Candidates without height data or
/// inside the spawn clearance are skipped; gives up after a bounded number of attempts so
/// a tiny or fully-cleared area cannot loop forever.
pub fn scatter_trees(
    rng: &mut impl Rng,
    extent: Vec2,
    surface: &dyn HeightSurface,
    forest: &ForestConfig,
) -> Vec<TreeSpawn> {
    let mut out = Vec::with_capacity(forest.count);
    let max_attempts = forest.count.saturating_mul(8).max(16);
    let half = extent * 0.5;

    for _ in 0..max_attempts {
        if out.len() >= forest.count {
            break;
        }

        let x = (rng.gen::<f32>() - 0.5) * extent.x;
        let z = (rng.gen::<f32>() - 0.5) * extent.y;
        if x.abs() > half.x || z.abs() > half.y {
            continue;
        }
        if Vec2::new(x, z).length() < forest.spawn_clearance {
            continue;
        }
        let Some(y) = surface.height_at(x, z) else {
            continue;
        };

        out.push(TreeSpawn {
            obstacle: Obstacle::new(
                Vec3::new(x, y, z),
                forest.trunk_radius,
                forest.trunk_height,
            ),
            rotation: Quat::from_rotation_y(rng.gen::<f32>() * std::f32::consts::TAU),
        });
    }

    if out.len() < forest.count {
        warn!(
            "Only placed {} of {} trees (area too small or cleared)",
            out.len(),
            forest.count
        );
    }

    out
}
