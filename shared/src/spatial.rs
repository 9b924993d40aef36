//! Spatial hashing for obstacle lookups.
//!
//! The frame step only needs the few trunks around the walker, so obstacles are bucketed
//! into a coarse grid on the XZ plane. Lookups return obstacles in insertion order so the
//! resolution result doesn't depend on hash map iteration.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::props::Obstacle;

/// Size of each spatial grid cell in world units.
/// Should be a few trunk diameters wide.
pub const SPATIAL_CELL_SIZE: f32 = 16.0;

/// The fixed set of obstacles in the scene.
#[derive(Resource, Default, Debug, Clone)]
pub struct ObstacleSet {
    /// Map from grid cell (x, z) to indices of obstacles overlapping that cell.
    cells: HashMap<(i32, i32), Vec<usize>>,
    obstacles: Vec<Obstacle>,
    /// Largest radius seen, used to widen lookups.
    max_radius: f32,
}

impl ObstacleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_obstacles(obstacles: impl IntoIterator<Item = Obstacle>) -> Self {
        let mut set = Self::new();
        for obstacle in obstacles {
            set.insert(obstacle);
        }
        set
    }

    #[inline]
    fn world_to_cell(pos: Vec2) -> (i32, i32) {
        (
            (pos.x / SPATIAL_CELL_SIZE).floor() as i32,
            (pos.y / SPATIAL_CELL_SIZE).floor() as i32,
        )
    }

    pub fn insert(&mut self, obstacle: Obstacle) {
        let center = obstacle.center_xz();
        let min_cell = Self::world_to_cell(center - Vec2::splat(obstacle.radius));
        let max_cell = Self::world_to_cell(center + Vec2::splat(obstacle.radius));

        let idx = self.obstacles.len();
        self.obstacles.push(obstacle);
        self.max_radius = self.max_radius.max(obstacle.radius);

        for cx in min_cell.0..=max_cell.0 {
            for cz in min_cell.1..=max_cell.1 {
                self.cells.entry((cx, cz)).or_default().push(idx);
            }
        }
    }

    /// Obstacles whose footprint may come within `reach` of `point` (XZ), in insertion order.
    pub fn near(&self, point: Vec2, reach: f32) -> impl Iterator<Item = &Obstacle> {
        let reach = reach.max(0.0) + self.max_radius;
        let min_cell = Self::world_to_cell(point - Vec2::splat(reach));
        let max_cell = Self::world_to_cell(point + Vec2::splat(reach));

        let mut found = Vec::new();
        for cx in min_cell.0..=max_cell.0 {
            for cz in min_cell.1..=max_cell.1 {
                if let Some(indices) = self.cells.get(&(cx, cz)) {
                    found.extend_from_slice(indices);
                }
            }
        }
        found.sort_unstable();
        found.dedup();

        found.into_iter().map(move |idx| &self.obstacles[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}
