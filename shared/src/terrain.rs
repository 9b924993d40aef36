//! Heightfield terrain built from a grayscale elevation image.
//!
//! The field is a regular grid of `(subdivisions + 1)^2` vertices centered on the origin.
//! The same grid drives both the rendered ground mesh and `height_at`, so the walker
//! stands exactly on the triangles the player sees.
//!
//! Scale: 1 unit = 1 meter

use bevy::prelude::*;
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Anything that can answer "how high is the ground here?".
///
/// `None` means there is no data for that position (e.g. outside the field).
pub trait HeightSurface {
    fn height_at(&self, x: f32, z: f32) -> Option<f32>;
}

impl<F> HeightSurface for F
where
    F: Fn(f32, f32) -> Option<f32>,
{
    fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        self(x, z)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TerrainError {
    #[error("heightfield needs at least one subdivision")]
    ZeroSubdivisions,
    #[error("{requested} subdivisions is more than the supported {max}")]
    TooManySubdivisions { requested: u32, max: u32 },
    #[error("heightfield extent must be positive (width {width}, length {length})")]
    InvalidExtent { width: f32, length: f32 },
    #[error("max height {max} is below min height {min}")]
    InvertedHeightRange { min: f32, max: f32 },
    #[error("heightmap image has no pixels")]
    EmptyImage,
    #[error("heightmap pixels can't be read: {0}")]
    UnreadableImage(String),
    #[error("expected {expected} height samples, got {actual}")]
    SampleCountMismatch { expected: usize, actual: usize },
}

/// Largest grid accepted. Keeps vertex indices within `u32` and the grid in memory.
pub const MAX_SUBDIVISIONS: u32 = 4096;

/// Dimensions of the generated ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightFieldSettings {
    /// Extent along X.
    pub width: f32,
    /// Extent along Z.
    pub length: f32,
    /// Grid cells per side.
    pub subdivisions: u32,
    /// Height of a black pixel.
    pub min_height: f32,
    /// Height of a white pixel.
    pub max_height: f32,
}

impl Default for HeightFieldSettings {
    fn default() -> Self {
        Self {
            width: 1023.0,
            length: 1023.0,
            subdivisions: 400,
            min_height: 0.0,
            max_height: 150.0,
        }
    }
}

impl HeightFieldSettings {
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.subdivisions == 0 {
            return Err(TerrainError::ZeroSubdivisions);
        }
        if self.subdivisions > MAX_SUBDIVISIONS {
            return Err(TerrainError::TooManySubdivisions {
                requested: self.subdivisions,
                max: MAX_SUBDIVISIONS,
            });
        }
        if !(self.width > 0.0 && self.length > 0.0) {
            return Err(TerrainError::InvalidExtent {
                width: self.width,
                length: self.length,
            });
        }
        if self.max_height < self.min_height {
            return Err(TerrainError::InvertedHeightRange {
                min: self.min_height,
                max: self.max_height,
            });
        }
        Ok(())
    }

    /// Number of vertices along one side of the grid.
    #[inline]
    pub fn vertices_per_side(&self) -> usize {
        self.subdivisions as usize + 1
    }

    /// Horizontal extent as (width, length).
    #[inline]
    pub fn extent(&self) -> Vec2 {
        Vec2::new(self.width, self.length)
    }

    /// Map a normalized elevation (0 = black, 1 = white) into world height.
    #[inline]
    pub fn elevation(&self, t: f32) -> f32 {
        self.min_height + (self.max_height - self.min_height) * t.clamp(0.0, 1.0)
    }
}

/// Perceptual luma of an 8-bit-normalized RGB sample.
#[inline]
pub fn luma(r: f32, g: f32, b: f32) -> f32 {
    r * 0.3 + g * 0.59 + b * 0.11
}

/// Regular grid of terrain heights.
#[derive(Debug, Clone)]
pub struct HeightField {
    settings: HeightFieldSettings,
    /// Row-major, row index grows along +Z.
    heights: Vec<f32>,
}

impl HeightField {
    /// Build a field from explicit vertex heights (row-major, rows along +Z).
    pub fn from_heights(settings: HeightFieldSettings, heights: Vec<f32>) -> Result<Self, TerrainError> {
        settings.validate()?;
        let expected = settings.vertices_per_side() * settings.vertices_per_side();
        if heights.len() != expected {
            return Err(TerrainError::SampleCountMismatch {
                expected,
                actual: heights.len(),
            });
        }
        Ok(Self { settings, heights })
    }

    /// Build a field by sampling a grayscale image.
    ///
    /// `sample(px, py)` returns the normalized elevation (0..=1) of pixel `(px, py)`, with
    /// `py = 0` being the top row. The top row of the image becomes the +Z edge.
    pub fn from_image(
        settings: HeightFieldSettings,
        image_width: u32,
        image_height: u32,
        sample: impl Fn(u32, u32) -> f32,
    ) -> Result<Self, TerrainError> {
        settings.validate()?;
        if image_width == 0 || image_height == 0 {
            return Err(TerrainError::EmptyImage);
        }

        let side = settings.vertices_per_side();
        let sub = settings.subdivisions as f32;
        let max_px = (image_width - 1) as f32;
        let max_py = (image_height - 1) as f32;

        let mut heights = Vec::with_capacity(side * side);
        for row in 0..side {
            let py = ((1.0 - row as f32 / sub) * max_py) as u32;
            for col in 0..side {
                let px = ((col as f32 / sub) * max_px) as u32;
                heights.push(settings.elevation(sample(px, py)));
            }
        }

        Ok(Self { settings, heights })
    }

    /// Procedural stand-in used when no heightmap image is available.
    ///
    /// Layered Perlin noise: broad hills with a little detail on top.
    pub fn from_noise(settings: HeightFieldSettings, seed: u32) -> Result<Self, TerrainError> {
        settings.validate()?;

        let hills = Perlin::new(seed);
        let detail = Perlin::new(seed.wrapping_add(1000));

        let side = settings.vertices_per_side();
        let mut heights = Vec::with_capacity(side * side);
        for row in 0..side {
            for col in 0..side {
                let p = vertex_xz(&settings, col, row);
                let (x, z) = (p.x as f64, p.y as f64);

                let mut value = 0.0;
                let mut amplitude = 1.0;
                let mut frequency = 0.004;
                let mut total = 0.0;
                for _ in 0..4 {
                    value += hills.get([x * frequency, z * frequency]) * amplitude;
                    total += amplitude;
                    amplitude *= 0.5;
                    frequency *= 2.0;
                }
                value += detail.get([x * 0.05, z * 0.05]) * 0.05;

                let t = ((value / total) as f32 * 0.5 + 0.5).clamp(0.0, 1.0);
                heights.push(settings.elevation(t));
            }
        }

        Ok(Self { settings, heights })
    }

    pub fn settings(&self) -> &HeightFieldSettings {
        &self.settings
    }

    #[inline]
    fn vertex_height(&self, col: usize, row: usize) -> f32 {
        self.heights[row * self.settings.vertices_per_side() + col]
    }

    /// World position of grid vertex `(col, row)`.
    pub fn vertex_position(&self, col: usize, row: usize) -> Vec3 {
        let xz = vertex_xz(&self.settings, col, row);
        Vec3::new(xz.x, self.vertex_height(col, row), xz.y)
    }

    /// Lowest and highest vertex heights.
    pub fn height_range(&self) -> (f32, f32) {
        self.heights
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &h| (lo.min(h), hi.max(h)))
    }

    /// Vertex data for the ground mesh.
    pub fn mesh_data(&self) -> TerrainMeshData {
        let side = self.settings.vertices_per_side();
        let sub = self.settings.subdivisions as f32;
        let cell = Vec2::new(
            self.settings.width / sub,
            self.settings.length / sub,
        );

        let mut positions = Vec::with_capacity(side * side);
        let mut normals = Vec::with_capacity(side * side);
        let mut uvs = Vec::with_capacity(side * side);
        let mut indices = Vec::with_capacity((side - 1) * (side - 1) * 6);

        for row in 0..side {
            for col in 0..side {
                positions.push(self.vertex_position(col, row).to_array());
                uvs.push([col as f32 / sub, 1.0 - row as f32 / sub]);
            }
        }

        for row in 0..side {
            for col in 0..side {
                let here = self.vertex_height(col, row);
                let h_left = if col > 0 { self.vertex_height(col - 1, row) } else { here };
                let h_right = if col + 1 < side { self.vertex_height(col + 1, row) } else { here };
                let h_down = if row > 0 { self.vertex_height(col, row - 1) } else { here };
                let h_up = if row + 1 < side { self.vertex_height(col, row + 1) } else { here };

                let normal = Vec3::new(
                    (h_left - h_right) * cell.y,
                    2.0 * cell.x * cell.y,
                    (h_down - h_up) * cell.x,
                )
                .normalize();
                normals.push(normal.to_array());
            }
        }

        // Each cell is split along the (col + 1, row) - (col, row + 1) diagonal;
        // `height_at` interpolates over the same two triangles.
        for row in 0..side - 1 {
            for col in 0..side - 1 {
                let top_left = (row * side + col) as u32;
                let top_right = top_left + 1;
                let bottom_left = top_left + side as u32;
                let bottom_right = bottom_left + 1;

                indices.extend_from_slice(&[top_left, bottom_left, top_right]);
                indices.extend_from_slice(&[top_right, bottom_left, bottom_right]);
            }
        }

        TerrainMeshData {
            positions,
            normals,
            uvs,
            indices,
        }
    }
}

impl HeightSurface for HeightField {
    fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        if !x.is_finite() || !z.is_finite() {
            return None;
        }

        let s = &self.settings;
        let sub = s.subdivisions as f32;
        let fx = (x + s.width * 0.5) / s.width * sub;
        let fz = (z + s.length * 0.5) / s.length * sub;
        if fx < 0.0 || fz < 0.0 || fx > sub || fz > sub {
            return None;
        }

        let last = s.subdivisions as usize - 1;
        let col = (fx.floor() as usize).min(last);
        let row = (fz.floor() as usize).min(last);
        let tx = fx - col as f32;
        let tz = fz - row as f32;

        let h00 = self.vertex_height(col, row);
        let h10 = self.vertex_height(col + 1, row);
        let h01 = self.vertex_height(col, row + 1);
        let h11 = self.vertex_height(col + 1, row + 1);

        let height = if tx + tz <= 1.0 {
            h00 + (h10 - h00) * tx + (h01 - h00) * tz
        } else {
            h11 + (h01 - h11) * (1.0 - tx) + (h10 - h11) * (1.0 - tz)
        };
        Some(height)
    }
}

fn vertex_xz(settings: &HeightFieldSettings, col: usize, row: usize) -> Vec2 {
    let sub = settings.subdivisions as f32;
    Vec2::new(
        -settings.width * 0.5 + col as f32 * settings.width / sub,
        -settings.length * 0.5 + row as f32 * settings.length / sub,
    )
}

/// Generated mesh data for the ground.
pub struct TerrainMeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

/// Resource holding the active heightfield once the scene has loaded it.
#[derive(Resource)]
pub struct WorldTerrain {
    pub field: HeightField,
}

impl HeightSurface for WorldTerrain {
    fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        self.field.height_at(x, z)
    }
}
