//! Walk configuration loaded from a RON file.
//!
//! Every field has a default matching the tuned demo, so a partial file (or no file at
//! all) still produces a playable setup.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::player::{
    ACTOR_RADIUS, COLLISION_DAMPING, EYE_HEIGHT, GRAVITY, JUMP_IMPULSE, MOUSE_SENSITIVITY,
    SPAWN_POSITION, WALK_SPEED,
};
use crate::terrain::{HeightFieldSettings, TerrainError};

/// Default location of the config file, relative to the asset folder.
pub const CONFIG_FILE: &str = "walk.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),

    #[error("invalid terrain settings: {0}")]
    Terrain(#[from] TerrainError),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level configuration resource.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WalkConfig {
    pub terrain: TerrainConfig,
    pub movement: MovementConfig,
    pub collision: CollisionConfig,
    pub forest: ForestConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Grayscale heightmap image, relative to the asset folder.
    pub heightmap: String,
    pub settings: HeightFieldSettings,
    /// Generate noise terrain when the heightmap image cannot be loaded.
    pub fallback_to_noise: bool,
    pub noise_seed: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            heightmap: "heightmap.png".to_string(),
            settings: HeightFieldSettings::default(),
            fallback_to_noise: true,
            noise_seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub walk_speed: f32,
    pub gravity: f32,
    pub jump_impulse: f32,
    pub eye_height: f32,
    pub mouse_sensitivity: f32,
    /// Optional clamp for pitch in radians. `None` leaves pitch free.
    pub pitch_limit: Option<f32>,
    pub spawn: [f32; 3],
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: WALK_SPEED,
            gravity: GRAVITY,
            jump_impulse: JUMP_IMPULSE,
            eye_height: EYE_HEIGHT,
            mouse_sensitivity: MOUSE_SENSITIVITY,
            pitch_limit: None,
            spawn: SPAWN_POSITION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    pub actor_radius: f32,
    /// Share of the penetration depth pushed out per frame (0..=1).
    pub damping: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            actor_radius: ACTOR_RADIUS,
            damping: COLLISION_DAMPING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub count: usize,
    pub trunk_radius: f32,
    pub trunk_height: f32,
    /// Scene instanced under every tree collider.
    pub template: String,
    /// Fixed scatter seed. `None` picks a fresh seed each run.
    pub seed: Option<u64>,
    /// No trees are placed closer than this to the world origin.
    pub spawn_clearance: f32,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            count: 100,
            trunk_radius: 2.5,
            trunk_height: 16.0,
            template: "pine.glb#Scene0".to_string(),
            seed: None,
            spawn_clearance: 8.0,
        }
    }
}

fn require(field: &'static str, ok: bool, reason: impl Into<String>) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: reason.into(),
        })
    }
}

impl WalkConfig {
    /// Parse a config from RON text and validate it.
    pub fn from_ron_str(text: &str, origin: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let config: WalkConfig = ron::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.into(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a config file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&text, path)
    }

    /// Load the config, falling back to defaults (with a warning) if anything goes wrong.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load_from_file(path) {
            Ok(config) => {
                info!("Loaded walk config from {:?}", path);
                config
            }
            Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                info!("No walk config at {:?}, using defaults", path);
                Self::default()
            }
            Err(e) => {
                warn!("{e}; using default walk config");
                Self::default()
            }
        }
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.terrain.settings.validate()?;

        let m = &self.movement;
        require("movement.walk_speed", m.walk_speed >= 0.0, "must be >= 0")?;
        require("movement.gravity", m.gravity >= 0.0, "must be >= 0")?;
        require("movement.jump_impulse", m.jump_impulse >= 0.0, "must be >= 0")?;
        require("movement.eye_height", m.eye_height >= 0.0, "must be >= 0")?;
        require(
            "movement.pitch_limit",
            m.pitch_limit.is_none_or(|limit| limit > 0.0),
            "must be > 0 when set",
        )?;

        let c = &self.collision;
        require("collision.actor_radius", c.actor_radius > 0.0, "must be > 0")?;
        require(
            "collision.damping",
            (0.0..=1.0).contains(&c.damping),
            format!("{} is outside 0..=1", c.damping),
        )?;

        let f = &self.forest;
        require("forest.trunk_radius", f.trunk_radius > 0.0, "must be > 0")?;
        require("forest.trunk_height", f.trunk_height > 0.0, "must be > 0")?;
        require("forest.spawn_clearance", f.spawn_clearance >= 0.0, "must be >= 0")?;

        Ok(())
    }
}
