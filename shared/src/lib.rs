//! Engine-independent walking logic shared by the Pinewalk client and its tests.
//!
//! Everything in here is plain data plus pure functions over Bevy's math types:
//! the heightfield, the obstacle set, and the per-frame movement pipeline.

pub mod actor;
pub mod config;
pub mod input;
pub mod movement;
pub mod physics;
pub mod player;
pub mod props;
pub mod spatial;
pub mod terrain;

pub use actor::ActorState;
pub use config::{CollisionConfig, ConfigError, ForestConfig, MovementConfig, TerrainConfig, WalkConfig};
pub use input::{InputState, MoveKey};
pub use movement::{step_frame, FrameEnv, FrameStage};
pub use player::*;
pub use props::{scatter_trees, ActorProbe, CollisionProbe, CylinderProbe, Obstacle, TreeSpawn};
pub use spatial::ObstacleSet;
pub use terrain::{luma, HeightField, HeightFieldSettings, HeightSurface, TerrainError, TerrainMeshData, WorldTerrain};
