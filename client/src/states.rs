//! Scene lifecycle

use bevy::prelude::*;

/// Where the scene is in its startup.
///
/// The walker only steps in `Ready`. `Failed` is terminal.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SceneState {
    #[default]
    Loading,
    Ready,
    Failed,
}
