//! Pine forest: random placement, collider set and instanced tree scenes.

use bevy::asset::RecursiveDependencyLoadState;
use bevy::prelude::*;
use pinewalk_shared::{scatter_trees, ForestConfig, HeightField, ObstacleSet, TreeSpawn, WalkConfig, WorldTerrain};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::states::SceneState;

/// Template scene instanced under every tree.
#[derive(Resource)]
pub struct PineTemplate {
    pub handle: Handle<Scene>,
}

/// Marker for a placed tree
#[derive(Component)]
pub struct Tree;

/// What gets drawn at each tree.
#[derive(Clone)]
pub enum TreeVisual {
    Template(Handle<Scene>),
    /// Plain trunk cylinder, used when the template could not be loaded.
    StandIn {
        mesh: Handle<Mesh>,
        material: Handle<StandardMaterial>,
        height: f32,
    },
}

pub struct ForestPlugin;

impl Plugin for ForestPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, load_pine_template);
        app.add_systems(
            Update,
            spawn_forest
                .run_if(in_state(SceneState::Loading))
                .run_if(resource_exists::<WorldTerrain>)
                .run_if(not(resource_exists::<ObstacleSet>)),
        );
    }
}

fn load_pine_template(mut commands: Commands, asset_server: Res<AssetServer>, config: Res<WalkConfig>) {
    let handle = asset_server.load(config.forest.template.clone());
    commands.insert_resource(PineTemplate { handle });
}

/// Place the trees and build the collider set.
///
/// Deterministic for a given seed.
pub fn plan_forest(forest: &ForestConfig, field: &HeightField, seed: u64) -> (Vec<TreeSpawn>, ObstacleSet) {
    let mut rng = StdRng::seed_from_u64(seed);
    let trees = scatter_trees(&mut rng, field.settings().extent(), field, forest);
    let obstacles = ObstacleSet::from_obstacles(trees.iter().map(|t| t.obstacle));
    (trees, obstacles)
}

/// Once the template has settled (loaded or failed), scatter and spawn the forest.
fn spawn_forest(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    template: Res<PineTemplate>,
    terrain: Res<WorldTerrain>,
    config: Res<WalkConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let template_ok = match asset_server.recursive_dependency_load_state(&template.handle) {
        RecursiveDependencyLoadState::Loaded => true,
        RecursiveDependencyLoadState::Failed(err) => {
            warn!(
                "Tree template {} failed to load ({err}), showing stand-in trunks",
                config.forest.template
            );
            false
        }
        _ => return,
    };

    let forest = &config.forest;
    let seed = forest.seed.unwrap_or_else(rand::random);
    let (trees, obstacles) = plan_forest(forest, &terrain.field, seed);
    info!("Planted {} trees (seed {})", trees.len(), seed);

    let visual = if template_ok {
        TreeVisual::Template(template.handle.clone())
    } else {
        TreeVisual::StandIn {
            mesh: meshes.add(Cylinder::new(forest.trunk_radius, forest.trunk_height)),
            material: materials.add(StandardMaterial {
                base_color: Color::srgb(0.2, 0.35, 0.18),
                perceptual_roughness: 0.9,
                ..default()
            }),
            height: forest.trunk_height,
        }
    };

    spawn_trees(&mut commands, &trees, &visual);
    commands.insert_resource(obstacles);
}

/// Spawn one tree entity per placement with its visual as a child.
pub fn spawn_trees(commands: &mut Commands, trees: &[TreeSpawn], visual: &TreeVisual) {
    for tree in trees {
        let mut entity = commands.spawn((
            Tree,
            Transform::from_translation(tree.obstacle.base).with_rotation(tree.rotation),
            Visibility::default(),
        ));

        match visual {
            TreeVisual::Template(scene) => {
                entity.with_child((SceneRoot(scene.clone()), Transform::IDENTITY));
            }
            TreeVisual::StandIn {
                mesh,
                material,
                height,
            } => {
                entity.with_child((
                    Mesh3d(mesh.clone()),
                    MeshMaterial3d(material.clone()),
                    // Cylinder meshes are centered; lift so the base sits on the ground.
                    Transform::from_xyz(0.0, height * 0.5, 0.0),
                ));
            }
        }
    }
}
