//! Ground: heightmap loading, the shared heightfield resource, and the rendered mesh.

use bevy::asset::{LoadState, RenderAssetUsages};
use bevy::mesh::{Indices, VertexAttributeValues};
use bevy::prelude::*;
use bevy::render::render_resource::PrimitiveTopology;
use pinewalk_shared::{
    luma, HeightField, HeightFieldSettings, TerrainConfig, TerrainError, WalkConfig, WorldTerrain,
};

use crate::states::SceneState;

/// Handle to the heightmap image while it loads.
#[derive(Resource)]
pub struct HeightmapSource {
    pub handle: Handle<Image>,
}

/// Marker for the ground mesh entity
#[derive(Component)]
pub struct Ground;

/// Plugin for the heightfield and its mesh
pub struct TerrainPlugin;

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, load_heightmap);
        app.add_systems(
            Update,
            build_terrain
                .run_if(in_state(SceneState::Loading))
                .run_if(not(resource_exists::<WorldTerrain>)),
        );
    }
}

fn load_heightmap(mut commands: Commands, asset_server: Res<AssetServer>, config: Res<WalkConfig>) {
    info!("Loading heightmap {}", config.terrain.heightmap);
    let handle = asset_server.load(config.terrain.heightmap.clone());
    commands.insert_resource(HeightmapSource { handle });
}

/// Where the heightmap image is in its load.
pub enum HeightmapStatus<'a> {
    Pending,
    Loaded(&'a Image),
    Failed,
}

/// What the terrain stage does next.
#[derive(Debug)]
pub enum TerrainOutcome {
    Pending,
    Built(HeightField),
    Failed(String),
}

/// Decide how to build the ground for the current heightmap status.
///
/// A failed heightmap falls back to noise terrain only when the config allows it.
pub fn resolve_terrain(status: HeightmapStatus, terrain: &TerrainConfig) -> TerrainOutcome {
    let built = match status {
        HeightmapStatus::Pending => return TerrainOutcome::Pending,
        HeightmapStatus::Loaded(image) => field_from_image(terrain.settings, image),
        HeightmapStatus::Failed if terrain.fallback_to_noise => {
            warn!(
                "Heightmap {} unavailable, generating terrain from noise",
                terrain.heightmap
            );
            HeightField::from_noise(terrain.settings, terrain.noise_seed)
        }
        HeightmapStatus::Failed => {
            return TerrainOutcome::Failed(format!(
                "heightmap {} unavailable and noise fallback is off",
                terrain.heightmap
            ));
        }
    };

    match built {
        Ok(field) => TerrainOutcome::Built(field),
        Err(err) => TerrainOutcome::Failed(format!("could not build terrain: {err}")),
    }
}

/// Wait for the heightmap, then build the field and the ground mesh.
fn build_terrain(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    images: Res<Assets<Image>>,
    source: Res<HeightmapSource>,
    config: Res<WalkConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut next_state: ResMut<NextState<SceneState>>,
) {
    let status = match asset_server.load_state(&source.handle) {
        LoadState::Loaded => match images.get(&source.handle) {
            Some(image) => HeightmapStatus::Loaded(image),
            None => HeightmapStatus::Pending,
        },
        LoadState::Failed(err) => {
            warn!("Heightmap {} failed to load: {err}", config.terrain.heightmap);
            HeightmapStatus::Failed
        }
        _ => HeightmapStatus::Pending,
    };

    let field = match resolve_terrain(status, &config.terrain) {
        TerrainOutcome::Pending => return,
        TerrainOutcome::Built(field) => field,
        TerrainOutcome::Failed(reason) => {
            error!("Terrain failed: {reason}");
            next_state.set(SceneState::Failed);
            return;
        }
    };

    let settings = field.settings();
    let (low, high) = field.height_range();
    info!(
        "Terrain ready: {}x{} units, {} subdivisions, heights {:.1}..{:.1}",
        settings.width, settings.length, settings.subdivisions, low, high
    );

    commands.spawn((
        Mesh3d(meshes.add(ground_mesh(&field))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.42, 0.5, 0.36),
            emissive: LinearRgba::rgb(0.1, 0.1, 0.1),
            perceptual_roughness: 0.95,
            metallic: 0.0,
            ..default()
        })),
        Transform::IDENTITY,
        Ground,
    ));
    commands.insert_resource(WorldTerrain { field });
}

/// Sample a decoded image into a heightfield using the pixel luma.
pub fn field_from_image(settings: HeightFieldSettings, image: &Image) -> Result<HeightField, TerrainError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(TerrainError::EmptyImage);
    }
    // Probe once so an unsupported pixel format is an error rather than a flat field.
    pixel_luma(image, 0, 0).map_err(|e| TerrainError::UnreadableImage(e.to_string()))?;

    HeightField::from_image(settings, width, height, |px, py| {
        pixel_luma(image, px, py).unwrap_or(0.0)
    })
}

/// Luma of the stored channel values, whatever the color space of the texture.
fn pixel_luma(image: &Image, x: u32, y: u32) -> Result<f32, bevy::image::TextureAccessError> {
    let color = image.get_color_at(x, y)?;
    let [r, g, b] = if image.texture_descriptor.format.is_srgb() {
        let c = color.to_srgba();
        [c.red, c.green, c.blue]
    } else {
        let c = color.to_linear();
        [c.red, c.green, c.blue]
    };
    Ok(luma(r, g, b))
}

/// Build the render mesh for a heightfield.
pub fn ground_mesh(field: &HeightField) -> Mesh {
    let data = field.mesh_data();

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(
        Mesh::ATTRIBUTE_POSITION,
        VertexAttributeValues::Float32x3(data.positions),
    );
    mesh.insert_attribute(
        Mesh::ATTRIBUTE_NORMAL,
        VertexAttributeValues::Float32x3(data.normals),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, VertexAttributeValues::Float32x2(data.uvs));
    mesh.insert_indices(Indices::U32(data.indices));
    mesh
}
