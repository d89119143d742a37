use bevy::asset::{LoadState, RenderAssetUsages};
use bevy::image::{ImageAddressMode, ImageLoaderSettings, ImageSampler, ImageSamplerDescriptor};
use bevy::math::Affine2;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

use constants::map::GRASS_TEXTURE_PATH;
use constants::render_settings::{
    GRASS_COLOR, GRASS_TEXTURE_REPEAT, ROAD_COLOR, ROAD_HEIGHT, ROAD_MASK_SIZE, ROAD_WIDTH,
    WORLD_SIZE,
};

use crate::engine::assets::registry::MapRegistry;
use crate::engine::core::app_state::MapSceneEntity;

/// Maps a map-space point onto mask pixel coordinates. Mask rows follow +Z.
pub fn world_to_mask(point: Vec2, world_size: f32, mask_size: u32) -> Vec2 {
    (point + Vec2::splat(world_size * 0.5)) / world_size * mask_size as f32
}

fn distance_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let length_squared = ab.length_squared();
    let t = if length_squared <= f32::EPSILON {
        0.0
    } else {
        ((point - a).dot(ab) / length_squared).clamp(0.0, 1.0)
    };
    point.distance(a + ab * t)
}

/// Single-channel road mask: 255 within half a road width of any edge
/// (round caps included), 0 elsewhere.
pub fn rasterize_road_mask(
    segments: impl IntoIterator<Item = (Vec2, Vec2)>,
    mask_size: u32,
    world_size: f32,
    road_width: f32,
) -> Vec<u8> {
    let size = mask_size as usize;
    let mut alpha = vec![0u8; size * size];
    let half_width = road_width / world_size * mask_size as f32 * 0.5;
    let max_pixel = mask_size as f32 - 1.0;

    for (from, to) in segments {
        let a = world_to_mask(from, world_size, mask_size);
        let b = world_to_mask(to, world_size, mask_size);
        let min = (a.min(b) - Vec2::splat(half_width)).floor().max(Vec2::ZERO);
        let max = (a.max(b) + Vec2::splat(half_width))
            .ceil()
            .min(Vec2::splat(max_pixel));
        if min.x > max.x || min.y > max.y {
            continue;
        }

        for y in min.y as usize..=max.y as usize {
            for x in min.x as usize..=max.x as usize {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if distance_to_segment(center, a, b) <= half_width {
                    alpha[y * size + x] = 255;
                }
            }
        }
    }

    alpha
}

pub fn road_mask_image(alpha: &[u8], mask_size: u32) -> Image {
    let data = alpha
        .iter()
        .flat_map(|&a| [255, 255, 255, a])
        .collect::<Vec<u8>>();

    Image::new(
        Extent3d {
            width: mask_size,
            height: mask_size,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        data,
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::RENDER_WORLD,
    )
}

/// Grass texture is attached to the ground material only once it loads,
/// so a missing file leaves a plain coloured ground instead of none.
#[derive(Resource, Default)]
pub struct GroundTexture {
    image: Option<Handle<Image>>,
    material: Option<Handle<StandardMaterial>>,
    resolved: bool,
}

pub fn spawn_ground(
    mut commands: Commands,
    registry: Res<MapRegistry>,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
    mut ground_texture: ResMut<GroundTexture>,
) {
    let plane = meshes.add(Plane3d::default().mesh().size(WORLD_SIZE, WORLD_SIZE));

    let grass_material = materials.add(StandardMaterial {
        base_color: GRASS_COLOR,
        perceptual_roughness: 0.95,
        uv_transform: Affine2::from_scale(Vec2::splat(GRASS_TEXTURE_REPEAT)),
        ..default()
    });
    commands.spawn((
        Name::new("Grass"),
        MapSceneEntity,
        Mesh3d(plane.clone()),
        MeshMaterial3d(grass_material.clone()),
        Transform::IDENTITY,
    ));

    let grass = asset_server.load_with_settings(
        GRASS_TEXTURE_PATH,
        |settings: &mut ImageLoaderSettings| {
            settings.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
                address_mode_u: ImageAddressMode::Repeat,
                address_mode_v: ImageAddressMode::Repeat,
                ..default()
            });
        },
    );
    *ground_texture = GroundTexture {
        image: Some(grass),
        material: Some(grass_material),
        resolved: false,
    };

    let alpha = rasterize_road_mask(
        registry.edge_segments(),
        ROAD_MASK_SIZE,
        WORLD_SIZE,
        ROAD_WIDTH,
    );
    let mask = images.add(road_mask_image(&alpha, ROAD_MASK_SIZE));
    let road_material = materials.add(StandardMaterial {
        base_color: ROAD_COLOR,
        base_color_texture: Some(mask),
        alpha_mode: AlphaMode::Blend,
        perceptual_roughness: 0.6,
        metallic: 0.1,
        ..default()
    });
    commands.spawn((
        Name::new("Roads"),
        MapSceneEntity,
        Mesh3d(plane),
        MeshMaterial3d(road_material),
        Transform::from_xyz(0.0, ROAD_HEIGHT, 0.0),
    ));

    info!(
        "Ground ready: {} road segments on a {}x{} mask",
        registry.edge_segments().count(),
        ROAD_MASK_SIZE,
        ROAD_MASK_SIZE
    );
}

pub fn attach_grass_texture(
    mut ground_texture: ResMut<GroundTexture>,
    asset_server: Res<AssetServer>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if ground_texture.resolved {
        return;
    }
    let (Some(image), Some(material)) = (&ground_texture.image, &ground_texture.material) else {
        return;
    };

    match asset_server.get_load_state(image.id()) {
        Some(LoadState::Loaded) => {
            if let Some(material) = materials.get_mut(material) {
                material.base_color = Color::WHITE;
                material.base_color_texture = Some(image.clone());
            }
            ground_texture.resolved = true;
        }
        Some(LoadState::Failed(error)) => {
            warn!("Grass texture unavailable, keeping flat colour: {}", error);
            ground_texture.resolved = true;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_world_corners_to_mask_corners() {
        assert_eq!(world_to_mask(Vec2::splat(-45.0), 90.0, 64), Vec2::ZERO);
        assert_eq!(world_to_mask(Vec2::splat(45.0), 90.0, 64), Vec2::splat(64.0));
        assert_eq!(world_to_mask(Vec2::ZERO, 90.0, 64), Vec2::splat(32.0));
    }

    #[test]
    fn paints_along_edges_only() {
        let size = 90;
        let alpha = rasterize_road_mask(
            [(Vec2::new(-30.0, 0.0), Vec2::new(30.0, 0.0))],
            size,
            90.0,
            4.0,
        );
        let at = |x: usize, y: usize| alpha[y * size as usize + x];

        assert_eq!(at(45, 45), 255);
        assert_eq!(at(20, 44), 255);
        assert_eq!(at(45, 60), 0);
        assert_eq!(at(5, 45), 0, "beyond the round cap");
    }

    #[test]
    fn ignores_segments_outside_the_world() {
        let alpha = rasterize_road_mask(
            [(Vec2::new(100.0, 100.0), Vec2::new(120.0, 100.0))],
            32,
            90.0,
            2.5,
        );
        assert!(alpha.iter().all(|&a| a == 0));
    }

    #[test]
    fn mask_image_is_white_with_alpha() {
        let image = road_mask_image(&[0, 255, 0, 0], 2);
        let data = image.data.as_ref().unwrap();
        assert_eq!(&data[0..8], &[255, 255, 255, 0, 255, 255, 255, 255]);
    }
}
