// renderer sink: turns synthesized pixel buffers into textures on building materials
use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

use crate::config::FACADE_VARIANTS;
use crate::error::Result;
use crate::procgen::{self, FacadeStyle, FacadeTextures, PixelBuffer, RendererSink, WindowGridSpec};

// facade generation parameters
#[derive(Resource, Default, Clone)]
pub struct FacadeParams {
    pub grid: WindowGridSpec,
    pub style: FacadeStyle,
}

// one material per facade variant, plus the flat roof material
#[derive(Resource)]
pub struct FacadeMaterials {
    pub variants: Vec<Handle<StandardMaterial>>,
    pub roof: Handle<StandardMaterial>,
}

impl FacadeMaterials {
    pub fn for_building(&self, global_index: u32) -> Handle<StandardMaterial> {
        self.variants[global_index as usize % self.variants.len()].clone()
    }
}

// writes both maps into an existing material
pub struct MaterialSink<'a> {
    pub images: &'a mut Assets<Image>,
    pub materials: &'a mut Assets<StandardMaterial>,
    pub target: &'a Handle<StandardMaterial>,
}

impl RendererSink for MaterialSink<'_> {
    fn apply(&mut self, color: &PixelBuffer, emission: &PixelBuffer) {
        let albedo = self.images.add(to_image(color));
        let glow = self.images.add(to_image(emission));

        if let Some(material) = self.materials.get_mut(self.target) {
            material.base_color = Color::WHITE;
            material.base_color_texture = Some(albedo);
            // texture controls the color per pixel
            material.emissive = LinearRgba::WHITE;
            material.emissive_texture = Some(glow);
        }
    }
}

pub fn to_image(buffer: &PixelBuffer) -> Image {
    Image::new(
        Extent3d {
            width: buffer.width(),
            height: buffer.height(),
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        buffer.as_bytes().to_vec(),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
    )
}

pub struct FacadePlugin;

impl Plugin for FacadePlugin {
    fn build(&self, app: &mut App) {
        app
            .insert_resource(FacadeParams::default())
            // painted together with the city, see city::scene::rebuild_city
            .add_systems(Startup, setup_facades);
    }
}

pub fn setup_facades(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let variants = (0..FACADE_VARIANTS)
        .map(|_| materials.add(StandardMaterial {
            perceptual_roughness: 0.8,
            ..default()
        }))
        .collect();
    let roof = materials.add(StandardMaterial::default());

    commands.insert_resource(FacadeMaterials { variants, roof });
}

// every variant or none, each with its own seed
pub fn synthesize_variants(params: &FacadeParams, seed: u64, count: usize) -> Result<Vec<FacadeTextures>> {
    (0..count)
        .map(|i| procgen::synthesize(&params.grid, &params.style, seed.wrapping_add(i as u64)))
        .collect()
}

pub fn apply_variants(
    facades: &FacadeMaterials,
    textures: &[FacadeTextures],
    facade_color: Srgba,
    images: &mut Assets<Image>,
    materials: &mut Assets<StandardMaterial>,
) {
    for (target, variant) in facades.variants.iter().zip(textures) {
        let mut sink = MaterialSink { images: &mut *images, materials: &mut *materials, target };
        variant.apply_to(&mut sink);
    }

    // roofs adopt the facade color and never glow
    if let Some(roof) = materials.get_mut(&facades.roof) {
        roof.base_color = Color::Srgba(facade_color);
        roof.emissive = LinearRgba::BLACK;
    }
    debug!("painted {} facade variants", textures.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_matches_buffer() {
        let buffer = PixelBuffer::filled(3, 5, [10, 20, 30, 255]);
        let image = to_image(&buffer);
        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 5);
        assert_eq!(image.data.as_deref(), Some(buffer.as_bytes()));
    }

    #[test]
    fn variants_are_all_or_nothing() {
        let mut params = FacadeParams::default();
        params.grid.texture_width = 16;
        params.grid.texture_height = 32;
        params.grid.cols = 2;
        params.grid.rows = 4;

        let variants = synthesize_variants(&params, 5, 3).unwrap();
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[1], procgen::synthesize(&params.grid, &params.style, 6).unwrap());

        params.grid.padding_normalized = 0.45;
        let err = synthesize_variants(&params, 5, 3).unwrap_err();
        assert_eq!(err.field(), "padding_normalized");
    }

    #[test]
    fn sink_sets_both_textures() {
        let mut images = Assets::<Image>::default();
        let mut materials = Assets::<StandardMaterial>::default();
        let target = materials.add(StandardMaterial::default());

        let textures = procgen::synthesize(
            &WindowGridSpec {
                texture_width: 16,
                texture_height: 32,
                cols: 2,
                rows: 4,
                ..WindowGridSpec::default()
            },
            &FacadeStyle::default(),
            1,
        )
        .unwrap();
        let mut sink = MaterialSink { images: &mut images, materials: &mut materials, target: &target };
        textures.apply_to(&mut sink);

        let material = materials.get(&target).unwrap();
        assert!(material.base_color_texture.is_some());
        assert!(material.emissive_texture.is_some());
        assert_eq!(images.len(), 2);
    }
}
