//! The GPU texture set bound by the render pipelines.
//!
//! Bindings of [`BodyTextures::layout`]:
//!
//! | binding | resource |
//! |---|---|
//! | 0 | permutation map, `texture_1d<u32>` |
//! | 1 | surface texture |
//! | 2 | crater decal |
//! | 3 | decal sampler slot (crater sampler or default sampler) |
//! | 4, 5 | normal maps |
//! | 6 | normal interpolation, `R32Float`, unfilterable |
//! | 7 | default repeating sampler |

use std::path::{Path, PathBuf};
use std::time::Instant;

use planets_render::RenderContext;
use tracing::{info, warn};
use wgpu::util::DeviceExt;

use super::procedural::{
    SurfaceNoiseParams, TextureNoise, generate_interpolation_raster, generate_surface_raster,
    permutation_table, placeholder_crater_decal, placeholder_normal_map,
};
use super::raster::{InterpolationRaster, RasterError, SurfaceRaster};

pub const SURFACE_TEXTURE_FILE: &str = "SurfaceTexture.raw";
pub const NORMAL_INTERPOLATION_FILE: &str = "NormalInterpolation.raw";
pub const CRATER_DECAL_FILE: &str = "CraterEjectaRay.png";
pub const NORMAL_MAP_FILES: [&str; 2] = ["AsteroidNormal.png", "RockCliffNormal.png"];

/// Edge length of placeholder images generated for missing files.
const PLACEHOLDER_SIZE: u32 = 256;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error("failed to load image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Where texture files live and whether the baked rasters are rebuilt.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSettings {
    pub dir: PathBuf,
    pub regenerate: bool,
    pub raster_size: u32,
    pub seed: u64,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("textures"),
            regenerate: false,
            raster_size: 255,
            seed: 0,
        }
    }
}

/// Host-side pixel data for every texture in the set.
pub struct TextureImages {
    pub permutation: [u8; 256],
    pub surface: SurfaceRaster,
    pub interpolation: InterpolationRaster,
    pub crater_decal: image::RgbaImage,
    pub normal_maps: [image::RgbaImage; 2],
}

impl TextureImages {
    /// Load the texture set from `settings.dir`, baking the rasters first when
    /// regeneration is requested.
    pub fn load(settings: &TextureSettings) -> Result<Self, TextureError> {
        if settings.regenerate {
            bake_rasters(settings)?;
        }

        let surface = SurfaceRaster::read(&settings.dir.join(SURFACE_TEXTURE_FILE))?;
        let interpolation =
            InterpolationRaster::read(&settings.dir.join(NORMAL_INTERPOLATION_FILE))?;

        let crater_decal = load_image_or(&settings.dir.join(CRATER_DECAL_FILE), || {
            placeholder_crater_decal(PLACEHOLDER_SIZE)
        })?;
        let normal_maps = [
            load_image_or(&settings.dir.join(NORMAL_MAP_FILES[0]), || {
                placeholder_normal_map(PLACEHOLDER_SIZE, 11, 0.08, 3.0)
            })?,
            load_image_or(&settings.dir.join(NORMAL_MAP_FILES[1]), || {
                placeholder_normal_map(PLACEHOLDER_SIZE, 23, 0.03, 6.0)
            })?,
        ];

        Ok(Self {
            permutation: permutation_table(settings.seed),
            surface,
            interpolation,
            crater_decal,
            normal_maps,
        })
    }
}

/// Generate both baked rasters and write them into `settings.dir`.
pub fn bake_rasters(settings: &TextureSettings) -> Result<(), RasterError> {
    let start = Instant::now();
    let size = settings.raster_size.max(1);
    let noise = TextureNoise::new(settings.seed as u32);

    generate_interpolation_raster(size, size, &noise)
        .write(&settings.dir.join(NORMAL_INTERPOLATION_FILE))?;
    generate_surface_raster(size, size, &noise, &SurfaceNoiseParams::default())
        .write(&settings.dir.join(SURFACE_TEXTURE_FILE))?;

    info!(
        dir = %settings.dir.display(),
        size,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "baked surface and normal-interpolation rasters"
    );
    Ok(())
}

fn load_image_or(
    path: &Path,
    placeholder: impl FnOnce() -> image::RgbaImage,
) -> Result<image::RgbaImage, TextureError> {
    if !path.exists() {
        warn!(path = %path.display(), "texture image missing, using a generated placeholder");
        return Ok(placeholder());
    }
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| TextureError::Image {
            path: path.to_path_buf(),
            source,
        })
}

/// Process-wide texture set, shared by bodies through an `Arc`.
pub struct BodyTextures {
    layout: wgpu::BindGroupLayout,
    crater_bind_group: wgpu::BindGroup,
    default_bind_group: wgpu::BindGroup,
    permutation_view: wgpu::TextureView,
}

impl BodyTextures {
    pub fn new(ctx: &RenderContext, images: &TextureImages) -> Self {
        let device = &ctx.device;

        let permutation = upload(
            ctx,
            "permutation-map",
            wgpu::TextureDimension::D1,
            wgpu::TextureFormat::R8Uint,
            (images.permutation.len() as u32, 1),
            &images.permutation,
        );
        let surface = upload(
            ctx,
            "surface-texture",
            wgpu::TextureDimension::D2,
            wgpu::TextureFormat::Rgba8Unorm,
            (images.surface.width(), images.surface.height()),
            images.surface.as_bytes(),
        );
        let crater = upload_image(ctx, "crater-decal", &images.crater_decal);
        let normal_0 = upload_image(ctx, "normal-map-0", &images.normal_maps[0]);
        let normal_1 = upload_image(ctx, "normal-map-1", &images.normal_maps[1]);
        let interpolation = upload(
            ctx,
            "normal-interpolation",
            wgpu::TextureDimension::D2,
            wgpu::TextureFormat::R32Float,
            (images.interpolation.width(), images.interpolation.height()),
            images.interpolation.as_bytes(),
        );

        let default_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("default-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let crater_sampler = device.create_sampler(&crater_sampler_descriptor(
            ctx.supports_clamp_to_border(),
        ));

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("body-textures-layout"),
            entries: &[
                texture_entry(0, wgpu::TextureSampleType::Uint, wgpu::TextureViewDimension::D1),
                filterable_entry(1),
                filterable_entry(2),
                sampler_entry(3),
                filterable_entry(4),
                filterable_entry(5),
                texture_entry(
                    6,
                    wgpu::TextureSampleType::Float { filterable: false },
                    wgpu::TextureViewDimension::D2,
                ),
                sampler_entry(7),
            ],
        });

        let views = [&permutation, &surface, &crater, &normal_0, &normal_1, &interpolation]
            .map(|t| t.create_view(&wgpu::TextureViewDescriptor::default()));
        let bind_group = |label, decal_sampler: &wgpu::Sampler| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &layout,
                entries: &[
                    view_binding(0, &views[0]),
                    view_binding(1, &views[1]),
                    view_binding(2, &views[2]),
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(decal_sampler),
                    },
                    view_binding(4, &views[3]),
                    view_binding(5, &views[4]),
                    view_binding(6, &views[5]),
                    wgpu::BindGroupEntry {
                        binding: 7,
                        resource: wgpu::BindingResource::Sampler(&default_sampler),
                    },
                ],
            })
        };
        let crater_bind_group = bind_group("body-textures-crater-sampler", &crater_sampler);
        let default_bind_group = bind_group("body-textures-default-sampler", &default_sampler);

        let [permutation_view, ..] = views;
        Self {
            layout,
            crater_bind_group,
            default_bind_group,
            permutation_view,
        }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    /// View of the permutation map, also consumed by the terrain compute pass.
    pub fn permutation_view(&self) -> &wgpu::TextureView {
        &self.permutation_view
    }

    /// Bind the full set with the clamping crater sampler in the decal slot.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>, group: u32) {
        pass.set_bind_group(group, &self.crater_bind_group, &[]);
    }

    /// Put the default sampler back into the decal slot.
    pub fn bind_default_sampler(&self, pass: &mut wgpu::RenderPass<'_>, group: u32) {
        pass.set_bind_group(group, &self.default_bind_group, &[]);
    }
}

fn crater_sampler_descriptor(clamp_to_border: bool) -> wgpu::SamplerDescriptor<'static> {
    let (address_mode, border_color) = if clamp_to_border {
        (
            wgpu::AddressMode::ClampToBorder,
            Some(wgpu::SamplerBorderColor::TransparentBlack),
        )
    } else {
        (wgpu::AddressMode::ClampToEdge, None)
    };
    wgpu::SamplerDescriptor {
        label: Some("crater-sampler"),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        border_color,
        ..Default::default()
    }
}

fn upload(
    ctx: &RenderContext,
    label: &str,
    dimension: wgpu::TextureDimension,
    format: wgpu::TextureFormat,
    (width, height): (u32, u32),
    data: &[u8],
) -> wgpu::Texture {
    ctx.device.create_texture_with_data(
        &ctx.queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        data,
    )
}

fn upload_image(ctx: &RenderContext, label: &str, image: &image::RgbaImage) -> wgpu::Texture {
    upload(
        ctx,
        label,
        wgpu::TextureDimension::D2,
        wgpu::TextureFormat::Rgba8Unorm,
        image.dimensions(),
        image.as_raw(),
    )
}

fn texture_entry(
    binding: u32,
    sample_type: wgpu::TextureSampleType,
    view_dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn filterable_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    texture_entry(
        binding,
        wgpu::TextureSampleType::Float { filterable: true },
        wgpu::TextureViewDimension::D2,
    )
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn view_binding(binding: u32, view: &wgpu::TextureView) -> wgpu::BindGroupEntry<'_> {
    wgpu::BindGroupEntry {
        binding,
        resource: wgpu::BindingResource::TextureView(view),
    }
}
