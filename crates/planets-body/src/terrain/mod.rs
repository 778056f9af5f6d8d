//! GPU terrain generation: displaces the base sphere mesh by noise and craters
//! in a compute pass and reads the result back.
//!
//! One call to [`TerrainGenerator::generate`] runs the whole pipeline:
//! upload the base vertices and crater records, dispatch one invocation per
//! vertex, block until the device is idle, and convert the device layout back
//! to [`CelestialVertex`]. Nothing observable changes on failure; the caller
//! decides when to publish the returned mesh.

use std::time::Instant;

use bytemuck::{Pod, Zeroable};
use planets_cubesphere::{CelestialVertex, CelestialVertexStd430, from_std430, to_std430};
use planets_render::{
    BufferAllocator, ReadbackError, RenderContext, ShaderError, ShaderLibrary, read_buffer_blocking,
};
use static_assertions::const_assert_eq;
use tracing::debug;

use crate::crater::CraterRecord;
use crate::params::MAX_PARAMETERS;
use crate::textures::BodyTextures;

/// Invocations per workgroup. Every sphere mesh holds a multiple of this many vertices.
pub const WORKGROUP_SIZE: u32 = 36;

pub const TERRAIN_SHADER_NAME: &str = "terrain_generation";
const TERRAIN_SHADER: &str = include_str!("terrain_generation.wgsl");

const VERTEX_STRIDE: u64 = std::mem::size_of::<CelestialVertexStd430>() as u64;

#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    #[error("cannot generate terrain for an empty mesh")]
    EmptyMesh,

    #[error("mesh of {0} vertices is not a whole number of {WORKGROUP_SIZE}-vertex workgroups")]
    UnevenMesh(usize),

    #[error("dispatch of {requested} workgroups exceeds the device limit of {limit}")]
    DispatchTooLarge { requested: u64, limit: u32 },

    #[error("vertex storage of {size} bytes exceeds the device binding limit of {limit}")]
    StorageTooLarge { size: u64, limit: u64 },

    #[error("failed to read generated vertices back: {0}")]
    Readback(#[from] ReadbackError),
}

/// Scalar block bound next to the crater array.
///
/// `parameters` carries the raw parameter group, four floats per `vec4`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TerrainUniform {
    pub crater_count: u32,
    pub max_texture_radius: f32,
    pub parameter_count: u32,
    _pad: u32,
    pub parameters: [[f32; 4]; MAX_PARAMETERS / 4],
}

const_assert_eq!(std::mem::size_of::<TerrainUniform>(), 272);
const_assert_eq!(MAX_PARAMETERS % 4, 0);

impl TerrainUniform {
    /// Pack `parameters`, ignoring anything past [`MAX_PARAMETERS`].
    pub fn new(crater_count: u32, max_texture_radius: f32, parameters: &[f32]) -> Self {
        let mut uniform = Self {
            crater_count,
            max_texture_radius,
            parameter_count: parameters.len().min(MAX_PARAMETERS) as u32,
            ..Self::zeroed()
        };
        for (i, &value) in parameters.iter().take(MAX_PARAMETERS).enumerate() {
            uniform.parameters[i / 4][i % 4] = value;
        }
        uniform
    }

    pub fn parameter(&self, index: usize) -> f32 {
        if index >= self.parameter_count as usize {
            return 0.0;
        }
        self.parameters[index / 4][index % 4]
    }
}

/// Workgroups needed for `vertex_count` vertices.
pub fn workgroup_count(vertex_count: usize) -> Result<u64, TerrainError> {
    if vertex_count == 0 {
        return Err(TerrainError::EmptyMesh);
    }
    if vertex_count % WORKGROUP_SIZE as usize != 0 {
        return Err(TerrainError::UnevenMesh(vertex_count));
    }
    Ok((vertex_count / WORKGROUP_SIZE as usize) as u64)
}

/// Compiled terrain compute pipeline, shared by every body.
pub struct TerrainGenerator {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
}

impl TerrainGenerator {
    pub fn new(ctx: &RenderContext, shaders: &mut ShaderLibrary) -> Result<Self, ShaderError> {
        let device = &ctx.device;
        let module = shaders.get_or_load(device, TERRAIN_SHADER_NAME, TERRAIN_SHADER)?;

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("terrain-layout"),
            entries: &[
                storage_entry(0, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Uint,
                        view_dimension: wgpu::TextureViewDimension::D1,
                        multisampled: false,
                    },
                    count: None,
                },
                storage_entry(2, true),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(
                            std::mem::size_of::<TerrainUniform>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("terrain-pipeline-layout"),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("terrain-pipeline"),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Ok(Self { pipeline, layout })
    }

    /// Displace `base` on the GPU and return the generated mesh.
    ///
    /// `craters` may be empty. `parameters` is the body's raw parameter group.
    pub fn generate(
        &self,
        ctx: &RenderContext,
        textures: &BodyTextures,
        base: &[CelestialVertex],
        craters: &[CraterRecord],
        max_texture_radius: f32,
        parameters: &[f32],
    ) -> Result<Vec<CelestialVertex>, TerrainError> {
        let start = Instant::now();
        let device = &ctx.device;
        let limits = device.limits();

        let workgroups = workgroup_count(base.len())?;
        let limit = limits.max_compute_workgroups_per_dimension;
        if workgroups > u64::from(limit) {
            return Err(TerrainError::DispatchTooLarge {
                requested: workgroups,
                limit,
            });
        }
        let size = base.len() as u64 * VERTEX_STRIDE;
        let binding_limit = limits.max_storage_buffer_binding_size as u64;
        if size > binding_limit {
            return Err(TerrainError::StorageTooLarge {
                size,
                limit: binding_limit,
            });
        }

        let alloc = BufferAllocator::new(device);
        let vertex_buffer = alloc.create_storage_buffer("terrain-vertices", size);
        ctx.queue
            .write_buffer(&vertex_buffer, 0, bytemuck::cast_slice(&to_std430(base)));

        // Zero-sized bindings are invalid, so an empty crater list binds one unread record.
        let padding = [CraterRecord::default()];
        let crater_data = if craters.is_empty() { &padding[..] } else { craters };
        let crater_buffer =
            alloc.create_storage_buffer_init("terrain-craters", bytemuck::cast_slice(crater_data));

        let uniform = TerrainUniform::new(craters.len() as u32, max_texture_radius, parameters);
        let uniform_buffer =
            alloc.create_uniform_buffer("terrain-uniform", bytemuck::bytes_of(&uniform));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("terrain-bind-group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: vertex_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(textures.permutation_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: crater_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let staging = alloc.create_readback_buffer("terrain-readback", size);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("terrain-encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("terrain-pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(workgroups as u32, 1, 1);
        }
        encoder.copy_buffer_to_buffer(&vertex_buffer, 0, &staging, 0, size);
        ctx.queue.submit(Some(encoder.finish()));

        let bytes = read_buffer_blocking(device, &staging, size)?;
        let device_vertices: Vec<CelestialVertexStd430> = bytes
            .chunks_exact(VERTEX_STRIDE as usize)
            .map(bytemuck::pod_read_unaligned)
            .collect();

        debug!(
            vertices = base.len(),
            craters = craters.len(),
            workgroups,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "terrain generated"
        );
        Ok(from_std430(&device_vertices))
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::textures::{TextureImages, TextureSettings};
    use glam::Vec3;
    use planets_cubesphere::build_sphere_mesh;
    use planets_render::init_render_context_blocking;
    use tempfile::TempDir;

    #[test]
    fn test_uniform_packs_parameters_row_major() {
        let params: Vec<f32> = (0..9).map(|i| i as f32).collect();
        let uniform = TerrainUniform::new(7, 0.25, &params);
        assert_eq!(uniform.crater_count, 7);
        assert_eq!(uniform.parameter_count, 9);
        assert_eq!(uniform.parameters[0], [0.0, 1.0, 2.0, 3.0]);
        assert_eq!(uniform.parameters[2], [8.0, 0.0, 0.0, 0.0]);
        assert_eq!(uniform.parameter(8), 8.0);
        assert_eq!(uniform.parameter(9), 0.0);
    }

    #[test]
    fn test_uniform_truncates_long_groups() {
        let params = vec![1.0; MAX_PARAMETERS + 10];
        let uniform = TerrainUniform::new(0, 0.0, &params);
        assert_eq!(uniform.parameter_count as usize, MAX_PARAMETERS);
    }

    #[test]
    fn test_workgroup_count() {
        assert_eq!(workgroup_count(360_000).unwrap(), 10_000);
        assert_eq!(workgroup_count(216).unwrap(), 6);
        assert!(matches!(workgroup_count(0), Err(TerrainError::EmptyMesh)));
        assert!(matches!(workgroup_count(37), Err(TerrainError::UnevenMesh(37))));
    }

    fn gpu_setup() -> Option<(RenderContext, TerrainGenerator, BodyTextures, TempDir)> {
        let ctx = init_render_context_blocking().ok()?;
        let dir = TempDir::new().unwrap();
        let images = TextureImages::load(&TextureSettings {
            dir: dir.path().to_path_buf(),
            regenerate: true,
            raster_size: 8,
            seed: 1,
        })
        .unwrap();
        let textures = BodyTextures::new(&ctx, &images);
        let generator = TerrainGenerator::new(&ctx, &mut ShaderLibrary::new()).unwrap();
        Some((ctx, generator, textures, dir))
    }

    #[test]
    fn test_flat_parameters_keep_the_unit_sphere() {
        let Some((ctx, generator, textures, _dir)) = gpu_setup() else {
            return;
        };
        let base = build_sphere_mesh(4);
        let out = generator
            .generate(&ctx, &textures, &base, &[], 0.0, &[0.0; 9])
            .unwrap();
        assert_eq!(out.len(), base.len());
        for (a, b) in out.iter().zip(&base) {
            let p = Vec3::from_array(a.position);
            assert!((p.length() - 1.0).abs() < 1e-4);
            assert!(p.normalize().dot(Vec3::from_array(b.position)) > 0.9999);
            assert!(Vec3::from_array(a.normal).dot(p.normalize()) > 0.99);
            assert_eq!(a.uv[2], 0.0);
        }
    }

    #[test]
    fn test_crater_lowers_its_centre() {
        let Some((ctx, generator, textures, _dir)) = gpu_setup() else {
            return;
        };
        let base = build_sphere_mesh(6);
        let centre = Vec3::from_array(base[0].position);
        let crater = CraterRecord::new(centre, 1.0, true);
        let mut params = [0.0; 9];
        params[crate::params::MIN_CRATER_RADIUS] = 0.2;
        params[crate::params::MAX_CRATER_RADIUS] = 0.2;
        params[crate::params::CRATER_DEPTH] = 0.5;
        let out = generator
            .generate(&ctx, &textures, &base, &[crater], 1.0, &params)
            .unwrap();
        assert!(Vec3::from_array(out[0].position).length() < 1.0);
        assert_eq!(out[0].uv[2], 1.0);
    }

    #[test]
    fn test_uneven_mesh_is_rejected_before_submission() {
        let Some((ctx, generator, textures, _dir)) = gpu_setup() else {
            return;
        };
        let base = build_sphere_mesh(1);
        let err = generator
            .generate(&ctx, &textures, &base[..35], &[], 0.0, &[])
            .unwrap_err();
        assert!(matches!(err, TerrainError::UnevenMesh(35)));
    }
}
