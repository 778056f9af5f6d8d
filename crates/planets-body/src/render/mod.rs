//! Render pipelines for celestial bodies.
//!
//! All shadings share one WGSL module and one vertex stage; they differ only
//! in the fragment entry point. Group 0 holds the per-body [`BodyUniform`],
//! group 1 the shared [`BodyTextures`](crate::textures::BodyTextures) set.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use planets_cubesphere::CelestialVertex;
use planets_render::{Camera, DepthBuffer, Projection, RenderContext, ShaderError, ShaderLibrary};
use static_assertions::const_assert_eq;

pub const BODY_SHADER_NAME: &str = "celestial_body";
const BODY_SHADER: &str = include_str!("celestial_body.wgsl");

/// Bind group index of the per-body uniform.
pub const UNIFORM_GROUP: u32 = 0;
/// Bind group index of the shared texture set.
pub const TEXTURE_GROUP: u32 = 1;

/// Surface look of a body, selecting the fragment entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyShading {
    TexturedMoon,
    ColouredMoon,
    Planet,
}

impl BodyShading {
    pub fn fragment_entry(self) -> &'static str {
        match self {
            Self::TexturedMoon => "fs_textured_moon",
            Self::ColouredMoon => "fs_coloured_moon",
            Self::Planet => "fs_planet",
        }
    }
}

/// Per-body transform block: camera rotation and projection, camera
/// position, uniform scale and world position.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BodyUniform {
    pub view_rotation: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub camera_position: [f32; 3],
    pub scale: f32,
    pub body_position: [f32; 3],
    _pad: f32,
}

const_assert_eq!(std::mem::size_of::<BodyUniform>(), 160);
const_assert_eq!(std::mem::offset_of!(BodyUniform, camera_position), 128);
const_assert_eq!(std::mem::offset_of!(BodyUniform, body_position), 144);

impl BodyUniform {
    pub fn new(camera: &Camera, projection: &Projection, position: Vec3, scale: f32) -> Self {
        Self {
            view_rotation: camera.view_rotation().to_cols_array_2d(),
            projection: projection.matrix().to_cols_array_2d(),
            camera_position: camera.position.to_array(),
            scale,
            body_position: position.to_array(),
            _pad: 0.0,
        }
    }
}

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];

/// Vertex buffer layout of [`CelestialVertex`].
pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<CelestialVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

/// One compiled render pipeline for a shading.
pub struct BodyPipeline {
    pub shading: BodyShading,
    pub pipeline: wgpu::RenderPipeline,
    pub uniform_layout: wgpu::BindGroupLayout,
}

impl BodyPipeline {
    pub fn new(
        ctx: &RenderContext,
        shaders: &mut ShaderLibrary,
        texture_layout: &wgpu::BindGroupLayout,
        shading: BodyShading,
    ) -> Result<Self, ShaderError> {
        let device = &ctx.device;
        let shader = shaders.get_or_load(device, BODY_SHADER_NAME, BODY_SHADER)?;

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("body-uniform-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(160), // BodyUniform
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("body-pipeline-layout"),
            bind_group_layouts: &[&uniform_layout, texture_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(shading.fragment_entry()),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(DepthBuffer::depth_stencil_state()),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(shading.fragment_entry()),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Ok(Self {
            shading,
            pipeline,
            uniform_layout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec4};

    #[test]
    fn test_fragment_entries_are_distinct() {
        let entries: std::collections::HashSet<_> =
            [BodyShading::TexturedMoon, BodyShading::ColouredMoon, BodyShading::Planet]
                .map(BodyShading::fragment_entry)
                .into_iter()
                .collect();
        assert_eq!(entries.len(), 3);
        for entry in entries {
            assert!(BODY_SHADER.contains(&format!("fn {entry}(")));
        }
    }

    #[test]
    fn test_vertex_layout_matches_host_vertex() {
        let layout = vertex_layout();
        assert_eq!(layout.array_stride, 36);
        let offsets: Vec<_> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
    }

    #[test]
    fn test_uniform_places_body_in_front_of_camera() {
        let camera = Camera::default();
        let projection = Projection::default();
        let uniform = BodyUniform::new(&camera, &projection, Vec3::new(0.0, 0.0, -20.0), 10.0);
        assert_eq!(uniform.scale, 10.0);
        assert_eq!(uniform.body_position, [0.0, 0.0, -20.0]);

        // Mirror the vertex stage for the body's nearest point.
        let world = Vec3::new(0.0, 0.0, 1.0) * uniform.scale + Vec3::from(uniform.body_position);
        let view = Mat4::from_cols_array_2d(&uniform.view_rotation)
            * (world - Vec3::from(uniform.camera_position)).extend(1.0);
        let clip: Vec4 = Mat4::from_cols_array_2d(&uniform.projection) * view;
        let ndc_depth = clip.z / clip.w;
        assert!(clip.w > 0.0);
        assert!((0.0..=1.0).contains(&ndc_depth));
        assert!(clip.x.abs() < 1e-4 && clip.y.abs() < 1e-4);
    }
}
