//! A renderable, regenerating celestial body.

use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use planets_cubesphere::{BodyDimensions, CelestialVertex, build_sphere_mesh};
use planets_render::{BufferAllocator, Camera, Projection, RenderContext};
use tracing::{debug, info, trace, warn};

use crate::crater::{CraterRecord, CraterSettings, generate_craters};
use crate::error::BodyError;
use crate::params::{
    CRATER_COUNT, MAX_TEXTURE_RADIUS, ParameterGroup, ParameterSnapshot, WANTED_TEXTURES,
};
use crate::render::{BodyPipeline, BodyUniform, TEXTURE_GROUP, UNIFORM_GROUP};
use crate::terrain::{TerrainError, TerrainGenerator};
use crate::textures::BodyTextures;

/// Placement and size of a body in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDescriptor {
    pub name: String,
    pub position: Vec3,
    pub scale: f32,
    pub cell_side_length: f32,
}

/// Process-wide objects every body draws with.
#[derive(Clone)]
pub struct BodyResources {
    pub textures: Arc<BodyTextures>,
    pub generator: Arc<TerrainGenerator>,
    pub pipeline: Arc<BodyPipeline>,
}

pub struct CelestialBody {
    name: String,
    position: Vec3,
    scale: f32,
    dimensions: BodyDimensions,
    base_mesh: Vec<CelestialVertex>,
    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    parameters: Arc<ParameterGroup>,
    observed_version: u64,
    craters: Vec<CraterRecord>,
    resources: BodyResources,
}

impl CelestialBody {
    /// Build the base mesh and run the first terrain generation.
    ///
    /// Geometry is validated before anything is allocated on the device.
    pub fn new(
        ctx: &RenderContext,
        descriptor: &BodyDescriptor,
        parameters: Arc<ParameterGroup>,
        resources: BodyResources,
    ) -> Result<Self, BodyError> {
        let dimensions = BodyDimensions::from_cell_side_length(descriptor.cell_side_length)?;
        let base_mesh = build_sphere_mesh(dimensions.cells_per_side());
        info!(
            body = %descriptor.name,
            cells_per_side = dimensions.cells_per_side(),
            cell_side_length = dimensions.cell_side_length(),
            vertices = base_mesh.len(),
            "building celestial body"
        );

        let snapshot = parameters.snapshot();
        let (vertices, craters) =
            regenerate(ctx, &resources, &descriptor.name, &base_mesh, &snapshot)?;

        let alloc = BufferAllocator::new(&ctx.device);
        let vertex_buffer = alloc.create_vertex_buffer(
            &format!("{}-vertices", descriptor.name),
            bytemuck::cast_slice(&vertices),
        );
        let uniform = BodyUniform::new(
            &Camera::default(),
            &Projection::default(),
            descriptor.position,
            descriptor.scale,
        );
        let uniform_buffer = alloc.create_uniform_buffer(
            &format!("{}-uniform", descriptor.name),
            bytemuck::bytes_of(&uniform),
        );
        let uniform_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("body-uniform-bind-group"),
            layout: &resources.pipeline.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            name: descriptor.name.clone(),
            position: descriptor.position,
            scale: descriptor.scale,
            dimensions,
            base_mesh,
            vertex_buffer,
            uniform_buffer,
            uniform_bind_group,
            observed_version: snapshot.version,
            parameters,
            craters,
            resources,
        })
    }

    /// Regenerate from the base mesh when the parameter group changed since
    /// the last observation. Returns whether a regeneration ran.
    ///
    /// On error the published vertices are left untouched.
    pub fn update(&mut self, ctx: &RenderContext, dt: f32) -> Result<bool, TerrainError> {
        let snapshot = self.parameters.snapshot();
        if snapshot.version == self.observed_version {
            return Ok(false);
        }
        trace!(body = %self.name, dt, version = snapshot.version, "parameters changed");
        // A failed attempt is not retried until the parameters change again.
        self.observed_version = snapshot.version;

        let (vertices, craters) =
            regenerate(ctx, &self.resources, &self.name, &self.base_mesh, &snapshot)?;
        ctx.queue
            .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        self.craters = craters;
        Ok(true)
    }

    /// Record one draw of the body into `pass`, then restore the default
    /// sampler so the crater sampler does not leak into later draws.
    pub fn render(
        &self,
        queue: &wgpu::Queue,
        pass: &mut wgpu::RenderPass<'_>,
        camera: &Camera,
        projection: &Projection,
    ) {
        let uniform = BodyUniform::new(camera, projection, self.position, self.scale);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));

        let textures = &self.resources.textures;
        pass.set_pipeline(&self.resources.pipeline.pipeline);
        pass.set_bind_group(UNIFORM_GROUP, &self.uniform_bind_group, &[]);
        textures.bind(pass, TEXTURE_GROUP);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..self.vertex_count(), 0..1);
        textures.bind_default_sampler(pass, TEXTURE_GROUP);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Rendered radius: model radius times scale.
    pub fn radius(&self) -> f32 {
        self.dimensions.model_radius() * self.scale
    }

    pub fn dimensions(&self) -> &BodyDimensions {
        &self.dimensions
    }

    pub fn vertex_count(&self) -> u32 {
        self.base_mesh.len() as u32
    }

    /// Craters of the most recent successful generation.
    pub fn craters(&self) -> &[CraterRecord] {
        &self.craters
    }
}

fn regenerate(
    ctx: &RenderContext,
    resources: &BodyResources,
    name: &str,
    base_mesh: &[CelestialVertex],
    snapshot: &ParameterSnapshot,
) -> Result<(Vec<CelestialVertex>, Vec<CraterRecord>), TerrainError> {
    let start = Instant::now();
    let settings = crater_settings(name, snapshot, base_mesh.len());
    let craters = generate_craters(base_mesh, &settings, &mut rand::rng());

    let vertices = resources.generator.generate(
        ctx,
        &resources.textures,
        base_mesh,
        &craters,
        settings.max_texture_radius,
        &snapshot.values,
    )?;

    debug!(
        body = name,
        craters = craters.len(),
        wanted_textures = settings.wanted_textures,
        textured = craters.iter().filter(|c| c.has_texture()).count(),
        vertices = vertices.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "terrain regenerated"
    );
    Ok((vertices, craters))
}

/// Read placement settings from a snapshot, clamping counts so that
/// `wanted_textures <= count <= vertex_count`.
pub fn crater_settings(name: &str, snapshot: &ParameterSnapshot, vertex_count: usize) -> CraterSettings {
    let count = clamp_count(name, "crater count", snapshot.get(CRATER_COUNT), vertex_count);
    let wanted_textures = clamp_count(
        name,
        "wanted textures",
        snapshot.get(WANTED_TEXTURES),
        count,
    );
    CraterSettings {
        count,
        wanted_textures,
        max_texture_radius: snapshot.get(MAX_TEXTURE_RADIUS).max(0.0),
    }
}

fn clamp_count(name: &str, what: &str, value: f32, max: usize) -> usize {
    let requested = if value > 0.0 { value as usize } else { 0 };
    if requested > max {
        warn!(body = name, what, requested, max, "clamping parameter");
        return max;
    }
    requested
}
