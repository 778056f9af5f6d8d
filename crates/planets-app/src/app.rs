//! Scene assembly and the main loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use glam::Vec3;
use planets_body::{
    BodyDescriptor, BodyPipeline, BodyResources, BodyShading, BodyTextures, CelestialBody,
    ParameterGroup, ParameterManager, TerrainGenerator, TextureImages, TextureSettings,
    spawn_console,
};
use planets_config::{CliArgs, Config, Shading};
use planets_render::{
    Camera, OffscreenTarget, Projection, RenderContext, RenderPassBuilder, ShaderLibrary,
    init_render_context_blocking,
};
use tracing::{info, info_span, warn};

use crate::error::AppError;
use crate::game_loop::GameLoop;
use crate::screenshot::save_png;

/// What a finished run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub updates: u64,
    pub regenerations: u64,
}

/// Everything drawn each frame.
pub struct Scene {
    pub ctx: RenderContext,
    pub bodies: Vec<CelestialBody>,
    pub camera: Camera,
    pub projection: Projection,
    pub target: OffscreenTarget,
    pub parameters: Arc<ParameterManager>,
}

pub fn body_shading(shading: Shading) -> BodyShading {
    match shading {
        Shading::TexturedMoon => BodyShading::TexturedMoon,
        Shading::ColouredMoon => BodyShading::ColouredMoon,
        Shading::Planet => BodyShading::Planet,
    }
}

pub fn texture_settings(config: &Config) -> TextureSettings {
    TextureSettings {
        dir: config.textures.dir.clone(),
        regenerate: config.textures.regenerate,
        raster_size: config.textures.raster_size,
        seed: config.textures.seed,
    }
}

pub fn camera_from_config(config: &Config) -> (Camera, Projection) {
    let camera = Camera::new(
        Vec3::from(config.camera.position),
        config.camera.x_rotation,
        config.camera.y_rotation,
    );
    let mut projection = Projection {
        fov_y: config.render.fov_y_degrees.to_radians(),
        near: config.render.near,
        far: config.render.far,
        ..Projection::default()
    };
    projection.set_aspect_ratio(config.render.width, config.render.height);
    (camera, projection)
}

impl Scene {
    /// Build the texture set, pipelines, parameter groups and every body.
    pub fn build(config: &Config) -> Result<Self, AppError> {
        let _span = info_span!("scene_build").entered();
        let ctx = init_render_context_blocking()?;

        let images = TextureImages::load(&texture_settings(config))?;
        let textures = Arc::new(BodyTextures::new(&ctx, &images));

        let mut shaders = ShaderLibrary::new();
        if let Some(dir) = &config.render.shader_dir {
            shaders = shaders.with_shader_dir(dir);
        }
        let generator = Arc::new(TerrainGenerator::new(&ctx, &mut shaders)?);

        let parameters = Arc::new(ParameterManager::new());
        let mut pipelines: HashMap<BodyShading, Arc<BodyPipeline>> = HashMap::new();
        let mut bodies = Vec::with_capacity(config.bodies.len());

        for body in &config.bodies {
            let shading = body_shading(body.shading);
            let pipeline = match pipelines.get(&shading) {
                Some(pipeline) => Arc::clone(pipeline),
                None => {
                    let pipeline = Arc::new(BodyPipeline::new(
                        &ctx,
                        &mut shaders,
                        textures.layout(),
                        shading,
                    )?);
                    pipelines.insert(shading, Arc::clone(&pipeline));
                    pipeline
                }
            };

            let group =
                parameters.insert(ParameterGroup::new(&body.name, body.parameters.clone())?);
            let descriptor = BodyDescriptor {
                name: body.name.clone(),
                position: Vec3::from(body.position),
                scale: body.scale,
                cell_side_length: body.cell_side_length,
            };
            let resources = BodyResources {
                textures: Arc::clone(&textures),
                generator: Arc::clone(&generator),
                pipeline,
            };
            let celestial = CelestialBody::new(&ctx, &descriptor, group, resources).map_err(
                |source| AppError::Body {
                    name: body.name.clone(),
                    source,
                },
            )?;
            bodies.push(celestial);
        }

        let (camera, projection) = camera_from_config(config);
        let target = OffscreenTarget::new(&ctx, config.render.width, config.render.height);
        info!(
            bodies = bodies.len(),
            pipelines = pipelines.len(),
            width = target.width(),
            height = target.height(),
            "scene ready"
        );

        Ok(Self {
            ctx,
            bodies,
            camera,
            projection,
            target,
            parameters,
        })
    }

    /// Advance every body by one fixed step. Returns how many regenerated.
    pub fn update(&mut self, dt: f32) -> Result<u64, AppError> {
        let mut regenerated = 0;
        for body in &mut self.bodies {
            let changed = body
                .update(&self.ctx, dt)
                .map_err(|source| AppError::Regeneration {
                    name: body.name().to_string(),
                    source,
                })?;
            regenerated += u64::from(changed);
        }
        Ok(regenerated)
    }

    /// Render all bodies into the offscreen target.
    pub fn render(&self) {
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });
        {
            let mut pass = RenderPassBuilder::new()
                .label("frame")
                .begin(&mut encoder, &self.target);
            for body in &self.bodies {
                body.render(&self.ctx.queue, &mut pass, &self.camera, &self.projection);
            }
        }
        self.ctx.queue.submit(Some(encoder.finish()));
    }
}

/// Join a console thread that already ended. A console still waiting on
/// stdin cannot be interrupted, so it is detached and ends with the process.
/// Returns whether the thread was joined.
fn release_console(handle: JoinHandle<()>) -> bool {
    if !handle.is_finished() {
        info!("frame limit reached, abandoning parameter console blocked on stdin");
        return false;
    }
    if handle.join().is_err() {
        warn!("parameter console thread panicked");
    }
    true
}

/// Run the application until the frame budget is spent or the console quits.
pub fn run(config: &Config, args: &CliArgs) -> Result<RunSummary, AppError> {
    let mut scene = Scene::build(config)?;

    let console: Option<JoinHandle<()>> = if config.debug.console {
        let stdin = std::io::BufReader::new(std::io::stdin());
        let handle = spawn_console(Arc::clone(&scene.parameters), stdin, std::io::stdout())
            .map_err(AppError::Console)?;
        Some(handle)
    } else {
        None
    };

    // Without a console nothing could ever stop an unbounded run.
    let frame_limit = match (args.frames, &console) {
        (0, None) => {
            warn!("no frame limit and no console, rendering a single frame");
            1
        }
        (frames, _) => frames,
    };

    let tick_rate = config.render.tick_rate.max(1);
    let mut game_loop = GameLoop::with_timestep(1.0 / f64::from(tick_rate));
    let frame_pause = Duration::from_secs_f64(game_loop.timestep());
    let mut regenerations = 0;

    while frame_limit == 0 || game_loop.frame_count() < frame_limit {
        if console.as_ref().is_some_and(|h| h.is_finished()) {
            info!("parameter console closed, stopping");
            break;
        }

        let update = |scene: &mut Scene, dt: f64, _sim_time: f64| {
            regenerations += scene.update(dt as f32)?;
            Ok::<(), AppError>(())
        };
        let render = |scene: &Scene, _alpha: f64| {
            scene.render();
            Ok::<(), AppError>(())
        };
        if frame_limit == 0 {
            game_loop.tick(&mut scene, update, render)?;
            std::thread::sleep(frame_pause);
        } else {
            game_loop.tick_fixed(game_loop.timestep(), &mut scene, update, render)?;
        }
    }

    if let Some(handle) = console {
        release_console(handle);
    }

    if let Some(path) = &args.screenshot {
        let pixels = scene.target.read_rgba8(&scene.ctx)?;
        save_png(path, scene.target.width(), scene.target.height(), &pixels)?;
        info!(path = %path.display(), "screenshot written");
    }

    let summary = RunSummary {
        frames: game_loop.frame_count(),
        updates: game_loop.update_count(),
        regenerations,
    };
    info!(
        frames = summary.frames,
        updates = summary.updates,
        regenerations = summary.regenerations,
        "run finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use planets_config::BodyConfig;

    #[test]
    fn test_shading_mapping_is_one_to_one() {
        assert_eq!(body_shading(Shading::TexturedMoon), BodyShading::TexturedMoon);
        assert_eq!(body_shading(Shading::ColouredMoon), BodyShading::ColouredMoon);
        assert_eq!(body_shading(Shading::Planet), BodyShading::Planet);
    }

    #[test]
    fn test_camera_from_config() {
        let mut config = Config::default();
        config.render.width = 800;
        config.render.height = 400;
        config.camera.position = [1.0, 2.0, 3.0];
        let (camera, projection) = camera_from_config(&config);
        assert_eq!(camera.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(projection.aspect_ratio, 2.0);
        assert!((projection.fov_y - 60f32.to_radians()).abs() < 1e-6);
    }

    fn small_config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.render.width = 64;
        config.render.height = 36;
        config.textures.dir = dir.to_path_buf();
        config.textures.regenerate = true;
        config.textures.raster_size = 8;
        config.debug.console = false;
        config.bodies = BodyConfig::demo_scene();
        for body in &mut config.bodies {
            body.cell_side_length = 0.25;
            body.parameters[0] = body.parameters[0].min(20.0);
            body.parameters[1] = body.parameters[1].min(5.0);
        }
        config
    }

    #[test]
    fn test_run_renders_and_writes_screenshot() {
        if init_render_context_blocking().is_err() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path());
        let shot = dir.path().join("frame.png");
        let args = CliArgs {
            frames: 2,
            screenshot: Some(shot.clone()),
            ..Default::default()
        };
        let summary = run(&config, &args).unwrap();
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.updates, 2);
        assert_eq!(summary.regenerations, 0);
        assert!(shot.is_file());
    }

    #[test]
    fn test_parameter_edit_triggers_regeneration() {
        if init_render_context_blocking().is_err() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let mut scene = Scene::build(&small_config(dir.path())).unwrap();
        assert_eq!(scene.update(1.0 / 60.0).unwrap(), 0);

        scene.parameters.group("Planet").unwrap().set(0, 3.0).unwrap();
        assert_eq!(scene.update(1.0 / 60.0).unwrap(), 1);
        assert_eq!(scene.update(1.0 / 60.0).unwrap(), 0);
    }

    #[test]
    fn test_degenerate_body_names_itself() {
        if init_render_context_blocking().is_err() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config(dir.path());
        config.bodies[2].cell_side_length = 5.0;
        match Scene::build(&config) {
            Err(AppError::Body { name, .. }) => assert_eq!(name, "Planet"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("degenerate body should fail"),
        }
    }

    #[test]
    fn test_bounded_run_updates_every_frame() {
        if init_render_context_blocking().is_err() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config(dir.path());
        config.render.tick_rate = 30;
        let args = CliArgs {
            frames: 5,
            ..Default::default()
        };
        let summary = run(&config, &args).unwrap();
        assert_eq!(summary.frames, 5);
        assert_eq!(summary.updates, 5);
    }

    #[test]
    fn test_release_console_joins_finished_thread() {
        let handle = std::thread::spawn(|| {});
        while !handle.is_finished() {
            std::thread::yield_now();
        }
        assert!(release_console(handle));
    }

    #[test]
    fn test_release_console_detaches_blocked_thread() {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let handle = std::thread::spawn(move || {
            let _ = rx.recv();
        });
        assert!(!release_console(handle));
        drop(tx);
    }
}
