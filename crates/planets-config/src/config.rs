//! Configuration structs with sensible defaults and RON persistence.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Offscreen frame and projection settings.
    pub render: RenderConfig,
    /// Initial camera placement.
    pub camera: CameraConfig,
    /// Texture directory and baked-raster generation.
    pub textures: TextureConfig,
    /// Bodies in the scene, drawn in order.
    pub bodies: Vec<BodyConfig>,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Offscreen frame width in pixels.
    pub width: u32,
    /// Offscreen frame height in pixels.
    pub height: u32,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Simulation steps per second.
    pub tick_rate: u32,
    /// Directory searched for WGSL overrides of the embedded shaders.
    pub shader_dir: Option<PathBuf>,
}

/// Camera start position and rotation (radians).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub x_rotation: f32,
    pub y_rotation: f32,
}

/// Texture set configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextureConfig {
    /// Directory holding the images and the baked rasters.
    pub dir: PathBuf,
    /// Rebuild the baked rasters on startup.
    pub regenerate: bool,
    /// Edge length of the baked rasters.
    pub raster_size: u32,
    /// Seed for the noise behind the rasters and the permutation map.
    pub seed: u64,
}

/// Surface look of a body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Shading {
    TexturedMoon,
    ColouredMoon,
    Planet,
}

/// One celestial body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BodyConfig {
    /// Unique name, also the name of the body's parameter group.
    pub name: String,
    pub shading: Shading,
    pub position: [f32; 3],
    pub scale: f32,
    /// Requested mesh cell edge on the model cube (diameter 2).
    pub cell_side_length: f32,
    /// Initial tunable parameters.
    pub parameters: Vec<f32>,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Also write JSON logs to the log directory.
    pub json_log_file: bool,
    /// Start the interactive parameter console on stdin.
    pub console: bool,
}

// --- Default implementations ---

impl Default for Config {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            camera: CameraConfig::default(),
            textures: TextureConfig::default(),
            bodies: BodyConfig::demo_scene(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fov_y_degrees: 60.0,
            near: 0.1,
            far: 200.0,
            tick_rate: 60,
            shader_dir: None,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 20.0],
            x_rotation: 0.0,
            y_rotation: 0.0,
        }
    }
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("textures"),
            regenerate: false,
            raster_size: 255,
            seed: 0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_log_file: false,
            console: true,
        }
    }
}

impl BodyConfig {
    /// The three-body scene shown when no config exists yet.
    pub fn demo_scene() -> Vec<Self> {
        // crater count, wanted textures, max texture radius, min/max crater
        // radius, crater depth, rim height, noise amplitude, noise frequency
        vec![
            Self {
                name: "Moon".to_string(),
                shading: Shading::TexturedMoon,
                position: [0.0, 0.0, -20.0],
                scale: 10.0,
                cell_side_length: 0.02,
                parameters: vec![400.0, 40.0, 0.35, 0.01, 0.12, 0.35, 0.6, 0.01, 4.0],
            },
            Self {
                name: "AsteroidMoon".to_string(),
                shading: Shading::ColouredMoon,
                position: [25.0, 0.0, -20.0],
                scale: 10.0,
                cell_side_length: 0.02,
                parameters: vec![800.0, 0.0, 0.0, 0.005, 0.08, 0.5, 0.8, 0.04, 2.0],
            },
            Self {
                name: "Planet".to_string(),
                shading: Shading::Planet,
                position: [-25.0, 0.0, -20.0],
                scale: 10.0,
                cell_side_length: 0.02,
                parameters: vec![30.0, 0.0, 0.0, 0.02, 0.1, 0.2, 0.4, 0.06, 1.5],
            },
        ]
    }
}

// --- Load / Save ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).map_err(|source| ConfigError::ReadError {
                    path: config_path.clone(),
                    source,
                })?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            config
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            config
        };
        config.validate()?;
        Ok(config)
    }

    /// Save config to the given directory as `config.ron`.
    ///
    /// The file is written to a temporary sibling and renamed into place.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let write_error = |source| ConfigError::WriteError {
            path: config_path.clone(),
            source,
        };

        std::fs::create_dir_all(config_dir).map_err(write_error)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        let mut file = tempfile::NamedTempFile::new_in(config_dir).map_err(write_error)?;
        file.write_all(serialized.as_bytes()).map_err(write_error)?;
        file.persist(&config_path)
            .map_err(|e| write_error(e.error))?;
        Ok(())
    }

    /// Reject configurations the scene cannot be built from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for body in &self.bodies {
            if !seen.insert(body.name.as_str()) {
                return Err(ConfigError::DuplicateBody(body.name.clone()));
            }
        }
        Ok(())
    }
}
