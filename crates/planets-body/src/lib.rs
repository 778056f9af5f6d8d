//! Procedural celestial bodies: crater placement, GPU terrain generation,
//! live tunable parameters and the shared texture set.

pub mod body;
pub mod console;
pub mod crater;
mod error;
pub mod params;
pub mod render;
pub mod terrain;
pub mod textures;

pub use body::{BodyDescriptor, BodyResources, CelestialBody, crater_settings};
pub use console::{CommandError, ConsoleCommand, parse_command, run_console, spawn_console};
pub use crater::{CraterRecord, CraterSettings, generate_craters};
pub use error::BodyError;
pub use params::{
    MAX_PARAMETERS, ParameterError, ParameterGroup, ParameterManager, ParameterSnapshot,
};
pub use render::{BodyPipeline, BodyShading, BodyUniform};
pub use terrain::{TerrainError, TerrainGenerator, TerrainUniform};
pub use textures::{BodyTextures, RasterError, TextureError, TextureImages, TextureSettings};
