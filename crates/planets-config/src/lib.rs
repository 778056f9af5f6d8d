//! Configuration for the planets renderer.
//!
//! Settings persist to disk as a RON file and can be overridden from the
//! command line via clap.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    BodyConfig, CameraConfig, Config, DebugConfig, RenderConfig, Shading, TextureConfig,
};
pub use error::ConfigError;
