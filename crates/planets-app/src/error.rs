use planets_body::{BodyError, ParameterError, TerrainError, TextureError};
use planets_config::ConfigError;
use planets_render::{ReadbackError, RenderContextError, ShaderError};

use crate::platform::PlatformError;
use crate::screenshot::ScreenshotError;

/// Every failure that unwinds to `main`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("GPU initialisation failed: {0}")]
    Gpu(#[from] RenderContextError),

    #[error("failed to prepare textures: {0}")]
    Texture(#[from] TextureError),

    #[error("failed to load shader: {0}")]
    Shader(#[from] ShaderError),

    #[error("invalid parameters: {0}")]
    Parameter(#[from] ParameterError),

    #[error("failed to build body '{name}': {source}")]
    Body {
        name: String,
        #[source]
        source: BodyError,
    },

    #[error("failed to regenerate body '{name}': {source}")]
    Regeneration {
        name: String,
        #[source]
        source: TerrainError,
    },

    #[error("failed to read the frame back: {0}")]
    FrameReadback(#[from] ReadbackError),

    #[error(transparent)]
    Screenshot(#[from] ScreenshotError),

    #[error("failed to start the parameter console: {0}")]
    Console(#[source] std::io::Error),
}
