use planets_cubesphere::DimensionError;

use crate::terrain::TerrainError;

#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("invalid body geometry: {0}")]
    Dimensions(#[from] DimensionError),

    #[error("terrain generation failed: {0}")]
    Terrain(#[from] TerrainError),
}
