//! Texture resources shared by every celestial body.

mod procedural;
mod raster;
mod set;

pub use procedural::{
    INTERPOLATION_FREQUENCY, SurfaceNoiseParams, TextureNoise, generate_interpolation_raster,
    generate_surface_raster, permutation_table, placeholder_crater_decal, placeholder_normal_map,
};
pub use raster::{InterpolationRaster, Raster, RasterError, RasterOperation, SurfaceRaster};
pub use set::{
    BodyTextures, CRATER_DECAL_FILE, NORMAL_INTERPOLATION_FILE, NORMAL_MAP_FILES,
    SURFACE_TEXTURE_FILE, TextureError, TextureImages, TextureSettings, bake_rasters,
};
