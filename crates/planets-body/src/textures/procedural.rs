//! CPU-side procedural images: the baked rasters, the noise permutation table,
//! and stand-ins for decal and normal-map images that are not on disk.

use glam::{Vec2, Vec3};
use noise::{NoiseFn, Perlin};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use super::raster::{InterpolationRaster, SurfaceRaster};

/// Fractal noise settings for the surface raster.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceNoiseParams {
    pub octaves: u32,
    /// Frequency of the first octave, in cycles per pixel.
    pub frequency: f64,
    pub amplitude: f64,
    /// Distance, in pixels, a full-strength warp offset moves the sample.
    pub warp: f64,
    /// Decorrelates the second warp axis from the first.
    pub warp_offset: [f64; 2],
}

impl Default for SurfaceNoiseParams {
    fn default() -> Self {
        Self {
            octaves: 4,
            frequency: 0.01,
            amplitude: 1.0,
            warp: 1080.0,
            warp_offset: [5.2, 1.3],
        }
    }
}

/// Frequency of the normal-interpolation raster, in cycles per pixel.
pub const INTERPOLATION_FREQUENCY: f64 = 0.1;

/// Perlin noise remapped to `[0, 1]`.
pub struct TextureNoise {
    perlin: Perlin,
}

impl TextureNoise {
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
        }
    }

    pub fn unit(&self, x: f64, y: f64) -> f64 {
        (self.perlin.get([x, y]) * 0.5 + 0.5).clamp(0.0, 1.0)
    }

    /// Octave sum with halving amplitude and doubling frequency, normalised to `[0, 1]`.
    pub fn fractal(&self, x: f64, y: f64, params: &SurfaceNoiseParams) -> f64 {
        let mut frequency = params.frequency;
        let mut amplitude = params.amplitude;
        let mut total = 0.0;
        let mut max_amplitude = 0.0;

        for _ in 0..params.octaves {
            total += (self.unit(x * frequency, y * frequency) * 2.0 - 1.0) * amplitude;
            max_amplitude += amplitude;
            frequency *= 2.0;
            amplitude *= 0.5;
        }

        if max_amplitude == 0.0 {
            return 0.5;
        }
        (total + max_amplitude) / (2.0 * max_amplitude)
    }

    /// Fractal noise sampled at a point displaced by two more fractal lookups.
    pub fn warped(&self, x: f64, y: f64, params: &SurfaceNoiseParams) -> f64 {
        let [ox, oy] = params.warp_offset;
        let dx = self.fractal(x, y, params);
        let dy = self.fractal(x + ox, y + oy, params);
        self.fractal(x + dx * params.warp, y + dy * params.warp, params)
    }
}

/// Grey, opaque surface colour raster.
pub fn generate_surface_raster(
    width: u32,
    height: u32,
    noise: &TextureNoise,
    params: &SurfaceNoiseParams,
) -> SurfaceRaster {
    SurfaceRaster::from_fn(width, height, |x, y| {
        let grey = (noise.warped(f64::from(x), f64::from(y), params) * 255.0) as u8;
        [grey, grey, grey, 255]
    })
}

/// Blend weights in `[0, 1]` between the two normal maps.
pub fn generate_interpolation_raster(
    width: u32,
    height: u32,
    noise: &TextureNoise,
) -> InterpolationRaster {
    InterpolationRaster::from_fn(width, height, |x, y| {
        noise.unit(
            f64::from(x) * INTERPOLATION_FREQUENCY,
            f64::from(y) * INTERPOLATION_FREQUENCY,
        ) as f32
    })
}

/// Shuffled `0..=255` used by the shaders' gradient noise.
pub fn permutation_table(seed: u64) -> [u8; 256] {
    let mut table: [u8; 256] = std::array::from_fn(|i| i as u8);
    table.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
    table
}

/// Radial ejecta decal: dark floor, bright rim, rays fading to transparent.
pub fn placeholder_crater_decal(size: u32) -> image::RgbaImage {
    let noise = Perlin::new(7);
    image::RgbaImage::from_fn(size, size, |x, y| {
        let p = (Vec2::new(x as f32, y as f32) + 0.5) / size as f32 * 2.0 - 1.0;
        let r = p.length();
        let angle = f64::from(p.y.atan2(p.x));
        let rays = (noise.get([angle.cos() * 4.0, angle.sin() * 4.0]) as f32 * 0.5 + 0.5).powi(3);

        let rim = (1.0 - ((r - 0.35) / 0.08).abs()).max(0.0);
        let ejecta = rays * (1.0 - r).max(0.0) * 2.0;
        let floor = if r < 0.3 { 0.55 } else { 0.0 };

        let brightness = (0.4 + rim * 0.6 + ejecta * 0.4).min(1.0);
        let alpha = (rim + ejecta + floor).min(1.0) * f32::from(u8::from(r < 1.0));
        image::Rgba([
            (brightness * 255.0) as u8,
            (brightness * 255.0) as u8,
            (brightness * 250.0) as u8,
            (alpha * 255.0) as u8,
        ])
    })
}

/// Tangent-space normal map derived from a Perlin height field.
pub fn placeholder_normal_map(size: u32, seed: u32, frequency: f64, strength: f32) -> image::RgbaImage {
    let noise = Perlin::new(seed);
    let height = |x: f64, y: f64| noise.get([x * frequency, y * frequency]) as f32;
    image::RgbaImage::from_fn(size, size, |x, y| {
        let (fx, fy) = (f64::from(x), f64::from(y));
        let dx = height(fx + 1.0, fy) - height(fx - 1.0, fy);
        let dy = height(fx, fy + 1.0) - height(fx, fy - 1.0);
        let n = Vec3::new(-dx * strength, -dy * strength, 1.0).normalize();
        let encoded = (n * 0.5 + 0.5) * 255.0;
        image::Rgba([encoded.x as u8, encoded.y as u8, encoded.z as u8, 255])
    })
}
