//! Vertex layouts shared by the render pipeline and the terrain compute pass.
//!
//! [`CelestialVertex`] is the tightly packed layout used by the vertex buffer.
//! [`CelestialVertexStd430`] is the storage-buffer layout the compute shader
//! reads and writes, where every `vec3<f32>` is aligned to 16 bytes.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

/// Host-side vertex: position, uv (z = crater decal weight) and normal.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct CelestialVertex {
    pub position: [f32; 3],
    pub uv: [f32; 3],
    pub normal: [f32; 3],
}

/// Device-side vertex matching a WGSL `struct { vec3<f32>, vec3<f32>, vec3<f32> }`
/// in a storage buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct CelestialVertexStd430 {
    pub position: [f32; 3],
    _pad0: f32,
    pub uv: [f32; 3],
    _pad1: f32,
    pub normal: [f32; 3],
    _pad2: f32,
}

const_assert_eq!(std::mem::size_of::<CelestialVertex>(), 36);
const_assert_eq!(std::mem::size_of::<CelestialVertexStd430>(), 48);
const_assert_eq!(std::mem::offset_of!(CelestialVertexStd430, uv), 16);
const_assert_eq!(std::mem::offset_of!(CelestialVertexStd430, normal), 32);

impl From<CelestialVertex> for CelestialVertexStd430 {
    fn from(v: CelestialVertex) -> Self {
        Self {
            position: v.position,
            uv: v.uv,
            normal: v.normal,
            ..Self::zeroed()
        }
    }
}

impl From<CelestialVertexStd430> for CelestialVertex {
    fn from(v: CelestialVertexStd430) -> Self {
        Self {
            position: v.position,
            uv: v.uv,
            normal: v.normal,
        }
    }
}

/// Convert a host vertex slice into the storage-buffer layout, preserving order.
pub fn to_std430(vertices: &[CelestialVertex]) -> Vec<CelestialVertexStd430> {
    vertices.iter().copied().map(Into::into).collect()
}

/// Convert storage-buffer vertices back into the host layout, preserving order.
pub fn from_std430(vertices: &[CelestialVertexStd430]) -> Vec<CelestialVertex> {
    vertices.iter().copied().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(i: usize) -> CelestialVertex {
        let f = i as f32;
        CelestialVertex {
            position: [f, -f * 0.5, f32::MAX],
            uv: [f32::MIN_POSITIVE, 1.0 / (f + 1.0), f32::EPSILON],
            normal: [-0.0, f * 1e-30, -f32::MAX],
        }
    }

    #[test]
    fn test_conversion_preserves_bits_and_order() {
        let host: Vec<CelestialVertex> = (0..64).map(sample).collect();
        let device = to_std430(&host);
        assert_eq!(device.len(), host.len());
        let back = from_std430(&device);
        assert_eq!(
            bytemuck::cast_slice::<_, u8>(&back),
            bytemuck::cast_slice::<_, u8>(&host)
        );
    }

    #[test]
    fn test_padding_is_zeroed() {
        let device = CelestialVertexStd430::from(sample(3));
        let words: &[u32] = bytemuck::cast_slice(std::slice::from_ref(&device));
        assert_eq!(words[3], 0);
        assert_eq!(words[7], 0);
        assert_eq!(words[11], 0);
    }

    #[test]
    fn test_std430_fields_land_on_16_byte_boundaries() {
        let device = CelestialVertexStd430::from(sample(5));
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&device));
        assert_eq!(&floats[0..3], &sample(5).position);
        assert_eq!(&floats[4..7], &sample(5).uv);
        assert_eq!(&floats[8..11], &sample(5).normal);
    }
}
