//! The six faces of the cube that is projected onto the body's sphere.

use glam::Vec3;

/// One face of the unit cube.
///
/// Each face is described by an outward normal and an orthonormal
/// `tangent`/`bitangent` pair spanning the face. `tangent × bitangent`
/// always equals the normal, so triangles emitted in (tangent, bitangent)
/// order are counter-clockwise when seen from outside the body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CubeFace {
    /// +Z face
    Front = 0,
    /// −Z face
    Back = 1,
    /// −X face
    Left = 2,
    /// +X face
    Right = 3,
    /// +Y face
    Top = 4,
    /// −Y face
    Bottom = 5,
}

impl CubeFace {
    /// All six faces in mesh emission order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::Front,
        CubeFace::Back,
        CubeFace::Left,
        CubeFace::Right,
        CubeFace::Top,
        CubeFace::Bottom,
    ];

    /// Outward-pointing unit normal.
    #[must_use]
    pub fn normal(self) -> Vec3 {
        match self {
            CubeFace::Front => Vec3::Z,
            CubeFace::Back => Vec3::NEG_Z,
            CubeFace::Left => Vec3::NEG_X,
            CubeFace::Right => Vec3::X,
            CubeFace::Top => Vec3::Y,
            CubeFace::Bottom => Vec3::NEG_Y,
        }
    }

    /// Direction of increasing cell column on this face.
    #[must_use]
    pub fn tangent(self) -> Vec3 {
        match self {
            CubeFace::Front => Vec3::X,
            CubeFace::Back => Vec3::NEG_X,
            CubeFace::Left => Vec3::Z,
            CubeFace::Right => Vec3::NEG_Z,
            CubeFace::Top => Vec3::X,
            CubeFace::Bottom => Vec3::X,
        }
    }

    /// Direction of increasing cell row on this face.
    #[must_use]
    pub fn bitangent(self) -> Vec3 {
        match self {
            CubeFace::Front | CubeFace::Back | CubeFace::Left | CubeFace::Right => Vec3::Y,
            CubeFace::Top => Vec3::NEG_Z,
            CubeFace::Bottom => Vec3::Z,
        }
    }

    /// Lower-left corner of the face on a cube with half-extent `radius`.
    #[must_use]
    pub fn lower_left_corner(self, radius: f32) -> Vec3 {
        (self.normal() - self.tangent() - self.bitangent()) * radius
    }
}
