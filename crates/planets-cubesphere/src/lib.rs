//! Cube-sphere geometry for celestial bodies: face frames, body dimensions,
//! the fully expanded sphere mesh, and the host/device vertex layouts.

mod cube_face;
mod dimensions;
mod sphere_mesh;
mod vertex;

pub use cube_face::CubeFace;
pub use dimensions::{BodyDimensions, DimensionError, MODEL_DIAMETER, MODEL_RADIUS};
pub use sphere_mesh::{VERTICES_PER_CELL, build_sphere_mesh, face_vertices, sphere_vertex_count};
pub use vertex::{CelestialVertex, CelestialVertexStd430, from_std430, to_std430};
