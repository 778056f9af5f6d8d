//! Fully expanded cube-sphere triangle list.

use glam::Vec3;

use crate::{CelestialVertex, CubeFace, MODEL_DIAMETER, MODEL_RADIUS};

/// Two triangles of three vertices per grid cell.
pub const VERTICES_PER_CELL: usize = 6;

/// Vertex count of a sphere mesh with `cells_per_side` cells along each face edge.
pub fn sphere_vertex_count(cells_per_side: u32) -> usize {
    let cells = cells_per_side as usize;
    CubeFace::ALL.len() * cells * cells * VERTICES_PER_CELL
}

/// Build the unindexed sphere mesh.
///
/// Faces are emitted in [`CubeFace::ALL`] order, rows bottom to top and
/// columns left to right within a face. Every cell yields
/// `LL, LR, UL, LR, UR, UL`. The result is a pure function of `cells_per_side`.
///
/// # Panics
///
/// Panics if `cells_per_side` is zero.
pub fn build_sphere_mesh(cells_per_side: u32) -> Vec<CelestialVertex> {
    assert!(cells_per_side >= 1, "a sphere mesh needs at least one cell per side");

    let mut vertices = Vec::with_capacity(sphere_vertex_count(cells_per_side));
    for face in CubeFace::ALL {
        vertices.extend(face_vertices(face, cells_per_side));
    }
    vertices
}

/// Triangles of a single face, already projected onto the sphere.
pub fn face_vertices(face: CubeFace, cells_per_side: u32) -> Vec<CelestialVertex> {
    let cell_side_length = MODEL_DIAMETER / cells_per_side as f32;
    let corner = face.lower_left_corner(MODEL_RADIUS);
    let to_right = face.tangent() * cell_side_length;
    let to_up = face.bitangent() * cell_side_length;

    let grid_vertex = |x: u32, y: u32| {
        let on_cube = corner + to_right * x as f32 + to_up * y as f32;
        sphere_vertex(on_cube)
    };

    let cells = cells_per_side as usize;
    let mut vertices = Vec::with_capacity(cells * cells * VERTICES_PER_CELL);
    for y in 0..cells_per_side {
        for x in 0..cells_per_side {
            let lower_left = grid_vertex(x, y);
            let lower_right = grid_vertex(x + 1, y);
            let upper_right = grid_vertex(x + 1, y + 1);
            let upper_left = grid_vertex(x, y + 1);

            vertices.extend_from_slice(&[
                lower_left,
                lower_right,
                upper_left,
                lower_right,
                upper_right,
                upper_left,
            ]);
        }
    }
    vertices
}

fn sphere_vertex(on_cube: Vec3) -> CelestialVertex {
    let normal = on_cube.normalize();
    CelestialVertex {
        position: (normal * MODEL_RADIUS).to_array(),
        uv: [0.0; 3],
        normal: normal.to_array(),
    }
}
