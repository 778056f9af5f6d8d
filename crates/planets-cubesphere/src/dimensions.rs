//! Derived grid dimensions of a celestial body mesh.

/// Radius of the model-space sphere. Terrain math assumes a unit sphere.
pub const MODEL_RADIUS: f32 = 1.0;

/// Edge length of the cube before projection.
pub const MODEL_DIAMETER: f32 = 2.0 * MODEL_RADIUS;

/// Largest cell count per face edge whose vertex count still fits a `u32`.
const MAX_CELLS_PER_SIDE: u32 = 10_922;

/// Errors produced when deriving dimensions from a requested cell length.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DimensionError {
    /// The requested cell side length leaves no whole cell on a face edge.
    #[error(
        "cell side length {requested} yields no cells across a face of diameter {diameter}"
    )]
    NoCells { requested: f32, diameter: f32 },
    /// The requested cell side length is not a positive finite number.
    #[error("cell side length must be a positive finite number, got {0}")]
    InvalidLength(f32),
    /// The grid would contain more vertices than a draw call can address.
    #[error("cell side length {requested} yields {cells} cells per side (max {max})")]
    TooFine { requested: f32, cells: u64, max: u32 },
}

/// Grid dimensions of a cube-sphere body.
///
/// `cells_per_side` is `floor(MODEL_DIAMETER / requested)` and the actual cell
/// side length is re-derived from it, so it can differ from the request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDimensions {
    requested_cell_side_length: f32,
    cells_per_side: u32,
    cell_side_length: f32,
}

impl BodyDimensions {
    /// Derive dimensions from a requested cell side length.
    ///
    /// # Errors
    ///
    /// Returns [`DimensionError`] when the request is not positive and finite,
    /// when it is at least as long as the cube diameter, or when it is so small
    /// that the mesh would overflow `u32` vertex indexing.
    pub fn from_cell_side_length(requested: f32) -> Result<Self, DimensionError> {
        if !requested.is_finite() || requested <= 0.0 {
            return Err(DimensionError::InvalidLength(requested));
        }

        let cells = (f64::from(MODEL_DIAMETER) / f64::from(requested)).floor();
        if cells < 1.0 {
            return Err(DimensionError::NoCells {
                requested,
                diameter: MODEL_DIAMETER,
            });
        }
        if cells > f64::from(MAX_CELLS_PER_SIDE) {
            return Err(DimensionError::TooFine {
                requested,
                cells: cells as u64,
                max: MAX_CELLS_PER_SIDE,
            });
        }

        let cells_per_side = cells as u32;
        Ok(Self {
            requested_cell_side_length: requested,
            cells_per_side,
            cell_side_length: MODEL_DIAMETER / cells_per_side as f32,
        })
    }

    pub fn model_radius(&self) -> f32 {
        MODEL_RADIUS
    }

    pub fn model_diameter(&self) -> f32 {
        MODEL_DIAMETER
    }

    pub fn requested_cell_side_length(&self) -> f32 {
        self.requested_cell_side_length
    }

    /// Number of cells along one edge of a cube face. Always at least 1.
    pub fn cells_per_side(&self) -> u32 {
        self.cells_per_side
    }

    /// Actual cell side length after integer division.
    pub fn cell_side_length(&self) -> f32 {
        self.cell_side_length
    }

    /// Total vertex count of the expanded sphere mesh.
    pub fn vertex_count(&self) -> usize {
        crate::sphere_vertex_count(self.cells_per_side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_are_floored() {
        let dims = BodyDimensions::from_cell_side_length(0.6).unwrap();
        assert_eq!(dims.cells_per_side(), 3);
        assert!((dims.cell_side_length() - 2.0 / 3.0).abs() < 1e-6);
        assert!((dims.cell_side_length() - 0.6).abs() > 0.05);
        assert_eq!(dims.requested_cell_side_length(), 0.6);
    }

    #[test]
    fn test_exact_division() {
        let dims = BodyDimensions::from_cell_side_length(1.0).unwrap();
        assert_eq!(dims.cells_per_side(), 2);
        assert_eq!(dims.cell_side_length(), 1.0);
        assert_eq!(dims.vertex_count(), 144);
    }

    #[test]
    fn test_demo_resolution() {
        let dims = BodyDimensions::from_cell_side_length(0.02).unwrap();
        assert_eq!(dims.cells_per_side(), 100);
        assert_eq!(dims.vertex_count(), 360_000);
    }

    #[test]
    fn test_cell_as_long_as_diameter_gives_one_cell() {
        let dims = BodyDimensions::from_cell_side_length(2.0).unwrap();
        assert_eq!(dims.cells_per_side(), 1);
        assert_eq!(dims.cell_side_length(), 2.0);
    }

    #[test]
    fn test_cell_longer_than_diameter_is_rejected() {
        let err = BodyDimensions::from_cell_side_length(2.5).unwrap_err();
        assert_eq!(
            err,
            DimensionError::NoCells {
                requested: 2.5,
                diameter: 2.0
            }
        );
    }

    #[test]
    fn test_non_positive_and_non_finite_are_rejected() {
        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                BodyDimensions::from_cell_side_length(bad),
                Err(DimensionError::InvalidLength(_))
            ));
        }
    }

    #[test]
    fn test_absurdly_small_cells_are_rejected() {
        assert!(matches!(
            BodyDimensions::from_cell_side_length(1e-6),
            Err(DimensionError::TooFine { .. })
        ));
    }

    #[test]
    fn test_fixed_model_constants() {
        let dims = BodyDimensions::from_cell_side_length(0.5).unwrap();
        assert_eq!(dims.model_radius(), 1.0);
        assert_eq!(dims.model_diameter(), 2.0);
    }
}
