//! 2-node elastic rod element for tension/compression analysis.
//!
//! The rod resists only axial force. It has 2 vertices with `ndim`
//! translational DOFs each (2D: ux, uy; 3D: ux, uy, uz).
//!
//! ## Element Formulation
//!
//! With direction cosines `c` (unit vector from vertex 0 to vertex 1) and
//! axial stiffness `k = E·A/L`, the global stiffness matrix is
//!
//! ```text
//! K = k * [ c·cᵀ  -c·cᵀ]
//!         [-c·cᵀ   c·cᵀ]
//! ```
//!
//! i.e. `K[i][j] = k * s[i] * s[j]` with `s = (c, -c)`. Recovery projects the
//! nodal displacements onto the axis through
//!
//! ```text
//! T = [c  0]
//!     [0  c]
//! ```
//!
//! giving `ε = (ua1 - ua0) / L` and `σ = E·ε`.

use crate::elements::{AxialResult, Element};
use crate::error::{Result, SolverError};
use crate::materials::RodProperties;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;

/// Relative tolerance below which a rod is considered to have zero length
const ZERO_LENGTH_TOLERANCE: f64 = 1e-12;

/// Length and orientation of a rod
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RodGeometry {
    pub length: f64,
    /// Unit vector from vertex 0 to vertex 1
    pub cosines: Vec<f64>,
}

/// 2-node elastic rod
#[derive(Debug, Clone)]
pub struct Rod {
    /// Cell id
    pub id: usize,
    /// Vertex connectivity [v0, v1]
    pub vertices: [usize; 2],
    /// Space dimension (2 or 3)
    pub ndim: usize,
    /// Modulus and area
    pub props: RodProperties,
}

impl Rod {
    /// Create a new rod element
    pub fn new(id: usize, vertices: [usize; 2], ndim: usize, props: RodProperties) -> Self {
        Self {
            id,
            vertices,
            ndim,
            props,
        }
    }

    fn check_coords(&self, coords: &[&[f64]]) -> Result<()> {
        if coords.len() != 2 {
            return Err(SolverError::WrongNodeCount {
                cell: self.id,
                expected: 2,
                actual: coords.len(),
            });
        }
        for (local, c) in coords.iter().enumerate() {
            if c.len() != self.ndim {
                return Err(SolverError::DimensionMismatch {
                    vertex: self.vertices[local],
                    expected: self.ndim,
                    actual: c.len(),
                });
            }
        }
        Ok(())
    }

    /// Compute length and direction cosines
    pub fn geometry(&self, coords: &[&[f64]]) -> Result<RodGeometry> {
        self.check_coords(coords)?;

        let delta: Vec<f64> = (0..self.ndim).map(|i| coords[1][i] - coords[0][i]).collect();
        let length = delta.iter().map(|d| d * d).sum::<f64>().sqrt();

        let scale = coords
            .iter()
            .flat_map(|c| c.iter())
            .fold(1.0_f64, |acc, x| acc.max(x.abs()));
        if length <= ZERO_LENGTH_TOLERANCE * scale {
            return Err(SolverError::ZeroLength {
                cell: self.id,
                length,
            });
        }

        let cosines = delta.iter().map(|d| d / length).collect();
        Ok(RodGeometry { length, cosines })
    }

    /// Axial stiffness k = E·A/L
    pub fn axial_stiffness(&self, length: f64) -> f64 {
        self.props.axial_rigidity() / length
    }

    /// Build the transformation matrix from global DOFs to axial displacements
    fn transformation_matrix(&self, geometry: &RodGeometry) -> DMatrix<f64> {
        let n = self.ndim;
        let mut t = DMatrix::zeros(2, 2 * n);
        for (i, &c) in geometry.cosines.iter().enumerate() {
            t[(0, i)] = c;
            t[(1, n + i)] = c;
        }
        t
    }

    /// Signed direction vector s = (c, -c) over both vertices
    fn signed_cosines(&self, geometry: &RodGeometry) -> Vec<f64> {
        geometry
            .cosines
            .iter()
            .copied()
            .chain(geometry.cosines.iter().map(|c| -c))
            .collect()
    }
}

impl Element for Rod {
    fn stiffness_matrix(&self, coords: &[&[f64]]) -> Result<DMatrix<f64>> {
        let geometry = self.geometry(coords)?;
        let k = self.axial_stiffness(geometry.length);
        let s = self.signed_cosines(&geometry);

        let size = s.len();
        Ok(DMatrix::from_fn(size, size, |i, j| k * (s[i] * s[j])))
    }

    fn recover(&self, coords: &[&[f64]], u_element: &[f64]) -> Result<AxialResult> {
        let geometry = self.geometry(coords)?;
        if u_element.len() != 2 * self.ndim {
            return Err(SolverError::SizeMismatch {
                expected: 2 * self.ndim,
                actual: u_element.len(),
            });
        }

        let t = self.transformation_matrix(&geometry);
        let ua = t * DVector::from_column_slice(u_element);

        let strain = (ua[1] - ua[0]) / geometry.length;
        let stress = self.props.modulus * strain;
        Ok(AxialResult {
            strain,
            stress,
            force: stress * self.props.area,
        })
    }

    fn num_nodes(&self) -> usize {
        2
    }

    fn dofs_per_node(&self) -> usize {
        self.ndim
    }
}
