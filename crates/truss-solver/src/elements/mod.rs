//! Element formulations.
//!
//! Each element kind implements [`Element`]; the [`factory`] selects the
//! implementation from a mesh cell's [`ElementKind`](crate::mesh::ElementKind).

use crate::error::Result;
use nalgebra::DMatrix;
use serde::Serialize;

pub mod factory;
pub mod rod;

pub use factory::DynamicElement;
pub use rod::{Rod, RodGeometry};

/// Axial quantities recovered from nodal displacements
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AxialResult {
    /// Axial strain ε
    pub strain: f64,
    /// Axial stress σ = E·ε
    pub stress: f64,
    /// Axial force N = σ·A (positive in tension)
    pub force: f64,
}

/// Element interface for finite element calculations
pub trait Element {
    /// Compute the element stiffness matrix in global coordinates
    ///
    /// # Arguments
    /// * `coords` - Vertex coordinates, one slice per element vertex
    ///
    /// # Returns
    /// Element stiffness matrix k_e (size: num_dofs × num_dofs)
    fn stiffness_matrix(&self, coords: &[&[f64]]) -> Result<DMatrix<f64>>;

    /// Recover strain, stress and force from the element's displacements
    ///
    /// `u_element` holds the element DOF values in local DOF order
    /// (vertex-major, then direction).
    fn recover(&self, coords: &[&[f64]], u_element: &[f64]) -> Result<AxialResult>;

    /// Get the number of vertices for this element type
    fn num_nodes(&self) -> usize;

    /// Get the number of degrees of freedom per vertex
    fn dofs_per_node(&self) -> usize;

    /// Get the global DOF indices for this element
    ///
    /// Vertex ids are zero-based, so vertex `v` owns equations
    /// `v * dofs_per_node .. (v + 1) * dofs_per_node`.
    fn global_dof_indices(&self, connectivity: &[usize]) -> Vec<usize> {
        let dofs_per_node = self.dofs_per_node();
        let mut indices = Vec::with_capacity(connectivity.len() * dofs_per_node);
        for &vertex in connectivity {
            let base_dof = vertex * dofs_per_node;
            for local_dof in 0..dofs_per_node {
                indices.push(base_dof + local_dof);
            }
        }
        indices
    }
}
