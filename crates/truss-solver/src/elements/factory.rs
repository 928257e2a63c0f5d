//! Element factory for creating element instances from mesh data
//!
//! Selects the formulation from a cell's element kind and resolves the
//! parameters it needs from the property registry.

use crate::elements::{AxialResult, Element, Rod, RodGeometry};
use crate::error::Result;
use crate::materials::{PropertyRegistry, RodProperties};
use crate::mesh::{Cell, ElementKind};
use nalgebra::DMatrix;

/// Dynamic element wrapper that can hold any element kind
///
/// This lets assembly and recovery treat cells uniformly without knowing the
/// concrete formulation at compile time.
#[derive(Debug, Clone)]
pub enum DynamicElement {
    Rod(Rod),
}

impl DynamicElement {
    /// Create an element from a mesh cell
    ///
    /// # Errors
    /// Fails with a configuration error if the cell's region has no property
    /// set or the set lacks a parameter the formulation requires.
    pub fn from_cell(cell: &Cell, ndim: usize, registry: &PropertyRegistry) -> Result<Self> {
        cell.validate()?;
        let set = registry.lookup(cell.region, cell.id)?;
        match cell.kind {
            ElementKind::Rod => {
                let props = RodProperties::from_set(cell.region, set)?;
                let rod = Rod::new(cell.id, [cell.vertices[0], cell.vertices[1]], ndim, props);
                Ok(DynamicElement::Rod(rod))
            }
        }
    }

    /// Element kind of the wrapped formulation
    pub fn kind(&self) -> ElementKind {
        match self {
            DynamicElement::Rod(_) => ElementKind::Rod,
        }
    }

    /// Compute stiffness matrix
    pub fn stiffness_matrix(&self, coords: &[&[f64]]) -> Result<DMatrix<f64>> {
        match self {
            DynamicElement::Rod(e) => e.stiffness_matrix(coords),
        }
    }

    /// Length and direction cosines
    pub fn geometry(&self, coords: &[&[f64]]) -> Result<RodGeometry> {
        match self {
            DynamicElement::Rod(e) => e.geometry(coords),
        }
    }

    /// Recover axial quantities from element displacements
    pub fn recover(&self, coords: &[&[f64]], u_element: &[f64]) -> Result<AxialResult> {
        match self {
            DynamicElement::Rod(e) => e.recover(coords, u_element),
        }
    }

    /// Get the global DOF indices for this element
    pub fn global_dof_indices(&self, connectivity: &[usize]) -> Vec<usize> {
        match self {
            DynamicElement::Rod(e) => e.global_dof_indices(connectivity),
        }
    }

    /// Get number of DOFs for this element
    pub fn num_dofs(&self) -> usize {
        match self {
            DynamicElement::Rod(e) => e.num_nodes() * e.dofs_per_node(),
        }
    }
}
