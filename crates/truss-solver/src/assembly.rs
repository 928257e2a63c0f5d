//! Global stiffness assembly.
//!
//! ## Assembly Process
//!
//! 1. Check that every region tag used by the mesh has properties
//! 2. Formulate each element (local stiffness k_e and DOF map) in id order
//! 3. Scatter-add every k_e into the dense global matrix K
//!
//! Element matrices are kept alongside K so that stresses can be recovered
//! after the solve and the per-element matrices can be reported.
//!
//! With [`AssemblyStrategy::Parallel`] the element matrices are formulated on
//! the rayon thread pool; the scatter still runs sequentially in id order, so
//! K is bit-identical to the sequential result.

use crate::backend::SparseTripletsF64;
use crate::elements::{AxialResult, DynamicElement, RodGeometry};
use crate::error::Result;
use crate::materials::PropertyRegistry;
use crate::mesh::{Cell, Mesh};
use nalgebra::DMatrix;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// How element matrices are formulated during assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyStrategy {
    #[default]
    Sequential,
    /// Formulate elements in parallel, scatter in id order
    Parallel,
}

/// An element together with its local stiffness and DOF map
#[derive(Debug, Clone)]
pub struct FormulatedElement {
    /// Cell id
    pub id: usize,
    /// Region tag of the cell
    pub region: i32,
    pub element: DynamicElement,
    /// Vertex connectivity
    pub vertices: Vec<usize>,
    /// Vertex coordinates, one entry per vertex
    pub coords: Vec<Vec<f64>>,
    /// Global DOF index of each local DOF
    pub dofs: Vec<usize>,
    /// Element stiffness matrix in global orientation
    pub stiffness: DMatrix<f64>,
}

impl FormulatedElement {
    fn coord_slices(&self) -> Vec<&[f64]> {
        self.coords.iter().map(Vec::as_slice).collect()
    }

    /// Length and direction cosines
    pub fn geometry(&self) -> Result<RodGeometry> {
        self.element.geometry(&self.coord_slices())
    }

    /// Recover axial quantities from the global displacement vector
    pub fn recover(&self, u_global: &[f64]) -> Result<AxialResult> {
        let u_element: Vec<f64> = self.dofs.iter().map(|&d| u_global[d]).collect();
        self.element.recover(&self.coord_slices(), &u_element)
    }
}

/// Assembled global stiffness matrix
#[derive(Debug, Clone)]
pub struct GlobalStiffness {
    /// Global stiffness matrix K (num_dofs × num_dofs)
    pub matrix: DMatrix<f64>,
    /// Number of degrees of freedom
    pub num_dofs: usize,
    /// DOFs per vertex (mesh dimension)
    pub ndim: usize,
    /// Formulated elements, ordered by cell id
    pub elements: Vec<FormulatedElement>,
}

impl GlobalStiffness {
    /// Create an empty system
    pub fn new(num_dofs: usize, ndim: usize) -> Self {
        Self {
            matrix: DMatrix::zeros(num_dofs, num_dofs),
            num_dofs,
            ndim,
            elements: Vec::new(),
        }
    }

    /// Assemble the global stiffness matrix sequentially
    pub fn assemble(mesh: &Mesh, registry: &PropertyRegistry) -> Result<Self> {
        Self::assemble_with(mesh, registry, AssemblyStrategy::Sequential)
    }

    /// Assemble the global stiffness matrix with the given strategy
    ///
    /// # Errors
    /// Configuration errors (missing region or parameter) are reported before
    /// any element is formulated; geometry errors (zero-length rods) are
    /// reported for the lowest offending cell id.
    pub fn assemble_with(
        mesh: &Mesh,
        registry: &PropertyRegistry,
        strategy: AssemblyStrategy,
    ) -> Result<Self> {
        registry.check_mesh(mesh)?;

        let ndim = mesh.ndim();
        let elements: Vec<FormulatedElement> = match strategy {
            AssemblyStrategy::Sequential => mesh
                .cells()
                .iter()
                .map(|cell| Self::formulate(mesh, registry, cell))
                .collect::<Result<_>>()?,
            AssemblyStrategy::Parallel => mesh
                .cells()
                .par_iter()
                .map(|cell| Self::formulate(mesh, registry, cell))
                .collect::<Vec<_>>()
                .into_iter()
                .collect::<Result<_>>()?,
        };

        let mut system = Self::new(mesh.num_dofs(), ndim);
        for element in &elements {
            system.scatter(element);
        }
        system.elements = elements;
        Ok(system)
    }

    /// Formulate a single cell
    fn formulate(mesh: &Mesh, registry: &PropertyRegistry, cell: &Cell) -> Result<FormulatedElement> {
        let element = DynamicElement::from_cell(cell, mesh.ndim(), registry)?;

        // Mesh construction guarantees every referenced vertex exists
        let coords: Vec<Vec<f64>> = cell
            .vertices
            .iter()
            .map(|&v| mesh.vertices()[v].coords.clone())
            .collect();
        let slices: Vec<&[f64]> = coords.iter().map(Vec::as_slice).collect();

        let stiffness = element.stiffness_matrix(&slices)?;
        let dofs = element.global_dof_indices(&cell.vertices);

        Ok(FormulatedElement {
            id: cell.id,
            region: cell.region,
            element,
            vertices: cell.vertices.clone(),
            coords,
            dofs,
            stiffness,
        })
    }

    /// Add element contribution to global matrix
    fn scatter(&mut self, element: &FormulatedElement) {
        for (i_local, &i_global) in element.dofs.iter().enumerate() {
            for (j_local, &j_global) in element.dofs.iter().enumerate() {
                self.matrix[(i_global, j_global)] += element.stiffness[(i_local, j_local)];
            }
        }
    }

    /// Get a formulated element by cell id
    pub fn element(&self, id: usize) -> Option<&FormulatedElement> {
        self.elements.get(id)
    }

    /// Largest |K[i][j] - K[j][i]|
    pub fn max_asymmetry(&self) -> f64 {
        let n = self.num_dofs;
        let mut max = 0.0_f64;
        for i in 0..n {
            for j in (i + 1)..n {
                max = max.max((self.matrix[(i, j)] - self.matrix[(j, i)]).abs());
            }
        }
        max
    }

    /// Check symmetry within an absolute tolerance
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        self.max_asymmetry() <= tolerance
    }

    /// Export the non-zero entries as COO triplets, sorted column-major
    pub fn to_triplets(&self) -> SparseTripletsF64 {
        SparseTripletsF64::from_dense(&self.matrix)
    }

    /// Convert the global matrix to CSR format
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let triplets = self.to_triplets();
        let mut coo = CooMatrix::new(triplets.nrows, triplets.ncols);
        for k in 0..triplets.nnz() {
            coo.push(
                triplets.row_indices[k],
                triplets.col_indices[k],
                triplets.values[k],
            );
        }
        CsrMatrix::from(&coo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolverError;
    use crate::materials::PropertySet;
    use crate::mesh::Vertex;

    fn registry() -> PropertyRegistry {
        let mut registry = PropertyRegistry::new();
        registry.insert(-1, PropertySet::new().with("E", 210000.0).with("A", 0.01));
        registry
    }

    fn make_single_rod_mesh() -> Mesh {
        let vertices = vec![Vertex::new(0, 0, &[0.0, 0.0]), Vertex::new(1, 0, &[1.0, 0.0])];
        Mesh::new(vertices, vec![Cell::rod(0, -1, 0, 1)]).unwrap()
    }

    fn make_triangle_mesh() -> Mesh {
        let vertices = vec![
            Vertex::new(0, -1, &[0.0, 0.0]),
            Vertex::new(1, -2, &[1.0, 0.0]),
            Vertex::new(2, -3, &[0.5, 0.866]),
        ];
        let cells = vec![
            Cell::rod(0, -1, 0, 1),
            Cell::rod(1, -1, 1, 2),
            Cell::rod(2, -1, 2, 0),
        ];
        Mesh::new(vertices, cells).unwrap()
    }

    #[test]
    fn creates_empty_system() {
        let system = GlobalStiffness::new(6, 2);
        assert_eq!(system.num_dofs, 6);
        assert_eq!(system.matrix.nrows(), 6);
        assert!(system.elements.is_empty());
    }

    #[test]
    fn assembles_single_rod() {
        let system = GlobalStiffness::assemble(&make_single_rod_mesh(), &registry()).unwrap();

        // k = AE/L = 0.01 * 210000 / 1.0 = 2100
        let expected_k = 2100.0;
        assert!((system.matrix[(0, 0)] - expected_k).abs() < 1e-9);
        assert!((system.matrix[(0, 2)] + expected_k).abs() < 1e-9);
        assert!((system.matrix[(2, 2)] - expected_k).abs() < 1e-9);
        assert_eq!(system.matrix[(1, 1)], 0.0);
        assert_eq!(system.elements.len(), 1);
        assert_eq!(system.elements[0].dofs, vec![0, 1, 2, 3]);
    }

    #[test]
    fn shared_entries_sum() {
        let mesh = make_triangle_mesh();
        let system = GlobalStiffness::assemble(&mesh, &registry()).unwrap();

        // Vertex 0 x-x entry collects from cells 0 and 2
        let e0 = &system.elements[0].stiffness;
        let e2 = &system.elements[2].stiffness;
        // Cell 2 runs 2 -> 0, so vertex 0 is its second vertex
        let expected = e0[(0, 0)] + e2[(2, 2)];
        assert_eq!(system.matrix[(0, 0)], expected);
    }

    #[test]
    fn symmetry_check() {
        let system = GlobalStiffness::assemble(&make_triangle_mesh(), &registry()).unwrap();
        assert!(system.is_symmetric(0.0));
    }

    #[test]
    fn parallel_matches_sequential() {
        let mesh = make_triangle_mesh();
        let seq = GlobalStiffness::assemble_with(&mesh, &registry(), AssemblyStrategy::Sequential)
            .unwrap();
        let par =
            GlobalStiffness::assemble_with(&mesh, &registry(), AssemblyStrategy::Parallel).unwrap();
        assert_eq!(seq.matrix, par.matrix);
    }

    #[test]
    fn rejects_missing_material() {
        let result = GlobalStiffness::assemble(&make_single_rod_mesh(), &PropertyRegistry::new());
        let err = result.unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("No properties"));
    }

    #[test]
    fn rejects_zero_length_rod() {
        let vertices = vec![Vertex::new(0, 0, &[0.0, 0.0]), Vertex::new(1, 0, &[1.0, 0.0])];
        let cells = vec![Cell::rod(0, -1, 0, 1), Cell::rod(1, -1, 1, 1)];
        let mesh = Mesh::new(vertices, cells).unwrap();

        let result = GlobalStiffness::assemble_with(&mesh, &registry(), AssemblyStrategy::Parallel);
        assert!(matches!(result, Err(SolverError::ZeroLength { cell: 1, .. })));
    }

    #[test]
    fn missing_parameter_reported_before_geometry() {
        let vertices = vec![
            Vertex::new(0, 0, &[0.0, 0.0]),
            Vertex::new(1, 0, &[0.0, 0.0]),
            Vertex::new(2, 0, &[1.0, 0.0]),
        ];
        let cells = vec![Cell::rod(0, -1, 0, 1), Cell::rod(1, -2, 1, 2)];
        let mesh = Mesh::new(vertices, cells).unwrap();

        let mut registry = registry();
        registry.insert(-2, PropertySet::new().with("E", 2.1e8));
        for strategy in [AssemblyStrategy::Sequential, AssemblyStrategy::Parallel] {
            let err = GlobalStiffness::assemble_with(&mesh, &registry, strategy).unwrap_err();
            assert!(err.is_configuration());
            assert!(matches!(err, SolverError::MissingParameter { region: -2, .. }));
        }
    }

    #[test]
    fn exports_triplets_and_csr() {
        let system = GlobalStiffness::assemble(&make_single_rod_mesh(), &registry()).unwrap();
        let triplets = system.to_triplets();
        // Only the four ux entries are non-zero
        assert_eq!(triplets.nnz(), 4);

        let csr = system.to_csr();
        assert_eq!(csr.nrows(), 4);
        assert_eq!(csr.nnz(), 4);
    }

    #[test]
    fn recovers_from_formulated_element() {
        let system = GlobalStiffness::assemble(&make_single_rod_mesh(), &registry()).unwrap();
        let u = [0.0, 0.0, 0.001, 0.0];
        let result = system.elements[0].recover(&u).unwrap();
        assert!((result.strain - 0.001).abs() < 1e-15);
        assert!((result.stress - 210.0).abs() < 1e-9);
    }
}
