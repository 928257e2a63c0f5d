//! Linear static finite element solver for pin-jointed rod/truss structures.
//!
//! The crate builds a 2D or 3D truss mesh, assigns material properties per
//! region, imposes mixed displacement/load boundary conditions per boundary
//! tag, solves for the equilibrium displacements and recovers the axial
//! strain, stress and force of every rod.
//!
//! ```no_run
//! use truss_solver::{
//!     Analysis, AnalysisConfig, BoundaryConditions, Cell, Mesh, PropertyRegistry, PropertySet,
//!     Vertex,
//! };
//!
//! let mesh = Mesh::new(
//!     vec![
//!         Vertex::new(0, -1, &[0.0, 0.0]),
//!         Vertex::new(1, -2, &[1.0, 0.0]),
//!     ],
//!     vec![Cell::rod(0, -1, 0, 1)],
//! )?;
//! let mut registry = PropertyRegistry::new();
//! registry.insert(-1, PropertySet::new().with("E", 2.1e8).with("A", 0.003));
//! let bcs = BoundaryConditions::new()
//!     .with(-1, "ux", 0.0)
//!     .with(-1, "uy", 0.0)
//!     .with(-2, "uy", 0.0)
//!     .with(-2, "fx", 10.0);
//!
//! let mut analysis = Analysis::new(mesh, registry, bcs, AnalysisConfig::default());
//! analysis.calc_secondary()?;
//! let sa = analysis.stresses("sa");
//! # Ok::<(), truss_solver::SolverError>(())
//! ```

pub mod analysis;
pub mod assembly;
pub mod backend;
pub mod boundary_conditions;
pub mod elements;
pub mod error;
pub mod input;
pub mod materials;
pub mod mesh;
pub mod postprocess;
pub mod solver;

pub use analysis::{Analysis, AnalysisConfig, AnalysisResults, AnalysisType};
pub use assembly::{AssemblyStrategy, FormulatedElement, GlobalStiffness};
pub use backend::{
    default_backend, BackendKind, DenseCholeskyBackend, DenseLuBackend, LinearSolver,
    LinearSystemData, SolveInfo, SparseCholeskyBackend, SparseTripletsF64,
};
pub use boundary_conditions::{
    BcWarning, BoundaryConditions, ConditionKind, ConflictPolicy, Direction, DirectionCode,
    DofPartition,
};
pub use elements::{AxialResult, DynamicElement, Element, Rod, RodGeometry};
pub use error::{Result, SolverError};
pub use input::ModelInput;
pub use materials::{PropertyRegistry, PropertySet, RodProperties};
pub use mesh::{Cell, ElementKind, Mesh, MeshStatistics, Vertex};
pub use postprocess::{ElementResult, ResultStatistics, SecondaryResults};
pub use solver::{solve_static, solve_static_with, StaticSolution};
