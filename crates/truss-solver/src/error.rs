//! Error types for truss-solver

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SolverError>;

#[derive(Error, Debug)]
pub enum SolverError {
    // Mesh validation
    #[error("Vertex id {0} appears more than once")]
    DuplicateVertex(usize),

    #[error("Cell id {0} appears more than once")]
    DuplicateCell(usize),

    #[error("{kind} id {id} is not dense (expected ids 0..{count})")]
    NonDenseId {
        kind: &'static str,
        id: usize,
        count: usize,
    },

    #[error("Cell {cell} references non-existent vertex {vertex}")]
    DanglingVertex { cell: usize, vertex: usize },

    #[error("Cell {cell} has {actual} vertices but a rod needs {expected}")]
    WrongNodeCount {
        cell: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Vertex {vertex} has {actual} coordinates, mesh dimension is {expected}")]
    DimensionMismatch {
        vertex: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Unsupported space dimension {0} (expected 2 or 3)")]
    UnsupportedDimension(usize),

    #[error("Vertex {0} has a non-finite coordinate")]
    NonFiniteCoordinate(usize),

    #[error("Mesh has no vertices")]
    EmptyMesh,

    #[error("Cell {cell} has zero or near-zero length: {length}")]
    ZeroLength { cell: usize, length: f64 },

    // Configuration
    #[error("No properties defined for region tag {region} (used by cell {cell})")]
    MissingProperties { region: i32, cell: usize },

    #[error("Region tag {region} is missing required parameter \"{name}\"")]
    MissingParameter { region: i32, name: String },

    #[error("Region tag {region}: parameter \"{name}\" must be finite and positive, got {value}")]
    InvalidParameter {
        region: i32,
        name: String,
        value: f64,
    },

    #[error("Unknown boundary condition code \"{0}\" (expected ux, uy, uz, fx, fy or fz)")]
    UnknownDirection(String),

    #[error("Boundary condition code \"{code}\" is not available in a {ndim}D mesh")]
    DirectionOutOfRange { code: String, ndim: usize },

    // Boundary conditions
    #[error(
        "Vertex {vertex}: direction {direction} has both a prescribed displacement and a prescribed load"
    )]
    BoundaryConflict { vertex: usize, direction: String },

    // Solve
    #[error(
        "Reduced stiffness matrix is singular or ill-conditioned ({free_dofs} free DOFs): smallest relative pivot not above {tolerance:e}; check supports and connectivity, or lower AnalysisConfig::singular_tolerance for structures with widely differing rod stiffnesses"
    )]
    Singular { free_dofs: usize, tolerance: f64 },

    #[error("Load vector has length {actual}, system has {expected} DOFs")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Backend error: {0}")]
    Backend(String),

    // Input
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SolverError {
    /// True for errors raised while validating the mesh or element geometry.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SolverError::DuplicateVertex(_)
                | SolverError::DuplicateCell(_)
                | SolverError::NonDenseId { .. }
                | SolverError::DanglingVertex { .. }
                | SolverError::WrongNodeCount { .. }
                | SolverError::DimensionMismatch { .. }
                | SolverError::UnsupportedDimension(_)
                | SolverError::NonFiniteCoordinate(_)
                | SolverError::EmptyMesh
                | SolverError::ZeroLength { .. }
        )
    }

    /// True for missing or malformed properties and boundary condition codes.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SolverError::MissingProperties { .. }
                | SolverError::MissingParameter { .. }
                | SolverError::InvalidParameter { .. }
                | SolverError::UnknownDirection(_)
                | SolverError::DirectionOutOfRange { .. }
        )
    }
}
