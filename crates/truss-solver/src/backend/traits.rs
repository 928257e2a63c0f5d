//! Backend trait definitions for the linear solve.
//!
//! These traits abstract over the concrete factorization used for the reduced
//! system. Element-level computations remain in nalgebra (small, dense
//! matrices).

use crate::error::Result;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;

/// Sparse matrix in COO (coordinate/triplet) format.
///
/// This is the backend-agnostic interchange format between the equilibrium
/// engine and any solver backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseTripletsF64 {
    pub nrows: usize,
    pub ncols: usize,
    pub row_indices: Vec<usize>,
    pub col_indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseTripletsF64 {
    /// Collect the non-zero entries of a dense matrix, column by column
    pub fn from_dense(matrix: &DMatrix<f64>) -> Self {
        let mut triplets = Self {
            nrows: matrix.nrows(),
            ncols: matrix.ncols(),
            row_indices: Vec::new(),
            col_indices: Vec::new(),
            values: Vec::new(),
        };
        for j in 0..matrix.ncols() {
            for i in 0..matrix.nrows() {
                let v = matrix[(i, j)];
                if v != 0.0 {
                    triplets.row_indices.push(i);
                    triplets.col_indices.push(j);
                    triplets.values.push(v);
                }
            }
        }
        triplets
    }

    /// Number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Rebuild a dense matrix, summing duplicate entries
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut k = DMatrix::zeros(self.nrows, self.ncols);
        for i in 0..self.nnz() {
            k[(self.row_indices[i], self.col_indices[i])] += self.values[i];
        }
        k
    }
}

/// A reduced linear system ready for solving: K_ff * u_f = rhs.
pub struct LinearSystemData {
    /// Reduced stiffness matrix in COO triplet format
    pub stiffness: SparseTripletsF64,
    /// Right-hand side F_f - K_fc * U_c
    pub force: DVector<f64>,
    /// Number of unknowns
    pub num_dofs: usize,
}

/// Solver diagnostic info.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveInfo {
    /// Smallest factorization pivot relative to the largest diagonal entry
    pub min_pivot_ratio: f64,
    /// Final residual norm ||K u - F||
    pub residual_norm: Option<f64>,
    /// Human-readable solver name (e.g., "nalgebra-Cholesky")
    pub solver_name: String,
}

/// Trait for a linear solver backend.
///
/// Implementations solve K * u = F given the reduced system and fail with
/// [`SolverError::Singular`](crate::error::SolverError::Singular) when K is
/// not invertible within `tolerance` (relative pivot size).
pub trait LinearSolver: Send + Sync {
    /// Solve K * u = F and return the solution vector.
    fn solve_linear(
        &self,
        system: &LinearSystemData,
        tolerance: f64,
    ) -> Result<(DVector<f64>, SolveInfo)>;

    /// Human-readable name of this backend.
    fn name(&self) -> &str;
}
