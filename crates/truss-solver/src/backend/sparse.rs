//! Sparse Cholesky backend using nalgebra-sparse.
//!
//! The reduced triplets are compressed to CSC and factored with
//! [`CscCholesky`]. Suited to larger trusses where the dense factorization
//! dominates the run time.

use super::native::{check_pivots, max_abs_diagonal, min_pivot};
use super::traits::*;
use crate::error::{Result, SolverError};
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CooMatrix, CscMatrix};

/// Build a CSC matrix from COO triplets (duplicates are summed)
fn to_csc(triplets: &SparseTripletsF64) -> CscMatrix<f64> {
    let mut coo = CooMatrix::new(triplets.nrows, triplets.ncols);
    for k in 0..triplets.nnz() {
        coo.push(
            triplets.row_indices[k],
            triplets.col_indices[k],
            triplets.values[k],
        );
    }
    CscMatrix::from(&coo)
}

fn diagonal(matrix: &CscMatrix<f64>) -> impl Iterator<Item = f64> + '_ {
    matrix
        .triplet_iter()
        .filter(|(i, j, _)| i == j)
        .map(|(_, _, v)| *v)
}

/// Sparse Cholesky backend
#[derive(Debug, Clone, Copy, Default)]
pub struct SparseCholeskyBackend;

impl LinearSolver for SparseCholeskyBackend {
    fn solve_linear(
        &self,
        system: &LinearSystemData,
        tolerance: f64,
    ) -> Result<(DVector<f64>, SolveInfo)> {
        let n = system.num_dofs;
        let k = to_csc(&system.stiffness);
        let scale = max_abs_diagonal(diagonal(&k));

        // An empty diagonal entry leaves the column without a pivot
        if diagonal(&k).filter(|v| *v != 0.0).count() < n {
            return Err(SolverError::Singular {
                free_dofs: n,
                tolerance,
            });
        }

        let chol = CscCholesky::factor(&k).map_err(|_| SolverError::Singular {
            free_dofs: n,
            tolerance,
        })?;

        let min_pivot = min_pivot(diagonal(chol.l()).map(|l| l * l));
        let min_pivot_ratio = min_pivot / scale;
        check_pivots(min_pivot_ratio, tolerance, n)?;

        let rhs = DMatrix::from_column_slice(n, 1, system.force.as_slice());
        let x = chol.solve(&rhs);
        let u = DVector::from_column_slice(x.as_slice());

        let residual = (system.stiffness.to_dense() * &u - &system.force).norm();

        Ok((
            u,
            SolveInfo {
                min_pivot_ratio,
                residual_norm: Some(residual),
                solver_name: self.name().to_string(),
            },
        ))
    }

    fn name(&self) -> &str {
        "nalgebra-sparse-Cholesky"
    }
}
