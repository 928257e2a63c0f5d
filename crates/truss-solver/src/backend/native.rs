//! Native dense backends using nalgebra.
//!
//! - [`DenseCholeskyBackend`]: Cholesky factorization, the natural choice for
//!   the symmetric positive-definite reduced stiffness matrix (default)
//! - [`DenseLuBackend`]: LU decomposition with partial pivoting

use super::traits::*;
use crate::error::{Result, SolverError};
use nalgebra::DVector;

/// Largest absolute diagonal entry, at least tiny-positive
pub(crate) fn max_abs_diagonal(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::MIN_POSITIVE, |acc, v| acc.max(v.abs()))
}

/// Smallest pivot; NaN if any pivot is NaN
pub(crate) fn min_pivot(pivots: impl Iterator<Item = f64>) -> f64 {
    pivots.fold(f64::INFINITY, |acc, p| {
        if acc.is_nan() || p.is_nan() {
            f64::NAN
        } else {
            acc.min(p)
        }
    })
}

/// Reject factorizations whose smallest pivot is negligible (or NaN)
pub(crate) fn check_pivots(min_pivot_ratio: f64, tolerance: f64, num_dofs: usize) -> Result<()> {
    // NaN compares false, so it is rejected too
    if min_pivot_ratio > tolerance {
        Ok(())
    } else {
        Err(SolverError::Singular {
            free_dofs: num_dofs,
            tolerance,
        })
    }
}

fn residual_norm(system: &LinearSystemData, u: &DVector<f64>) -> f64 {
    let k = system.stiffness.to_dense();
    (k * u - &system.force).norm()
}

/// Dense Cholesky backend (K = L Lᵀ)
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseCholeskyBackend;

impl LinearSolver for DenseCholeskyBackend {
    fn solve_linear(
        &self,
        system: &LinearSystemData,
        tolerance: f64,
    ) -> Result<(DVector<f64>, SolveInfo)> {
        let n = system.num_dofs;
        let k = system.stiffness.to_dense();
        let scale = max_abs_diagonal(k.diagonal().iter().copied());

        let chol = k
            .cholesky()
            .ok_or(SolverError::Singular {
                free_dofs: n,
                tolerance,
            })?;

        // Pivot of column j is L_jj²
        let l = chol.l();
        let min_pivot = min_pivot((0..n).map(|j| l[(j, j)] * l[(j, j)]));
        let min_pivot_ratio = min_pivot / scale;
        check_pivots(min_pivot_ratio, tolerance, n)?;

        let u = chol.solve(&system.force);
        let residual = residual_norm(system, &u);

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
        "nalgebra-Cholesky"
    }
}

/// Dense LU backend (partial pivoting)
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseLuBackend;

impl LinearSolver for DenseLuBackend {
    fn solve_linear(
        &self,
        system: &LinearSystemData,
        tolerance: f64,
    ) -> Result<(DVector<f64>, SolveInfo)> {
        let n = system.num_dofs;
        let k = system.stiffness.to_dense();
        let scale = max_abs_diagonal(k.diagonal().iter().copied());

        let lu = k.lu();
        let upper = lu.u();
        let min_pivot = min_pivot((0..n).map(|j| upper[(j, j)].abs()));
        let min_pivot_ratio = min_pivot / scale;
        check_pivots(min_pivot_ratio, tolerance, n)?;

        let u = lu
            .solve(&system.force)
            .ok_or(SolverError::Singular {
                free_dofs: n,
                tolerance,
            })?;
        let residual = residual_norm(system, &u);

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
        "nalgebra-LU"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn spd_3x3() -> LinearSystemData {
        // K = [4 -1 0; -1 4 -1; 0 -1 4], F = [1; 2; 1]
        let k = DMatrix::from_row_slice(3, 3, &[4.0, -1.0, 0.0, -1.0, 4.0, -1.0, 0.0, -1.0, 4.0]);
        LinearSystemData {
            stiffness: SparseTripletsF64::from_dense(&k),
            force: DVector::from_vec(vec![1.0, 2.0, 1.0]),
            num_dofs: 3,
        }
    }

    fn singular_2x2() -> LinearSystemData {
        let k = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 0.0]);
        LinearSystemData {
            stiffness: SparseTripletsF64::from_dense(&k),
            force: DVector::from_vec(vec![1.0, 1.0]),
            num_dofs: 2,
        }
    }

    #[test]
    fn min_pivot_propagates_nan() {
        assert_eq!(min_pivot([3.0, 1.0, 2.0].into_iter()), 1.0);
        assert!(min_pivot([3.0, f64::NAN, 2.0].into_iter()).is_nan());
        assert!(check_pivots(f64::NAN, 1e-12, 3).is_err());
    }

    #[test]
    fn cholesky_solves_trivial_system() {
        // Solve: [2 0; 0 3] * [x; y] = [4; 9]
        let system = LinearSystemData {
            stiffness: SparseTripletsF64 {
                nrows: 2,
                ncols: 2,
                row_indices: vec![0, 1],
                col_indices: vec![0, 1],
                values: vec![2.0, 3.0],
            },
            force: DVector::from_vec(vec![4.0, 9.0]),
            num_dofs: 2,
        };

        let (u, info) = DenseCholeskyBackend.solve_linear(&system, 1e-12).unwrap();
        assert!((u[0] - 2.0).abs() < 1e-12);
        assert!((u[1] - 3.0).abs() < 1e-12);
        assert_eq!(info.solver_name, "nalgebra-Cholesky");
    }

    #[test]
    fn cholesky_and_lu_agree() {
        let system = spd_3x3();
        let (u_chol, info) = DenseCholeskyBackend.solve_linear(&system, 1e-12).unwrap();
        let (u_lu, _) = DenseLuBackend.solve_linear(&system, 1e-12).unwrap();

        for i in 0..3 {
            assert!((u_chol[i] - u_lu[i]).abs() < 1e-12, "DOF {} differs", i);
        }
        assert!(info.residual_norm.unwrap() < 1e-12);
    }

    #[test]
    fn cholesky_detects_singular_matrix() {
        let result = DenseCholeskyBackend.solve_linear(&singular_2x2(), 1e-12);
        assert!(matches!(result, Err(SolverError::Singular { free_dofs: 2, .. })));
    }

    #[test]
    fn stiffness_contrast_below_tolerance_is_rejected() {
        let k = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1e-14]);
        let system = LinearSystemData {
            stiffness: SparseTripletsF64::from_dense(&k),
            force: DVector::from_vec(vec![1.0, 1e-14]),
            num_dofs: 2,
        };

        let err = DenseCholeskyBackend.solve_linear(&system, 1e-12).unwrap_err();
        assert!(matches!(err, SolverError::Singular { tolerance, .. } if tolerance == 1e-12));
        assert!(err.to_string().contains("singular_tolerance"));

        let (u, _) = DenseCholeskyBackend.solve_linear(&system, 1e-16).unwrap();
        assert!((u[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn lu_detects_singular_matrix() {
        let result = DenseLuBackend.solve_linear(&singular_2x2(), 1e-12);
        assert!(matches!(result, Err(SolverError::Singular { .. })));
    }

    #[test]
    fn cholesky_rejects_indefinite_matrix() {
        let k = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        let system = LinearSystemData {
            stiffness: SparseTripletsF64::from_dense(&k),
            force: DVector::from_vec(vec![1.0, 1.0]),
            num_dofs: 2,
        };
        assert!(DenseCholeskyBackend.solve_linear(&system, 1e-12).is_err());
    }
}
