//! Linear solver backend abstraction layer.
//!
//! The equilibrium engine reduces the global system to the free DOFs and
//! hands it to a [`LinearSolver`] as COO triplets. The concrete factorization
//! is chosen at runtime through [`BackendKind`].
//!
//! # Backends
//!
//! - **Dense Cholesky** (default): nalgebra `Cholesky` with a relative pivot
//!   check.
//! - **Dense LU**: nalgebra `LU` with partial pivoting.
//! - **Sparse Cholesky**: nalgebra-sparse `CscCholesky`.
//!
//! # Architecture
//!
//! ```text
//! Element Library (nalgebra DMatrix, small and dense)
//!         │
//!         ▼
//! Assembly + condensation (reduced COO triplets + right-hand side)
//!         │
//!         ▼
//! Backend Trait Layer (LinearSolver)
//!    ┌────┴─────┬──────────┐
//!    ▼          ▼          ▼
//! Cholesky     LU     CscCholesky
//! ```

pub mod native;
pub mod sparse;
pub mod traits;

pub use native::{DenseCholeskyBackend, DenseLuBackend};
pub use sparse::SparseCholeskyBackend;
pub use traits::*;

use serde::{Deserialize, Serialize};

/// Selectable linear solver backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    DenseCholesky,
    DenseLu,
    SparseCholesky,
}

impl BackendKind {
    /// Instantiate the backend
    pub fn create(self) -> Box<dyn LinearSolver> {
        match self {
            BackendKind::DenseCholesky => Box::new(DenseCholeskyBackend),
            BackendKind::DenseLu => Box::new(DenseLuBackend),
            BackendKind::SparseCholesky => Box::new(SparseCholeskyBackend),
        }
    }
}

/// Returns the default solver backend (dense Cholesky).
pub fn default_backend() -> Box<dyn LinearSolver> {
    BackendKind::default().create()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_dense_cholesky() {
        assert_eq!(default_backend().name(), "nalgebra-Cholesky");
        assert_eq!(BackendKind::DenseLu.create().name(), "nalgebra-LU");
        assert_eq!(
            BackendKind::SparseCholesky.create().name(),
            "nalgebra-sparse-Cholesky"
        );
    }

    #[test]
    fn backend_kind_from_json() {
        let kind: BackendKind = serde_json::from_str("\"sparse_cholesky\"").unwrap();
        assert_eq!(kind, BackendKind::SparseCholesky);
    }
}
