//! Static equilibrium: condensation, solve, composition and reactions.
//!
//! With the DOFs split into natural (f) and essential (c) sets, the reduced
//! system is
//!
//! ```text
//! K_ff · U_f = F_f - K_fc · U_c
//! ```
//!
//! The backend solves for U_f, the full U is composed with the prescribed
//! values copied verbatim into U_c, and the reactions follow from
//!
//! ```text
//! R = K_cf · U_f + K_cc · U_c - F_c
//! ```

use crate::assembly::GlobalStiffness;
use crate::backend::{LinearSolver, LinearSystemData, SolveInfo, SparseTripletsF64};
use crate::boundary_conditions::{DofPartition, Direction};
use crate::error::{Result, SolverError};
use nalgebra::DVector;
use serde::Serialize;
use std::collections::BTreeMap;

/// Default relative pivot tolerance for singularity detection
pub const DEFAULT_SINGULAR_TOLERANCE: f64 = 1e-12;

/// Displacements and reactions of a solved static problem
#[derive(Debug, Clone, Serialize)]
pub struct StaticSolution {
    /// DOFs per vertex
    pub ndim: usize,
    /// Full displacement vector U, indexed by global DOF
    pub displacements: Vec<f64>,
    /// Essential DOF indices, ascending
    pub essential: Vec<usize>,
    /// Reaction at each essential DOF, aligned with `essential`
    pub reactions: Vec<f64>,
    /// Backend diagnostics; `None` when nothing had to be solved
    pub info: Option<SolveInfo>,
}

impl StaticSolution {
    pub fn num_dofs(&self) -> usize {
        self.displacements.len()
    }

    pub fn num_vertices(&self) -> usize {
        self.displacements.len() / self.ndim
    }

    /// Displacement components of one vertex
    pub fn vertex_displacement(&self, vertex: usize) -> Option<&[f64]> {
        let start = vertex * self.ndim;
        self.displacements.get(start..start + self.ndim)
    }

    /// One displacement component (`ux`, `uy`, `uz`) for every vertex,
    /// ordered by vertex id
    pub fn component(&self, name: &str) -> Option<Vec<f64>> {
        let direction = Direction::all(self.ndim)
            .iter()
            .find(|d| d.displacement_name() == name)?;
        Some(
            self.displacements
                .iter()
                .skip(direction.index())
                .step_by(self.ndim)
                .copied()
                .collect(),
        )
    }

    /// All displacement components keyed by name
    pub fn displacements_by_direction(&self) -> BTreeMap<String, Vec<f64>> {
        Direction::all(self.ndim)
            .iter()
            .filter_map(|d| {
                let name = d.displacement_name();
                self.component(name).map(|values| (name.to_string(), values))
            })
            .collect()
    }

    /// Reaction at a global DOF, if that DOF is essential
    pub fn reaction(&self, dof: usize) -> Option<f64> {
        self.essential
            .binary_search(&dof)
            .ok()
            .map(|k| self.reactions[k])
    }

    /// Sum of reactions per direction
    pub fn reaction_totals(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.ndim];
        for (&dof, &r) in self.essential.iter().zip(&self.reactions) {
            totals[dof % self.ndim] += r;
        }
        totals
    }

    /// Largest displacement magnitude over all vertices
    pub fn max_displacement(&self) -> f64 {
        self.displacements
            .chunks(self.ndim)
            .map(|u| u.iter().map(|x| x * x).sum::<f64>().sqrt())
            .fold(0.0, f64::max)
    }
}

/// Solve K·U = F for the given DOF partition with the default tolerance
pub fn solve_static(
    system: &GlobalStiffness,
    partition: &DofPartition,
    backend: &dyn LinearSolver,
) -> Result<StaticSolution> {
    solve_static_with(system, partition, backend, DEFAULT_SINGULAR_TOLERANCE)
}

/// Solve K·U = F for the given DOF partition
///
/// # Errors
/// [`SolverError::Singular`] when the reduced matrix is not positive
/// definite within `tolerance`; no partial solution is returned.
pub fn solve_static_with(
    system: &GlobalStiffness,
    partition: &DofPartition,
    backend: &dyn LinearSolver,
    tolerance: f64,
) -> Result<StaticSolution> {
    let n = system.num_dofs;
    if partition.num_dofs() != n {
        return Err(SolverError::SizeMismatch {
            expected: n,
            actual: partition.num_dofs(),
        });
    }

    let k = &system.matrix;
    let free = &partition.natural;
    let fixed = &partition.essential;

    let mut u = vec![0.0; n];
    for &c in fixed {
        u[c] = partition.prescribed[c];
    }

    let info = if free.is_empty() {
        None
    } else {
        let reduced = reduce(system, partition);
        let (u_free, info) = backend.solve_linear(&reduced, tolerance)?;
        for (local, &dof) in free.iter().enumerate() {
            u[dof] = u_free[local];
        }
        Some(info)
    };

    let reactions = fixed
        .iter()
        .map(|&c| {
            let ku: f64 = (0..n).map(|j| k[(c, j)] * u[j]).sum();
            ku - partition.load[c]
        })
        .collect();

    Ok(StaticSolution {
        ndim: system.ndim,
        displacements: u,
        essential: fixed.clone(),
        reactions,
        info,
    })
}

/// Extract K_ff and the condensed right-hand side F_f - K_fc·U_c
fn reduce(system: &GlobalStiffness, partition: &DofPartition) -> LinearSystemData {
    let k = &system.matrix;
    let free = &partition.natural;
    let nf = free.len();

    let mut stiffness = SparseTripletsF64 {
        nrows: nf,
        ncols: nf,
        row_indices: Vec::new(),
        col_indices: Vec::new(),
        values: Vec::new(),
    };
    for (jl, &jg) in free.iter().enumerate() {
        for (il, &ig) in free.iter().enumerate() {
            let v = k[(ig, jg)];
            if v != 0.0 {
                stiffness.row_indices.push(il);
                stiffness.col_indices.push(jl);
                stiffness.values.push(v);
            }
        }
    }

    let force = DVector::from_iterator(
        nf,
        free.iter().map(|&i| {
            let coupling: f64 = partition
                .essential
                .iter()
                .map(|&c| k[(i, c)] * partition.prescribed[c])
                .sum();
            partition.load[i] - coupling
        }),
    );

    LinearSystemData {
        stiffness,
        force,
        num_dofs: nf,
    }
}
