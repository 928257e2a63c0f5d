//! Analysis session: staged execution of a linear static truss analysis.
//!
//! An [`Analysis`] owns the model (mesh, properties, boundary conditions)
//! and the results of each stage:
//!
//! 1. [`assemble`](Analysis::assemble): element matrices and global K
//! 2. [`apply_boundary_conditions`](Analysis::apply_boundary_conditions):
//!    DOF partition and load vector
//! 3. [`solve_steady`](Analysis::solve_steady): displacements and reactions
//! 4. [`calc_secondary`](Analysis::calc_secondary): element strains, stresses
//!    and forces
//!
//! Each stage runs the stages it depends on when they have not run yet, and
//! caches its own result. Sessions share no state, so independent sessions
//! may run on separate threads.

use crate::assembly::{AssemblyStrategy, GlobalStiffness};
use crate::backend::BackendKind;
use crate::boundary_conditions::{BcWarning, BoundaryConditions, ConflictPolicy, DofPartition};
use crate::error::Result;
use crate::materials::PropertyRegistry;
use crate::mesh::Mesh;
use crate::postprocess::{ResultStatistics, SecondaryResults};
use crate::solver::{self, StaticSolution, DEFAULT_SINGULAR_TOLERANCE};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Analysis type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    /// Linear static structural analysis
    #[default]
    LinearStatic,
}

/// Analysis configuration and control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Type of analysis to perform
    pub analysis_type: AnalysisType,
    /// Sequential or rayon-parallel element formulation
    pub assembly: AssemblyStrategy,
    /// Handling of a displacement and a load on the same DOF
    pub conflict_policy: ConflictPolicy,
    /// Linear solver backend
    pub backend: BackendKind,
    /// Relative pivot size below which the reduced system counts as singular
    pub singular_tolerance: f64,
    /// Whether to write stage diagnostics to stderr
    pub verbose: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            analysis_type: AnalysisType::LinearStatic,
            assembly: AssemblyStrategy::Sequential,
            conflict_policy: ConflictPolicy::EssentialWins,
            backend: BackendKind::DenseCholesky,
            singular_tolerance: DEFAULT_SINGULAR_TOLERANCE,
            verbose: false,
        }
    }
}

/// Analysis results and statistics
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResults {
    /// Analysis type that was run
    pub analysis_type: AnalysisType,
    /// Number of degrees of freedom
    pub num_dofs: usize,
    /// Number of equations solved (free DOFs)
    pub num_equations: usize,
    /// Displacement components keyed by `ux`, `uy` (and `uz`)
    pub displacements: BTreeMap<String, Vec<f64>>,
    /// Reaction at each essential DOF
    pub reactions: BTreeMap<usize, f64>,
    /// Per-element results
    pub secondary: SecondaryResults,
    pub statistics: ResultStatistics,
    pub warnings: Vec<BcWarning>,
}

/// A single analysis session
#[derive(Debug, Clone)]
pub struct Analysis {
    config: AnalysisConfig,
    mesh: Mesh,
    registry: PropertyRegistry,
    bcs: BoundaryConditions,
    system: Option<GlobalStiffness>,
    partition: Option<DofPartition>,
    solution: Option<StaticSolution>,
    secondary: Option<SecondaryResults>,
}

impl Analysis {
    /// Create a new session; no work is done until a stage is requested
    pub fn new(
        mesh: Mesh,
        registry: PropertyRegistry,
        bcs: BoundaryConditions,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            config,
            mesh,
            registry,
            bcs,
            system: None,
            partition: None,
            solution: None,
            secondary: None,
        }
    }

    /// Create a linear static session with default configuration
    pub fn linear_static(mesh: Mesh, registry: PropertyRegistry, bcs: BoundaryConditions) -> Self {
        Self::new(mesh, registry, bcs, AnalysisConfig::default())
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Assemble element matrices and the global stiffness matrix
    pub fn assemble(&mut self) -> Result<&GlobalStiffness> {
        let system = self.take_system()?;
        Ok(&*self.system.insert(system))
    }

    /// Classify DOFs and build the load vector
    pub fn apply_boundary_conditions(&mut self) -> Result<&DofPartition> {
        let partition = self.take_partition()?;
        Ok(&*self.partition.insert(partition))
    }

    /// Solve for the equilibrium displacements and the reactions
    pub fn solve_steady(&mut self) -> Result<&StaticSolution> {
        let solution = self.take_solution()?;
        Ok(&*self.solution.insert(solution))
    }

    /// Recover per-element strains, stresses and forces
    pub fn calc_secondary(&mut self) -> Result<&SecondaryResults> {
        if let Some(secondary) = self.secondary.take() {
            return Ok(&*self.secondary.insert(secondary));
        }

        let solution = self.take_solution()?;
        let system = match self.take_system() {
            Ok(system) => system,
            Err(err) => {
                self.solution = Some(solution);
                return Err(err);
            }
        };
        let secondary = SecondaryResults::compute(&system, &solution);
        self.system = Some(system);
        self.solution = Some(solution);
        let secondary = secondary?;

        if self.config.verbose {
            eprintln!("  Recovered {} element results", secondary.len());
        }
        Ok(&*self.secondary.insert(secondary))
    }

    /// Run every stage and collect the results
    pub fn run(&mut self) -> Result<AnalysisResults> {
        let secondary = self.calc_secondary()?.clone();
        let num_dofs = self.mesh.num_dofs();
        let solution = self.solve_steady()?;

        let displacements = solution.displacements_by_direction();
        let reactions = solution
            .essential
            .iter()
            .copied()
            .zip(solution.reactions.iter().copied())
            .collect();
        let num_equations = num_dofs - solution.essential.len();
        let statistics = secondary.statistics(solution);

        if self.config.verbose {
            eprintln!("  {}", statistics.format());
        }

        Ok(AnalysisResults {
            analysis_type: self.config.analysis_type,
            num_dofs,
            num_equations,
            displacements,
            reactions,
            secondary,
            statistics,
            warnings: self.warnings().to_vec(),
        })
    }

    /// Local stiffness matrix of an element, once assembled
    pub fn element_stiffness(&self, id: usize) -> Option<&DMatrix<f64>> {
        self.system.as_ref()?.element(id).map(|e| &e.stiffness)
    }

    /// Global stiffness matrix, once assembled
    pub fn stiffness(&self) -> Option<&GlobalStiffness> {
        self.system.as_ref()
    }

    /// Displacements keyed by direction name, once solved
    pub fn get_u(&self) -> Option<BTreeMap<String, Vec<f64>>> {
        self.solution
            .as_ref()
            .map(StaticSolution::displacements_by_direction)
    }

    /// A secondary field (`sa`, `ea`, `fa`) ordered by element id
    pub fn stresses(&self, name: &str) -> Option<&[f64]> {
        self.secondary.as_ref()?.get(name)
    }

    /// Reactions at the essential DOFs, keyed by global DOF index
    pub fn reactions(&self) -> Option<BTreeMap<usize, f64>> {
        let solution = self.solution.as_ref()?;
        Some(
            solution
                .essential
                .iter()
                .copied()
                .zip(solution.reactions.iter().copied())
                .collect(),
        )
    }

    /// Boundary condition warnings; empty until conditions are applied
    pub fn warnings(&self) -> &[BcWarning] {
        self.partition
            .as_ref()
            .map(|p| p.warnings.as_slice())
            .unwrap_or_default()
    }

    pub fn solution(&self) -> Option<&StaticSolution> {
        self.solution.as_ref()
    }

    pub fn secondary(&self) -> Option<&SecondaryResults> {
        self.secondary.as_ref()
    }

    fn take_system(&mut self) -> Result<GlobalStiffness> {
        if let Some(system) = self.system.take() {
            return Ok(system);
        }

        if self.config.verbose {
            eprintln!("  {}", self.mesh.statistics().format());
            eprintln!("  {}", self.registry.format());
            eprintln!("  Assembling with {:?} strategy", self.config.assembly);
        }
        let system =
            GlobalStiffness::assemble_with(&self.mesh, &self.registry, self.config.assembly)?;
        if self.config.verbose {
            eprintln!(
                "  Assembled {} elements into {} DOFs",
                system.elements.len(),
                system.num_dofs
            );
        }
        Ok(system)
    }

    fn take_partition(&mut self) -> Result<DofPartition> {
        if let Some(partition) = self.partition.take() {
            return Ok(partition);
        }

        let partition = self.bcs.classify(&self.mesh, self.config.conflict_policy)?;
        if self.config.verbose {
            eprintln!("  {}", self.bcs.statistics().format());
            eprintln!(
                "  Found {} constrained DOFs, {} free DOFs",
                partition.essential.len(),
                partition.natural.len()
            );
            for warning in &partition.warnings {
                eprintln!("  Warning: {}", warning);
            }
        }
        Ok(partition)
    }

    fn take_solution(&mut self) -> Result<StaticSolution> {
        if let Some(solution) = self.solution.take() {
            return Ok(solution);
        }

        let system = self.take_system()?;
        let partition = match self.take_partition() {
            Ok(partition) => partition,
            Err(err) => {
                self.system = Some(system);
                return Err(err);
            }
        };

        let backend = self.config.backend.create();
        if self.config.verbose {
            eprintln!("  Solving with {}", backend.name());
        }
        let result = solver::solve_static_with(
            &system,
            &partition,
            backend.as_ref(),
            self.config.singular_tolerance,
        );
        self.system = Some(system);
        self.partition = Some(partition);
        let solution = result?;

        if self.config.verbose {
            if let Some(residual) = solution.info.as_ref().and_then(|i| i.residual_norm) {
                eprintln!("  Residual norm: {:.3e}", residual);
            }
        }
        Ok(solution)
    }
}
