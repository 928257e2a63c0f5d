//! Boundary conditions and loading for truss analysis.
//!
//! Conditions are attached to vertex boundary tags. Each tag maps direction
//! codes to values:
//! - `ux`, `uy`, `uz`: prescribed displacement (essential condition)
//! - `fx`, `fy`, `fz`: concentrated load (natural condition)
//!
//! [`BoundaryConditions::classify`] expands the tags over the mesh and puts
//! every DOF in exactly one state. DOFs without a displacement condition are
//! natural with a default load of zero.

use crate::error::{Result, SolverError};
use crate::mesh::Mesh;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Global direction of a DOF
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    X,
    Y,
    Z,
}

impl Direction {
    /// Directions available in a mesh of the given dimension
    pub fn all(ndim: usize) -> &'static [Direction] {
        const ALL: &[Direction] = &[Direction::X, Direction::Y, Direction::Z];
        &ALL[..ndim.min(3)]
    }

    /// Offset of this direction within a vertex's DOFs
    pub fn index(self) -> usize {
        match self {
            Direction::X => 0,
            Direction::Y => 1,
            Direction::Z => 2,
        }
    }

    /// Axis letter (`x`, `y`, `z`)
    pub fn axis(self) -> &'static str {
        match self {
            Direction::X => "x",
            Direction::Y => "y",
            Direction::Z => "z",
        }
    }

    /// Displacement component name (`ux`, `uy`, `uz`)
    pub fn displacement_name(self) -> &'static str {
        match self {
            Direction::X => "ux",
            Direction::Y => "uy",
            Direction::Z => "uz",
        }
    }
}

/// Whether a condition prescribes a displacement or a load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionKind {
    Displacement,
    Force,
}

/// Parsed direction code such as `uy` or `fx`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectionCode {
    pub kind: ConditionKind,
    pub direction: Direction,
}

impl DirectionCode {
    /// Parse a two-letter direction code
    pub fn parse(code: &str) -> Result<Self> {
        let mut chars = code.chars();
        let kind = match chars.next() {
            Some('u') => ConditionKind::Displacement,
            Some('f') => ConditionKind::Force,
            _ => return Err(SolverError::UnknownDirection(code.to_string())),
        };
        let direction = match (chars.next(), chars.next()) {
            (Some('x'), None) => Direction::X,
            (Some('y'), None) => Direction::Y,
            (Some('z'), None) => Direction::Z,
            _ => return Err(SolverError::UnknownDirection(code.to_string())),
        };
        Ok(Self { kind, direction })
    }

    /// Parse and check the direction exists in an `ndim`-dimensional mesh
    pub fn parse_for(code: &str, ndim: usize) -> Result<Self> {
        let parsed = Self::parse(code)?;
        if parsed.direction.index() >= ndim {
            return Err(SolverError::DirectionOutOfRange {
                code: code.to_string(),
                ndim,
            });
        }
        Ok(parsed)
    }
}

impl fmt::Display for DirectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            ConditionKind::Displacement => 'u',
            ConditionKind::Force => 'f',
        };
        write!(f, "{}{}", prefix, self.direction.axis())
    }
}

/// What to do when one direction carries both a displacement and a load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Keep the displacement, drop the load and record a warning
    #[default]
    EssentialWins,
    /// Fail with [`SolverError::BoundaryConflict`]
    Reject,
}

/// Non-fatal diagnostics produced while classifying DOFs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BcWarning {
    /// Displacement and load given for the same DOF; the load was ignored
    Conflict {
        tag: i32,
        vertex: usize,
        direction: Direction,
        ignored_load: f64,
    },
    /// No vertex carries this boundary tag
    UnusedTag { tag: i32 },
}

impl fmt::Display for BcWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BcWarning::Conflict {
                tag,
                vertex,
                direction,
                ignored_load,
            } => write!(
                f,
                "tag {}: vertex {} has both a displacement and a load ({}) in {:?}; load ignored",
                tag, vertex, ignored_load, direction
            ),
            BcWarning::UnusedTag { tag } => {
                write!(f, "boundary tag {} is not carried by any vertex", tag)
            }
        }
    }
}

/// Boundary conditions keyed by boundary tag, then by direction code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundaryConditions {
    conditions: BTreeMap<i32, BTreeMap<String, f64>>,
}

impl BoundaryConditions {
    /// Create an empty boundary conditions object
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a `{tag: {code: value}}` map
    pub fn from_map<I, C>(map: I) -> Self
    where
        I: IntoIterator<Item = (i32, C)>,
        C: IntoIterator<Item = (String, f64)>,
    {
        Self {
            conditions: map
                .into_iter()
                .map(|(tag, codes)| (tag, codes.into_iter().collect()))
                .collect(),
        }
    }

    /// Set (or overwrite) one condition on a tag
    pub fn set(&mut self, tag: i32, code: &str, value: f64) -> &mut Self {
        self.conditions
            .entry(tag)
            .or_default()
            .insert(code.to_string(), value);
        self
    }

    /// Builder form of [`set`](Self::set)
    pub fn with(mut self, tag: i32, code: &str, value: f64) -> Self {
        self.set(tag, code, value);
        self
    }

    /// Conditions attached to a tag
    pub fn get(&self, tag: i32) -> Option<&BTreeMap<String, f64>> {
        self.conditions.get(&tag)
    }

    /// Tags carrying at least one condition, ascending
    pub fn tags(&self) -> impl Iterator<Item = i32> + '_ {
        self.conditions.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Classify every DOF of `mesh` as essential or natural
    ///
    /// # Errors
    /// - unknown direction codes or `z` codes on a 2D mesh
    /// - non-finite condition values
    /// - displacement/load conflicts under [`ConflictPolicy::Reject`]
    pub fn classify(&self, mesh: &Mesh, policy: ConflictPolicy) -> Result<DofPartition> {
        let ndim = mesh.ndim();
        let n_dof = mesh.num_dofs();

        let mut is_essential = vec![false; n_dof];
        let mut prescribed = vec![0.0; n_dof];
        let mut load = vec![0.0; n_dof];
        let mut warnings = Vec::new();

        for (&tag, codes) in &self.conditions {
            let mut displacements: BTreeMap<Direction, f64> = BTreeMap::new();
            let mut forces: BTreeMap<Direction, f64> = BTreeMap::new();
            for (code, &value) in codes {
                let parsed = DirectionCode::parse_for(code, ndim)?;
                if !value.is_finite() {
                    return Err(SolverError::InvalidInput(format!(
                        "boundary tag {}: value of \"{}\" is not finite",
                        tag, code
                    )));
                }
                match parsed.kind {
                    ConditionKind::Displacement => displacements.insert(parsed.direction, value),
                    ConditionKind::Force => forces.insert(parsed.direction, value),
                };
            }

            let vertices = mesh.vertices_with_tag(tag);
            if vertices.is_empty() {
                warnings.push(BcWarning::UnusedTag { tag });
                continue;
            }

            for &vertex in vertices {
                for (&direction, &value) in &displacements {
                    let dof = mesh.dof_index(vertex, direction.index());
                    is_essential[dof] = true;
                    prescribed[dof] = value;
                }
                for (&direction, &value) in &forces {
                    let dof = mesh.dof_index(vertex, direction.index());
                    if !displacements.contains_key(&direction) {
                        load[dof] += value;
                        continue;
                    }
                    match policy {
                        ConflictPolicy::EssentialWins => warnings.push(BcWarning::Conflict {
                            tag,
                            vertex,
                            direction,
                            ignored_load: value,
                        }),
                        ConflictPolicy::Reject => {
                            return Err(SolverError::BoundaryConflict {
                                vertex,
                                direction: direction.axis().to_string(),
                            });
                        }
                    }
                }
            }
        }

        let (essential, natural): (Vec<usize>, Vec<usize>) =
            (0..n_dof).partition(|&dof| is_essential[dof]);

        Ok(DofPartition {
            essential,
            natural,
            prescribed,
            load,
            warnings,
            mask: is_essential,
        })
    }

    /// Get statistics
    pub fn statistics(&self) -> BcStatistics {
        let mut stats = BcStatistics {
            num_tags: self.conditions.len(),
            ..Default::default()
        };
        for code in self.conditions.values().flat_map(|codes| codes.keys()) {
            match DirectionCode::parse(code).map(|c| c.kind) {
                Ok(ConditionKind::Displacement) => stats.num_displacements += 1,
                Ok(ConditionKind::Force) => stats.num_loads += 1,
                Err(_) => stats.num_unknown += 1,
            }
        }
        stats
    }
}

/// Boundary condition statistics
#[derive(Debug, Clone, Default)]
pub struct BcStatistics {
    pub num_tags: usize,
    pub num_displacements: usize,
    pub num_loads: usize,
    /// Entries whose code does not parse
    pub num_unknown: usize,
}

impl BcStatistics {
    /// Format as a human-readable string
    pub fn format(&self) -> String {
        format!(
            "BCs: {} tags, {} displacement entries, {} load entries",
            self.num_tags, self.num_displacements, self.num_loads
        )
    }
}

/// Every DOF classified as essential (displacement known) or natural
/// (load known)
#[derive(Debug, Clone, Serialize)]
pub struct DofPartition {
    /// Essential DOF indices, ascending
    pub essential: Vec<usize>,
    /// Natural (free) DOF indices, ascending
    pub natural: Vec<usize>,
    /// Prescribed displacement per DOF (zero at natural DOFs)
    pub prescribed: Vec<f64>,
    /// Applied load per DOF (zero where no load is given)
    pub load: Vec<f64>,
    pub warnings: Vec<BcWarning>,
    #[serde(skip)]
    mask: Vec<bool>,
}

impl DofPartition {
    /// Total number of DOFs
    pub fn num_dofs(&self) -> usize {
        self.mask.len()
    }

    pub fn is_essential(&self, dof: usize) -> bool {
        self.mask.get(dof).copied().unwrap_or(false)
    }
}
