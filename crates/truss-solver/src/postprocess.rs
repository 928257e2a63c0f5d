//! Secondary quantities recovered after the solve.
//!
//! Every element's axial strain, stress and force are computed from the
//! global displacement vector and stored in element-id order under short
//! field names:
//!
//! | name | quantity |
//! |------|----------|
//! | `sa` | axial stress σ |
//! | `ea` | axial strain ε |
//! | `fa` | axial force N |

use crate::assembly::GlobalStiffness;
use crate::error::{Result, SolverError};
use crate::solver::StaticSolution;
use serde::Serialize;
use std::collections::BTreeMap;

/// Axial stress field name
pub const AXIAL_STRESS: &str = "sa";
/// Axial strain field name
pub const AXIAL_STRAIN: &str = "ea";
/// Axial force field name
pub const AXIAL_FORCE: &str = "fa";

/// Recovered quantities for one element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementResult {
    pub id: usize,
    pub region: i32,
    pub length: f64,
    pub cosines: Vec<f64>,
    pub strain: f64,
    pub stress: f64,
    pub force: f64,
}

/// Per-element results of a static solution
#[derive(Debug, Clone, Serialize)]
pub struct SecondaryResults {
    elements: Vec<ElementResult>,
    fields: BTreeMap<String, Vec<f64>>,
}

impl SecondaryResults {
    /// Recover every element in id order
    pub fn compute(system: &GlobalStiffness, solution: &StaticSolution) -> Result<Self> {
        if solution.num_dofs() != system.num_dofs {
            return Err(SolverError::SizeMismatch {
                expected: system.num_dofs,
                actual: solution.num_dofs(),
            });
        }

        let elements = system
            .elements
            .iter()
            .map(|formulated| {
                let geometry = formulated.geometry()?;
                let axial = formulated.recover(&solution.displacements)?;
                Ok(ElementResult {
                    id: formulated.id,
                    region: formulated.region,
                    length: geometry.length,
                    cosines: geometry.cosines,
                    strain: axial.strain,
                    stress: axial.stress,
                    force: axial.force,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut fields = BTreeMap::new();
        fields.insert(
            AXIAL_STRESS.to_string(),
            elements.iter().map(|e| e.stress).collect(),
        );
        fields.insert(
            AXIAL_STRAIN.to_string(),
            elements.iter().map(|e| e.strain).collect(),
        );
        fields.insert(
            AXIAL_FORCE.to_string(),
            elements.iter().map(|e| e.force).collect(),
        );

        Ok(Self { elements, fields })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[ElementResult] {
        &self.elements
    }

    pub fn element(&self, id: usize) -> Option<&ElementResult> {
        self.elements.get(id)
    }

    /// A named field over all elements, ordered by element id
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    /// A named field of one element
    pub fn value(&self, name: &str, id: usize) -> Option<f64> {
        self.get(name)?.get(id).copied()
    }

    /// Available field names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Summary statistics over the elements and the displacement field
    pub fn statistics(&self, solution: &StaticSolution) -> ResultStatistics {
        compute_statistics(&self.elements, solution)
    }
}

/// Statistical summary of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultStatistics {
    pub stress_min: f64,
    pub stress_max: f64,
    pub max_abs_stress: f64,
    /// Element carrying the largest |σ|
    pub max_abs_stress_element: Option<usize>,
    pub num_tension: usize,
    pub num_compression: usize,
    pub max_displacement: f64,
}

impl ResultStatistics {
    /// Format as a human-readable string
    pub fn format(&self) -> String {
        format!(
            "Stress: [{:.6e}, {:.6e}], max |σ| = {:.6e} (element {}), {} in tension, {} in compression, max |u| = {:.6e}",
            self.stress_min,
            self.stress_max,
            self.max_abs_stress,
            self.max_abs_stress_element
                .map_or_else(|| "-".to_string(), |id| id.to_string()),
            self.num_tension,
            self.num_compression,
            self.max_displacement
        )
    }
}

/// Compute statistical summary
pub fn compute_statistics(results: &[ElementResult], solution: &StaticSolution) -> ResultStatistics {
    let max_displacement = solution.max_displacement();
    if results.is_empty() {
        return ResultStatistics {
            stress_min: 0.0,
            stress_max: 0.0,
            max_abs_stress: 0.0,
            max_abs_stress_element: None,
            num_tension: 0,
            num_compression: 0,
            max_displacement,
        };
    }

    let stresses: Vec<f64> = results.iter().map(|r| r.stress).collect();
    let stress_min = stresses.iter().copied().fold(f64::INFINITY, f64::min);
    let stress_max = stresses.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let (max_abs_stress_element, max_abs_stress) = results
        .iter()
        .map(|r| (r.id, r.stress.abs()))
        .fold((None, 0.0), |(best_id, best), (id, s)| {
            if best_id.is_none() || s > best {
                (Some(id), s)
            } else {
                (best_id, best)
            }
        });

    ResultStatistics {
        stress_min,
        stress_max,
        max_abs_stress,
        max_abs_stress_element,
        num_tension: stresses.iter().filter(|&&s| s > 0.0).count(),
        num_compression: stresses.iter().filter(|&&s| s < 0.0).count(),
        max_displacement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::{PropertyRegistry, PropertySet};
    use crate::mesh::{Cell, Mesh, Vertex};
    use approx::assert_relative_eq;

    /// Two collinear rods along x, lengths 1 and 2
    fn system() -> GlobalStiffness {
        let mesh = Mesh::new(
            vec![
                Vertex::new(0, -1, &[0.0, 0.0]),
                Vertex::new(1, 0, &[1.0, 0.0]),
                Vertex::new(2, -2, &[3.0, 0.0]),
            ],
            vec![Cell::rod(0, -1, 0, 1), Cell::rod(1, -1, 1, 2)],
        )
        .unwrap();
        let mut registry = PropertyRegistry::new();
        registry.insert(-1, PropertySet::new().with("E", 1000.0).with("A", 0.5));
        GlobalStiffness::assemble(&mesh, &registry).unwrap()
    }

    fn solution(displacements: Vec<f64>) -> StaticSolution {
        StaticSolution {
            ndim: 2,
            displacements,
            essential: vec![],
            reactions: vec![],
            info: None,
        }
    }

    #[test]
    fn recovers_fields_in_element_order() {
        let system = system();
        // Rod 0 stretched by 0.001, rod 1 shortened by 0.004
        let u = solution(vec![0.0, 0.0, 0.001, 0.0, -0.003, 0.0]);
        let results = SecondaryResults::compute(&system, &u).unwrap();

        assert_eq!(results.len(), 2);
        let sa = results.get(AXIAL_STRESS).unwrap();
        assert_relative_eq!(sa[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(sa[1], -2.0, epsilon = 1e-12);
        assert_relative_eq!(results.value("ea", 1).unwrap(), -0.002, epsilon = 1e-15);
        assert_relative_eq!(results.value("fa", 0).unwrap(), 0.5, epsilon = 1e-12);
        assert_eq!(results.value("sa", 2), None);
        assert_eq!(results.get("sx"), None);

        let e1 = results.element(1).unwrap();
        assert_eq!(e1.length, 2.0);
        assert_eq!(e1.cosines, vec![1.0, 0.0]);
        assert_eq!(results.names().collect::<Vec<_>>(), vec!["ea", "fa", "sa"]);
    }

    #[test]
    fn zero_displacement_gives_zero_stress() {
        let results = SecondaryResults::compute(&system(), &solution(vec![0.0; 6])).unwrap();
        assert!(results.get("sa").unwrap().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn statistics_summary() {
        let u = solution(vec![0.0, 0.0, 0.001, 0.0, -0.003, 0.0]);
        let results = SecondaryResults::compute(&system(), &u).unwrap();
        let stats = results.statistics(&u);

        assert_relative_eq!(stats.stress_min, -2.0, epsilon = 1e-12);
        assert_relative_eq!(stats.stress_max, 1.0, epsilon = 1e-12);
        assert_eq!(stats.max_abs_stress_element, Some(1));
        assert_eq!(stats.num_tension, 1);
        assert_eq!(stats.num_compression, 1);
        assert_relative_eq!(stats.max_displacement, 0.003, epsilon = 1e-15);
        assert!(stats.format().contains("element 1"));
    }

    #[test]
    fn rejects_wrong_solution_size() {
        let result = SecondaryResults::compute(&system(), &solution(vec![0.0; 4]));
        assert!(matches!(result, Err(SolverError::SizeMismatch { .. })));
    }
}
