//! Material and section properties, looked up by region tag.

use crate::error::{Result, SolverError};
use crate::mesh::{ElementKind, Mesh};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameter name for the elastic (Young's) modulus
pub const MODULUS: &str = "E";
/// Parameter name for the cross-sectional area
pub const AREA: &str = "A";

/// A named-parameter set attached to one region
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertySet {
    params: BTreeMap<String, f64>,
}

impl PropertySet {
    /// Create an empty property set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: f64) {
        self.params.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.params.get(name).copied()
    }

    /// Get a parameter that must be present
    pub fn require(&self, region: i32, name: &str) -> Result<f64> {
        self.get(name).ok_or_else(|| SolverError::MissingParameter {
            region,
            name: name.to_string(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }
}

impl FromIterator<(String, f64)> for PropertySet {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

/// Parameters needed by the elastic rod formulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RodProperties {
    /// Young's modulus (E)
    pub modulus: f64,
    /// Cross-sectional area (A)
    pub area: f64,
}

impl RodProperties {
    pub fn new(modulus: f64, area: f64) -> Self {
        Self { modulus, area }
    }

    /// Extract and validate `E` and `A` from a property set
    pub fn from_set(region: i32, set: &PropertySet) -> Result<Self> {
        let modulus = positive(region, MODULUS, set.require(region, MODULUS)?)?;
        let area = positive(region, AREA, set.require(region, AREA)?)?;
        Ok(Self { modulus, area })
    }

    /// Axial rigidity E·A
    pub fn axial_rigidity(&self) -> f64 {
        self.modulus * self.area
    }
}

fn positive(region: i32, name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SolverError::InvalidParameter {
            region,
            name: name.to_string(),
            value,
        })
    }
}

/// Region tag → property set registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyRegistry {
    regions: BTreeMap<i32, PropertySet>,
}

impl PropertyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a `{region: {name: value}}` map
    pub fn from_map<I, P>(map: I) -> Self
    where
        I: IntoIterator<Item = (i32, P)>,
        P: IntoIterator<Item = (String, f64)>,
    {
        Self {
            regions: map
                .into_iter()
                .map(|(tag, params)| (tag, params.into_iter().collect()))
                .collect(),
        }
    }

    /// Add or replace the property set of a region
    pub fn insert(&mut self, region: i32, set: PropertySet) {
        self.regions.insert(region, set);
    }

    pub fn get(&self, region: i32) -> Option<&PropertySet> {
        self.regions.get(&region)
    }

    /// Look up a region that a cell depends on
    pub fn lookup(&self, region: i32, cell: usize) -> Result<&PropertySet> {
        self.regions
            .get(&region)
            .ok_or(SolverError::MissingProperties { region, cell })
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Verify every cell's region exists and carries the parameters its
    /// element kind requires
    pub fn check_mesh(&self, mesh: &Mesh) -> Result<()> {
        for cell in mesh.cells() {
            let set = self.lookup(cell.region, cell.id)?;
            match cell.kind {
                ElementKind::Rod => {
                    RodProperties::from_set(cell.region, set)?;
                }
            }
        }
        Ok(())
    }

    /// One line per region listing its parameter names
    pub fn format(&self) -> String {
        self.regions
            .iter()
            .map(|(region, set)| {
                let names: Vec<&str> = set.names().collect();
                format!("Region {}: {}", region, names.join(", "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
