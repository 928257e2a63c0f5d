//! JSON model description.
//!
//! ```json
//! {
//!   "vertices": [{"id": 0, "tag": -101, "coords": [0.0, 0.0]}, ...],
//!   "cells": [{"id": 0, "region": -1, "kind": "rod", "vertices": [0, 1]}, ...],
//!   "properties": {"-1": {"E": 2.1e8, "A": 0.003}},
//!   "boundary_conditions": {"-101": {"ux": 0.0, "uy": 0.0}, "-102": {"fy": -320.0}},
//!   "analysis": {"backend": "dense_cholesky", "verbose": false}
//! }
//! ```
//!
//! `tag` defaults to 0 (untagged), `region` to -1 and `kind` to `rod`.
//! `boundary_conditions` and `analysis` may be omitted.

use crate::analysis::{Analysis, AnalysisConfig};
use crate::boundary_conditions::BoundaryConditions;
use crate::error::{Result, SolverError};
use crate::materials::PropertyRegistry;
use crate::mesh::{Cell, ElementKind, Mesh, Vertex, DEFAULT_REGION, UNTAGGED};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn untagged() -> i32 {
    UNTAGGED
}

fn default_region() -> i32 {
    DEFAULT_REGION
}

/// Vertex entry of a model file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexInput {
    pub id: usize,
    #[serde(default = "untagged")]
    pub tag: i32,
    pub coords: Vec<f64>,
}

/// Cell entry of a model file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellInput {
    pub id: usize,
    #[serde(default = "default_region")]
    pub region: i32,
    /// Element kind name (`rod`, `elastrod`, `truss`); rod if omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub vertices: Vec<usize>,
}

impl CellInput {
    fn to_cell(&self) -> Result<Cell> {
        let kind = match &self.kind {
            None => ElementKind::Rod,
            Some(name) => ElementKind::from_name(name).ok_or_else(|| {
                SolverError::InvalidInput(format!(
                    "cell {}: unknown element kind \"{}\"",
                    self.id, name
                ))
            })?,
        };
        Ok(Cell {
            id: self.id,
            region: self.region,
            kind,
            vertices: self.vertices.clone(),
        })
    }
}

/// Complete model: mesh, properties, boundary conditions and configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInput {
    pub vertices: Vec<VertexInput>,
    pub cells: Vec<CellInput>,
    pub properties: PropertyRegistry,
    #[serde(default)]
    pub boundary_conditions: BoundaryConditions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisConfig>,
}

impl ModelInput {
    /// Parse a model from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a model from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Err(SolverError::InvalidInput(format!(
                "model file {} is empty",
                path.display()
            )));
        }
        Self::from_json_str(&content)
    }

    /// Serialize the model as pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build and validate the mesh
    pub fn build_mesh(&self) -> Result<Mesh> {
        let vertices = self
            .vertices
            .iter()
            .map(|v| Vertex::new(v.id, v.tag, &v.coords))
            .collect();
        let cells = self
            .cells
            .iter()
            .map(CellInput::to_cell)
            .collect::<Result<Vec<_>>>()?;
        Mesh::new(vertices, cells)
    }

    /// Validate the model and create an analysis session with `config`
    ///
    /// Mesh errors and missing or invalid region parameters are reported here,
    /// before any stage runs.
    pub fn into_analysis(self, config: AnalysisConfig) -> Result<Analysis> {
        let mesh = self.build_mesh()?;
        self.properties.check_mesh(&mesh)?;
        Ok(Analysis::new(
            mesh,
            self.properties,
            self.boundary_conditions,
            config,
        ))
    }

    /// Like [`into_analysis`](Self::into_analysis), using the model's own
    /// `analysis` section (or defaults)
    pub fn into_default_analysis(mut self) -> Result<Analysis> {
        let config = self.analysis.take().unwrap_or_default();
        self.into_analysis(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendKind;

    const TWO_RODS: &str = r#"{
        "vertices": [
            {"id": 1, "coords": [1.0, 0.0]},
            {"id": 0, "tag": -1, "coords": [0.0, 0.0]},
            {"id": 2, "tag": -2, "coords": [2.0, 0.0]}
        ],
        "cells": [
            {"id": 0, "vertices": [0, 1]},
            {"id": 1, "region": -1, "kind": "ElastRod", "vertices": [1, 2]}
        ],
        "properties": {"-1": {"E": 100.0, "A": 1.0, "rho": 7800.0}},
        "boundary_conditions": {"-1": {"ux": 0.0, "uy": 0.0}, "-2": {"uy": 0.0, "fx": 10.0}},
        "analysis": {"backend": "dense_lu"}
    }"#;

    #[test]
    fn parses_defaults() {
        let model = ModelInput::from_json_str(TWO_RODS).unwrap();
        assert_eq!(model.vertices[0].tag, UNTAGGED);
        assert_eq!(model.cells[0].region, DEFAULT_REGION);
        assert_eq!(model.cells[0].kind, None);
        assert_eq!(model.properties.get(-1).unwrap().get("rho"), Some(7800.0));

        let mesh = model.build_mesh().unwrap();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.vertices_with_tag(-2), &[2]);
    }

    #[test]
    fn embedded_config_is_used() {
        let model = ModelInput::from_json_str(TWO_RODS).unwrap();
        let analysis = model.into_default_analysis().unwrap();
        assert_eq!(analysis.config().backend, BackendKind::DenseLu);
    }

    #[test]
    fn unknown_kind_is_invalid_input() {
        let json = TWO_RODS.replace("ElastRod", "beam");
        let model = ModelInput::from_json_str(&json).unwrap();
        let err = model.build_mesh().unwrap_err();
        assert!(matches!(err, SolverError::InvalidInput(_)));
        assert!(err.to_string().contains("beam"));
    }

    #[test]
    fn malformed_json_is_json_error() {
        let result = ModelInput::from_json_str("{\"vertices\": [");
        assert!(matches!(result, Err(SolverError::Json(_))));
    }

    #[test]
    fn missing_region_detected_early() {
        let json = TWO_RODS.replace("\"-1\": {\"E\"", "\"-5\": {\"E\"");
        let model = ModelInput::from_json_str(&json).unwrap();
        let err = model.into_analysis(AnalysisConfig::default()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn json_roundtrip_preserves_model() {
        let model = ModelInput::from_json_str(TWO_RODS).unwrap();
        let json = model.to_json_string().unwrap();
        let again = ModelInput::from_json_str(&json).unwrap();
        assert_eq!(again.vertices, model.vertices);
        assert_eq!(again.cells, model.cells);
        assert_eq!(again.boundary_conditions, model.boundary_conditions);
    }
}
