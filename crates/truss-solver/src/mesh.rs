//! Mesh data structures for truss analysis.
//!
//! A mesh is a flat list of tagged vertices and tagged cells. Vertex and cell
//! ids are dense and zero-based, so both are stored in plain vectors indexed by
//! id. Boundary tags group vertices sharing a boundary condition; region tags
//! group cells sharing material parameters.

use crate::error::{Result, SolverError};
use serde::Serialize;
use std::collections::BTreeMap;

/// Boundary tag carried by interior (unconstrained, unloaded) vertices
pub const UNTAGGED: i32 = 0;

/// Region tag used when a cell does not name a specific region
pub const DEFAULT_REGION: i32 = -1;

/// A vertex (node) of the mesh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vertex {
    /// Vertex id (dense, zero-based)
    pub id: usize,
    /// Boundary tag (0 = untagged)
    pub tag: i32,
    /// Coordinates, 2 or 3 components
    pub coords: Vec<f64>,
}

impl Vertex {
    /// Create a new vertex
    pub fn new(id: usize, tag: i32, coords: &[f64]) -> Self {
        Self {
            id,
            tag,
            coords: coords.to_vec(),
        }
    }

    /// Number of coordinates
    pub fn ndim(&self) -> usize {
        self.coords.len()
    }
}

/// Element kind, selecting the formulator used for a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// 2-node linear elastic rod (axial force only)
    #[default]
    Rod,
}

impl ElementKind {
    /// Get the number of vertices for this element kind
    pub fn num_nodes(&self) -> usize {
        match self {
            ElementKind::Rod => 2,
        }
    }

    /// Parse an element kind name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "rod" | "elastrod" | "elasticrod" | "truss" => Some(ElementKind::Rod),
            _ => None,
        }
    }
}

/// A cell (element) of the mesh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    /// Cell id (dense, zero-based)
    pub id: usize,
    /// Region tag selecting the property set
    pub region: i32,
    /// Element kind
    pub kind: ElementKind,
    /// Vertex connectivity, ordered (defines the element axis)
    pub vertices: Vec<usize>,
}

impl Cell {
    /// Create a new rod cell
    pub fn rod(id: usize, region: i32, v0: usize, v1: usize) -> Self {
        Self {
            id,
            region,
            kind: ElementKind::Rod,
            vertices: vec![v0, v1],
        }
    }

    /// Validate that the cell has the correct number of vertices
    pub fn validate(&self) -> Result<()> {
        let expected = self.kind.num_nodes();
        if self.vertices.len() != expected {
            return Err(SolverError::WrongNodeCount {
                cell: self.id,
                expected,
                actual: self.vertices.len(),
            });
        }
        Ok(())
    }
}

/// Validated finite element mesh
#[derive(Debug, Clone)]
pub struct Mesh {
    ndim: usize,
    vertices: Vec<Vertex>,
    cells: Vec<Cell>,
    tag_index: BTreeMap<i32, Vec<usize>>,
}

impl Mesh {
    /// Build a mesh from vertex and cell lists.
    ///
    /// Entries may be supplied in any order. Fails if ids are duplicated or not
    /// dense, if coordinates are inconsistent, or if a cell references a
    /// vertex that does not exist.
    pub fn new(vertices: Vec<Vertex>, cells: Vec<Cell>) -> Result<Self> {
        let first = vertices.first().ok_or(SolverError::EmptyMesh)?;
        let ndim = first.ndim();
        if ndim != 2 && ndim != 3 {
            return Err(SolverError::UnsupportedDimension(ndim));
        }

        let count = vertices.len();
        let mut slots: Vec<Option<Vertex>> = vec![None; count];
        for vertex in vertices {
            if vertex.ndim() != ndim {
                return Err(SolverError::DimensionMismatch {
                    vertex: vertex.id,
                    expected: ndim,
                    actual: vertex.ndim(),
                });
            }
            if vertex.coords.iter().any(|c| !c.is_finite()) {
                return Err(SolverError::NonFiniteCoordinate(vertex.id));
            }
            let slot = slots.get_mut(vertex.id).ok_or(SolverError::NonDenseId {
                kind: "Vertex",
                id: vertex.id,
                count,
            })?;
            if slot.is_some() {
                return Err(SolverError::DuplicateVertex(vertex.id));
            }
            *slot = Some(vertex);
        }
        // n entries with unique ids below n fill every slot
        let vertices: Vec<Vertex> = slots.into_iter().flatten().collect();

        let count = cells.len();
        let mut slots: Vec<Option<Cell>> = vec![None; count];
        for cell in cells {
            cell.validate()?;
            if let Some(&missing) = cell.vertices.iter().find(|&&v| v >= vertices.len()) {
                return Err(SolverError::DanglingVertex {
                    cell: cell.id,
                    vertex: missing,
                });
            }
            let slot = slots.get_mut(cell.id).ok_or(SolverError::NonDenseId {
                kind: "Cell",
                id: cell.id,
                count,
            })?;
            if slot.is_some() {
                return Err(SolverError::DuplicateCell(cell.id));
            }
            *slot = Some(cell);
        }
        let cells: Vec<Cell> = slots.into_iter().flatten().collect();

        let mut tag_index: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for vertex in &vertices {
            tag_index.entry(vertex.tag).or_default().push(vertex.id);
        }

        Ok(Self {
            ndim,
            vertices,
            cells,
            tag_index,
        })
    }

    /// Space dimension (2 or 3)
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Total degrees of freedom (one per vertex per direction)
    pub fn num_dofs(&self) -> usize {
        self.vertices.len() * self.ndim
    }

    /// Global equation number of a (vertex, direction) pair
    pub fn dof_index(&self, vertex: usize, direction: usize) -> usize {
        vertex * self.ndim + direction
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Get a vertex by id
    pub fn vertex(&self, id: usize) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    /// Get vertex coordinates by id
    pub fn coords(&self, id: usize) -> Option<&[f64]> {
        self.vertices.get(id).map(|v| v.coords.as_slice())
    }

    /// Get a cell by id
    pub fn cell(&self, id: usize) -> Option<&Cell> {
        self.cells.get(id)
    }

    /// Ids of all vertices carrying `tag`, ascending
    pub fn vertices_with_tag(&self, tag: i32) -> &[usize] {
        self.tag_index.get(&tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All non-zero boundary tags present in the mesh, ascending
    pub fn boundary_tags(&self) -> Vec<i32> {
        self.tag_index
            .keys()
            .copied()
            .filter(|&t| t != UNTAGGED)
            .collect()
    }

    /// All region tags used by cells, ascending
    pub fn region_tags(&self) -> Vec<i32> {
        let mut tags: Vec<i32> = self.cells.iter().map(|c| c.region).collect();
        tags.sort_unstable();
        tags.dedup();
        tags
    }

    /// Get mesh statistics
    pub fn statistics(&self) -> MeshStatistics {
        let mut cells_per_region = BTreeMap::new();
        for cell in &self.cells {
            *cells_per_region.entry(cell.region).or_insert(0) += 1;
        }
        let vertices_per_tag = self
            .tag_index
            .iter()
            .filter(|(tag, _)| **tag != UNTAGGED)
            .map(|(tag, ids)| (*tag, ids.len()))
            .collect();

        MeshStatistics {
            ndim: self.ndim,
            num_vertices: self.vertices.len(),
            num_cells: self.cells.len(),
            num_dofs: self.num_dofs(),
            cells_per_region,
            vertices_per_tag,
        }
    }
}

/// Mesh statistics for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshStatistics {
    pub ndim: usize,
    pub num_vertices: usize,
    pub num_cells: usize,
    pub num_dofs: usize,
    /// Cell count per region tag
    pub cells_per_region: BTreeMap<i32, usize>,
    /// Vertex count per boundary tag (untagged vertices excluded)
    pub vertices_per_tag: BTreeMap<i32, usize>,
}

impl MeshStatistics {
    /// Format as a human-readable string
    pub fn format(&self) -> String {
        let mut lines = vec![
            format!("Dimension: {}D", self.ndim),
            format!("Vertices: {}", self.num_vertices),
            format!("Cells: {}", self.num_cells),
            format!("DOFs: {}", self.num_dofs),
        ];

        if !self.cells_per_region.is_empty() {
            lines.push("Regions:".to_string());
            for (region, count) in &self.cells_per_region {
                lines.push(format!("  {}: {} cells", region, count));
            }
        }
        if !self.vertices_per_tag.is_empty() {
            lines.push("Boundary tags:".to_string());
            for (tag, count) in &self.vertices_per_tag {
                lines.push(format!("  {}: {} vertices", tag, count));
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_vertices() -> Vec<Vertex> {
        vec![
            Vertex::new(0, -1, &[0.0, 0.0]),
            Vertex::new(1, 0, &[1.0, 0.0]),
            Vertex::new(2, -2, &[1.0, 1.0]),
            Vertex::new(3, -1, &[0.0, 1.0]),
        ]
    }

    #[test]
    fn builds_mesh_in_any_order() {
        let mut vertices = square_vertices();
        vertices.reverse();
        let cells = vec![Cell::rod(1, -1, 1, 2), Cell::rod(0, -1, 0, 1)];

        let mesh = Mesh::new(vertices, cells).unwrap();
        assert_eq!(mesh.ndim(), 2);
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_cells(), 2);
        assert_eq!(mesh.num_dofs(), 8);
        assert_eq!(mesh.coords(2), Some(&[1.0, 1.0][..]));
        assert_eq!(mesh.cell(1).unwrap().vertices, vec![1, 2]);
        assert_eq!(mesh.dof_index(3, 1), 7);
    }

    #[test]
    fn indexes_boundary_tags() {
        let mesh = Mesh::new(square_vertices(), vec![Cell::rod(0, -1, 0, 1)]).unwrap();
        assert_eq!(mesh.vertices_with_tag(-1), &[0, 3]);
        assert_eq!(mesh.vertices_with_tag(-2), &[2]);
        assert!(mesh.vertices_with_tag(-99).is_empty());
        assert_eq!(mesh.boundary_tags(), vec![-2, -1]);
    }

    #[test]
    fn rejects_duplicate_vertex() {
        let mut vertices = square_vertices();
        vertices[3].id = 1;
        let result = Mesh::new(vertices, vec![]);
        assert!(matches!(result, Err(SolverError::DuplicateVertex(1))));
    }

    #[test]
    fn rejects_sparse_ids() {
        let mut vertices = square_vertices();
        vertices[3].id = 7;
        let result = Mesh::new(vertices, vec![]);
        assert!(matches!(
            result,
            Err(SolverError::NonDenseId { id: 7, count: 4, .. })
        ));
    }

    #[test]
    fn rejects_duplicate_cell() {
        let cells = vec![Cell::rod(0, -1, 0, 1), Cell::rod(0, -1, 1, 2)];
        let result = Mesh::new(square_vertices(), cells);
        assert!(matches!(result, Err(SolverError::DuplicateCell(0))));
    }

    #[test]
    fn rejects_dangling_vertex() {
        let cells = vec![Cell::rod(0, -1, 0, 9)];
        let result = Mesh::new(square_vertices(), cells);
        let err = result.unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("non-existent vertex 9"));
    }

    #[test]
    fn rejects_wrong_node_count() {
        let cell = Cell {
            id: 0,
            region: -1,
            kind: ElementKind::Rod,
            vertices: vec![0, 1, 2],
        };
        let result = Mesh::new(square_vertices(), vec![cell]);
        assert!(matches!(
            result,
            Err(SolverError::WrongNodeCount { expected: 2, actual: 3, .. })
        ));
    }

    #[test]
    fn rejects_mixed_dimensions() {
        let mut vertices = square_vertices();
        vertices[2].coords.push(5.0);
        let result = Mesh::new(vertices, vec![]);
        assert!(matches!(result, Err(SolverError::DimensionMismatch { vertex: 2, .. })));
    }

    #[test]
    fn rejects_empty_and_1d_meshes() {
        assert!(matches!(Mesh::new(vec![], vec![]), Err(SolverError::EmptyMesh)));
        let line = vec![Vertex::new(0, 0, &[0.0])];
        assert!(matches!(
            Mesh::new(line, vec![]),
            Err(SolverError::UnsupportedDimension(1))
        ));
    }

    #[test]
    fn rejects_nan_coordinates() {
        let mut vertices = square_vertices();
        vertices[1].coords[0] = f64::NAN;
        assert!(matches!(
            Mesh::new(vertices, vec![]),
            Err(SolverError::NonFiniteCoordinate(1))
        ));
    }

    #[test]
    fn element_kind_parsing() {
        assert_eq!(ElementKind::from_name("Rod"), Some(ElementKind::Rod));
        assert_eq!(ElementKind::from_name("elastrod"), Some(ElementKind::Rod));
        assert_eq!(ElementKind::from_name("beam"), None);
    }

    #[test]
    fn mesh_statistics() {
        let cells = vec![Cell::rod(0, -1, 0, 1), Cell::rod(1, -2, 1, 2)];
        let mesh = Mesh::new(square_vertices(), cells).unwrap();
        let stats = mesh.statistics();
        assert_eq!(stats.num_vertices, 4);
        assert_eq!(stats.num_dofs, 8);
        assert_eq!(stats.cells_per_region.get(&-2), Some(&1));
        assert_eq!(stats.vertices_per_tag.get(&-1), Some(&2));
        assert!(!stats.vertices_per_tag.contains_key(&UNTAGGED));
        assert!(stats.format().contains("Cells: 2"));
    }
}
