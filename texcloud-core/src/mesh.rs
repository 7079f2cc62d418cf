//! Textured mesh data structures

use crate::point::Point3d;
use serde::{Deserialize, Serialize};

/// A texture coordinate, V pointing up as written in OBJ files
pub type UV = [f32; 2];

/// One corner of a face
///
/// Indices are not validated on construction; consumers must check them
/// against the mesh arrays and skip corners that are out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceVertex {
    pub vertex: usize,
    pub texcoord: Option<usize>,
}

impl FaceVertex {
    pub fn new(vertex: usize, texcoord: Option<usize>) -> Self {
        Self { vertex, texcoord }
    }
}

/// A polygon with its material assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    /// Index into the material list, `None` when no (known) material is bound
    pub material_id: Option<usize>,
    pub vertices: Vec<FaceVertex>,
}

impl Face {
    pub fn new(material_id: Option<usize>, vertices: Vec<FaceVertex>) -> Self {
        Self {
            material_id,
            vertices,
        }
    }

    /// Number of corners
    pub fn arity(&self) -> usize {
        self.vertices.len()
    }
}

/// A named group of faces (an OBJ `o`/`g` block)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub name: String,
    pub faces: Vec<Face>,
}

impl Shape {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            faces: Vec::new(),
        }
    }
}

/// A mesh with per-face materials and texture coordinates
///
/// Positions are shared by all shapes; a vertex may be referenced by faces
/// of several shapes and materials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TexturedMesh {
    pub positions: Vec<Point3d>,
    pub texcoords: Vec<UV>,
    pub shapes: Vec<Shape>,
}

impl TexturedMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of faces over all shapes
    pub fn face_count(&self) -> usize {
        self.shapes.iter().map(|s| s.faces.len()).sum()
    }

    pub fn has_texcoords(&self) -> bool {
        !self.texcoords.is_empty()
    }

    /// Check if the mesh has no vertices
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Add a vertex to the mesh
    pub fn add_vertex(&mut self, vertex: Point3d) -> usize {
        let index = self.positions.len();
        self.positions.push(vertex);
        index
    }

    /// Add a texture coordinate to the mesh
    pub fn add_texcoord(&mut self, uv: UV) -> usize {
        let index = self.texcoords.len();
        self.texcoords.push(uv);
        index
    }

    /// Iterate over all faces of all shapes
    pub fn faces(&self) -> impl Iterator<Item = &Face> {
        self.shapes.iter().flat_map(|s| s.faces.iter())
    }

    /// Iterate over the faces bound to `material_id`
    pub fn faces_with_material(&self, material_id: usize) -> impl Iterator<Item = &Face> {
        self.faces()
            .filter(move |f| f.material_id == Some(material_id))
    }
}
