//! Geometry extraction: scene mesh objects -> world-space face lists
//!
//! Every mesh object is transformed by its world matrix and appended to one
//! global vertex list. Face vertex indices are offset so they index that list.

use glam::{Mat3, Vec2, Vec3};

use crate::error::ExportError;
use crate::scene::{MeshObject, SceneProvider};

/// Source face shape. Anything else is rejected at extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polygon {
    Tri([usize; 3]),
    Quad([usize; 4]),
}

impl Polygon {
    /// Corner triples of the emitted triangles; a quad splits along 0-2
    pub fn triangle_corners(&self) -> &'static [[usize; 3]] {
        match self {
            Polygon::Tri(_) => &[[0, 1, 2]],
            Polygon::Quad(_) => &[[0, 1, 2], [2, 3, 0]],
        }
    }

    pub fn corners(&self) -> &[usize] {
        match self {
            Polygon::Tri(v) => v,
            Polygon::Quad(v) => v,
        }
    }

    /// Triangles as vertex index triples
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        let v = self.corners();
        self.triangle_corners()
            .iter()
            .map(move |c| [v[c[0]], v[c[1]], v[c[2]]])
    }
}

/// Face in world space with global vertex indices
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFace {
    pub polygon: Polygon,
    pub material: usize,
    pub smooth: bool,
    pub normal: Vec3,
    pub uvs: Option<Vec<Vec2>>,
}

/// One mesh object after world transform
#[derive(Debug, Clone)]
pub struct ExtractedMesh {
    /// Index into [`SceneProvider::mesh_objects`]
    pub object: usize,
    pub name: String,
    /// Global index of this mesh's first vertex
    pub vertex_offset: usize,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub faces: Vec<SourceFace>,
}

/// All mesh objects concatenated
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub meshes: Vec<ExtractedMesh>,
    pub vertex_count: usize,
}

impl Geometry {
    /// World-space position of a global vertex
    pub fn position(&self, vertex: usize) -> Option<Vec3> {
        let mesh = self.mesh_of(vertex)?;
        mesh.positions.get(vertex - mesh.vertex_offset).copied()
    }

    /// World-space vertex normal of a global vertex
    pub fn vertex_normal(&self, vertex: usize) -> Option<Vec3> {
        let mesh = self.mesh_of(vertex)?;
        mesh.normals.get(vertex - mesh.vertex_offset).copied()
    }

    fn mesh_of(&self, vertex: usize) -> Option<&ExtractedMesh> {
        self.meshes
            .iter()
            .rev()
            .find(|m| m.vertex_offset <= vertex && vertex < m.vertex_offset + m.positions.len())
    }

    /// Every position in global vertex order
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.meshes.iter().flat_map(|m| m.positions.iter().copied())
    }
}

/// Extract every mesh object of the scene
pub fn extract_geometry(scene: &impl SceneProvider) -> Result<Geometry, ExportError> {
    let mut geometry = Geometry::default();
    for (index, object) in scene.mesh_objects().iter().enumerate() {
        let mesh = extract_mesh(index, object, geometry.vertex_count)?;
        geometry.vertex_count += mesh.positions.len();
        geometry.meshes.push(mesh);
    }
    tracing::debug!(
        "Extracted {} meshes, {} vertices",
        geometry.meshes.len(),
        geometry.vertex_count
    );
    Ok(geometry)
}

fn extract_mesh(
    index: usize,
    object: &MeshObject,
    vertex_offset: usize,
) -> Result<ExtractedMesh, ExportError> {
    let normal_matrix = normal_matrix(object);
    let positions: Vec<Vec3> = object
        .vertices
        .iter()
        .map(|v| object.world.transform_point3(v.co))
        .collect();
    let normals = object
        .vertices
        .iter()
        .map(|v| (normal_matrix * v.normal).normalize_or_zero())
        .collect();

    let mut faces = Vec::with_capacity(object.faces.len());
    for (face_index, face) in object.faces.iter().enumerate() {
        if let Some(&bad) = face.vertices.iter().find(|&&v| v >= positions.len()) {
            return Err(ExportError::VertexOutOfRange {
                object: object.name.clone(),
                face: face_index,
                index: bad,
                count: positions.len(),
            });
        }

        let polygon = match face.vertices[..] {
            [a, b, c] => Polygon::Tri([a, b, c].map(|v| v + vertex_offset)),
            [a, b, c, d] => Polygon::Quad([a, b, c, d].map(|v| v + vertex_offset)),
            _ => {
                return Err(ExportError::UnsupportedPolygon {
                    object: object.name.clone(),
                    face: face_index,
                    corners: face.vertices.len(),
                });
            }
        };

        let mut normal = (normal_matrix * face.normal).normalize_or_zero();
        if normal == Vec3::ZERO {
            let [a, b, c] = [0, 1, 2].map(|i| positions[face.vertices[i]]);
            normal = (b - a).cross(c - a).normalize_or_zero();
        }

        faces.push(SourceFace {
            polygon,
            material: face.material,
            smooth: face.smooth,
            normal,
            uvs: face.uvs.clone(),
        });
    }

    Ok(ExtractedMesh {
        object: index,
        name: object.name.clone(),
        vertex_offset,
        positions,
        normals,
        faces,
    })
}

/// Inverse-transpose of the world matrix's linear part
fn normal_matrix(object: &MeshObject) -> Mat3 {
    let linear = Mat3::from_mat4(object.world);
    if linear.determinant() == 0.0 {
        linear
    } else {
        linear.inverse().transpose()
    }
}
