//! Skinning resolver: one dominant bone per vertex
//!
//! A vertex is bound to the first of its vertex groups whose name is a bone
//! of the export skeleton. Only that bone and its weight are kept.

use crate::error::ExportError;
use crate::geometry::Geometry;
use crate::scene::{MeshObject, SceneProvider};
use crate::skeleton::Skeleton;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneWeight {
    pub bone: usize,
    pub weight: f32,
}

/// Bone assignment of every global vertex
#[derive(Debug, Clone, Default)]
pub struct Skinning {
    pub assignments: Vec<BoneWeight>,
    /// Number of vertices bound to each bone
    pub bone_vert_counts: Vec<usize>,
}

impl Skinning {
    pub fn bone_of(&self, vertex: usize) -> usize {
        self.assignments[vertex].bone
    }
}

/// First vertex group of `vertex` naming a bone of `skeleton`
pub fn dominant_bone(object: &MeshObject, vertex: usize, skeleton: &Skeleton) -> Option<BoneWeight> {
    object.vertices[vertex].groups.iter().find_map(|g| {
        let name = object.vertex_groups.get(g.group)?;
        let bone = skeleton.bone_index(name)?;
        Some(BoneWeight {
            bone,
            weight: g.weight,
        })
    })
}

/// Assign a bone to every vertex of the extracted geometry
///
/// Objects without an armature modifier have no bone assignments, so any
/// vertex of theirs fails the export like an unweighted vertex would.
pub fn resolve_skinning(
    scene: &impl SceneProvider,
    geometry: &Geometry,
    skeleton: &Skeleton,
) -> Result<Skinning, ExportError> {
    let objects = scene.mesh_objects();
    let mut skinning = Skinning {
        assignments: Vec::with_capacity(geometry.vertex_count),
        bone_vert_counts: vec![0; skeleton.len()],
    };

    for mesh in &geometry.meshes {
        let object = &objects[mesh.object];
        let deformed = object.has_armature_modifier();
        for local in 0..mesh.positions.len() {
            let assignment = deformed
                .then(|| dominant_bone(object, local, skeleton))
                .flatten()
                .ok_or_else(|| ExportError::MissingBoneAssignment {
                    object: object.name.clone(),
                    vertex: mesh.vertex_offset + local,
                    armature: skeleton.armature.clone(),
                })?;
            skinning.bone_vert_counts[assignment.bone] += 1;
            skinning.assignments.push(assignment);
        }
    }

    tracing::debug!(
        "Skinned {} vertices to {} bones",
        skinning.assignments.len(),
        skeleton.len()
    );
    Ok(skinning)
}
