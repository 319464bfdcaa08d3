//! Export session: the derived dataset both writers consume
//!
//! Built once per export by running every pipeline stage in order, then
//! handed read-only to the text and binary writers.

use clap::ValueEnum;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use waffles_common::{ANIMATION_FORMAT, COLLISION_FORMAT, ExportFormat, MESH_FORMAT, VertexIndexLayout};

use crate::dedup::{build_vertex_buffers, index_normals, index_uvs};
use crate::error::ExportError;
use crate::geometry::extract_geometry;
use crate::grouping::{FaceGroup, GroupingOptions, TextureEntry, collect_textures, group_faces};
use crate::scene::SceneProvider;
use crate::skeleton::{Skeleton, build_skeleton};
use crate::skinning::{BoneWeight, resolve_skinning};

/// What an export writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Render mesh with textures, normals and UVs
    #[default]
    Mesh,
    /// Positions and faces only
    Collision,
    /// Keyframes of the armature's bones
    Animation,
}

impl ExportMode {
    pub const fn format(self) -> ExportFormat {
        match self {
            ExportMode::Mesh => MESH_FORMAT,
            ExportMode::Collision => COLLISION_FORMAT,
            ExportMode::Animation => ANIMATION_FORMAT,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub mode: ExportMode,
    /// Skin vertices to the scene's armature and write its bones
    pub export_armature: bool,
}

/// Object line of the text report
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSummary {
    pub name: String,
    pub animated: bool,
    pub modifiers: Vec<String>,
}

/// Final vertex: engine-space position plus the dominant bone when skinned
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportVertex {
    pub position: Vec3,
    pub skin: Option<BoneWeight>,
}

/// Mesh export dataset
#[derive(Debug, Clone, Default)]
pub struct ExportSession {
    pub options: ExportOptions,
    pub objects: Vec<ObjectSummary>,
    pub vertices: Vec<ExportVertex>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub textures: Vec<TextureEntry>,
    pub face_groups: Vec<FaceGroup>,
    pub skeleton: Option<Skeleton>,
    /// Vertices bound to each bone of `skeleton`
    pub bone_vert_counts: Vec<usize>,
}

impl ExportSession {
    /// Run extraction, skinning, grouping and dedup over `scene`
    pub fn build(scene: &impl SceneProvider, options: ExportOptions) -> Result<Self, ExportError> {
        let collision = options.mode == ExportMode::Collision;
        let geometry = extract_geometry(scene)?;

        let skeleton = if options.export_armature {
            build_skeleton(scene)?
        } else {
            None
        };
        let skinning = skeleton
            .as_ref()
            .map(|s| resolve_skinning(scene, &geometry, s))
            .transpose()?;

        let textures = if collision {
            Vec::new()
        } else {
            collect_textures(scene)?
        };
        let mut face_groups = group_faces(
            scene,
            &geometry,
            &textures,
            GroupingOptions { normals: !collision },
        );

        let normals = match (&skeleton, &skinning) {
            (Some(skeleton), Some(skinning)) => index_normals(&mut face_groups, |v, n| {
                skeleton.skin_normal(skinning.bone_of(v), n)
            }),
            _ => index_normals(&mut face_groups, |_, n| n),
        };
        let uvs = index_uvs(&mut face_groups);
        build_vertex_buffers(&mut face_groups);

        let vertices = geometry
            .positions()
            .enumerate()
            .map(|(v, position)| match (&skeleton, &skinning) {
                (Some(skeleton), Some(skinning)) => {
                    let skin = skinning.assignments[v];
                    ExportVertex {
                        position: skeleton.skin_position(skin.bone, position),
                        skin: Some(skin),
                    }
                }
                _ => ExportVertex {
                    position,
                    skin: None,
                },
            })
            .collect::<Vec<_>>();

        let objects = scene
            .mesh_objects()
            .iter()
            .map(|o| ObjectSummary {
                name: o.name.clone(),
                animated: o.animated,
                modifiers: o.modifiers.iter().map(|m| m.name.clone()).collect(),
            })
            .collect();

        tracing::debug!(
            "Session: {} vertices, {} normals, {} uvs, {} textures, {} groups, {} bones",
            vertices.len(),
            normals.len(),
            uvs.len(),
            textures.len(),
            face_groups.len(),
            skeleton.as_ref().map_or(0, Skeleton::len)
        );

        Ok(Self {
            options,
            objects,
            vertices,
            normals,
            uvs,
            textures,
            face_groups,
            skeleton,
            bone_vert_counts: skinning.map(|s| s.bone_vert_counts).unwrap_or_default(),
        })
    }

    pub fn is_skinned(&self) -> bool {
        self.skeleton.is_some()
    }

    pub fn bone_count(&self) -> usize {
        self.skeleton.as_ref().map_or(0, Skeleton::len)
    }

    pub fn triangle_count(&self) -> usize {
        self.face_groups.iter().map(|g| g.triangles.len()).sum()
    }

    /// Fields of each vertex-buffer record
    pub fn vertex_index_layout(&self) -> VertexIndexLayout {
        VertexIndexLayout {
            normals: !self.normals.is_empty(),
            uvs: !self.uvs.is_empty(),
        }
    }
}
