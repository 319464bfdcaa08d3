//! Binary `.3dm` / `.3da` writers
//!
//! Sections are written in the order the engine loader reads them, each
//! preceded by [`TAG_CHECK`]. Every count is range-checked before it is
//! narrowed to a u16 field.

use std::io::Write;

use waffles_common::{
    AnimationFileHeader, BoneRecord, FaceGroupHeader, JointAnimationHeader, KeyframeRecord,
    MeshFileHeader, TAG_CHECK, TextureRecord, VertexIndexRecord, VertexRecord, VertexSkin,
};

use crate::animation::AnimationExport;
use crate::error::{ExportError, u16_count};
use crate::session::ExportSession;

fn write_tag<W: Write>(w: &mut W) -> Result<(), ExportError> {
    w.write_all(&TAG_CHECK.to_le_bytes())?;
    Ok(())
}

/// Bone record `index` of a skinned session
pub fn bone_record(session: &ExportSession, index: usize) -> Option<BoneRecord> {
    let skeleton = session.skeleton.as_ref()?;
    let bone = skeleton.bones.get(index)?;
    let mut matrix = [0.0f32; 16];
    for r in 0..4 {
        matrix[r * 4..r * 4 + 4].copy_from_slice(&bone.orientation.row(r).to_array());
    }
    Some(BoneRecord {
        vert_count: session.bone_vert_counts.get(index).copied().unwrap_or(0) as i32,
        name: bone.name.clone(),
        parent: bone.parent.clone().unwrap_or_default(),
        head: skeleton.head_position(index).to_array(),
        tail: skeleton.tail_position(index).to_array(),
        matrix,
    })
}

/// Header of a mesh session, with every count checked
pub fn mesh_header(session: &ExportSession) -> Result<MeshFileHeader, ExportError> {
    Ok(MeshFileHeader::new(
        u16_count("vertex", session.vertices.len())?,
        u16_count("uv", session.uvs.len())?,
        u16_count("normal", session.normals.len())?,
        u16_count("face group", session.face_groups.len())?,
        u16_count("texture", session.textures.len())?,
        u16_count("joint", session.bone_count())?,
    ))
}

/// Write a complete `.3dm` file
pub fn write_mesh_binary<W: Write>(w: &mut W, session: &ExportSession) -> Result<(), ExportError> {
    let header = mesh_header(session)?;
    w.write_all(&header.to_bytes())?;

    if !session.textures.is_empty() {
        write_tag(w)?;
        for texture in &session.textures {
            let record = TextureRecord {
                texture_type: texture.texture_type,
                path: texture.path.clone(),
            };
            w.write_all(&record.to_bytes()?)?;
        }
    }

    write_tag(w)?;
    for vertex in &session.vertices {
        let record = VertexRecord {
            position: vertex.position.to_array(),
            skin: vertex.skin.map(|s| VertexSkin {
                weight: s.weight,
                bone: s.bone as i32,
            }),
        };
        w.write_all(&record.to_bytes())?;
    }

    if !session.normals.is_empty() {
        write_tag(w)?;
        for normal in &session.normals {
            for c in normal.to_array() {
                w.write_all(&c.to_le_bytes())?;
            }
        }
    }

    if !session.uvs.is_empty() {
        write_tag(w)?;
        for uv in &session.uvs {
            w.write_all(&uv.x.to_le_bytes())?;
            w.write_all(&uv.y.to_le_bytes())?;
        }
    }

    let layout = session.vertex_index_layout();
    for group in &session.face_groups {
        write_tag(w)?;
        let group_header = FaceGroupHeader {
            face_count: u16_count("face", group.triangles.len())?,
            vertex_buffer_count: u16_count("vertex buffer", group.vertex_buffer.len())?,
            index_buffer_count: u16_count("index buffer", group.index_buffer.len())?,
            texture_count: u16_count("group texture", group.textures.len())?,
        };
        w.write_all(&group_header.to_bytes())?;

        for &texture in &group.textures {
            w.write_all(&u16_count("texture index", texture)?.to_le_bytes())?;
        }
        for key in &group.vertex_buffer {
            let record = VertexIndexRecord {
                vert: u16_count("vertex index", key.vert)?,
                norm: key.norm.map(|n| u16_count("normal index", n)).transpose()?,
                uv: key.uv.map(|uv| u16_count("uv index", uv)).transpose()?,
            };
            w.write_all(&record.to_bytes(layout))?;
        }
        for &index in &group.index_buffer {
            w.write_all(&u16_count("index", index)?.to_le_bytes())?;
        }
    }

    if session.bone_count() > 0 {
        write_tag(w)?;
        for index in 0..session.bone_count() {
            if let Some(record) = bone_record(session, index) {
                w.write_all(&record.to_bytes()?)?;
            }
        }
    }

    Ok(())
}

/// Write a complete `.3da` file
pub fn write_animation_binary<W: Write>(
    w: &mut W,
    animation: &AnimationExport,
) -> Result<(), ExportError> {
    let frame_count = u16::try_from(animation.frame_end).map_err(|_| ExportError::CountOverflow {
        field: "frame",
        count: animation.frame_end as usize,
    })?;
    let header = AnimationFileHeader::new(u16_count("animated bone", animation.groups.len())?, frame_count);
    w.write_all(&header.to_bytes())?;

    for group in &animation.groups {
        let joint = JointAnimationHeader {
            keyframe_count: u16_count("keyframe", group.keyframes.len())?,
            name: group.name.clone(),
            parent: group.parent.clone(),
        };
        w.write_all(&joint.to_bytes()?)?;
        write_tag(w)?;
        for key in &group.keyframes {
            let record = KeyframeRecord {
                time: key.time,
                position: key.position.to_array(),
                rotation: key.rotation,
            };
            w.write_all(&record.to_bytes())?;
        }
    }

    Ok(())
}
