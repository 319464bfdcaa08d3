//! Read exported files back and summarise them

use anyhow::{Context, Result};
use std::path::Path;
use waffles_common::{AnimationFile, MeshFile};

/// Summary lines of a `.3dm` file
pub fn describe_mesh(file: &MeshFile) -> Vec<String> {
    let h = &file.header;
    let mut lines = vec![format!(
        "mesh: {} vertices, {} normals, {} uvs, {} face groups, {} textures, {} joints",
        h.vert_count, h.normal_count, h.uv_count, h.face_group_count, h.texture_count, h.joint_count
    )];
    for (i, texture) in file.textures.iter().enumerate() {
        lines.push(format!("  texture {}: {} {}", i, texture.texture_type.label(), texture.path));
    }
    for (i, group) in file.face_groups.iter().enumerate() {
        lines.push(format!(
            "  group {}: {} faces, {} vertices, {} indices, textures {:?}",
            i,
            group.header.face_count,
            group.header.vertex_buffer_count,
            group.header.index_buffer_count,
            group.textures
        ));
    }
    for (i, bone) in file.bones.iter().enumerate() {
        let parent = if bone.parent.is_empty() { "-" } else { bone.parent.as_str() };
        lines.push(format!(
            "  bone {}: {} (parent {}) {} vertices",
            i, bone.name, parent, bone.vert_count
        ));
    }
    lines
}

/// Summary lines of a `.3da` file
pub fn describe_animation(file: &AnimationFile) -> Vec<String> {
    let mut lines = vec![format!(
        "animation: {} bones, {} frames",
        file.header.bone_count, file.header.frame_count
    )];
    for joint in &file.joints {
        let h = &joint.header;
        let parent = if h.parent.is_empty() { "-" } else { h.parent.as_str() };
        lines.push(format!(
            "  {} (parent {}): {} keyframes",
            h.name, parent, h.keyframe_count
        ));
    }
    lines
}

/// Parse `path` as a mesh or animation (by extension) and summarise it
pub fn describe(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let is_animation = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("3da"));

    if is_animation {
        let file = AnimationFile::from_bytes(&bytes)
            .with_context(|| format!("Invalid animation file: {}", path.display()))?;
        Ok(describe_animation(&file))
    } else {
        let file = MeshFile::from_bytes(&bytes)
            .with_context(|| format!("Invalid mesh file: {}", path.display()))?;
        Ok(describe_mesh(&file))
    }
}
