//! Diagnostic text reports
//!
//! Human-readable dumps of the same data the binary writers emit. The counts
//! printed here always match the binary header.

use std::io::Write;

use crate::animation::AnimationExport;
use crate::error::ExportError;
use crate::session::ExportSession;

fn fmt3(v: [f32; 3]) -> String {
    format!("{:.6} {:.6} {:.6}", v[0], v[1], v[2])
}

/// Write the mesh report for `session`
pub fn write_mesh_report<W: Write>(w: &mut W, session: &ExportSession) -> Result<(), ExportError> {
    writeln!(w, "objects: {}", session.objects.len())?;
    for object in &session.objects {
        writeln!(
            w,
            "  {} animated: {} modifiers: [{}]",
            object.name,
            object.animated,
            object.modifiers.join(", ")
        )?;
    }
    writeln!(w)?;

    writeln!(w, "vertCount: {}", session.vertices.len())?;
    writeln!(w, "uvCount: {}", session.uvs.len())?;
    writeln!(w, "normCount: {}", session.normals.len())?;
    writeln!(w, "faceGroupCount: {}", session.face_groups.len())?;
    writeln!(w, "matCount: {}", session.textures.len())?;
    writeln!(w, "jointCount: {}", session.bone_count())?;
    writeln!(w)?;

    writeln!(w, "vertices:")?;
    for (i, vertex) in session.vertices.iter().enumerate() {
        match (vertex.skin, &session.skeleton) {
            (Some(skin), Some(skeleton)) => writeln!(
                w,
                "  {i}: {} w: {:.6} bone: {} {}",
                fmt3(vertex.position.to_array()),
                skin.weight,
                skin.bone,
                skeleton.bones[skin.bone].name
            )?,
            _ => writeln!(w, "  {i}: {}", fmt3(vertex.position.to_array()))?,
        }
    }

    if !session.normals.is_empty() {
        writeln!(w, "normals:")?;
        for (i, normal) in session.normals.iter().enumerate() {
            writeln!(w, "  {i}: {}", fmt3(normal.to_array()))?;
        }
    }

    if !session.uvs.is_empty() {
        writeln!(w, "uvs:")?;
        for (i, uv) in session.uvs.iter().enumerate() {
            writeln!(w, "  {i}: {:.6} {:.6}", uv.x, uv.y)?;
        }
    }
    writeln!(w)?;

    for (g, group) in session.face_groups.iter().enumerate() {
        let textures = group
            .textures
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(
            w,
            "faceGroup {g}: faces: {} textures: [{textures}]",
            group.triangles.len()
        )?;
        for (f, tri) in group.triangles.iter().enumerate() {
            let corners = tri
                .keys
                .iter()
                .map(|k| format!("({}, {}, {})", k.vert, opt(k.norm), opt(k.uv)))
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(w, "  face {f}: {corners}")?;
        }
        writeln!(w, "  vertexBuffer: {}", group.vertex_buffer.len())?;
        for (i, key) in group.vertex_buffer.iter().enumerate() {
            writeln!(w, "    {i}: {} {} {}", key.vert, opt(key.norm), opt(key.uv))?;
        }
        writeln!(w, "  indexBuffer: {}", group.index_buffer.len())?;
        for row in group.index_buffer.chunks(3) {
            let row = row.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
            writeln!(w, "    {row}")?;
        }
    }

    if !session.textures.is_empty() {
        writeln!(w)?;
        writeln!(w, "textures:")?;
        for (i, texture) in session.textures.iter().enumerate() {
            writeln!(
                w,
                "  {i}: {} len: {} - {}",
                texture.texture_type.label(),
                texture.path.len(),
                texture.path
            )?;
        }
    }

    if let Some(skeleton) = &session.skeleton {
        writeln!(w)?;
        writeln!(w, "bones:")?;
        for (i, bone) in skeleton.bones.iter().enumerate() {
            writeln!(
                w,
                "  {i}: {} verts: {} parent: {}",
                bone.name,
                session.bone_vert_counts.get(i).copied().unwrap_or(0),
                bone.parent.as_deref().unwrap_or("armature")
            )?;
            writeln!(w, "    head: {}", fmt3(skeleton.head_position(i).to_array()))?;
            writeln!(w, "    tail: {}", fmt3(skeleton.tail_position(i).to_array()))?;
            for r in 0..4 {
                let row = bone.orientation.row(r);
                writeln!(
                    w,
                    "    {:.6} {:.6} {:.6} {:.6}",
                    row.x, row.y, row.z, row.w
                )?;
            }
        }
    }

    Ok(())
}

fn opt(index: Option<usize>) -> String {
    index.map_or_else(|| "-".to_string(), |i| i.to_string())
}

/// Write the animation report
pub fn write_animation_report<W: Write>(
    w: &mut W,
    animation: &AnimationExport,
) -> Result<(), ExportError> {
    writeln!(
        w,
        "armature: {}",
        animation.armature.as_deref().unwrap_or("none")
    )?;
    writeln!(w, "boneCount: {}", animation.groups.len())?;
    writeln!(w, "frameStart: {}", animation.frame_start)?;
    writeln!(w, "frameEnd: {}", animation.frame_end)?;

    for group in &animation.groups {
        writeln!(w)?;
        writeln!(w, "keyframes: {}", group.keyframes.len())?;
        writeln!(w, "name: {}", group.name)?;
        writeln!(w, "parent: {}", group.parent)?;
        for key in &group.keyframes {
            writeln!(
                w,
                "  {:.2}: pos {} rot {}",
                key.time,
                fmt3(key.position.to_array()),
                fmt3(key.rotation)
            )?;
        }
    }

    Ok(())
}
