//! Integration tests for the glTF scene adapter.
//!
//! Writes a small skinned, animated .gltf + .bin pair, loads it and runs it
//! through the mesh and animation exports.

use serde_json::json;
use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_2};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

use waffles_common::{AnimationFile, MeshFile, TextureType};
use waffles_export::{ExportMode, ExportOptions, SceneProvider, export_scene, load_scene};

fn push_f32s(buf: &mut Vec<u8>, values: &[f32]) {
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

/// Triangle skinned to a two-joint chain with one rotation channel on the tip
fn write_skinned_gltf(dir: &Path) -> PathBuf {
    let mut bin = Vec::new();
    // 0: positions
    push_f32s(&mut bin, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    // 36: normals
    push_f32s(&mut bin, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    // 72: uvs
    push_f32s(&mut bin, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    // 96: indices + padding
    for i in [0u16, 1, 2, 0] {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    // 104: joints
    bin.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]);
    // 116: weights
    push_f32s(
        &mut bin,
        &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
    );
    // 164: inverse bind matrices
    push_f32s(
        &mut bin,
        &[
            1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
            1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, -1.0, 0.0, 1.0,
        ],
    );
    // 292: keyframe times
    push_f32s(&mut bin, &[0.0, 1.0]);
    // 300: rotations, identity then 90 degrees about Y
    push_f32s(&mut bin, &[0.0, 0.0, 0.0, 1.0, 0.0, FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2]);
    assert_eq!(bin.len(), 332);

    let view = |offset: usize, length: usize| json!({ "buffer": 0, "byteOffset": offset, "byteLength": length });
    let document = json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0, 1] }],
        "nodes": [
            { "name": "Body", "mesh": 0, "skin": 0 },
            { "name": "root", "children": [2] },
            { "name": "tip", "translation": [0.0, 1.0, 0.0] }
        ],
        "meshes": [{
            "name": "Body",
            "primitives": [{
                "attributes": { "POSITION": 0, "NORMAL": 1, "TEXCOORD_0": 2, "JOINTS_0": 4, "WEIGHTS_0": 5 },
                "indices": 3,
                "material": 0
            }]
        }],
        "materials": [{ "name": "Mat", "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } } }],
        "textures": [{ "source": 0 }],
        "images": [{ "uri": "tex.png" }],
        "skins": [{ "name": "Rig", "joints": [1, 2], "inverseBindMatrices": 6 }],
        "animations": [{
            "channels": [{ "sampler": 0, "target": { "node": 2, "path": "rotation" } }],
            "samplers": [{ "input": 7, "output": 8, "interpolation": "LINEAR" }]
        }],
        "buffers": [{ "uri": "skinned.bin", "byteLength": bin.len() }],
        "bufferViews": [
            view(0, 36), view(36, 36), view(72, 24), view(96, 6), view(104, 12),
            view(116, 48), view(164, 128), view(292, 8), view(300, 32)
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" },
            { "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC2" },
            { "bufferView": 3, "componentType": 5123, "count": 3, "type": "SCALAR" },
            { "bufferView": 4, "componentType": 5121, "count": 3, "type": "VEC4" },
            { "bufferView": 5, "componentType": 5126, "count": 3, "type": "VEC4" },
            { "bufferView": 6, "componentType": 5126, "count": 2, "type": "MAT4" },
            { "bufferView": 7, "componentType": 5126, "count": 2, "type": "SCALAR",
              "min": [0.0], "max": [1.0] },
            { "bufferView": 8, "componentType": 5126, "count": 2, "type": "VEC4" }
        ]
    });

    std::fs::write(dir.join("skinned.bin"), &bin).expect("Failed to write buffer");
    let path = dir.join("skinned.gltf");
    std::fs::write(&path, serde_json::to_string_pretty(&document).unwrap())
        .expect("Failed to write glTF");
    path
}

#[test]
fn test_gltf_scene_conversion() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene = load_scene(&write_skinned_gltf(dir.path()), 24.0).expect("Failed to load glTF");

    let mesh = &scene.mesh_objects()[0];
    assert_eq!(mesh.name, "Body");
    assert_eq!(mesh.vertices.len(), 3);
    assert_eq!(mesh.faces.len(), 1);
    assert!(mesh.faces[0].smooth);
    assert_eq!(mesh.vertex_groups, vec!["root".to_string(), "tip".to_string()]);
    assert!(mesh.has_armature_modifier());
    assert_eq!(mesh.vertices[2].groups[0].group, 1);
    assert_eq!(mesh.materials[0].textures[0].path, "tex.png");
    assert!(mesh.materials[0].textures[0].use_diffuse);

    let armature = scene.armature_object().expect("Skin should become an armature");
    assert_eq!(armature.name, "Rig");
    assert_eq!(armature.bones[0].parent, None);
    assert_eq!(armature.bones[1].parent.as_deref(), Some("root"));
    // glTF +Y becomes editor +Z
    let tip_head = armature.bones[1].head;
    assert!((tip_head - glam::Vec3::Z).length() < 1e-5);
    let root_tail = armature.bones[0].tail;
    assert!((root_tail - glam::Vec3::Z).length() < 1e-5);

    let curves = scene.action_curves("tip").expect("tip is animated");
    assert_eq!(curves.rotation_quaternion.len(), 4);
    assert_eq!(curves.rotation_quaternion[0].keyframes[1].0, 24.0);
    assert!(scene.action_curves("root").is_none());
    assert_eq!(scene.frame_range(), (0, 24));
}

#[test]
fn test_gltf_mesh_and_animation_export() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene = load_scene(&write_skinned_gltf(dir.path()), 24.0).unwrap();
    let base = dir.path().join("out/skinned");

    let options = ExportOptions {
        mode: ExportMode::Mesh,
        export_armature: true,
    };
    let report = export_scene(&scene, &base, options).expect("Mesh export failed");
    let mesh = MeshFile::from_bytes(&std::fs::read(&report.paths.binary).unwrap()).unwrap();
    assert_eq!(mesh.header.joint_count, 2);
    assert_eq!(mesh.textures[0].texture_type, TextureType::Diffuse);
    assert_eq!(mesh.bones[0].vert_count, 2);
    assert_eq!(mesh.bones[1].vert_count, 1);
    assert_eq!(mesh.face_groups[0].header.face_count, 1);

    let options = ExportOptions {
        mode: ExportMode::Animation,
        export_armature: false,
    };
    let report = export_scene(&scene, &base, options).expect("Animation export failed");
    let anim = AnimationFile::from_bytes(&std::fs::read(&report.paths.binary).unwrap()).unwrap();
    assert_eq!(anim.header.bone_count, 1);
    assert_eq!(anim.header.frame_count, 24);
    let joint = &anim.joints[0];
    assert_eq!(joint.header.name, "tip");
    assert_eq!(joint.keyframes.len(), 2);
    // a turn about glTF Y is a turn about editor Z, which hits the pole branch
    assert!((joint.keyframes[1].rotation[0] + FRAC_PI_2).abs() < 1e-3);
}
