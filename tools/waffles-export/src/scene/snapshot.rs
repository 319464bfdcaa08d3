//! Editor JSON dump reader
//!
//! The dump is a direct serialisation of [`Scene`]: vectors are arrays,
//! matrices are 16 floats in column-major order.

use anyhow::{Context, Result};
use std::path::Path;

use super::Scene;

/// Load a scene dump from disk
pub fn load_json(path: &Path) -> Result<Scene> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene: {:?}", path))?;
    parse_json(&content).with_context(|| format!("Failed to parse scene: {:?}", path))
}

/// Parse a scene dump
pub fn parse_json(content: &str) -> Result<Scene> {
    let scene: Scene = serde_json::from_str(content)?;
    tracing::debug!(
        "Scene snapshot: {} meshes, {} armatures, {} animated bones",
        scene.meshes.len(),
        scene.armatures.len(),
        scene.actions.len()
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ModifierKind, SceneProvider};
    use glam::Vec3;

    #[test]
    fn test_parse_minimal_scene() {
        let scene = parse_json(
            r#"{
                "meshes": [{
                    "name": "Plane",
                    "vertices": [
                        { "co": [0, 0, 0], "normal": [0, 0, 1] },
                        { "co": [1, 0, 0], "normal": [0, 0, 1] },
                        { "co": [1, 1, 0], "normal": [0, 0, 1] }
                    ],
                    "faces": [{ "vertices": [0, 1, 2] }]
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(scene.frame_range(), (1, 250));
        let mesh = &scene.mesh_objects()[0];
        assert_eq!(mesh.world, glam::Mat4::IDENTITY);
        assert_eq!(mesh.vertices[1].co, Vec3::X);
        assert!(!mesh.faces[0].smooth);
        assert!(mesh.faces[0].uvs.is_none());
        assert!(scene.armature_object().is_none());
    }

    #[test]
    fn test_parse_armature_and_curves() {
        let scene = parse_json(
            r#"{
                "meshes": [{
                    "name": "Body",
                    "vertices": [{ "co": [0, 0, 0], "groups": [{ "group": 0, "weight": 1.0 }] }],
                    "faces": [],
                    "vertex_groups": ["root"],
                    "modifiers": [{ "name": "Armature", "kind": "armature" }]
                }],
                "armatures": [{
                    "name": "Rig",
                    "world": [1,0,0,0, 0,1,0,0, 0,0,1,0, 2,3,4,1],
                    "bones": [{
                        "name": "root",
                        "head": [0, 0, 0],
                        "tail": [0, 1, 0],
                        "matrix_local": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]
                    }]
                }],
                "actions": {
                    "root": { "rotation_quaternion": [{ "index": 0, "keyframes": [[1, 1.0], [10, 0.5]] }] }
                },
                "frame_start": 1,
                "frame_end": 10
            }"#,
        )
        .unwrap();

        let armature = scene.armature_object().unwrap();
        assert_eq!(armature.world.w_axis.truncate(), Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(scene.mesh_objects()[0].modifiers[0].kind, ModifierKind::Armature);
        let curves = scene.action_curves("root").unwrap();
        assert_eq!(curves.rotation_quaternion[0].keyframes[1], (10.0, 0.5));
        assert!(scene.action_curves("spine").is_none());
    }

    #[test]
    fn test_parse_error_has_context() {
        let err = parse_json("{ \"meshes\": 3 }").unwrap_err();
        assert!(err.to_string().contains("invalid type"));
    }
}
