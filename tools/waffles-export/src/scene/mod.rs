//! Read-only view of an editor scene
//!
//! The export pipeline never touches an editor object model directly. It reads
//! a [`SceneProvider`]; [`Scene`] is the owned snapshot implementation, filled
//! either from an editor JSON dump ([`snapshot`]) or from a glTF file
//! ([`gltf`]).
//!
//! All data is in the editor's convention: right-handed, Z up, matrices acting
//! on column vectors.

pub mod gltf;
pub mod snapshot;

use anyhow::{Result, bail};
use glam::{Mat4, Vec2, Vec3};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Capability interface the pipeline reads scenes through
pub trait SceneProvider {
    /// Every mesh object, in scene order
    fn mesh_objects(&self) -> &[MeshObject];

    /// Every armature object, in scene order
    fn armature_objects(&self) -> &[ArmatureObject];

    /// The armature used for export. Only one armature per scene is supported.
    fn armature_object(&self) -> Option<&ArmatureObject> {
        self.armature_objects().first()
    }

    /// Animation curves of one pose bone of the export armature
    fn action_curves(&self, bone_name: &str) -> Option<&ActionCurves>;

    /// Scene (start, end) frame
    fn frame_range(&self) -> (u32, u32);
}

/// Mesh object with its data in object space
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshObject {
    pub name: String,
    #[serde(default = "identity")]
    pub world: Mat4,
    pub vertices: Vec<MeshVertex>,
    pub faces: Vec<MeshFace>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub vertex_groups: Vec<String>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    /// Object carries its own animation data
    #[serde(default)]
    pub animated: bool,
}

impl MeshObject {
    /// Deformed by an armature modifier
    pub fn has_armature_modifier(&self) -> bool {
        self.modifiers.iter().any(|m| m.kind == ModifierKind::Armature)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshVertex {
    pub co: Vec3,
    #[serde(default)]
    pub normal: Vec3,
    /// Vertex group memberships in editor order
    #[serde(default)]
    pub groups: Vec<GroupWeight>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupWeight {
    /// Index into [`MeshObject::vertex_groups`]
    pub group: usize,
    pub weight: f32,
}

/// Tessellated face (triangle or quad)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshFace {
    /// Object-local vertex indices
    pub vertices: Vec<usize>,
    #[serde(default)]
    pub material: usize,
    #[serde(default)]
    pub smooth: bool,
    /// Flat normal; a zero normal is recomputed from the corners
    #[serde(default)]
    pub normal: Vec3,
    /// One UV per corner, from the active UV layer
    #[serde(default)]
    pub uvs: Option<Vec<Vec2>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Image texture slots in slot order
    #[serde(default)]
    pub textures: Vec<TextureSlot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextureSlot {
    /// Image file path as stored by the editor
    pub path: String,
    #[serde(default)]
    pub use_diffuse: bool,
    #[serde(default)]
    pub use_normal: bool,
    #[serde(default)]
    pub use_specular: bool,
    #[serde(default)]
    pub use_displacement: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    Armature,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub name: String,
    pub kind: ModifierKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArmatureObject {
    pub name: String,
    #[serde(default = "identity")]
    pub world: Mat4,
    /// Bones in armature order; parents need not come first
    pub bones: Vec<ArmatureBone>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArmatureBone {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// Head in armature space
    pub head: Vec3,
    /// Tail in armature space
    pub tail: Vec3,
    /// Rest matrix in armature space
    pub matrix_local: Mat4,
}

/// Scalar animation curves of one pose bone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionCurves {
    #[serde(default)]
    pub location: Vec<FCurve>,
    /// Quaternion curves, array index 0 is W
    #[serde(default)]
    pub rotation_quaternion: Vec<FCurve>,
}

impl ActionCurves {
    pub fn is_empty(&self) -> bool {
        self.location.is_empty() && self.rotation_quaternion.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FCurve {
    pub index: usize,
    /// (frame, value) pairs
    pub keyframes: Vec<(f32, f32)>,
}

/// Owned scene snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub meshes: Vec<MeshObject>,
    #[serde(default)]
    pub armatures: Vec<ArmatureObject>,
    /// Curves of the export armature's action, keyed by bone name
    #[serde(default)]
    pub actions: HashMap<String, ActionCurves>,
    #[serde(default = "default_frame_start")]
    pub frame_start: u32,
    #[serde(default = "default_frame_end")]
    pub frame_end: u32,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            meshes: Vec::new(),
            armatures: Vec::new(),
            actions: HashMap::new(),
            frame_start: default_frame_start(),
            frame_end: default_frame_end(),
        }
    }
}

impl SceneProvider for Scene {
    fn mesh_objects(&self) -> &[MeshObject] {
        &self.meshes
    }

    fn armature_objects(&self) -> &[ArmatureObject] {
        &self.armatures
    }

    fn action_curves(&self, bone_name: &str) -> Option<&ActionCurves> {
        self.actions.get(bone_name)
    }

    fn frame_range(&self) -> (u32, u32) {
        (self.frame_start, self.frame_end)
    }
}

fn identity() -> Mat4 {
    Mat4::IDENTITY
}

fn default_frame_start() -> u32 {
    1
}

fn default_frame_end() -> u32 {
    250
}

/// Load a scene, picking the reader from the file extension
///
/// `.json` is an editor dump; `.gltf`/`.glb` go through the glTF adapter,
/// which samples animation times at `frame_rate`.
pub fn load_scene(path: &Path, frame_rate: f32) -> Result<Scene> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "json" => snapshot::load_json(path),
        "gltf" | "glb" => gltf::load_gltf(path, frame_rate),
        _ => bail!(
            "Unsupported scene format: {:?} (use .json, .gltf, or .glb)",
            path
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_armature_is_used() {
        let scene = Scene {
            armatures: vec![
                ArmatureObject {
                    name: "Rig".to_string(),
                    ..Default::default()
                },
                ArmatureObject {
                    name: "Spare".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(scene.armature_object().unwrap().name, "Rig");
    }

    #[test]
    fn test_armature_modifier_lookup() {
        let mut object = MeshObject::default();
        assert!(!object.has_armature_modifier());
        object.modifiers.push(Modifier {
            name: "Armature".to_string(),
            kind: ModifierKind::Armature,
        });
        assert!(object.has_armature_modifier());
    }

    #[test]
    fn test_unknown_extension() {
        let err = load_scene(Path::new("scene.fbx"), 24.0).unwrap_err();
        assert!(err.to_string().contains("Unsupported scene format"));
    }
}
