//! Skeleton builder: armature bind pose -> engine bone matrices
//!
//! The engine swaps the Y and Z axes relative to the editor. Every bind
//! matrix is conjugated with the Y/Z permutation before use, and skinned
//! vertices are re-expressed in the space of their dominant bone.

use glam::{Mat3, Mat4, Vec3, Vec4};
use hashbrown::HashMap;
use waffles_common::JOINT_NAME_SIZE;

use crate::error::ExportError;
use crate::scene::{ArmatureObject, SceneProvider};

/// Y/Z swap
const AXIS_SWAP: Mat4 = Mat4::from_cols(Vec4::X, Vec4::Z, Vec4::Y, Vec4::W);

/// Swap the second and third rows and columns of `m`
pub fn axis_permuted(m: Mat4) -> Mat4 {
    AXIS_SWAP * m * AXIS_SWAP
}

/// Swap the Y and Z components
pub fn swap_yz(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, v.y)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub parent: Option<String>,
    pub parent_index: Option<usize>,
    /// Head in armature space
    pub head: Vec3,
    /// Tail in armature space
    pub tail: Vec3,
    /// Bind matrix in engine model space
    pub world: Mat4,
    /// Inverse of `world`, used to skin vertices
    pub world_inverse: Mat4,
    /// Parent-relative orientation; roots are relative to the armature
    pub orientation: Mat4,
}

#[derive(Debug, Clone)]
pub struct Skeleton {
    pub armature: String,
    pub armature_world: Mat4,
    pub bones: Vec<Bone>,
    index: HashMap<String, usize>,
}

impl Skeleton {
    /// Build engine matrices for every bone of `armature`
    pub fn from_armature(armature: &ArmatureObject) -> Result<Self, ExportError> {
        let mut index = HashMap::with_capacity(armature.bones.len());
        for (i, bone) in armature.bones.iter().enumerate() {
            check_bone_name(&bone.name)?;
            if index.insert(bone.name.clone(), i).is_some() {
                return Err(ExportError::DuplicateBone(bone.name.clone()));
            }
        }

        let arm = axis_permuted(armature.world);
        let mut bones = Vec::with_capacity(armature.bones.len());
        for bone in &armature.bones {
            let parent_index = match &bone.parent {
                Some(parent) => Some(*index.get(parent).ok_or_else(|| {
                    ExportError::UnknownParent {
                        bone: bone.name.clone(),
                        parent: parent.clone(),
                    }
                })?),
                None => None,
            };

            let world = arm * axis_permuted(bone.matrix_local);
            if world.determinant() == 0.0 {
                return Err(ExportError::SingularMatrix(format!(
                    "bind matrix of bone '{}'",
                    bone.name
                )));
            }

            let orientation = match parent_index {
                Some(p) => {
                    let parent_local = armature.bones[p].matrix_local;
                    if parent_local.determinant() == 0.0 {
                        return Err(ExportError::SingularMatrix(format!(
                            "bind matrix of bone '{}'",
                            armature.bones[p].name
                        )));
                    }
                    axis_permuted(parent_local.inverse() * bone.matrix_local)
                }
                None => world,
            };

            bones.push(Bone {
                name: bone.name.clone(),
                parent: bone.parent.clone(),
                parent_index,
                head: bone.head,
                tail: bone.tail,
                world,
                world_inverse: world.inverse(),
                orientation,
            });
        }

        Ok(Self {
            armature: armature.name.clone(),
            armature_world: armature.world,
            bones,
            index,
        })
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Armature world translation, added to bone heads and tails
    pub fn armature_offset(&self) -> Vec3 {
        self.armature_world.w_axis.truncate()
    }

    pub fn head_position(&self, bone: usize) -> Vec3 {
        self.bones[bone].head + self.armature_offset()
    }

    pub fn tail_position(&self, bone: usize) -> Vec3 {
        self.bones[bone].tail + self.armature_offset()
    }

    /// World-space position re-expressed in the space of `bone`
    ///
    /// The engine multiplies row vectors, so the inverse bind matrix is
    /// applied transposed.
    pub fn skin_position(&self, bone: usize, position: Vec3) -> Vec3 {
        let v = swap_yz(position).extend(1.0);
        (self.bones[bone].world_inverse.transpose() * v).truncate()
    }

    /// World-space normal re-expressed in the space of `bone`
    pub fn skin_normal(&self, bone: usize, normal: Vec3) -> Vec3 {
        Mat3::from_mat4(self.bones[bone].world_inverse).transpose() * swap_yz(normal)
    }
}

/// Bone names must fit a `char[20]` field
pub fn check_bone_name(name: &str) -> Result<(), ExportError> {
    let max = JOINT_NAME_SIZE - 1;
    if name.len() > max {
        return Err(ExportError::BoneNameTooLong {
            name: name.to_string(),
            len: name.len(),
            max,
        });
    }
    Ok(())
}

/// The export armature, logging when further armatures are ignored
pub fn select_armature(scene: &impl SceneProvider) -> Option<&ArmatureObject> {
    let armatures = scene.armature_objects();
    if armatures.len() > 1 {
        tracing::warn!(
            "Scene has {} armatures, only '{}' is exported",
            armatures.len(),
            armatures[0].name
        );
    }
    scene.armature_object()
}

/// Build the export skeleton, if the scene has a usable armature
pub fn build_skeleton(scene: &impl SceneProvider) -> Result<Option<Skeleton>, ExportError> {
    let Some(armature) = select_armature(scene) else {
        tracing::warn!("Armature export requested but the scene has no armature");
        return Ok(None);
    };
    if armature.bones.is_empty() {
        tracing::warn!("Armature '{}' has no bones, exporting without skin", armature.name);
        return Ok(None);
    }

    let skeleton = Skeleton::from_armature(armature)?;
    tracing::debug!(
        "Skeleton '{}': {} bones",
        skeleton.armature,
        skeleton.len()
    );
    Ok(Some(skeleton))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ArmatureBone, Scene};

    fn bone(name: &str, parent: Option<&str>, matrix_local: Mat4) -> ArmatureBone {
        ArmatureBone {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            head: matrix_local.w_axis.truncate(),
            tail: matrix_local.w_axis.truncate() + Vec3::Y,
            matrix_local,
        }
    }

    fn armature(bones: Vec<ArmatureBone>) -> ArmatureObject {
        ArmatureObject {
            name: "Rig".to_string(),
            world: Mat4::IDENTITY,
            bones,
        }
    }

    #[test]
    fn test_axis_permutation() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let p = axis_permuted(m);
        assert_eq!(p.w_axis, Vec4::new(1.0, 3.0, 2.0, 1.0));
        assert_eq!(axis_permuted(p), m);

        let m = Mat4::from_cols_array(&[
            0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0,
        ]);
        let p = axis_permuted(m);
        // row 1 / column 2 of the result is row 2 / column 1 of the source
        assert_eq!(p.col(2)[1], m.col(1)[2]);
        assert_eq!(p.col(0)[1], m.col(0)[2]);
        assert_eq!(p.col(3)[3], m.col(3)[3]);
    }

    #[test]
    fn test_root_and_child_orientation() {
        let root = Mat4::from_translation(Vec3::new(0.0, 0.0, 1.0));
        let child = Mat4::from_translation(Vec3::new(0.0, 0.0, 3.0));
        let skeleton = Skeleton::from_armature(&armature(vec![
            bone("root", None, root),
            bone("child", Some("root"), child),
        ]))
        .unwrap();

        assert_eq!(skeleton.bone_index("child"), Some(1));
        assert_eq!(skeleton.bones[1].parent_index, Some(0));

        // root orientation is its engine-space bind matrix
        let root_bone = &skeleton.bones[0];
        assert_eq!(root_bone.orientation, root_bone.world);
        assert_eq!(root_bone.world.w_axis, Vec4::new(0.0, 1.0, 0.0, 1.0));

        // child orientation is relative to its parent
        let child_bone = &skeleton.bones[1];
        assert!(
            child_bone
                .orientation
                .w_axis
                .abs_diff_eq(Vec4::new(0.0, 2.0, 0.0, 1.0), 1e-6)
        );
        assert_eq!(child_bone.world_inverse, child_bone.world.inverse());
    }

    #[test]
    fn test_skin_position_with_identity_bind() {
        let skeleton =
            Skeleton::from_armature(&armature(vec![bone("root", None, Mat4::IDENTITY)])).unwrap();
        assert_eq!(
            skeleton.skin_position(0, Vec3::new(1.0, 2.0, 3.0)),
            Vec3::new(1.0, 3.0, 2.0)
        );
        assert_eq!(skeleton.skin_normal(0, Vec3::Z), Vec3::Y);
    }

    #[test]
    fn test_skin_normal_uses_rotation() {
        // bone rotated 90 degrees about the engine's vertical axis
        let rotation = axis_permuted(Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let skeleton =
            Skeleton::from_armature(&armature(vec![bone("root", None, rotation)])).unwrap();
        let world_inverse = skeleton.bones[0].world_inverse;
        let n = skeleton.skin_normal(0, Vec3::X);
        let expected = Mat3::from_mat4(world_inverse).transpose() * Vec3::X;
        assert!((n - expected).length() < 1e-6);
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_head_includes_armature_offset() {
        let mut arm = armature(vec![bone("root", None, Mat4::IDENTITY)]);
        arm.world = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
        let skeleton = Skeleton::from_armature(&arm).unwrap();
        assert_eq!(skeleton.head_position(0), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(skeleton.tail_position(0), Vec3::new(5.0, 1.0, 0.0));
    }

    #[test]
    fn test_bone_errors() {
        let err = Skeleton::from_armature(&armature(vec![bone(
            "root",
            Some("missing"),
            Mat4::IDENTITY,
        )]))
        .unwrap_err();
        assert!(matches!(err, ExportError::UnknownParent { .. }));

        let err = Skeleton::from_armature(&armature(vec![
            bone("root", None, Mat4::IDENTITY),
            bone("root", None, Mat4::IDENTITY),
        ]))
        .unwrap_err();
        assert!(matches!(err, ExportError::DuplicateBone(name) if name == "root"));

        let err = Skeleton::from_armature(&armature(vec![bone(
            "a_bone_name_over_19b",
            None,
            Mat4::IDENTITY,
        )]))
        .unwrap_err();
        assert!(matches!(err, ExportError::BoneNameTooLong { len: 20, .. }));

        let err = Skeleton::from_armature(&armature(vec![bone("flat", None, Mat4::ZERO)]))
            .unwrap_err();
        assert!(matches!(err, ExportError::SingularMatrix(_)));
    }

    #[test]
    fn test_missing_armature_is_not_fatal() {
        let scene = Scene::default();
        assert!(build_skeleton(&scene).unwrap().is_none());
    }

    #[test]
    fn test_second_armature_ignored() {
        let scene = Scene {
            armatures: vec![
                armature(vec![bone("root", None, Mat4::IDENTITY)]),
                ArmatureObject {
                    name: "Other".to_string(),
                    world: Mat4::IDENTITY,
                    bones: vec![bone("other", None, Mat4::IDENTITY)],
                },
            ],
            ..Default::default()
        };
        let skeleton = build_skeleton(&scene).unwrap().unwrap();
        assert_eq!(skeleton.armature, "Rig");
        assert!(skeleton.bone_index("other").is_none());
    }
}
