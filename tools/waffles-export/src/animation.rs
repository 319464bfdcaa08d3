//! Keyframe extractor: pose-bone curves -> engine keyframes
//!
//! Each animated bone yields one keyframe group. Per keyframe the location
//! curves give the position (moved out of armature space) and the quaternion
//! curves give the rotation, converted to the engine's Euler angles.

use glam::{Quat, Vec3};

use crate::error::{ExportError, u16_count};
use crate::scene::{ActionCurves, ArmatureObject, FCurve, SceneProvider};
use crate::skeleton::{check_bone_name, select_armature};

/// Frame rate used to turn glTF seconds into editor frames
pub const DEFAULT_FRAME_RATE: f32 = 24.0;

/// Euler angles of a quaternion, with the poles handled explicitly
///
/// Returns (x, y, z) where x is the pitch about the pole axis.
pub fn quat_to_euler(q: Quat) -> Vec3 {
    let (x, y, z, w) = (q.x, q.y, q.z, q.w);
    let (sqx, sqy, sqz, sqw) = (x * x, y * y, z * z, w * w);
    let unit = sqx + sqy + sqz + sqw;
    let test = x * y + z * w;

    if test > 0.499 * unit {
        // north pole
        return Vec3::new(std::f32::consts::FRAC_PI_2, 0.0, 2.0 * x.atan2(w));
    }
    if test < -0.499 * unit {
        // south pole
        return Vec3::new(-std::f32::consts::FRAC_PI_2, 0.0, -2.0 * x.atan2(w));
    }

    Vec3::new(
        (2.0 * test / unit).asin(),
        (2.0 * x * w - 2.0 * y * z).atan2(-sqx + sqy - sqz + sqw),
        (2.0 * y * w - 2.0 * x * z).atan2(sqx - sqy - sqz + sqw),
    )
}

/// Engine rotation of a quaternion: `(-x, -z, -y)` of [`quat_to_euler`]
pub fn engine_euler(q: Quat) -> [f32; 3] {
    let e = quat_to_euler(q);
    [-e.x, -e.z, -e.y]
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    /// Editor frame
    pub time: f32,
    pub position: Vec3,
    pub rotation: [f32; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeGroup {
    pub name: String,
    /// Parent bone name, empty for roots
    pub parent: String,
    pub keyframes: Vec<Keyframe>,
}

/// Everything written by an animation export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationExport {
    pub armature: Option<String>,
    /// Bones in the armature, animated or not
    pub armature_bones: usize,
    pub frame_start: u32,
    pub frame_end: u32,
    pub groups: Vec<KeyframeGroup>,
}

impl AnimationExport {
    /// Extract keyframe groups for every animated bone of the export armature
    pub fn build(scene: &impl SceneProvider) -> Result<Self, ExportError> {
        let (frame_start, frame_end) = scene.frame_range();
        let Some(armature) = select_armature(scene) else {
            tracing::warn!("Scene has no armature, writing an empty animation");
            return Ok(Self {
                frame_start,
                frame_end,
                ..Default::default()
            });
        };

        let groups = extract_keyframes(scene, armature)?;
        u16_count("animated bone", groups.len())?;
        tracing::debug!(
            "Animation '{}': {} of {} bones animated",
            armature.name,
            groups.len(),
            armature.bones.len()
        );

        Ok(Self {
            armature: Some(armature.name.clone()),
            armature_bones: armature.bones.len(),
            frame_start,
            frame_end,
            groups,
        })
    }

    pub fn keyframe_count(&self) -> usize {
        self.groups.iter().map(|g| g.keyframes.len()).sum()
    }
}

/// Keyframe groups of `armature`, in bone order; bones without curves are skipped
pub fn extract_keyframes(
    scene: &impl SceneProvider,
    armature: &ArmatureObject,
) -> Result<Vec<KeyframeGroup>, ExportError> {
    let world = armature.world;
    if world.determinant() == 0.0 {
        return Err(ExportError::SingularMatrix(format!(
            "world matrix of armature '{}'",
            armature.name
        )));
    }
    // positions are multiplied as row vectors
    let to_armature = world.inverse().transpose();

    let mut groups = Vec::new();
    for bone in &armature.bones {
        let Some(curves) = scene.action_curves(&bone.name) else {
            continue;
        };
        if curves.is_empty() {
            continue;
        }
        check_bone_name(&bone.name)?;

        let Some(channels) = BoneChannels::new(&bone.name, curves)? else {
            continue;
        };
        let keyframes = (0..channels.len())
            .map(|i| {
                let position = (to_armature * channels.location(i).extend(1.0)).truncate();
                Keyframe {
                    time: channels.time(i),
                    position,
                    rotation: engine_euler(channels.rotation(i)),
                }
            })
            .collect::<Vec<_>>();
        u16_count("keyframe", keyframes.len())?;

        groups.push(KeyframeGroup {
            name: bone.name.clone(),
            parent: bone.parent.clone().unwrap_or_default(),
            keyframes,
        });
    }
    Ok(groups)
}

/// Location and quaternion curves of one bone, checked to share keyframe times
struct BoneChannels<'a> {
    location: [Option<&'a FCurve>; 3],
    /// W, X, Y, Z
    rotation: [Option<&'a FCurve>; 4],
    driver: &'a FCurve,
}

impl<'a> BoneChannels<'a> {
    /// `None` when no curve has a usable index
    fn new(bone: &str, curves: &'a ActionCurves) -> Result<Option<Self>, ExportError> {
        let mut location = [None; 3];
        let mut rotation = [None; 4];
        for curve in &curves.location {
            match location.get_mut(curve.index) {
                Some(slot) => *slot = Some(curve),
                None => tracing::warn!("'{}': ignoring location curve {}", bone, curve.index),
            }
        }
        for curve in &curves.rotation_quaternion {
            match rotation.get_mut(curve.index) {
                Some(slot) => *slot = Some(curve),
                None => tracing::warn!("'{}': ignoring rotation curve {}", bone, curve.index),
            }
        }

        let Some(driver) = rotation.iter().chain(location.iter()).flatten().next().copied() else {
            return Ok(None);
        };

        let named = location
            .iter()
            .enumerate()
            .map(|(i, c)| (format!("location[{i}]"), c))
            .chain(
                rotation
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (format!("rotation_quaternion[{i}]"), c)),
            );
        for (name, curve) in named {
            let Some(curve) = curve else {
                continue;
            };
            if curve.keyframes.len() != driver.keyframes.len() {
                return Err(ExportError::CurveLengthMismatch {
                    bone: bone.to_string(),
                    curve: name,
                    found: curve.keyframes.len(),
                    expected: driver.keyframes.len(),
                });
            }
            let mismatch = curve
                .keyframes
                .iter()
                .zip(&driver.keyframes)
                .position(|(a, b)| a.0 != b.0);
            if let Some(index) = mismatch {
                return Err(ExportError::CurveTimeMismatch {
                    bone: bone.to_string(),
                    curve: name,
                    index,
                    found: curve.keyframes[index].0,
                    expected: driver.keyframes[index].0,
                });
            }
        }

        Ok(Some(Self {
            location,
            rotation,
            driver,
        }))
    }

    fn len(&self) -> usize {
        self.driver.keyframes.len()
    }

    fn time(&self, i: usize) -> f32 {
        self.driver.keyframes[i].0
    }

    fn value(curve: Option<&FCurve>, i: usize, rest: f32) -> f32 {
        curve.map_or(rest, |c| c.keyframes[i].1)
    }

    fn location(&self, i: usize) -> Vec3 {
        Vec3::from_array(self.location.map(|c| Self::value(c, i, 0.0)))
    }

    fn rotation(&self, i: usize) -> Quat {
        let [w, x, y, z] = self.rotation;
        Quat::from_xyzw(
            Self::value(x, i, 0.0),
            Self::value(y, i, 0.0),
            Self::value(z, i, 0.0),
            Self::value(w, i, 1.0),
        )
    }
}
