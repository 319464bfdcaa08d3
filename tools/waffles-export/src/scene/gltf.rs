//! glTF/GLB scene adapter
//!
//! Converts a glTF document into a [`Scene`] in the editor's convention:
//! glTF is Y-up, so every node transform, bind matrix and animation value is
//! rotated +90 degrees about X into Z-up space.

use anyhow::{Context, Result};
use glam::{Mat4, Quat, Vec2, Vec3};
use gltf::animation::Interpolation;
use gltf::animation::util::ReadOutputs;
use hashbrown::HashMap;
use std::f32::consts::FRAC_PI_2;
use std::path::Path;

use super::{
    ActionCurves, ArmatureBone, ArmatureObject, FCurve, GroupWeight, Material, MeshFace,
    MeshObject, MeshVertex, Modifier, ModifierKind, Scene, TextureSlot,
};

fn y_up_to_z_up() -> Mat4 {
    Mat4::from_rotation_x(FRAC_PI_2)
}

/// Load a `.gltf` or `.glb` file. Animation times are converted to frames at `frame_rate`.
pub fn load_gltf(path: &Path, frame_rate: f32) -> Result<Scene> {
    let gltf = gltf::Gltf::open(path).with_context(|| format!("Failed to load glTF: {:?}", path))?;
    let buffers = gltf::import_buffers(&gltf.document, path.parent(), gltf.blob.clone())
        .with_context(|| format!("Failed to load glTF buffers: {:?}", path))?;
    let scene = convert_document(&gltf.document, &buffers, frame_rate)?;

    tracing::info!(
        "Loaded {:?}: {} meshes, {} armatures, {} animated bones",
        path,
        scene.meshes.len(),
        scene.armatures.len(),
        scene.actions.len()
    );
    Ok(scene)
}

/// Convert an already loaded document
pub fn convert_document(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    frame_rate: f32,
) -> Result<Scene> {
    let worlds = node_world_transforms(document);
    let parents = node_parents(document);
    let materials = convert_materials(document);

    let mut meshes = Vec::new();
    for node in document.nodes() {
        let Some(mesh) = node.mesh() else {
            continue;
        };
        let world = y_up_to_z_up() * worlds[node.index()];
        let name = node
            .name()
            .or(mesh.name())
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh{}", node.index()));
        meshes.push(convert_mesh(&node, &mesh, buffers, &materials, name, world)?);
    }

    let mut armatures = Vec::new();
    let mut actions = HashMap::new();
    let mut frame_end = 0;
    if let Some(skin) = document.skins().next() {
        let armature = convert_skin(&skin, buffers, &worlds, &parents)?;

        if let Some(animation) = document.animations().next() {
            let joint_names: HashMap<usize, String> = skin
                .joints()
                .zip(&armature.bones)
                .map(|(joint, bone)| (joint.index(), bone.name.clone()))
                .collect();
            let (curves, end) = convert_animation(&animation, buffers, &joint_names, frame_rate)?;
            actions = curves;
            frame_end = end;
        }
        armatures.push(armature);
    }
    if document.skins().count() > 1 {
        tracing::warn!("glTF has {} skins, only the first becomes an armature", document.skins().count());
    }

    Ok(Scene {
        meshes,
        armatures,
        actions,
        frame_start: 0,
        frame_end,
    })
}

fn node_matrix(node: &gltf::Node) -> Mat4 {
    Mat4::from_cols_array_2d(&node.transform().matrix())
}

/// World transform of every node, in glTF space
fn node_world_transforms(document: &gltf::Document) -> Vec<Mat4> {
    fn visit(node: gltf::Node, parent: Mat4, out: &mut Vec<Mat4>) {
        let world = parent * node_matrix(&node);
        out[node.index()] = world;
        for child in node.children() {
            visit(child, world, out);
        }
    }

    let mut worlds = vec![Mat4::IDENTITY; document.nodes().count()];
    let parents = node_parents(document);
    for node in document.nodes().filter(|n| parents[n.index()].is_none()) {
        visit(node, Mat4::IDENTITY, &mut worlds);
    }
    worlds
}

fn node_parents(document: &gltf::Document) -> Vec<Option<usize>> {
    let mut parents = vec![None; document.nodes().count()];
    for node in document.nodes() {
        for child in node.children() {
            parents[child.index()] = Some(node.index());
        }
    }
    parents
}

fn image_path(texture: gltf::Texture) -> Option<String> {
    match texture.source().source() {
        gltf::image::Source::Uri { uri, .. } => Some(uri.to_string()),
        gltf::image::Source::View { .. } => None,
    }
}

/// Every document material, plus a texture-less default for primitives without one
fn convert_materials(document: &gltf::Document) -> Vec<Material> {
    let mut materials = document
        .materials()
        .map(|material| {
            let mut textures = Vec::new();
            let base_color = material
                .pbr_metallic_roughness()
                .base_color_texture()
                .and_then(|info| image_path(info.texture()));
            if let Some(path) = base_color {
                textures.push(TextureSlot {
                    path,
                    use_diffuse: true,
                    ..Default::default()
                });
            }
            if let Some(path) = material.normal_texture().and_then(|n| image_path(n.texture())) {
                textures.push(TextureSlot {
                    path,
                    use_normal: true,
                    ..Default::default()
                });
            }
            Material {
                name: material
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("material{}", material.index().unwrap_or(0))),
                textures,
            }
        })
        .collect::<Vec<_>>();
    materials.push(Material {
        name: "default".to_string(),
        textures: Vec::new(),
    });
    materials
}

fn convert_mesh(
    node: &gltf::Node,
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
    materials: &[Material],
    name: String,
    world: Mat4,
) -> Result<MeshObject> {
    let default_material = materials.len() - 1;
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            tracing::warn!("'{}': skipping {:?} primitive", name, primitive.mode());
            continue;
        }
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .with_context(|| format!("No positions in mesh '{}'", name))?
            .collect();
        let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());
        let uvs: Option<Vec<[f32; 2]>> = reader.read_tex_coords(0).map(|iter| iter.into_f32().collect());
        let joints: Option<Vec<[u16; 4]>> = reader.read_joints(0).map(|iter| iter.into_u16().collect());
        let weights: Option<Vec<[f32; 4]>> = reader.read_weights(0).map(|iter| iter.into_f32().collect());
        let indices: Vec<u32> = match reader.read_indices() {
            Some(iter) => iter.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        let base = vertices.len();
        for (i, position) in positions.iter().enumerate() {
            let skin = joints
                .as_ref()
                .and_then(|j| j.get(i))
                .zip(weights.as_ref().and_then(|w| w.get(i)));
            let mut groups = match skin {
                Some((j, w)) => j
                    .iter()
                    .zip(*w)
                    .filter(|&(_, weight)| weight > 0.0)
                    .map(|(&joint, weight)| GroupWeight {
                        group: joint as usize,
                        weight,
                    })
                    .collect::<Vec<_>>(),
                None => Vec::new(),
            };
            groups.sort_by(|a, b| b.weight.total_cmp(&a.weight));
            vertices.push(MeshVertex {
                co: Vec3::from_array(*position),
                normal: normals
                    .as_ref()
                    .and_then(|n| n.get(i))
                    .map_or(Vec3::ZERO, |n| Vec3::from_array(*n)),
                groups,
            });
        }

        let material = primitive.material().index().unwrap_or(default_material);
        for tri in indices.chunks_exact(3) {
            let corners = tri.iter().map(|&i| i as usize).collect::<Vec<_>>();
            let face_uvs = uvs.as_ref().and_then(|uvs| {
                corners
                    .iter()
                    .map(|&c| uvs.get(c).map(|uv| Vec2::from_array(*uv)))
                    .collect::<Option<Vec<_>>>()
            });
            faces.push(MeshFace {
                vertices: corners.iter().map(|&c| c + base).collect(),
                material,
                smooth: normals.is_some(),
                normal: Vec3::ZERO,
                uvs: face_uvs,
            });
        }
    }

    let (vertex_groups, modifiers) = match node.skin() {
        Some(skin) => (
            skin.joints().map(|j| joint_name(&j)).collect(),
            vec![Modifier {
                name: "Armature".to_string(),
                kind: ModifierKind::Armature,
            }],
        ),
        None => (Vec::new(), Vec::new()),
    };

    Ok(MeshObject {
        name,
        world,
        vertices,
        faces,
        materials: materials.to_vec(),
        vertex_groups,
        modifiers,
        animated: false,
    })
}

fn joint_name(joint: &gltf::Node) -> String {
    joint
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("joint{}", joint.index()))
}

/// The skin's joints as armature bones, rest matrices from the inverse bind matrices
fn convert_skin(
    skin: &gltf::Skin,
    buffers: &[gltf::buffer::Data],
    worlds: &[Mat4],
    parents: &[Option<usize>],
) -> Result<ArmatureObject> {
    let joints = skin.joints().collect::<Vec<_>>();
    let reader = skin.reader(|buffer| Some(&buffers[buffer.index()]));
    let inverse_binds: Option<Vec<Mat4>> = reader
        .read_inverse_bind_matrices()
        .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect());
    if let Some(ibms) = &inverse_binds {
        if ibms.len() < joints.len() {
            anyhow::bail!(
                "Skin has {} inverse bind matrices for {} joints",
                ibms.len(),
                joints.len()
            );
        }
    }

    let joint_of: HashMap<usize, usize> = joints.iter().enumerate().map(|(i, j)| (j.index(), i)).collect();
    let rest = joints
        .iter()
        .enumerate()
        .map(|(i, joint)| {
            let bind = match &inverse_binds {
                Some(ibms) => ibms[i].inverse(),
                None => worlds[joint.index()],
            };
            y_up_to_z_up() * bind
        })
        .collect::<Vec<_>>();

    let mut bones = Vec::with_capacity(joints.len());
    for (i, joint) in joints.iter().enumerate() {
        // nearest ancestor that is also a joint
        let mut parent = parents[joint.index()];
        while let Some(p) = parent {
            if joint_of.contains_key(&p) {
                break;
            }
            parent = parents[p];
        }

        let head = rest[i].w_axis.truncate();
        let length = joint
            .children()
            .find_map(|c| joint_of.get(&c.index()))
            .map(|&c| rest[c].w_axis.truncate().distance(head))
            .unwrap_or(1.0);
        let tail = head + rest[i].y_axis.truncate().normalize_or_zero() * length;

        bones.push(ArmatureBone {
            name: joint_name(joint),
            parent: parent.and_then(|p| joint_of.get(&p)).map(|&p| joint_name(&joints[p])),
            head,
            tail,
            matrix_local: rest[i],
        });
    }

    Ok(ArmatureObject {
        name: skin.name().unwrap_or("Armature").to_string(),
        world: Mat4::IDENTITY,
        bones,
    })
}

/// Keep the value element of cubic-spline (in-tangent, value, out-tangent) triples
fn spline_values<T: Copy>(values: Vec<T>, interpolation: Interpolation) -> Vec<T> {
    match interpolation {
        Interpolation::CubicSpline => values.chunks_exact(3).map(|c| c[1]).collect(),
        _ => values,
    }
}

fn scalar_curves<const N: usize>(frames: &[f32], values: &[[f32; N]]) -> Vec<FCurve> {
    (0..N)
        .map(|index| FCurve {
            index,
            keyframes: frames.iter().zip(values).map(|(&t, v)| (t, v[index])).collect(),
        })
        .collect()
}

/// Translation and rotation channels of joints as per-bone curves; returns the curves and the last frame
fn convert_animation(
    animation: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
    joint_names: &HashMap<usize, String>,
    frame_rate: f32,
) -> Result<(HashMap<String, ActionCurves>, u32)> {
    let axis = Quat::from_rotation_x(FRAC_PI_2);
    let mut actions: HashMap<String, ActionCurves> = HashMap::new();
    let mut max_time = 0.0f32;

    for channel in animation.channels() {
        let Some(bone) = joint_names.get(&channel.target().node().index()) else {
            continue;
        };
        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let times: Vec<f32> = reader
            .read_inputs()
            .with_context(|| format!("Animation channel of '{}' has no input times", bone))?
            .collect();
        if let Some(&t) = times.last() {
            max_time = max_time.max(t);
        }
        let frames = times.iter().map(|t| t * frame_rate).collect::<Vec<_>>();
        let interpolation = channel.sampler().interpolation();

        match reader.read_outputs() {
            Some(ReadOutputs::Translations(iter)) => {
                let values = spline_values(iter.collect::<Vec<_>>(), interpolation)
                    .into_iter()
                    .map(|[x, y, z]| [x, -z, y])
                    .collect::<Vec<_>>();
                actions.entry(bone.clone()).or_default().location = scalar_curves(&frames, &values);
            }
            Some(ReadOutputs::Rotations(rotations)) => {
                let values = spline_values(rotations.into_f32().collect::<Vec<_>>(), interpolation)
                    .into_iter()
                    .map(|q| {
                        let q = axis * Quat::from_array(q) * axis.inverse();
                        [q.w, q.x, q.y, q.z]
                    })
                    .collect::<Vec<_>>();
                actions.entry(bone.clone()).or_default().rotation_quaternion =
                    scalar_curves(&frames, &values);
            }
            _ => {}
        }
    }

    Ok((actions, (max_time * frame_rate).ceil() as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_conversion() {
        let c = y_up_to_z_up();
        let up = c.transform_vector3(Vec3::Y);
        assert!((up - Vec3::Z).length() < 1e-6);
        let forward = c.transform_vector3(Vec3::Z);
        assert!((forward + Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_spline_values_take_middle() {
        let values = vec![1, 2, 3, 4, 5, 6];
        assert_eq!(spline_values(values.clone(), Interpolation::CubicSpline), vec![2, 5]);
        assert_eq!(spline_values(values.clone(), Interpolation::Linear), values);
    }

    #[test]
    fn test_scalar_curves_split_components() {
        let curves = scalar_curves(&[0.0, 24.0], &[[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(curves.len(), 2);
        assert_eq!(curves[1].index, 1);
        assert_eq!(curves[1].keyframes, vec![(0.0, 2.0), (24.0, 4.0)]);
    }
}
