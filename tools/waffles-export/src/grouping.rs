//! Face/texture grouper
//!
//! Faces are partitioned by the first texture of their material. Each group
//! keeps the texture list of the material that created it. Quads are split
//! into two triangles and each corner carries its normal and UV.

use glam::{Vec2, Vec3};
use waffles_common::{TEXTURE_PATH_SIZE, TextureType};

use crate::error::ExportError;
use crate::geometry::Geometry;
use crate::scene::{SceneProvider, TextureSlot};

/// Entry of the unique texture list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureEntry {
    /// Path with leading separators and dots removed
    pub path: String,
    pub texture_type: TextureType,
}

/// Texture usage of a slot: diffuse, then normal, specular, displacement
pub fn texture_type(slot: &TextureSlot) -> TextureType {
    if slot.use_diffuse {
        TextureType::Diffuse
    } else if slot.use_normal {
        TextureType::Normal
    } else if slot.use_specular {
        TextureType::Specular
    } else if slot.use_displacement {
        TextureType::Displacement
    } else {
        TextureType::Null
    }
}

/// Strip leading `/`, `.` and `\` so paths are relative to the asset root
pub fn clean_texture_path(path: &str) -> &str {
    path.trim_start_matches(['/', '.', '\\'])
}

/// Unique textures of every material slot, in scene order
pub fn collect_textures(scene: &impl SceneProvider) -> Result<Vec<TextureEntry>, ExportError> {
    let mut textures: Vec<TextureEntry> = Vec::new();
    let slots = scene
        .mesh_objects()
        .iter()
        .flat_map(|o| o.materials.iter())
        .flat_map(|m| m.textures.iter());

    for slot in slots {
        let path = clean_texture_path(&slot.path);
        let max = TEXTURE_PATH_SIZE - 1;
        if path.len() > max {
            return Err(ExportError::TexturePathTooLong {
                path: path.to_string(),
                len: path.len(),
                max,
            });
        }
        if !textures.iter().any(|t| t.path == path) {
            textures.push(TextureEntry {
                path: path.to_string(),
                texture_type: texture_type(slot),
            });
        }
    }
    Ok(textures)
}

fn texture_index(textures: &[TextureEntry], slot: &TextureSlot) -> usize {
    let path = clean_texture_path(&slot.path);
    textures
        .iter()
        .position(|t| t.path == path)
        .unwrap_or_default()
}

/// (global vertex, normal index, UV index) of one triangle corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexKey {
    pub vert: usize,
    pub norm: Option<usize>,
    pub uv: Option<usize>,
}

impl VertexKey {
    pub fn new(vert: usize) -> Self {
        Self {
            vert,
            norm: None,
            uv: None,
        }
    }
}

/// Triangle with per-corner source attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub verts: [usize; 3],
    /// World-space normals, absent in collision exports
    pub normals: Option<[Vec3; 3]>,
    /// Flipped UVs, present only in textured exports
    pub uvs: Option<[Vec2; 3]>,
    /// Dedup indices, filled by the dedup indexer
    pub keys: [VertexKey; 3],
}

/// Triangles sharing a primary texture
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceGroup {
    /// Index of the primary texture, `None` for texture-less faces
    pub key: Option<usize>,
    /// Texture indices of the material that created the group
    pub textures: Vec<usize>,
    pub triangles: Vec<Triangle>,
    pub vertex_buffer: Vec<VertexKey>,
    pub index_buffer: Vec<usize>,
}

/// What the grouper attaches to each corner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingOptions {
    pub normals: bool,
}

/// Partition every face of `geometry` into face groups
///
/// With no textures (or for collision meshes) a single implicit group holds
/// every face.
pub fn group_faces(
    scene: &impl SceneProvider,
    geometry: &Geometry,
    textures: &[TextureEntry],
    options: GroupingOptions,
) -> Vec<FaceGroup> {
    let objects = scene.mesh_objects();
    let textured = !textures.is_empty();
    let mut groups: Vec<FaceGroup> = Vec::new();
    if !textured {
        groups.push(FaceGroup::default());
    }

    for mesh in &geometry.meshes {
        let object = &objects[mesh.object];
        let mut missing_uvs = 0usize;

        for face in &mesh.faces {
            let group = if textured {
                let slots = object
                    .materials
                    .get(face.material)
                    .map(|m| m.textures.as_slice())
                    .unwrap_or_default();
                let key = slots.first().map(|s| texture_index(textures, s));
                match groups.iter().position(|g| g.key == key) {
                    Some(i) => i,
                    None => {
                        groups.push(FaceGroup {
                            key,
                            textures: slots.iter().map(|s| texture_index(textures, s)).collect(),
                            ..Default::default()
                        });
                        groups.len() - 1
                    }
                }
            } else {
                0
            };

            let corners = face.polygon.corners();
            let face_uvs = if textured {
                match &face.uvs {
                    Some(uvs) if uvs.len() == corners.len() => Some(uvs.as_slice()),
                    _ => {
                        missing_uvs += 1;
                        None
                    }
                }
            } else {
                None
            };

            for tri in face.polygon.triangle_corners() {
                let verts = tri.map(|c| corners[c]);
                let normals = options.normals.then(|| {
                    if face.smooth {
                        verts.map(|v| geometry.vertex_normal(v).unwrap_or(face.normal))
                    } else {
                        [face.normal; 3]
                    }
                });
                let uvs = textured.then(|| {
                    tri.map(|c| {
                        let uv = face_uvs.map(|uvs| uvs[c]).unwrap_or(Vec2::ZERO);
                        Vec2::new(uv.x, 1.0 - uv.y)
                    })
                });
                groups[group].triangles.push(Triangle {
                    verts,
                    normals,
                    uvs,
                    keys: verts.map(VertexKey::new),
                });
            }
        }

        if missing_uvs > 0 {
            tracing::warn!(
                "'{}': {} faces have no UVs in a textured export, using (0, 0)",
                mesh.name,
                missing_uvs
            );
        }
    }

    tracing::debug!(
        "Grouped faces into {} groups over {} textures",
        groups.len(),
        textures.len()
    );
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::extract_geometry;
    use crate::scene::{Material, MeshFace, MeshObject, MeshVertex, Scene};

    fn slot(path: &str) -> TextureSlot {
        TextureSlot {
            path: path.to_string(),
            use_diffuse: true,
            ..Default::default()
        }
    }

    fn plane(materials: Vec<Material>, faces: Vec<MeshFace>) -> Scene {
        let vertices = (0..4)
            .map(|i| MeshVertex {
                co: Vec3::new((i % 2) as f32, (i / 2) as f32, 0.0),
                normal: Vec3::Y,
                groups: Vec::new(),
            })
            .collect();
        Scene {
            meshes: vec![MeshObject {
                name: "Plane".to_string(),
                vertices,
                faces,
                materials,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn quad(material: usize, smooth: bool) -> MeshFace {
        MeshFace {
            vertices: vec![0, 1, 3, 2],
            material,
            smooth,
            normal: Vec3::Z,
            uvs: Some(vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 0.25),
            ]),
        }
    }

    const NORMALS: GroupingOptions = GroupingOptions { normals: true };

    #[test]
    fn test_texture_type_priority() {
        let mut s = TextureSlot {
            use_specular: true,
            use_displacement: true,
            ..Default::default()
        };
        assert_eq!(texture_type(&s), TextureType::Specular);
        s.use_normal = true;
        assert_eq!(texture_type(&s), TextureType::Normal);
        s.use_diffuse = true;
        assert_eq!(texture_type(&s), TextureType::Diffuse);
        assert_eq!(texture_type(&TextureSlot::default()), TextureType::Null);
    }

    #[test]
    fn test_clean_texture_path() {
        assert_eq!(clean_texture_path("//textures/wood.png"), "textures/wood.png");
        assert_eq!(clean_texture_path("..\\tex.png"), "tex.png");
        assert_eq!(clean_texture_path("tex.png"), "tex.png");
    }

    #[test]
    fn test_collect_unique_textures() {
        let scene = plane(
            vec![
                Material {
                    name: "A".to_string(),
                    textures: vec![slot("//tex.png"), slot("bump.png")],
                },
                Material {
                    name: "B".to_string(),
                    textures: vec![slot("tex.png")],
                },
            ],
            vec![],
        );
        let textures = collect_textures(&scene).unwrap();
        assert_eq!(textures.len(), 2);
        assert_eq!(textures[0].path, "tex.png");
        assert_eq!(textures[1].path, "bump.png");
    }

    #[test]
    fn test_long_texture_path_is_fatal() {
        let long = format!("{}.png", "a".repeat(124));
        let scene = plane(
            vec![Material {
                name: "A".to_string(),
                textures: vec![slot(&long)],
            }],
            vec![],
        );
        let err = collect_textures(&scene).unwrap_err();
        assert!(matches!(
            err,
            ExportError::TexturePathTooLong { len: 128, max: 127, .. }
        ));
    }

    #[test]
    fn test_quad_grouped_and_split() {
        let scene = plane(
            vec![Material {
                name: "A".to_string(),
                textures: vec![slot("tex.png"), slot("detail.png")],
            }],
            vec![quad(0, false)],
        );
        let geometry = extract_geometry(&scene).unwrap();
        let textures = collect_textures(&scene).unwrap();
        let groups = group_faces(&scene, &geometry, &textures, NORMALS);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, Some(0));
        assert_eq!(groups[0].textures, vec![0, 1]);
        let tris = &groups[0].triangles;
        assert_eq!(tris.len(), 2);
        assert_eq!(tris[0].verts, [0, 1, 3]);
        assert_eq!(tris[1].verts, [3, 2, 0]);
        assert_eq!(tris[0].normals, Some([Vec3::Z; 3]));

        // v is flipped, corners follow the split
        let uvs = tris[1].uvs.unwrap();
        assert_eq!(uvs[0], Vec2::new(1.0, 0.0));
        assert_eq!(uvs[1], Vec2::new(0.0, 0.75));
        assert_eq!(uvs[2], Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_groups_by_first_texture() {
        let scene = plane(
            vec![
                Material {
                    name: "A".to_string(),
                    textures: vec![slot("a.png")],
                },
                Material {
                    name: "B".to_string(),
                    textures: vec![slot("b.png"), slot("a.png")],
                },
                Material {
                    name: "Plain".to_string(),
                    textures: vec![],
                },
            ],
            vec![quad(0, false), quad(1, false), quad(0, false), quad(2, false)],
        );
        let geometry = extract_geometry(&scene).unwrap();
        let textures = collect_textures(&scene).unwrap();
        let groups = group_faces(&scene, &geometry, &textures, NORMALS);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].triangles.len(), 4);
        assert_eq!(groups[1].textures, vec![1, 0]);
        assert_eq!(groups[2].key, None);
        assert!(groups[2].textures.is_empty());
        // texture-less faces still carry UVs in a textured export
        assert!(groups[2].triangles[0].uvs.is_some());
    }

    #[test]
    fn test_untextured_single_group() {
        let mut face = quad(0, true);
        face.uvs = None;
        let scene = plane(vec![], vec![face]);
        let geometry = extract_geometry(&scene).unwrap();
        let groups = group_faces(&scene, &geometry, &[], NORMALS);

        assert_eq!(groups.len(), 1);
        assert!(groups[0].textures.is_empty());
        let tri = &groups[0].triangles[0];
        assert!(tri.uvs.is_none());
        // smooth faces use the vertex normals
        assert_eq!(tri.normals.unwrap()[0], Vec3::Y);
    }

    #[test]
    fn test_missing_uvs_default_to_origin() {
        let mut face = quad(0, false);
        face.uvs = None;
        let scene = plane(
            vec![Material {
                name: "A".to_string(),
                textures: vec![slot("tex.png")],
            }],
            vec![face],
        );
        let geometry = extract_geometry(&scene).unwrap();
        let textures = collect_textures(&scene).unwrap();
        let groups = group_faces(&scene, &geometry, &textures, NORMALS);
        assert_eq!(groups[0].triangles[0].uvs, Some([Vec2::new(0.0, 1.0); 3]));
    }

    #[test]
    fn test_collision_has_no_normals() {
        let scene = plane(vec![], vec![quad(0, false)]);
        let geometry = extract_geometry(&scene).unwrap();
        let groups = group_faces(&scene, &geometry, &[], GroupingOptions { normals: false });
        assert!(groups[0].triangles.iter().all(|t| t.normals.is_none()));
    }
}
