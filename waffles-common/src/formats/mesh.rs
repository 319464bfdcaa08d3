//! Waffles mesh binary format (.3dm)
//!
//! # Layout
//! ```text
//! MeshFileHeader (16 bytes)
//! [TAG_CHECK, texture_count x TextureRecord]      if texture_count > 0
//! TAG_CHECK, vert_count x VertexRecord            (20 bytes skinned, 12 otherwise)
//! [TAG_CHECK, normal_count x f32 x,y,z]           if normal_count > 0
//! [TAG_CHECK, uv_count x f32 u,v]                 if uv_count > 0
//! face_group_count x {
//!     TAG_CHECK, FaceGroupHeader (8 bytes),
//!     texture_count x u16 texture index,
//!     vertex_buffer_count x VertexIndexRecord,
//!     index_buffer_count x u16
//! }
//! [TAG_CHECK, joint_count x BoneRecord]           if joint_count > 0
//! ```
//!
//! Vertices are skinned exactly when `joint_count > 0`.

use super::{read_f32, read_u16, read_u32, write_f32s};
use super::{JOINT_NAME_SIZE, MESH_FILE_MAGIC, TEXTURE_PATH_SIZE};
use super::{decode_fixed_str, encode_fixed_str};
use crate::FormatError;

/// Mesh file header (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct MeshFileHeader {
    pub magic: u32,
    pub vert_count: u16,
    pub uv_count: u16,
    pub normal_count: u16,
    pub face_group_count: u16,
    pub texture_count: u16,
    pub joint_count: u16,
}

impl MeshFileHeader {
    pub const SIZE: usize = 16;

    pub fn new(
        vert_count: u16,
        uv_count: u16,
        normal_count: u16,
        face_group_count: u16,
        texture_count: u16,
        joint_count: u16,
    ) -> Self {
        Self {
            magic: MESH_FILE_MAGIC,
            vert_count,
            uv_count,
            normal_count,
            face_group_count,
            texture_count,
            joint_count,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.magic.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.vert_count.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.uv_count.to_le_bytes());
        bytes[8..10].copy_from_slice(&self.normal_count.to_le_bytes());
        bytes[10..12].copy_from_slice(&self.face_group_count.to_le_bytes());
        bytes[12..14].copy_from_slice(&self.texture_count.to_le_bytes());
        bytes[14..16].copy_from_slice(&self.joint_count.to_le_bytes());
        bytes
    }

    /// Read header from bytes (magic is not validated here)
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            magic: read_u32(bytes, 0),
            vert_count: read_u16(bytes, 4),
            uv_count: read_u16(bytes, 6),
            normal_count: read_u16(bytes, 8),
            face_group_count: read_u16(bytes, 10),
            texture_count: read_u16(bytes, 12),
            joint_count: read_u16(bytes, 14),
        })
    }

    pub fn is_skinned(&self) -> bool {
        self.joint_count > 0
    }

    /// Layout of the vertex-buffer records that follow each face group header
    pub fn vertex_index_layout(&self) -> VertexIndexLayout {
        VertexIndexLayout {
            normals: self.normal_count > 0,
            uvs: self.uv_count > 0,
        }
    }
}

/// Face group header (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct FaceGroupHeader {
    pub face_count: u16,
    pub vertex_buffer_count: u16,
    pub index_buffer_count: u16,
    pub texture_count: u16,
}

impl FaceGroupHeader {
    pub const SIZE: usize = 8;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..2].copy_from_slice(&self.face_count.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.vertex_buffer_count.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.index_buffer_count.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.texture_count.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            face_count: read_u16(bytes, 0),
            vertex_buffer_count: read_u16(bytes, 2),
            index_buffer_count: read_u16(bytes, 4),
            texture_count: read_u16(bytes, 6),
        })
    }
}

/// Texture usage tag stored as a signed byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i8)]
pub enum TextureType {
    #[default]
    Null = -1,
    Diffuse = 0,
    Normal = 1,
    Specular = 2,
    Displacement = 3,
}

impl TextureType {
    pub const fn to_byte(self) -> u8 {
        self as i8 as u8
    }

    pub fn from_byte(byte: u8) -> Result<Self, FormatError> {
        match byte as i8 {
            -1 => Ok(Self::Null),
            0 => Ok(Self::Diffuse),
            1 => Ok(Self::Normal),
            2 => Ok(Self::Specular),
            3 => Ok(Self::Displacement),
            other => Err(FormatError::UnknownTextureType(other)),
        }
    }

    /// Label used in the text report
    pub const fn label(self) -> &'static str {
        match self {
            Self::Null => "none",
            Self::Diffuse => "diffuse",
            Self::Normal => "normal",
            Self::Specular => "specular",
            Self::Displacement => "displacement",
        }
    }
}

/// Texture record: type tag followed by a `char[128]` path (129 bytes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRecord {
    pub texture_type: TextureType,
    pub path: String,
}

impl TextureRecord {
    pub const SIZE: usize = 1 + TEXTURE_PATH_SIZE;

    pub fn to_bytes(&self) -> Result<[u8; Self::SIZE], FormatError> {
        let path: [u8; TEXTURE_PATH_SIZE] = encode_fixed_str(&self.path)?;
        let mut bytes = [0u8; Self::SIZE];
        bytes[0] = self.texture_type.to_byte();
        bytes[1..].copy_from_slice(&path);
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < Self::SIZE {
            return Err(FormatError::UnexpectedEof {
                offset: 0,
                needed: Self::SIZE,
                available: bytes.len(),
            });
        }
        Ok(Self {
            texture_type: TextureType::from_byte(bytes[0])?,
            path: decode_fixed_str(&bytes[1..Self::SIZE]),
        })
    }
}

/// Dominant bone of a skinned vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexSkin {
    pub weight: f32,
    pub bone: i32,
}

/// Vertex record: `f32 x,y,z` or, when skinned, `f32 x,y,z,w; i32 bone`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexRecord {
    pub position: [f32; 3],
    pub skin: Option<VertexSkin>,
}

impl VertexRecord {
    pub const SIZE: usize = 12;
    pub const SKINNED_SIZE: usize = 20;

    pub const fn size(skinned: bool) -> usize {
        if skinned {
            Self::SKINNED_SIZE
        } else {
            Self::SIZE
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; Self::size(self.skin.is_some())];
        write_f32s(&mut bytes[0..12], &self.position);
        if let Some(skin) = self.skin {
            bytes[12..16].copy_from_slice(&skin.weight.to_le_bytes());
            bytes[16..20].copy_from_slice(&skin.bone.to_le_bytes());
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8], skinned: bool) -> Option<Self> {
        if bytes.len() < Self::size(skinned) {
            return None;
        }
        let position = [read_f32(bytes, 0), read_f32(bytes, 4), read_f32(bytes, 8)];
        let skin = skinned.then(|| VertexSkin {
            weight: read_f32(bytes, 12),
            bone: read_u32(bytes, 16) as i32,
        });
        Some(Self { position, skin })
    }
}

/// Which optional fields a vertex-buffer record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VertexIndexLayout {
    pub normals: bool,
    pub uvs: bool,
}

impl VertexIndexLayout {
    pub const fn size(self) -> usize {
        2 + if self.normals { 2 } else { 0 } + if self.uvs { 2 } else { 0 }
    }
}

/// Vertex-buffer record: `u16 vert [u16 norm] [u16 uv]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexIndexRecord {
    pub vert: u16,
    pub norm: Option<u16>,
    pub uv: Option<u16>,
}

impl VertexIndexRecord {
    /// Encode according to `layout`; fields the layout includes but the record lacks are written as 0
    pub fn to_bytes(&self, layout: VertexIndexLayout) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(layout.size());
        bytes.extend_from_slice(&self.vert.to_le_bytes());
        if layout.normals {
            bytes.extend_from_slice(&self.norm.unwrap_or(0).to_le_bytes());
        }
        if layout.uvs {
            bytes.extend_from_slice(&self.uv.unwrap_or(0).to_le_bytes());
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8], layout: VertexIndexLayout) -> Option<Self> {
        if bytes.len() < layout.size() {
            return None;
        }
        let vert = read_u16(bytes, 0);
        let mut at = 2;
        let norm = layout.normals.then(|| {
            let v = read_u16(bytes, at);
            at += 2;
            v
        });
        let uv = layout.uvs.then(|| read_u16(bytes, at));
        Some(Self { vert, norm, uv })
    }
}

/// Bone record (132 bytes)
///
/// `matrix` holds the 16 orientation values in file order: the four rows of the
/// orientation matrix, one after another.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneRecord {
    pub vert_count: i32,
    pub name: String,
    pub parent: String,
    pub head: [f32; 3],
    pub tail: [f32; 3],
    pub matrix: [f32; 16],
}

impl BoneRecord {
    pub const SIZE: usize = 4 + 2 * JOINT_NAME_SIZE + 24 + 64;

    pub fn to_bytes(&self) -> Result<[u8; Self::SIZE], FormatError> {
        let name: [u8; JOINT_NAME_SIZE] = encode_fixed_str(&self.name)?;
        let parent: [u8; JOINT_NAME_SIZE] = encode_fixed_str(&self.parent)?;

        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.vert_count.to_le_bytes());
        bytes[4..24].copy_from_slice(&name);
        bytes[24..44].copy_from_slice(&parent);
        write_f32s(&mut bytes[44..56], &self.head);
        write_f32s(&mut bytes[56..68], &self.tail);
        write_f32s(&mut bytes[68..132], &self.matrix);
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let vec3 = |at: usize| [read_f32(bytes, at), read_f32(bytes, at + 4), read_f32(bytes, at + 8)];
        let mut matrix = [0.0f32; 16];
        for (i, m) in matrix.iter_mut().enumerate() {
            *m = read_f32(bytes, 68 + i * 4);
        }
        Some(Self {
            vert_count: read_u32(bytes, 0) as i32,
            name: decode_fixed_str(&bytes[4..24]),
            parent: decode_fixed_str(&bytes[24..44]),
            head: vec3(44),
            tail: vec3(56),
            matrix,
        })
    }
}
