//! Readers for complete `.3dm` and `.3da` files
//!
//! Mirrors the order the engine loader consumes sections in, so a file that
//! parses here also loads in the engine. Used by `waffles-export inspect` and
//! by the exporter's tests.

use crate::FormatError;
use crate::formats::{
    ANIMATION_FILE_MAGIC, AnimationFileHeader, BinarySerializable, BoneRecord, FaceGroupHeader,
    JointAnimationHeader, KeyframeRecord, MESH_FILE_MAGIC, MeshFileHeader, TAG_CHECK,
    TextureRecord, VertexIndexRecord, VertexRecord,
};

/// Forward-only cursor over a byte slice
struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], FormatError> {
        let available = self.bytes.len() - self.pos;
        if needed > available {
            return Err(FormatError::UnexpectedEof {
                offset: self.pos,
                needed,
                available,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16, FormatError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, FormatError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32(&mut self) -> Result<f32, FormatError> {
        self.u32().map(f32::from_bits)
    }

    fn record<T: BinarySerializable>(&mut self) -> Result<T, FormatError> {
        let offset = self.pos;
        let bytes = self.take(T::SIZE)?;
        T::deserialize(bytes).ok_or(FormatError::UnexpectedEof {
            offset,
            needed: T::SIZE,
            available: bytes.len(),
        })
    }

    fn expect_tag(&mut self) -> Result<(), FormatError> {
        let offset = self.pos;
        let found = self.u32()?;
        if found != TAG_CHECK {
            return Err(FormatError::TagMismatch { offset, found });
        }
        Ok(())
    }

    fn finish(self) -> Result<(), FormatError> {
        match self.bytes.len() - self.pos {
            0 => Ok(()),
            n => Err(FormatError::TrailingBytes(n)),
        }
    }
}

/// One face group as stored in a mesh file
#[derive(Debug, Clone, PartialEq)]
pub struct FaceGroupData {
    pub header: FaceGroupHeader,
    /// Indices into [`MeshFile::textures`]
    pub textures: Vec<u16>,
    pub vertex_buffer: Vec<VertexIndexRecord>,
    pub index_buffer: Vec<u16>,
}

/// A fully parsed `.3dm` file
#[derive(Debug, Clone, PartialEq)]
pub struct MeshFile {
    pub header: MeshFileHeader,
    pub textures: Vec<TextureRecord>,
    pub vertices: Vec<VertexRecord>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub face_groups: Vec<FaceGroupData>,
    pub bones: Vec<BoneRecord>,
}

impl MeshFile {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut r = ByteReader::new(bytes);
        let header: MeshFileHeader = r.record()?;
        if header.magic != MESH_FILE_MAGIC {
            return Err(FormatError::BadMagic {
                found: header.magic,
                expected: MESH_FILE_MAGIC,
            });
        }

        let mut textures = Vec::with_capacity(header.texture_count as usize);
        if header.texture_count > 0 {
            r.expect_tag()?;
            for _ in 0..header.texture_count {
                textures.push(TextureRecord::from_bytes(r.take(TextureRecord::SIZE)?)?);
            }
        }

        r.expect_tag()?;
        let skinned = header.is_skinned();
        let mut vertices = Vec::with_capacity(header.vert_count as usize);
        for _ in 0..header.vert_count {
            let offset = r.pos;
            let size = VertexRecord::size(skinned);
            let record = VertexRecord::from_bytes(r.take(size)?, skinned).ok_or(
                FormatError::UnexpectedEof {
                    offset,
                    needed: size,
                    available: 0,
                },
            )?;
            vertices.push(record);
        }

        let mut normals = Vec::with_capacity(header.normal_count as usize);
        if header.normal_count > 0 {
            r.expect_tag()?;
            for _ in 0..header.normal_count {
                normals.push([r.f32()?, r.f32()?, r.f32()?]);
            }
        }

        let mut uvs = Vec::with_capacity(header.uv_count as usize);
        if header.uv_count > 0 {
            r.expect_tag()?;
            for _ in 0..header.uv_count {
                uvs.push([r.f32()?, r.f32()?]);
            }
        }

        let layout = header.vertex_index_layout();
        let mut face_groups = Vec::with_capacity(header.face_group_count as usize);
        for _ in 0..header.face_group_count {
            r.expect_tag()?;
            let group: FaceGroupHeader = r.record()?;
            let textures = (0..group.texture_count)
                .map(|_| r.u16())
                .collect::<Result<Vec<_>, _>>()?;
            let mut vertex_buffer = Vec::with_capacity(group.vertex_buffer_count as usize);
            for _ in 0..group.vertex_buffer_count {
                let offset = r.pos;
                let record = VertexIndexRecord::from_bytes(r.take(layout.size())?, layout).ok_or(
                    FormatError::UnexpectedEof {
                        offset,
                        needed: layout.size(),
                        available: 0,
                    },
                )?;
                vertex_buffer.push(record);
            }
            let index_buffer = (0..group.index_buffer_count)
                .map(|_| r.u16())
                .collect::<Result<Vec<_>, _>>()?;
            face_groups.push(FaceGroupData {
                header: group,
                textures,
                vertex_buffer,
                index_buffer,
            });
        }

        let mut bones = Vec::with_capacity(header.joint_count as usize);
        if header.joint_count > 0 {
            r.expect_tag()?;
            for _ in 0..header.joint_count {
                let offset = r.pos;
                let bone = BoneRecord::from_bytes(r.take(BoneRecord::SIZE)?).ok_or(
                    FormatError::UnexpectedEof {
                        offset,
                        needed: BoneRecord::SIZE,
                        available: 0,
                    },
                )?;
                bones.push(bone);
            }
        }

        r.finish()?;
        Ok(Self {
            header,
            textures,
            vertices,
            normals,
            uvs,
            face_groups,
            bones,
        })
    }
}

/// Keyframes of one bone as stored in an animation file
#[derive(Debug, Clone, PartialEq)]
pub struct JointAnimation {
    pub header: JointAnimationHeader,
    pub keyframes: Vec<KeyframeRecord>,
}

/// A fully parsed `.3da` file
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationFile {
    pub header: AnimationFileHeader,
    pub joints: Vec<JointAnimation>,
}

impl AnimationFile {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut r = ByteReader::new(bytes);
        let header: AnimationFileHeader = r.record()?;
        if header.magic != ANIMATION_FILE_MAGIC {
            return Err(FormatError::BadMagic {
                found: header.magic,
                expected: ANIMATION_FILE_MAGIC,
            });
        }

        let mut joints = Vec::with_capacity(header.bone_count as usize);
        for _ in 0..header.bone_count {
            let offset = r.pos;
            let joint = JointAnimationHeader::from_bytes(r.take(JointAnimationHeader::SIZE)?)
                .ok_or(FormatError::UnexpectedEof {
                    offset,
                    needed: JointAnimationHeader::SIZE,
                    available: 0,
                })?;
            r.expect_tag()?;
            let keyframes = (0..joint.keyframe_count)
                .map(|_| r.record())
                .collect::<Result<Vec<KeyframeRecord>, _>>()?;
            joints.push(JointAnimation {
                header: joint,
                keyframes,
            });
        }

        r.finish()?;
        Ok(Self { header, joints })
    }
}
