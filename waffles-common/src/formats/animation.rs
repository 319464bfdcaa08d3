//! Waffles animation binary format (.3da)
//!
//! # Layout
//! ```text
//! AnimationFileHeader (8 bytes)
//! bone_count x {
//!     JointAnimationHeader (42 bytes),
//!     TAG_CHECK,
//!     keyframe_count x KeyframeRecord (28 bytes)
//! }
//! ```

use super::{ANIMATION_FILE_MAGIC, JOINT_NAME_SIZE};
use super::{decode_fixed_str, encode_fixed_str, read_f32, read_u16, read_u32, write_f32s};
use crate::FormatError;

/// Animation file header (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct AnimationFileHeader {
    pub magic: u32,
    pub bone_count: u16,
    pub frame_count: u16,
}

impl AnimationFileHeader {
    pub const SIZE: usize = 8;

    pub fn new(bone_count: u16, frame_count: u16) -> Self {
        Self {
            magic: ANIMATION_FILE_MAGIC,
            bone_count,
            frame_count,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.magic.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.bone_count.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.frame_count.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            magic: read_u32(bytes, 0),
            bone_count: read_u16(bytes, 4),
            frame_count: read_u16(bytes, 6),
        })
    }
}

/// Per-bone keyframe group header (42 bytes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointAnimationHeader {
    pub keyframe_count: u16,
    pub name: String,
    pub parent: String,
}

impl JointAnimationHeader {
    pub const SIZE: usize = 2 + 2 * JOINT_NAME_SIZE;

    pub fn to_bytes(&self) -> Result<[u8; Self::SIZE], FormatError> {
        let name: [u8; JOINT_NAME_SIZE] = encode_fixed_str(&self.name)?;
        let parent: [u8; JOINT_NAME_SIZE] = encode_fixed_str(&self.parent)?;
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..2].copy_from_slice(&self.keyframe_count.to_le_bytes());
        bytes[2..22].copy_from_slice(&name);
        bytes[22..42].copy_from_slice(&parent);
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            keyframe_count: read_u16(bytes, 0),
            name: decode_fixed_str(&bytes[2..22]),
            parent: decode_fixed_str(&bytes[22..42]),
        })
    }
}

/// One sampled keyframe: time, position and engine Euler angles (28 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KeyframeRecord {
    pub time: f32,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
}

impl KeyframeRecord {
    pub const SIZE: usize = 28;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.time.to_le_bytes());
        write_f32s(&mut bytes[4..16], &self.position);
        write_f32s(&mut bytes[16..28], &self.rotation);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            time: read_f32(bytes, 0),
            position: [read_f32(bytes, 4), read_f32(bytes, 8), read_f32(bytes, 12)],
            rotation: [read_f32(bytes, 16), read_f32(bytes, 20), read_f32(bytes, 24)],
        })
    }
}
