//! Waffles engine binary asset formats
//!
//! Fixed-layout, little-endian, tightly packed records. Unlike the GPU formats
//! of other engines these files carry magic values and a "tag check" sentinel
//! in front of every section so the loader can detect a desynchronised stream.
//!
//! All fixed-size headers implement the [`BinarySerializable`] trait for
//! consistent serialization/deserialization.

pub mod animation;
pub mod file_format;
pub mod fixed_str;
pub mod mesh;
mod serialization;

pub use animation::*;
pub use file_format::*;
pub use fixed_str::{decode_fixed_str, encode_fixed_str};
pub use mesh::*;
pub use serialization::BinarySerializable;

/// Magic value at the start of every `.3dm` mesh file
pub const MESH_FILE_MAGIC: u32 = 0x4153_82AE;

/// Magic value at the start of every `.3da` animation file ("RSA")
pub const ANIMATION_FILE_MAGIC: u32 = 0x0041_5352;

/// Sentinel written in front of each section
pub const TAG_CHECK: u32 = 0x6A82_FC4D;

/// Size of the texture path field, including the terminating NUL
pub const TEXTURE_PATH_SIZE: usize = 128;

/// Size of the joint name fields, including the terminating NUL
pub const JOINT_NAME_SIZE: usize = 20;

pub(crate) fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

pub(crate) fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

pub(crate) fn read_f32(bytes: &[u8], at: usize) -> f32 {
    f32::from_bits(read_u32(bytes, at))
}

pub(crate) fn write_f32s(out: &mut [u8], values: &[f32]) {
    for (i, v) in values.iter().enumerate() {
        out[i * 4..i * 4 + 4].copy_from_slice(&v.to_le_bytes());
    }
}
