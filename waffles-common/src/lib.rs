//! Shared types and utilities for the Waffles engine asset formats
//!
//! This crate is shared between:
//! - `waffles-export` (asset pipeline, writes the files)
//! - the runtime loader and `waffles-export inspect` (read the files back)
//!
//! # Modules
//!
//! - [`formats`] - `.3dm` mesh and `.3da` animation record layouts
//! - [`reader`] - Parses complete files, verifying magics and tag checks

pub mod error;
pub mod formats;
pub mod reader;

pub use error::FormatError;

// Re-export commonly used format items
pub use formats::{
    // Constants
    ANIMATION_FILE_MAGIC,
    ANIMATION_FORMAT,
    // Animation records
    AnimationFileHeader,
    BinarySerializable,
    // Mesh records
    BoneRecord,
    COLLISION_FORMAT,
    ExportFormat,
    FaceGroupHeader,
    JOINT_NAME_SIZE,
    JointAnimationHeader,
    KeyframeRecord,
    MESH_FILE_MAGIC,
    MESH_FORMAT,
    MeshFileHeader,
    TAG_CHECK,
    TEXTURE_PATH_SIZE,
    TextureRecord,
    TextureType,
    VertexIndexLayout,
    VertexIndexRecord,
    VertexRecord,
    VertexSkin,
    decode_fixed_str,
    encode_fixed_str,
};
pub use reader::{AnimationFile, FaceGroupData, JointAnimation, MeshFile};
