//! Export pipeline errors

use waffles_common::FormatError;

/// Fatal export failure. No output files are left behind when one is raised.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Texture path does not fit the 128-byte path field
    #[error("texture path '{path}' is {len} bytes, the engine allows at most {max}")]
    TexturePathTooLong { path: String, len: usize, max: usize },

    /// Bone name does not fit the 20-byte name field
    #[error("bone name '{name}' is {len} bytes, the engine allows at most {max}")]
    BoneNameTooLong { name: String, len: usize, max: usize },

    #[error("face {face} of '{object}' has {corners} corners, only triangles and quads are supported")]
    UnsupportedPolygon {
        object: String,
        face: usize,
        corners: usize,
    },

    #[error("face {face} of '{object}' references vertex {index}, the mesh has {count}")]
    VertexOutOfRange {
        object: String,
        face: usize,
        index: usize,
        count: usize,
    },

    /// Skinned export found a vertex with no vertex group naming a bone
    #[error(
        "vertex {vertex} of '{object}' has no vertex group matching a bone of armature '{armature}'"
    )]
    MissingBoneAssignment {
        object: String,
        vertex: usize,
        armature: String,
    },

    /// A list is too long for its u16 count field
    #[error("{field} count {count} exceeds the maximum of 65535")]
    CountOverflow { field: &'static str, count: usize },

    #[error("bone '{bone}': {curve} curve has {found} keyframes, expected {expected}")]
    CurveLengthMismatch {
        bone: String,
        curve: String,
        found: usize,
        expected: usize,
    },

    #[error("bone '{bone}': {curve} keyframe {index} is at frame {found}, expected {expected}")]
    CurveTimeMismatch {
        bone: String,
        curve: String,
        index: usize,
        found: f32,
        expected: f32,
    },

    #[error("bone '{bone}' has unknown parent '{parent}'")]
    UnknownParent { bone: String, parent: String },

    #[error("duplicate bone name '{0}'")]
    DuplicateBone(String),

    /// Bind or world matrix cannot be inverted
    #[error("{0} is singular")]
    SingularMatrix(String),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Narrow a list length to a u16 header field.
pub fn u16_count(field: &'static str, count: usize) -> Result<u16, ExportError> {
    u16::try_from(count).map_err(|_| ExportError::CountOverflow { field, count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u16_count_limit() {
        assert_eq!(u16_count("vertex", 65535).unwrap(), 65535);
        let err = u16_count("vertex", 65536).unwrap_err();
        assert_eq!(
            err.to_string(),
            "vertex count 65536 exceeds the maximum of 65535"
        );
    }

    #[test]
    fn test_format_error_is_transparent() {
        let err: ExportError = FormatError::TrailingBytes(3).into();
        assert_eq!(err.to_string(), "3 trailing bytes after the last section");
    }
}
