//! Binary serialization trait for fixed-size format headers.
//!
//! Each header keeps its own `to_bytes()` returning a fixed-size array; the
//! trait gives generic code (the section reader, tests) one entry point.

/// Trait for fixed-size binary records.
///
/// Records that carry fixed-length strings (textures, bones, joint headers)
/// can fail to encode and therefore do not implement this trait.
///
/// # Example
///
/// ```
/// use waffles_common::{BinarySerializable, MeshFileHeader};
///
/// let header = MeshFileHeader::new(3, 0, 0, 1, 0, 0);
/// let bytes = header.serialize();
/// assert_eq!(bytes.len(), <MeshFileHeader as BinarySerializable>::SIZE);
/// assert_eq!(MeshFileHeader::deserialize(&bytes), Some(header));
/// ```
pub trait BinarySerializable: Sized {
    /// Size of the serialized record in bytes.
    const SIZE: usize;

    /// Serialize to bytes.
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize from bytes.
    ///
    /// Returns `None` if the byte slice is too short.
    fn deserialize(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_binary_serializable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl BinarySerializable for $ty {
                const SIZE: usize = <$ty>::SIZE;

                fn serialize(&self) -> Vec<u8> {
                    self.to_bytes().to_vec()
                }

                fn deserialize(bytes: &[u8]) -> Option<Self> {
                    Self::from_bytes(bytes)
                }
            }
        )*
    };
}

impl_binary_serializable!(
    super::MeshFileHeader,
    super::FaceGroupHeader,
    super::AnimationFileHeader,
    super::KeyframeRecord,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{AnimationFileHeader, FaceGroupHeader, KeyframeRecord, MeshFileHeader};

    fn check<T: BinarySerializable + PartialEq + std::fmt::Debug>(value: T) {
        let bytes = value.serialize();
        assert_eq!(bytes.len(), T::SIZE);
        assert_eq!(T::deserialize(&bytes), Some(value));
        assert_eq!(T::deserialize(&bytes[..T::SIZE - 1]), None);
    }

    #[test]
    fn test_headers_through_trait() {
        check(MeshFileHeader::new(8, 4, 6, 2, 1, 3));
        check(FaceGroupHeader {
            face_count: 2,
            vertex_buffer_count: 4,
            index_buffer_count: 6,
            texture_count: 1,
        });
        check(AnimationFileHeader::new(2, 30));
        check(KeyframeRecord {
            time: 1.0,
            position: [0.0, 1.0, 2.0],
            rotation: [0.1, 0.2, 0.3],
        });
    }

    #[test]
    fn test_trait_sizes() {
        assert_eq!(<MeshFileHeader as BinarySerializable>::SIZE, 16);
        assert_eq!(<FaceGroupHeader as BinarySerializable>::SIZE, 8);
        assert_eq!(<AnimationFileHeader as BinarySerializable>::SIZE, 8);
        assert_eq!(<KeyframeRecord as BinarySerializable>::SIZE, 28);
    }
}
