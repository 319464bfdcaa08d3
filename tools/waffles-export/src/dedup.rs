//! Dedup indexer: unique normal/UV lists and per-group vertex/index buffers
//!
//! Uniqueness is exact float equality. Lookups go through a hash map keyed
//! by canonical bit patterns (`-0.0` folds into `0.0`; NaN never matches),
//! which gives the same result as a linear scan with `==`.

use std::hash::Hash;

use glam::{Vec2, Vec3};
use hashbrown::HashMap;

use crate::grouping::{FaceGroup, VertexKey};

/// Hashable stand-in for `==` on a value
pub trait ExactKey {
    type Key: Hash + Eq;

    /// `None` when the value is not equal to itself
    fn exact_key(&self) -> Option<Self::Key>;
}

fn canonical_bits(f: f32) -> Option<u32> {
    if f.is_nan() {
        None
    } else if f == 0.0 {
        Some(0)
    } else {
        Some(f.to_bits())
    }
}

impl ExactKey for Vec3 {
    type Key = [u32; 3];

    fn exact_key(&self) -> Option<Self::Key> {
        Some([
            canonical_bits(self.x)?,
            canonical_bits(self.y)?,
            canonical_bits(self.z)?,
        ])
    }
}

impl ExactKey for Vec2 {
    type Key = [u32; 2];

    fn exact_key(&self) -> Option<Self::Key> {
        Some([canonical_bits(self.x)?, canonical_bits(self.y)?])
    }
}

impl ExactKey for VertexKey {
    type Key = VertexKey;

    fn exact_key(&self) -> Option<Self::Key> {
        Some(*self)
    }
}

/// Insertion-ordered list of unique values
pub struct UniqueList<T: ExactKey> {
    items: Vec<T>,
    lookup: HashMap<T::Key, usize>,
}

impl<T: ExactKey + Copy> UniqueList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Index of `value`, appending it if no equal value exists
    pub fn insert(&mut self, value: T) -> usize {
        let Some(key) = value.exact_key() else {
            self.items.push(value);
            return self.items.len() - 1;
        };
        if let Some(&index) = self.lookup.get(&key) {
            return index;
        }
        let index = self.items.len();
        self.items.push(value);
        self.lookup.insert(key, index);
        index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: ExactKey + Copy> Default for UniqueList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the unique normal list and fill each corner's normal index
///
/// `reorient` maps (global vertex, world normal) to the written normal and
/// runs before the uniqueness test. Groups are visited in order, then
/// triangles, then corners.
pub fn index_normals(
    groups: &mut [FaceGroup],
    reorient: impl Fn(usize, Vec3) -> Vec3,
) -> Vec<Vec3> {
    let mut unique = UniqueList::new();
    for tri in groups.iter_mut().flat_map(|g| g.triangles.iter_mut()) {
        let Some(normals) = tri.normals else {
            continue;
        };
        for (key, normal) in tri.keys.iter_mut().zip(normals) {
            key.norm = Some(unique.insert(reorient(key.vert, normal)));
        }
    }
    unique.into_vec()
}

/// Build the unique UV list and fill each corner's UV index
pub fn index_uvs(groups: &mut [FaceGroup]) -> Vec<Vec2> {
    let mut unique = UniqueList::new();
    for tri in groups.iter_mut().flat_map(|g| g.triangles.iter_mut()) {
        let Some(uvs) = tri.uvs else {
            continue;
        };
        for (key, uv) in tri.keys.iter_mut().zip(uvs) {
            key.uv = Some(unique.insert(uv));
        }
    }
    unique.into_vec()
}

/// Build each group's vertex buffer and index buffer from its corner keys
///
/// Corners are processed in triangle order, so the output is deterministic.
pub fn build_vertex_buffers(groups: &mut [FaceGroup]) {
    for group in groups.iter_mut() {
        let mut unique = UniqueList::new();
        let mut index_buffer = Vec::with_capacity(group.triangles.len() * 3);
        for key in group.triangles.iter().flat_map(|t| t.keys) {
            index_buffer.push(unique.insert(key));
        }
        group.vertex_buffer = unique.into_vec();
        group.index_buffer = index_buffer;
    }
}
