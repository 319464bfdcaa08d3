//! Output file naming for the three export modes.
//!
//! `ExportFormat` is the single source of truth for the suffixes appended to
//! the user-chosen base path.
//!
//! # Example
//!
//! ```
//! use waffles_common::{ANIMATION_FORMAT, MESH_FORMAT};
//!
//! assert_eq!(MESH_FORMAT.binary_suffix, ".3dm");
//! assert_eq!(ANIMATION_FORMAT.text_suffix, "_animation.txt");
//! ```

/// Suffixes of the binary and text outputs written by one export mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    /// Suffix of the binary file consumed by the engine (e.g. ".3dm")
    pub binary_suffix: &'static str,

    /// Suffix of the diagnostic text report (e.g. ".txt")
    pub text_suffix: &'static str,
}

impl ExportFormat {
    pub const fn new(binary_suffix: &'static str, text_suffix: &'static str) -> Self {
        Self {
            binary_suffix,
            text_suffix,
        }
    }
}

/// Visual mesh export
pub const MESH_FORMAT: ExportFormat = ExportFormat::new(".3dm", ".txt");

/// Collision mesh export (positions and indices only)
pub const COLLISION_FORMAT: ExportFormat = ExportFormat::new("_collision.3dm", "_collision.txt");

/// Keyframe-only export
pub const ANIMATION_FORMAT: ExportFormat = ExportFormat::new("_animation.3da", "_animation.txt");
