//! waffles-export library
//!
//! Turns an editor scene into the engine's `.3dm` mesh and `.3da` animation
//! files, each accompanied by a text report.
//!
//! Pipeline: [`geometry`] -> [`skeleton`] / [`skinning`] -> [`grouping`] ->
//! [`dedup`] -> [`writer`]. Keyframe export ([`animation`]) runs on its own
//! and shares only the writers.

pub mod animation;
pub mod dedup;
pub mod error;
pub mod geometry;
pub mod grouping;
pub mod inspect;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod scene;
pub mod session;
pub mod skeleton;
pub mod skinning;
pub mod writer;

pub use error::ExportError;
pub use pipeline::{ExportReport, export_scene, render};
pub use scene::{Scene, SceneProvider, load_scene};
pub use session::{ExportMode, ExportOptions, ExportSession};
