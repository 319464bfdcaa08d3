//! Dual-format writers: a binary file for the engine and a text report for people

pub mod binary;
pub mod text;

pub use binary::{write_animation_binary, write_mesh_binary};
pub use text::{write_animation_report, write_mesh_report};
