//! One export invocation: build the dataset, render both outputs, place them

use std::path::Path;

use crate::animation::AnimationExport;
use crate::error::ExportError;
use crate::output::{OutputPaths, output_paths, write_outputs};
use crate::scene::SceneProvider;
use crate::session::{ExportMode, ExportOptions, ExportSession};
use crate::writer::{write_animation_binary, write_animation_report, write_mesh_binary, write_mesh_report};

/// Summary of a finished export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub paths: OutputPaths,
    pub binary_size: usize,
    pub text_size: usize,
}

/// Render the binary and text outputs of `scene` in memory
pub fn render(
    scene: &impl SceneProvider,
    options: ExportOptions,
) -> Result<(Vec<u8>, Vec<u8>), ExportError> {
    let mut binary = Vec::new();
    let mut text = Vec::new();

    match options.mode {
        ExportMode::Animation => {
            let animation = AnimationExport::build(scene)?;
            write_animation_binary(&mut binary, &animation)?;
            write_animation_report(&mut text, &animation)?;
            tracing::info!(
                "Animation: {} bones, {} keyframes",
                animation.groups.len(),
                animation.keyframe_count()
            );
        }
        ExportMode::Mesh | ExportMode::Collision => {
            let session = ExportSession::build(scene, options)?;
            write_mesh_binary(&mut binary, &session)?;
            write_mesh_report(&mut text, &session)?;
            tracing::info!(
                "Mesh: {} vertices, {} triangles in {} groups, {} textures, {} bones",
                session.vertices.len(),
                session.triangle_count(),
                session.face_groups.len(),
                session.textures.len(),
                session.bone_count()
            );
        }
    }

    Ok((binary, text))
}

/// Export `scene` next to `base`, naming the files after the export mode
pub fn export_scene(
    scene: &impl SceneProvider,
    base: &Path,
    options: ExportOptions,
) -> Result<ExportReport, ExportError> {
    let paths = output_paths(base, options.mode.format());
    let (binary, text) = render(scene, options)?;
    write_outputs(&paths, &binary, &text)?;

    Ok(ExportReport {
        paths,
        binary_size: binary.len(),
        text_size: text.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::textured_quad;

    #[test]
    fn test_export_writes_mode_named_files() {
        let dir = tempfile::tempdir().unwrap();
        let report = export_scene(&textured_quad(), &dir.path().join("quad.blend"), ExportOptions::default())
            .unwrap();
        assert_eq!(report.paths.binary, dir.path().join("quad.3dm"));
        assert_eq!(std::fs::read(&report.paths.binary).unwrap().len(), report.binary_size);
        assert!(report.paths.text.exists());
    }

    #[test]
    fn test_failed_export_writes_nothing() {
        let mut scene = textured_quad();
        scene.meshes[0].materials[0].textures[0].path = "a".repeat(200);
        let dir = tempfile::tempdir().unwrap();

        let err = export_scene(&scene, &dir.path().join("quad"), ExportOptions::default()).unwrap_err();
        assert!(matches!(err, ExportError::TexturePathTooLong { len: 200, .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_animation_without_armature() {
        let (binary, text) = render(
            &textured_quad(),
            ExportOptions {
                mode: ExportMode::Animation,
                export_armature: false,
            },
        )
        .unwrap();
        assert_eq!(binary.len(), 8);
        assert!(String::from_utf8(text).unwrap().contains("boneCount: 0"));
    }
}
