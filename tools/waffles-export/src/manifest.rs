//! export.toml manifest parsing
//!
//! A manifest lists several exports so a whole asset folder can be rebuilt
//! with one command. Relative paths resolve against the manifest directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::animation::DEFAULT_FRAME_RATE;
use crate::pipeline::{ExportReport, export_scene};
use crate::scene::load_scene;
use crate::session::{ExportMode, ExportOptions};

/// export.toml manifest structure
#[derive(Debug, Deserialize)]
pub struct ExportManifest {
    #[serde(default)]
    pub defaults: ManifestDefaults,
    #[serde(rename = "export", default)]
    pub exports: Vec<ExportEntry>,
}

/// Values used by entries that do not set their own
#[derive(Debug, Deserialize)]
pub struct ManifestDefaults {
    /// Directory outputs are written to
    #[serde(default)]
    pub output_dir: Option<String>,
    /// Skin meshes to the scene's armature
    #[serde(default)]
    pub armature: bool,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f32,
}

impl Default for ManifestDefaults {
    fn default() -> Self {
        Self {
            output_dir: None,
            armature: false,
            frame_rate: default_frame_rate(),
        }
    }
}

fn default_frame_rate() -> f32 {
    DEFAULT_FRAME_RATE
}

/// Single `[[export]]` entry
#[derive(Debug, Deserialize)]
pub struct ExportEntry {
    /// Scene file (.json, .gltf or .glb)
    pub scene: String,
    /// Output base name; defaults to the scene's file stem
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub mode: ExportMode,
    #[serde(default)]
    pub armature: Option<bool>,
    #[serde(default)]
    pub frame_rate: Option<f32>,
}

impl ExportManifest {
    /// Load manifest from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse manifest from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse export.toml")
    }

    /// Check every entry without touching the filesystem
    pub fn validate(&self) -> Result<()> {
        if self.exports.is_empty() {
            anyhow::bail!("Manifest has no [[export]] entries");
        }
        check_frame_rate(self.defaults.frame_rate, "defaults")?;

        let mut outputs = Vec::new();
        for (i, entry) in self.exports.iter().enumerate() {
            let ext = Path::new(&entry.scene)
                .extension()
                .and_then(|e| e.to_str())
                .map(|s| s.to_lowercase())
                .unwrap_or_default();
            if !matches!(ext.as_str(), "json" | "gltf" | "glb") {
                anyhow::bail!(
                    "Export {} ('{}'): unsupported scene format (use .json, .gltf, or .glb)",
                    i,
                    entry.scene
                );
            }
            if let Some(rate) = entry.frame_rate {
                check_frame_rate(rate, &entry.scene)?;
            }

            let key = (entry.output_base(), entry.mode);
            if outputs.contains(&key) {
                anyhow::bail!(
                    "Export {} ('{}') writes the same {:?} output as an earlier entry",
                    i,
                    entry.scene,
                    entry.mode
                );
            }
            outputs.push(key);
        }
        Ok(())
    }

    /// Export options of one entry, after applying defaults
    pub fn options(&self, entry: &ExportEntry) -> ExportOptions {
        ExportOptions {
            mode: entry.mode,
            export_armature: entry.armature.unwrap_or(self.defaults.armature),
        }
    }

    /// Output base path of one entry
    pub fn output_base(&self, entry: &ExportEntry, base_dir: &Path, output_override: Option<&Path>) -> PathBuf {
        let dir = match (output_override, &self.defaults.output_dir) {
            (Some(dir), _) => dir.to_path_buf(),
            (None, Some(dir)) => base_dir.join(dir),
            (None, None) => base_dir.to_path_buf(),
        };
        dir.join(entry.output_base())
    }
}

impl ExportEntry {
    fn output_base(&self) -> String {
        self.output.clone().unwrap_or_else(|| {
            Path::new(&self.scene)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.scene.clone())
        })
    }
}

fn check_frame_rate(rate: f32, owner: &str) -> Result<()> {
    if !rate.is_finite() || rate <= 0.0 {
        anyhow::bail!("{}: frame_rate must be positive, got {}", owner, rate);
    }
    Ok(())
}

/// Load and validate a manifest
pub fn load_manifest(path: &Path) -> Result<ExportManifest> {
    let manifest = ExportManifest::load(path)?;
    manifest.validate()?;
    Ok(manifest)
}

/// Run every export of `manifest`, in order
///
/// `base_dir` is the manifest's directory; `output_override` replaces the
/// manifest's output directory.
pub fn build_all(
    manifest: &ExportManifest,
    base_dir: &Path,
    output_override: Option<&Path>,
) -> Result<Vec<ExportReport>> {
    let mut reports = Vec::with_capacity(manifest.exports.len());
    for entry in &manifest.exports {
        let scene_path = base_dir.join(&entry.scene);
        let frame_rate = entry.frame_rate.unwrap_or(manifest.defaults.frame_rate);
        let scene = load_scene(&scene_path, frame_rate)?;

        let base = manifest.output_base(entry, base_dir, output_override);
        let report = export_scene(&scene, &base, manifest.options(entry))
            .with_context(|| format!("Failed to export {}", scene_path.display()))?;
        tracing::info!(
            "  {} -> {} ({} bytes)",
            entry.scene,
            report.paths.binary.display(),
            report.binary_size
        );
        reports.push(report);
    }
    Ok(reports)
}
