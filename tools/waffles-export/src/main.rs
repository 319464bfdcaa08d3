//! waffles-export - Waffles asset export tool
//!
//! Converts editor scenes (JSON dumps, glTF/GLB) to .3dm meshes and .3da
//! animations, each with a .txt report.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use waffles_export::animation::DEFAULT_FRAME_RATE;
use waffles_export::{ExportMode, ExportOptions, export_scene, inspect, load_scene, manifest};

#[derive(Parser)]
#[command(name = "waffles-export")]
#[command(about = "Waffles asset export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a single scene
    Export {
        /// Input scene (.json, .gltf or .glb)
        scene: PathBuf,

        /// Output base path; its extension is replaced by the mode suffix
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// What to export
        #[arg(short, long, value_enum, default_value_t = ExportMode::Mesh)]
        mode: ExportMode,

        /// Skin meshes to the scene's armature and write its bones
        #[arg(long)]
        armature: bool,

        /// Frames per second for glTF animation times
        #[arg(long, default_value_t = DEFAULT_FRAME_RATE)]
        frame_rate: f32,
    },

    /// Run every export of a manifest file
    Build {
        /// Path to export.toml manifest
        #[arg(default_value = "export.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate manifest without exporting
    Check {
        /// Path to export.toml manifest
        #[arg(default_value = "export.toml")]
        manifest: PathBuf,
    },

    /// Summarise an exported .3dm or .3da file
    Inspect {
        /// File to read
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            scene,
            output,
            mode,
            armature,
            frame_rate,
        } => {
            let base = output.unwrap_or_else(|| scene.clone());
            tracing::info!("Exporting {:?} ({:?})", scene, mode);
            let loaded = load_scene(&scene, frame_rate)?;
            let options = ExportOptions {
                mode,
                export_armature: armature,
            };
            let report = export_scene(&loaded, &base, options)
                .with_context(|| format!("Failed to export {}", scene.display()))?;
            tracing::info!(
                "Wrote {:?} ({} bytes) and {:?}",
                report.paths.binary,
                report.binary_size,
                report.paths.text
            );
        }

        Commands::Build {
            manifest,
            output,
            verbose,
        } => {
            if verbose {
                tracing::info!("Building exports from {:?}", manifest);
            }
            let config = manifest::load_manifest(&manifest)?;
            let base_dir = manifest.parent().unwrap_or(Path::new("."));
            let reports = manifest::build_all(&config, base_dir, output.as_deref())?;
            tracing::info!("Build complete! {} exports", reports.len());
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            manifest::load_manifest(&manifest)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Inspect { file } => {
            for line in inspect::describe(&file)? {
                tracing::info!("{}", line);
            }
        }
    }

    Ok(())
}
