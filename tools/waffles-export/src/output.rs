//! Output naming and atomic file placement
//!
//! Both files of an export are rendered in memory first, written to
//! temporary files next to their destinations and only then renamed into
//! place. A failure at any point leaves neither output nor temporary file.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use waffles_common::ExportFormat;

use crate::error::ExportError;

/// Destinations of one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub binary: PathBuf,
    pub text: PathBuf,
}

/// Replace the extension of `base` with the format's suffixes
pub fn output_paths(base: &Path, format: ExportFormat) -> OutputPaths {
    let stem = base.with_extension("");
    let with_suffix = |suffix: &str| {
        let mut name = stem.clone().into_os_string();
        name.push(suffix);
        PathBuf::from(name)
    };
    OutputPaths {
        binary: with_suffix(format.binary_suffix),
        text: with_suffix(format.text_suffix),
    }
}

fn stage(path: &Path, contents: &[u8]) -> Result<NamedTempFile, ExportError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    Ok(file)
}

/// Write both outputs, all or nothing
pub fn write_outputs(paths: &OutputPaths, binary: &[u8], text: &[u8]) -> Result<(), ExportError> {
    // dropping a staged file deletes it
    let staged_binary = stage(&paths.binary, binary)?;
    let staged_text = stage(&paths.text, text)?;

    staged_binary
        .persist(&paths.binary)
        .map_err(|e| ExportError::Io(e.error))?;
    if let Err(e) = staged_text.persist(&paths.text) {
        if let Err(cleanup) = std::fs::remove_file(&paths.binary) {
            tracing::warn!("Failed to remove {:?}: {}", paths.binary, cleanup);
        }
        return Err(ExportError::Io(e.error));
    }

    tracing::debug!("Wrote {:?} and {:?}", paths.binary, paths.text);
    Ok(())
}
