use std::fs::{OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use tablegen_codegen::OutputFileManifest;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid output path: {0}")]
    InvalidPath(String),
}

pub type OutputResult<T> = Result<T, OutputError>;

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> OutputResult<()> {
    let mut data = serde_json::to_vec_pretty(value)?;
    data.push(b'\n');
    write_bytes_atomic(path, &data)
}

/// Write through a sibling temp file and rename it into place.
pub fn write_bytes_atomic(path: &Path, data: &[u8]) -> OutputResult<()> {
    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
    if let Some(parent) = parent {
        create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    std::fs::rename(&tmp_path, path)?;
    if let Some(parent) = parent {
        sync_dir(parent)?;
    }

    Ok(())
}

/// Persist every file of a manifest under `dir`. Returns the written paths.
pub fn write_manifest(dir: &Path, manifest: &OutputFileManifest) -> OutputResult<Vec<PathBuf>> {
    manifest
        .files
        .iter()
        .map(|file| {
            let relative = Path::new(&file.path);
            let escapes = relative
                .components()
                .any(|component| !matches!(component, Component::Normal(_)));
            if escapes {
                return Err(OutputError::InvalidPath(file.path.clone()));
            }
            let path = dir.join(relative);
            write_bytes_atomic(&path, file.content.as_bytes())?;
            Ok(path)
        })
        .collect()
}

fn temp_path(path: &Path) -> OutputResult<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| OutputError::InvalidPath(path.display().to_string()))?;
    let tmp_name = format!("{}.tmp", file_name.to_string_lossy());
    Ok(path.with_file_name(tmp_name))
}

#[cfg(unix)]
fn sync_dir(path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(path)?;
    dir.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}
