pub mod apply;
pub mod check;
pub mod normalize;
pub mod render;

pub use apply::{apply, ApplyArgs};
pub use check::{check, CheckArgs};
pub use normalize::{normalize, NormalizeArgs};
pub use render::{render, RenderArgs};

use atbd_editor::{FieldKey, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum FieldFileError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("Input path does not exist: {0}")]
    Missing(String),
}

/// Read and decode one persisted field document
pub fn read_field(path: &Path) -> Result<Value, FieldFileError> {
    let source = fs::read_to_string(path).map_err(|source| FieldFileError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Value::from_json(&source).map_err(|source| FieldFileError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// `input` itself when it is a file, every `.json` file below it when it is
/// a directory
pub fn field_files(input: &Path) -> Result<Vec<PathBuf>, FieldFileError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(FieldFileError::Missing(input.display().to_string()));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && path.extension().map(|e| e == "json").unwrap_or(false))
        .filter(|path| path.file_name().map(|n| n != crate::config::DEFAULT_CONFIG_NAME).unwrap_or(true))
        .collect();
    files.sort();
    Ok(files)
}

/// Field key from a `<record>/<version>/<field>.json` layout
///
/// Missing directory levels fall back to `local` and `draft`.
pub fn key_for_path(path: &Path) -> FieldKey {
    let name = |path: Option<&Path>| {
        path.and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
    };

    let field = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let version_dir = path.parent();
    let record_dir = version_dir.and_then(Path::parent);

    FieldKey::new(
        name(record_dir).unwrap_or_else(|| "local".to_string()),
        name(version_dir).unwrap_or_else(|| "draft".to_string()),
        field,
    )
}
