//! Coverage loading: resolve the configured files, decode each as a JSON
//! object keyed by source path, and merge them into one [`CoverageMap`].
//!
//! Missing files are skipped with a warning; every other failure is fatal.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Result, UploadError};
use crate::model::CoverageMap;

/// Split the comma-separated `coverage-file` input, trimming each path and
/// dropping empties.
pub fn split_paths(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve `path` against `workdir` unless it is already absolute.
pub fn resolve_path(workdir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path.trim());
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workdir.join(path)
    }
}

/// Read and decode one coverage file. `Ok(None)` means the file does not exist.
pub fn load_coverage_file(path: &Path) -> Result<Option<CoverageMap>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|source| UploadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|source| UploadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(UploadError::NotAnObject(path.to_path_buf())),
    }
}

/// Load every path in order and merge the results. A later file replaces
/// entries of earlier files that share a source path.
pub fn load_coverage_files(paths: &[String], workdir: &Path) -> Result<CoverageMap> {
    if paths.iter().all(|p| p.trim().is_empty()) {
        return Err(UploadError::NoCoverageFiles);
    }

    let mut merged = CoverageMap::new();
    for raw in paths.iter().filter(|p| !p.trim().is_empty()) {
        let full_path = resolve_path(workdir, raw);
        match load_coverage_file(&full_path)? {
            Some(coverage) => {
                merge_into(&mut merged, coverage);
                info!("Loaded coverage from: {}", full_path.display());
            }
            None => warn!("{}", UploadError::FileNotFound(full_path)),
        }
    }
    Ok(merged)
}

/// Shallow top-level merge; last write wins.
pub fn merge_into(target: &mut CoverageMap, source: CoverageMap) {
    for (file_path, entry) in source {
        target.insert(file_path, entry);
    }
}
