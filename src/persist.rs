//! Whole-file persistence
//!
//! Registry, mapping and Turtle outputs are always rewritten in full. Every
//! write goes through a `.tmp` sibling that is synced and then renamed over
//! the target, so an interrupted run leaves the previous file intact.

use crate::errors::{CdeError, CdeResult};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Phase 1: write data to the `.tmp` sibling (prepare)
fn prepare_write(path: &Path, data: &[u8]) -> CdeResult<PathBuf> {
    let tmp = tmp_path(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CdeError::io(parent, e))?;
    }

    let mut file = fs::File::create(&tmp).map_err(|e| CdeError::io(&tmp, e))?;
    file.write_all(data).map_err(|e| CdeError::io(&tmp, e))?;
    file.sync_all().map_err(|e| CdeError::io(&tmp, e))?;

    Ok(tmp)
}

/// Phase 2: rename the `.tmp` file over the target (commit)
fn commit_rename(tmp: &Path, path: &Path) -> CdeResult<()> {
    fs::rename(tmp, path).map_err(|e| CdeError::io(path, e))
}

/// Atomically replace `path` with `data`
pub fn write_atomic(path: &Path, data: &[u8]) -> CdeResult<()> {
    let tmp = prepare_write(path, data)?;
    if let Err(e) = commit_rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

/// Serialize `value` as 2-space indented JSON with a trailing newline and
/// write it atomically
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> CdeResult<()> {
    let mut json = serde_json::to_string_pretty(value).map_err(|e| CdeError::json(path, e))?;
    json.push('\n');
    write_atomic(path, json.as_bytes())
}

/// Read a whole file into a string
pub fn read_to_string(path: &Path) -> CdeResult<String> {
    fs::read_to_string(path).map_err(|e| CdeError::io(path, e))
}
