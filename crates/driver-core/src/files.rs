//! Skip-if-exists file writes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::DriverError;

/// Result of a guarded write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "path", rename_all = "snake_case")]
pub enum WriteOutcome {
    /// The file was (re)written.
    Written(PathBuf),
    /// The file already existed and overwriting was disabled.
    Skipped(PathBuf),
}

impl WriteOutcome {
    /// Path of the target file.
    pub fn path(&self) -> &Path {
        match self {
            WriteOutcome::Written(path) | WriteOutcome::Skipped(path) => path,
        }
    }

    /// Whether the file was actually written.
    pub fn written(&self) -> bool {
        matches!(self, WriteOutcome::Written(_))
    }
}

/// Writes `contents` to `path`, creating parent directories.
///
/// Existing files (including symlinks, dangling or not) are left untouched unless `overwrite` is set.
pub fn write_guarded(
    path: &Path,
    contents: impl AsRef<[u8]>,
    overwrite: bool,
) -> Result<WriteOutcome, DriverError> {
    if !overwrite && fs::symlink_metadata(path).is_ok() {
        return Ok(WriteOutcome::Skipped(path.to_path_buf()));
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| DriverError::io("create_parent", parent, err))?;
    }
    if fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink()) {
        fs::remove_file(path).map_err(|err| DriverError::io("replace_link", path, err))?;
    }
    fs::write(path, contents).map_err(|err| DriverError::io("write_file", path, err))?;
    Ok(WriteOutcome::Written(path.to_path_buf()))
}
