//! Common rendering and persistence of shell scripts.

use std::fs;
use std::path::{Path, PathBuf};

use driver_core::errors::DriverError;
use driver_core::files::{write_guarded, WriteOutcome};
use tracing::debug;

/// Interpreter line written at the top of every script.
pub const SHEBANG: &str = "#!/bin/bash --login";

/// Shell script rendered from an ordered list of lines.
pub trait Script {
    /// Script lines, without the trailing newline.
    fn lines(&self) -> Result<Vec<String>, DriverError>;

    /// File name used when writing into a directory.
    fn default_filename(&self) -> String;

    /// Full script text.
    fn render(&self) -> Result<String, DriverError> {
        let mut text = self.lines()?.join("\n");
        text.push('\n');
        Ok(text)
    }

    /// Resolves a directory target to the default file name.
    fn target_path(&self, path: &Path) -> PathBuf {
        if path.is_dir() {
            path.join(self.default_filename())
        } else {
            path.to_path_buf()
        }
    }

    /// Writes the script, keeping an existing file unless `overwrite` is set.
    fn write(&self, path: &Path, overwrite: bool) -> Result<WriteOutcome, DriverError> {
        let target = self.target_path(path);
        write_guarded(&target, self.render()?, overwrite)
    }
}

/// Copies the read bits of `path` onto its execute bits.
#[cfg(unix)]
pub fn make_executable(path: &Path) -> Result<(), DriverError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|err| DriverError::io("stat_script", path, err))?;
    let mut permissions = metadata.permissions();
    let mode = permissions.mode();
    permissions.set_mode(mode | ((mode & 0o444) >> 2));
    debug!(path = %path.display(), "marking script executable");
    fs::set_permissions(path, permissions)
        .map_err(|err| DriverError::io("chmod_script", path, err))
}

/// Scripts are run through `sh` where execute bits do not exist.
#[cfg(not(unix))]
pub fn make_executable(path: &Path) -> Result<(), DriverError> {
    debug!(path = %path.display(), "scripts run through sh on this host");
    fs::metadata(path)
        .map(|_| ())
        .map_err(|err| DriverError::io("stat_script", path, err))
}
