//! Relative symlinks with a copy fallback.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use driver_core::errors::DriverError;
use driver_core::paths::relative_path;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How a link request was satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "path", rename_all = "snake_case")]
pub enum LinkOutcome {
    /// Symlink pointing at an existing source.
    Linked(PathBuf),
    /// The filesystem refused the symlink and the source was copied.
    Copied(PathBuf),
    /// Symlink whose source does not exist yet.
    Dangling(PathBuf),
    /// A regular file already occupied the link path and overwriting was disabled.
    Skipped(PathBuf),
}

impl LinkOutcome {
    /// Path of the link.
    pub fn path(&self) -> &Path {
        match self {
            LinkOutcome::Linked(path)
            | LinkOutcome::Copied(path)
            | LinkOutcome::Dangling(path)
            | LinkOutcome::Skipped(path) => path,
        }
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "symlinks are not supported"))
}

/// Links `link` to `source`.
///
/// Existing symlinks at `link` are always replaced; existing files only with `overwrite`.
/// With `relative`, the link stores the path of `source` relative to the link's directory
/// so a tree can be moved as a whole. A source that does not exist yet still gets a link,
/// reported as [`LinkOutcome::Dangling`].
pub fn create_link(
    source: &Path,
    link: &Path,
    relative: bool,
    overwrite: bool,
) -> Result<LinkOutcome, DriverError> {
    create_link_with(source, link, relative, overwrite, symlink)
}

/// [`create_link`] with the platform symlink call replaced by `make_link`.
///
/// When `make_link` fails and `source` is a regular file, the file is copied instead and
/// reported as [`LinkOutcome::Copied`].
pub fn create_link_with<F>(
    source: &Path,
    link: &Path,
    relative: bool,
    overwrite: bool,
    make_link: F,
) -> Result<LinkOutcome, DriverError>
where
    F: FnOnce(&Path, &Path) -> io::Result<()>,
{
    let parent = link.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|err| DriverError::io("create_link_parent", parent, err))?;
    if let Ok(metadata) = fs::symlink_metadata(link) {
        if !metadata.file_type().is_symlink() && !overwrite {
            debug!(link = %link.display(), "keeping existing file");
            return Ok(LinkOutcome::Skipped(link.to_path_buf()));
        }
        debug!(link = %link.display(), "removing previous link");
        fs::remove_file(link).map_err(|err| DriverError::io("replace_link", link, err))?;
    }

    let target = if relative {
        relative_path(parent, source).unwrap_or_else(|| source.to_path_buf())
    } else {
        source.to_path_buf()
    };
    match make_link(&target, link) {
        Ok(()) if source.exists() => Ok(LinkOutcome::Linked(link.to_path_buf())),
        Ok(()) => Ok(LinkOutcome::Dangling(link.to_path_buf())),
        Err(err) if source.is_file() => {
            warn!(
                source = %source.display(),
                link = %link.display(),
                error = %err,
                "symlink failed; copying instead"
            );
            fs::copy(source, link).map_err(|err| DriverError::io("copy_file", link, err))?;
            Ok(LinkOutcome::Copied(link.to_path_buf()))
        }
        Err(err) => Err(DriverError::io("create_link", link, err)),
    }
}
