//! Lexical path helpers.

use std::path::{Component, Path, PathBuf};

/// Renders a path with forward slashes regardless of host separator.
pub fn posix_string(path: &Path) -> String {
    let text = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        text.into_owned()
    } else {
        text.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

fn normalized(path: &Path) -> Vec<Component<'_>> {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                _ => components.push(component),
            },
            other => components.push(other),
        }
    }
    components
}

/// Expresses `target` relative to the directory `base`.
///
/// Both paths are compared lexically; symlinks are not resolved. Returns `None` when the two
/// paths do not share a root (one absolute and one relative, or different prefixes).
pub fn relative_path(base: &Path, target: &Path) -> Option<PathBuf> {
    if base.is_absolute() != target.is_absolute() {
        return None;
    }
    let base = normalized(base);
    let target = normalized(target);
    if base.first() != target.first() && base.first().is_some_and(|c| matches!(c, Component::Prefix(_))) {
        return None;
    }
    let shared = base
        .iter()
        .zip(target.iter())
        .take_while(|(left, right)| left == right)
        .count();
    if base[shared..].iter().any(|component| matches!(component, Component::ParentDir)) {
        return None;
    }
    let mut relative = PathBuf::new();
    for _ in shared..base.len() {
        relative.push("..");
    }
    for component in &target[shared..] {
        relative.push(component.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    Some(relative)
}
