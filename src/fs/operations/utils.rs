//! Shared helpers for transfer operations.

use std::path::{Component, Path, PathBuf};

/// Normalize a remote path: leading slash, no trailing slash, no "//".
///
/// The root normalizes to the empty string, which is how Dropbox addresses it.
pub(crate) fn normalize_remote_path(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        return String::new();
    }
    format!("/{}", parts.join("/"))
}

/// Join a normalized remote base with a relative, slash-separated path.
pub(crate) fn join_remote(base: &str, relative: &str) -> String {
    normalize_remote_path(&format!("{}/{}", base, relative))
}

/// Last component of a normalized remote path ("" for the root).
pub(crate) fn remote_basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

/// Path of `entry_path` relative to `base`, compared case-insensitively.
///
/// Returns `None` when the entry is not strictly below `base`.
pub(crate) fn remote_relative<'a>(base: &str, entry_path: &'a str) -> Option<&'a str> {
    if base.is_empty() {
        return entry_path.strip_prefix('/').filter(|rest| !rest.is_empty());
    }
    if entry_path.len() <= base.len() || !entry_path.is_char_boundary(base.len()) {
        return None;
    }
    let (head, tail) = entry_path.split_at(base.len());
    if head.to_lowercase() != base.to_lowercase() {
        return None;
    }
    tail.strip_prefix('/').filter(|rest| !rest.is_empty())
}

/// Slash-separated form of a relative local path.
pub(crate) fn local_to_remote_relative(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Local path for a slash-separated remote relative path under `root`.
pub(crate) fn remote_to_local(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|p| !p.is_empty() && *p != "." && *p != "..")
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}
