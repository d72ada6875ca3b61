//! Filesystem path normalization.
//!
//! - `resolve_path` - config paths relative to a base directory, with `~` expansion
//! - `get_mtime` - modification time, `None` when unavailable

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}

/// Resolve a configured path against `base`.
///
/// Absolute paths (after `~` expansion) are kept; relative ones are joined
/// onto `base`. The file does not need to exist.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    let expanded = expand_tilde(path);
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

/// Get the modification time of a file.
#[inline]
pub fn get_mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}
