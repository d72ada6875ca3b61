//! Relative paths as stored in asset descriptors.
//!
//! Descriptors always carry forward-slash paths relative to the runtime base
//! path, regardless of the platform that wrote them.

use std::path::Path;

/// Normalize a descriptor path: unify separators, drop `.` and empty
/// segments, fold `..` where possible.
///
/// ```ignore
/// assert_eq!(normalize_rel("./assets\\ui//a.svg"), "assets/ui/a.svg");
/// ```
pub fn normalize_rel(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split(['/', '\\']) {
        match seg {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            s => parts.push(s),
        }
    }
    let joined = parts.join("/");
    if path.starts_with('/') {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Render `path` relative to `base` in descriptor form.
///
/// Falls back to the full path if `path` is not under `base`.
pub fn to_rel_string(path: &Path, base: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    normalize_rel(&rel.to_string_lossy())
}
