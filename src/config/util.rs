//! Configuration utility functions.

use serde_json::Value;
use std::path::{Path, PathBuf};

/// Find config file by searching upward from current directory
///
/// Returns the config path and the directory it was resolved from. That
/// directory is the root that relative `runtime.base_path` values hang off.
///
/// # Example
/// ```text
/// /repo/systems/dvos/              ← cwd
/// /repo/systems/dvos/schema/registry.json  (no)
/// /repo/systems/dvos/schema/registry.json  ← found from /repo, root = /repo
/// ```
pub fn find_config_file(config_name: &Path) -> Option<(PathBuf, PathBuf)> {
    let cwd = std::env::current_dir().ok()?;

    if config_name.is_absolute() {
        return config_name
            .exists()
            .then(|| (config_name.to_path_buf(), cwd));
    }

    let mut current = cwd.as_path();
    loop {
        let candidate = current.join(config_name);
        if candidate.exists() {
            return Some((candidate, current.to_path_buf()));
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

/// Walk a JSON document by `.`-separated keys.
///
/// Object segments are looked up by key, array segments by numeric index.
/// Returns `None` on any missing segment or when a scalar is traversed.
///
/// # Examples
/// ```ignore
/// lookup(&doc, "repo.branch")            -> Some("main")
/// lookup(&doc, "asset_sources.0")        -> Some("assets/ui")
/// lookup(&doc, "repo.branch.name")       -> None
/// ```
pub fn lookup<'a>(doc: &'a Value, dot_path: &str) -> Option<&'a Value> {
    if dot_path.is_empty() {
        return Some(doc);
    }
    dot_path.split('.').try_fold(doc, |node, key| match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Extract the host of a URL, lowercased.
///
/// Returns `None` if the URL is invalid or has no host.
pub fn extract_host(url_str: &str) -> Option<String> {
    let parsed = url::Url::parse(url_str).ok()?;
    parsed.host_str().map(str::to_ascii_lowercase)
}
