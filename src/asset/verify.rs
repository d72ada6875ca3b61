//! Integrity checks over the merged asset map.
//!
//! Per asset, in order: validity (id and path present), duplicate id,
//! file existence. Invalid entries skip the remaining checks; a duplicate
//! is still checked for existence. The map is never modified.

use serde::Serialize;
use std::{
    fmt::Write as _,
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

use rustc_hash::FxHashSet;

use super::{AssetDescriptor, MergedAssetMap};
use crate::event;
use crate::logger::EventSink;

/// The merged map could not be loaded; nothing downstream can run.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("merged asset map not found at {}", .0.display())]
    MapMissing(PathBuf),

    #[error("cannot read merged asset map {}: {}", .0.display(), .1)]
    Read(PathBuf, #[source] io::Error),

    #[error("merged asset map {} is corrupt: {}", .0.display(), .1)]
    MapCorrupt(PathBuf, #[source] serde_json::Error),
}

/// Findings of one integrity check.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct IntegrityReport {
    /// Paths (as written in the map) with no file on disk.
    pub missing_files: Vec<String>,
    /// One entry per extra occurrence of an id.
    pub duplicates: Vec<String>,
    /// Entries lacking an id or path.
    pub invalid_entries: Vec<AssetDescriptor>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.missing_files.is_empty() && self.duplicates.is_empty() && self.invalid_entries.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        self.missing_files.len() + self.duplicates.len() + self.invalid_entries.len()
    }

    /// Human-readable report.
    pub fn summary(&self) -> String {
        let mut out = String::from("DVOS Integrity Report:");
        push_section(&mut out, "missing_files", &self.missing_files);
        push_section(&mut out, "duplicates", &self.duplicates);
        let invalid: Vec<String> = self
            .invalid_entries
            .iter()
            .map(|d| serde_json::to_string(d).unwrap_or_default())
            .collect();
        push_section(&mut out, "invalid_entries", &invalid);
        out
    }
}

fn push_section(out: &mut String, name: &str, values: &[String]) {
    let _ = write!(out, "\n  {name}: {}", values.len());
    for value in values {
        let _ = write!(out, "\n    - {value}");
    }
}

/// Load the merged map for checking.
pub fn load_merged_map(path: &Path) -> Result<MergedAssetMap, VerifyError> {
    MergedAssetMap::load(path)
}

/// Check every asset in `map`; paths resolve against `base`.
pub fn check(map: &MergedAssetMap, base: &Path, sink: &dyn EventSink) -> IntegrityReport {
    let mut report = IntegrityReport::default();
    let mut seen: FxHashSet<&str> = FxHashSet::default();

    for asset in &map.assets {
        let Some((id, path)) = asset.key() else {
            event!(
                sink, "verify";
                "[INVALID] missing id or path in asset entry: {}",
                serde_json::to_string(asset).unwrap_or_default()
            );
            report.invalid_entries.push(asset.clone());
            continue;
        };

        if !seen.insert(id) {
            event!(sink, "verify"; "[DUPLICATE] asset id '{id}' appears multiple times");
            report.duplicates.push(id.to_string());
        }

        if !base.join(path).exists() {
            event!(sink, "verify"; "[MISSING] file not found for {id}: {path}");
            report.missing_files.push(path.to_string());
        }
    }

    event!(
        sink, "verify";
        "integrity check complete: {} missing, {} duplicates, {} invalid",
        report.missing_files.len(),
        report.duplicates.len(),
        report.invalid_entries.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemorySink;
    use std::fs;
    use tempfile::TempDir;

    fn asset(id: Option<&str>, path: Option<&str>) -> AssetDescriptor {
        AssetDescriptor {
            id: id.map(Into::into),
            path: path.map(Into::into),
            ..Default::default()
        }
    }

    fn map_of(assets: Vec<AssetDescriptor>) -> MergedAssetMap {
        MergedAssetMap {
            assets,
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_map() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.svg"), "<svg/>").unwrap();
        let map = map_of(vec![asset(Some("a"), Some("a.svg"))]);

        let report = check(&map, dir.path(), &MemorySink::new());
        assert!(report.is_clean());
        assert_eq!(report.issue_count(), 0);
    }

    #[test]
    fn test_duplicates_reported_per_extra_occurrence() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.svg"), "<svg/>").unwrap();
        let map = map_of(vec![
            asset(Some("a"), Some("a.svg")),
            asset(Some("a"), Some("a.svg")),
            asset(Some("a"), Some("a.svg")),
        ]);

        let report = check(&map, dir.path(), &MemorySink::new());
        assert_eq!(report.duplicates, vec!["a", "a"]);
        assert!(report.missing_files.is_empty());
    }

    #[test]
    fn test_invalid_then_missing() {
        let dir = TempDir::new().unwrap();
        let map = map_of(vec![
            asset(None, Some("x.svg")),
            asset(Some("y"), None),
            asset(Some("z"), Some("ui/z.svg")),
        ]);
        let sink = MemorySink::new();

        let report = check(&map, dir.path(), &sink);
        assert_eq!(report.invalid_entries.len(), 2);
        assert_eq!(report.missing_files, vec!["ui/z.svg"]);
        assert!(report.duplicates.is_empty());
        assert!(sink.contains("[MISSING] file not found for z"));
        assert!(sink.contains("1 missing, 0 duplicates, 2 invalid"));
    }

    #[test]
    fn test_check_does_not_mutate() {
        let dir = TempDir::new().unwrap();
        let map = map_of(vec![asset(Some("a"), Some("a.svg")), asset(None, None)]);
        let before = map.clone();
        let _ = check(&map, dir.path(), &MemorySink::new());
        assert_eq!(map, before);
    }

    #[test]
    fn test_summary() {
        let report = IntegrityReport {
            missing_files: vec!["ui/a.svg".into()],
            duplicates: Vec::new(),
            invalid_entries: vec![asset(Some("b"), None)],
        };
        let summary = report.summary();
        assert!(summary.starts_with("DVOS Integrity Report:"));
        assert!(summary.contains("\n  missing_files: 1\n    - ui/a.svg"));
        assert!(summary.contains("\n  duplicates: 0"));
        assert!(summary.contains("\n  invalid_entries: 1\n    - {\"id\":\"b\"}"));
    }

    #[test]
    fn test_load_missing_map_is_hard_failure() {
        let dir = TempDir::new().unwrap();
        let err = load_merged_map(&dir.path().join("merged-asset-map.json")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
