//! Asset descriptors, the merged asset map, and the reconciliation passes
//! that keep them in sync with files on disk.
//!
//! # Module Structure
//!
//! ```text
//! asset/
//! ├── mod.rs       # AssetDescriptor, MergedAssetMap (this file)
//! ├── scan.rs      # descriptor collection → merged map
//! ├── verify.rs    # integrity checks over the merged map
//! ├── mismatch.rs  # descriptor/binary cross-reference on disk
//! ├── heal.rs      # mismatch repair and metadata backfill
//! ├── generate.rs  # derived variants, registration, regeneration
//! └── stub.rs      # placeholder payloads
//! ```

pub mod generate;
pub mod heal;
pub mod mismatch;
pub mod scan;
pub mod stub;
pub mod verify;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::utils::fs::write_json;

pub use verify::VerifyError;

/// Extension of descriptor files.
pub const DESCRIPTOR_EXT: &str = "json";

/// Extension of binary asset files.
pub const BINARY_EXT: &str = "svg";

/// Files whose name contains this are merged maps, never descriptors.
pub const MERGED_MAP_MARKER: &str = "asset-map";

/// Whether `path` names a merged map rather than an asset file.
pub fn is_merged_map(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains(MERGED_MAP_MARKER))
}

// ============================================================================
// Descriptor
// ============================================================================

/// Lifecycle marker on a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    /// File not found on disk; queued for regeneration.
    Missing,
    /// File not found on disk and dropped from the merged map.
    Pruned,
    /// Produced by the variant generator.
    Regenerated,
    Healed,
    /// Any other value, kept as written.
    #[serde(untagged)]
    Other(String),
}

/// One asset descriptor.
///
/// Known fields are typed; everything else lands in `extra` and is written
/// back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_optimize: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_optimized: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_asset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AssetStatus>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Descriptor file this entry was scanned from.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl AssetDescriptor {
    /// `(id, path)` when both are present and non-empty.
    pub fn key(&self) -> Option<(&str, &str)> {
        let id = self.id.as_deref().filter(|s| !s.is_empty())?;
        let path = self.path.as_deref().filter(|s| !s.is_empty())?;
        Some((id, path))
    }

    pub fn is_valid(&self) -> bool {
        self.key().is_some()
    }

    /// Id for log lines; `<unnamed>` when absent.
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or("<unnamed>")
    }
}

// ============================================================================
// Merged asset map
// ============================================================================

/// Overall state of the merged map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapStatus {
    Ok,
    #[default]
    Empty,
    Healed,
}

impl MapStatus {
    pub const fn for_assets(count: usize) -> Self {
        if count == 0 { Self::Empty } else { Self::Ok }
    }
}

/// The single source of truth for declared assets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergedAssetMap {
    pub assets: Vec<AssetDescriptor>,
    pub generated_at: String,
    pub status: MapStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl MergedAssetMap {
    /// Read a snapshot. Missing or corrupt files are hard failures.
    pub fn load(path: &Path) -> Result<Self, VerifyError> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => VerifyError::MapMissing(path.to_path_buf()),
            _ => VerifyError::Read(path.to_path_buf(), e),
        })?;
        serde_json::from_str(&content).map_err(|e| VerifyError::MapCorrupt(path.to_path_buf(), e))
    }

    /// Overwrite the snapshot at `path` (temp file + rename).
    pub fn save(&self, path: &Path) -> io::Result<()> {
        write_json(path, self)
    }

    /// Index of the first asset with `id`.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.assets.iter().position(|a| a.id.as_deref() == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_descriptor_preserves_unknown_fields() {
        let raw = json!({
            "id": "button-primary",
            "path": "assets/ui/button-primary.svg",
            "resolution_target": "240x64",
            "palette": {"fg": "#fff"}
        });
        let desc: AssetDescriptor = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(desc.extra.len(), 2);
        assert_eq!(serde_json::to_value(&desc).unwrap(), raw);
    }

    #[test]
    fn test_descriptor_validity() {
        let mut desc = AssetDescriptor {
            id: Some("a".into()),
            ..Default::default()
        };
        assert!(!desc.is_valid());
        desc.path = Some(String::new());
        assert!(!desc.is_valid());
        desc.path = Some("a.svg".into());
        assert_eq!(desc.key(), Some(("a", "a.svg")));
    }

    #[test]
    fn test_unknown_status_round_trips() {
        let desc: AssetDescriptor =
            serde_json::from_value(json!({"id": "a", "status": "archived"})).unwrap();
        assert_eq!(desc.status, Some(AssetStatus::Other("archived".into())));
        let desc: AssetDescriptor =
            serde_json::from_value(json!({"id": "a", "status": "missing"})).unwrap();
        assert_eq!(desc.status, Some(AssetStatus::Missing));
    }

    #[test]
    fn test_map_load_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("merged-asset-map.json");
        assert!(matches!(
            MergedAssetMap::load(&path),
            Err(VerifyError::MapMissing(_))
        ));

        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(
            MergedAssetMap::load(&path),
            Err(VerifyError::MapCorrupt(..))
        ));
    }

    #[test]
    fn test_map_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("runtime/merged-asset-map.json");
        let map = MergedAssetMap {
            assets: vec![AssetDescriptor {
                id: Some("a".into()),
                path: Some("a.svg".into()),
                ..Default::default()
            }],
            generated_at: "2025-01-01T00:00:00Z".into(),
            status: MapStatus::Ok,
            last_updated: None,
        };
        map.save(&path).unwrap();
        let loaded = MergedAssetMap::load(&path).unwrap();
        assert_eq!(loaded, map);
        assert_eq!(loaded.position("a"), Some(0));
        assert!(!fs::read_to_string(&path).unwrap().contains("last_updated"));
    }

    #[test]
    fn test_is_merged_map() {
        assert!(is_merged_map(Path::new("runtime/merged-asset-map.json")));
        assert!(!is_merged_map(Path::new("ui/button.json")));
    }
}
