//! Descriptor collection and merged map output.
//!
//! Every `*.json` file under each configured source directory is a
//! descriptor, except files carrying the merged map marker. A file that
//! fails to parse is skipped and recorded; the rest of the scan continues.

use anyhow::{Context, Result};
use jwalk::WalkDir;
use rayon::prelude::*;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

use super::{AssetDescriptor, DESCRIPTOR_EXT, MapStatus, MergedAssetMap, is_merged_map};
use crate::config::RegistryConfig;
use crate::event;
use crate::logger::EventSink;
use crate::utils::{date::now_rfc3339, path::normalize_rel, plural::plural_count};

/// A descriptor file the scan had to skip.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot read {}: {}", .0.display(), .1)]
    Read(PathBuf, #[source] io::Error),

    #[error("invalid descriptor {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] serde_json::Error),
}

/// Result of one scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub descriptors: Vec<AssetDescriptor>,
    pub skipped: Vec<ScanError>,
}

/// Collect descriptor files under `dir`, sorted.
pub fn collect_descriptor_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .sort(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == DESCRIPTOR_EXT))
        .filter(|p| !is_merged_map(p))
        .collect();
    files.sort();
    files
}

/// Read all descriptors from `sources`.
///
/// Missing source directories are logged and skipped.
pub fn scan(sources: &[PathBuf], sink: &dyn EventSink) -> ScanOutcome {
    let mut files = Vec::new();
    for source in sources {
        if !source.is_dir() {
            event!(sink, "scan"; "[WARN] missing asset source: {}", source.display());
            continue;
        }
        files.extend(collect_descriptor_files(source));
    }

    let parsed: Vec<_> = files.par_iter().map(|path| read_descriptor(path)).collect();

    let mut outcome = ScanOutcome::default();
    for result in parsed {
        match result {
            Ok(desc) => outcome.descriptors.push(desc),
            Err(e) => {
                event!(sink, "scan"; "ScanPartialFailure: {e}");
                outcome.skipped.push(e);
            }
        }
    }

    event!(
        sink, "scan";
        "collected {} from {}",
        plural_count(outcome.descriptors.len(), "descriptor"),
        plural_count(sources.len(), "source")
    );
    outcome
}

fn read_descriptor(path: &Path) -> Result<AssetDescriptor, ScanError> {
    let content = fs::read_to_string(path).map_err(|e| ScanError::Read(path.to_path_buf(), e))?;
    let mut desc: AssetDescriptor =
        serde_json::from_str(&content).map_err(|e| ScanError::Parse(path.to_path_buf(), e))?;
    if let Some(p) = desc.path.as_mut() {
        *p = normalize_rel(p);
    }
    desc.source = Some(path.to_path_buf());
    Ok(desc)
}

/// Overwrite the merged map at `output` with `descriptors`.
pub fn write_merged_map(descriptors: Vec<AssetDescriptor>, output: &Path) -> io::Result<MergedAssetMap> {
    let map = MergedAssetMap {
        status: MapStatus::for_assets(descriptors.len()),
        assets: descriptors,
        generated_at: now_rfc3339(),
        last_updated: None,
    };
    map.save(output)?;
    Ok(map)
}

/// Directories to scan: `asset_sources`, or `runtime.asset_root` when none
/// are configured.
pub fn sources_of(config: &RegistryConfig) -> Vec<PathBuf> {
    if config.asset_sources.is_empty() {
        vec![config.runtime.asset_root.clone()]
    } else {
        config.asset_sources.clone()
    }
}

/// Scan the configured sources and write the merged map.
pub fn run_scan(config: &RegistryConfig, sink: &dyn EventSink) -> Result<MergedAssetMap> {
    let outcome = scan(&sources_of(config), sink);
    let output = &config.runtime.merged_map;
    let map = write_merged_map(outcome.descriptors, output)
        .with_context(|| format!("Failed to write merged map {}", output.display()))?;
    event!(
        sink, "scan";
        "merged map written: {} ({})",
        output.display(),
        plural_count(map.assets.len(), "asset")
    );
    Ok(map)
}
