//! Descriptor/binary cross-reference.
//!
//! Buckets file stems under the asset root by extension family and reports
//! the one-sided differences. A stem present in both families is never
//! reported.

use jwalk::WalkDir;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::{BINARY_EXT, DESCRIPTOR_EXT, is_merged_map};
use crate::event;
use crate::logger::EventSink;

/// Stems present in one family but not the other.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct MismatchReport {
    /// Binaries with no descriptor, sorted.
    pub missing_json: Vec<String>,
    /// Descriptors with no binary, sorted.
    pub missing_svg: Vec<String>,
    pub total_svg: usize,
    pub total_json: usize,

    /// Directory of the file that does exist, per reported stem.
    #[serde(skip)]
    pub locations: FxHashMap<String, PathBuf>,
}

impl MismatchReport {
    pub fn has_mismatches(&self) -> bool {
        !self.missing_json.is_empty() || !self.missing_svg.is_empty()
    }

    pub fn len(&self) -> usize {
        self.missing_json.len() + self.missing_svg.len()
    }

    /// Directory the counterpart for `id` belongs in, if known.
    pub fn location(&self, id: &str) -> Option<&Path> {
        self.locations.get(id).map(PathBuf::as_path)
    }
}

/// Walk `root` and compare descriptor and binary stems.
pub fn detect(root: &Path, sink: &dyn EventSink) -> MismatchReport {
    let mut json: FxHashMap<String, PathBuf> = FxHashMap::default();
    let mut svg: FxHashMap<String, PathBuf> = FxHashMap::default();

    if !root.is_dir() {
        event!(sink, "detect"; "[WARN] asset root not found: {}", root.display());
    }

    let files = WalkDir::new(root)
        .sort(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path());

    for path in files {
        if is_merged_map(&path) {
            continue;
        }
        let (Some(stem), Some(ext)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|s| s.to_str()),
        ) else {
            continue;
        };
        let bucket = if ext.eq_ignore_ascii_case(DESCRIPTOR_EXT) {
            &mut json
        } else if ext.eq_ignore_ascii_case(BINARY_EXT) {
            &mut svg
        } else {
            continue;
        };
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        bucket.entry(stem.to_string()).or_insert(dir);
    }

    let mut report = MismatchReport {
        total_svg: svg.len(),
        total_json: json.len(),
        ..Default::default()
    };
    for (stem, dir) in &svg {
        if !json.contains_key(stem) {
            report.missing_json.push(stem.clone());
            report.locations.insert(stem.clone(), dir.clone());
        }
    }
    for (stem, dir) in &json {
        if !svg.contains_key(stem) {
            report.missing_svg.push(stem.clone());
            report.locations.insert(stem.clone(), dir.clone());
        }
    }
    report.missing_json.sort();
    report.missing_svg.sort();

    event!(
        sink, "detect";
        "{} svg, {} json; missing json: {}, missing svg: {}",
        report.total_svg,
        report.total_json,
        report.missing_json.len(),
        report.missing_svg.len()
    );
    report
}
