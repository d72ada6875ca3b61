//! Repair engine.
//!
//! Two passes, selected by whether a mismatch report is supplied:
//!
//! - **mismatch repair**: write the missing half of each descriptor/binary
//!   pair next to the half that exists. Existing files are never touched, so
//!   a second run performs no repairs.
//! - **backfill**: default missing metadata over the merged map and flag or
//!   prune assets whose file is gone. Entries that came from a scan carry
//!   their descriptor file, and every change is written back to it, so the
//!   next scan starts from the repaired descriptor.
//!
//! Individual write failures are soft: logged, collected, and the pass
//! continues.

use anyhow::{Context, Result};
use std::{
    io,
    mem,
    path::{Path, PathBuf},
};
use thiserror::Error;

use super::{
    AssetDescriptor, AssetStatus, BINARY_EXT, DESCRIPTOR_EXT, MapStatus, MergedAssetMap,
    mismatch::MismatchReport,
    stub::{placeholder_descriptor, placeholder_svg},
};
use crate::config::RuntimeConfig;
use crate::event;
use crate::logger::EventSink;
use crate::utils::{
    date::now_rfc3339,
    fs::{write_json, write_new},
    path::to_rel_string,
    plural::plural_count,
};

/// A single repair that could not be applied.
#[derive(Debug, Error)]
pub enum RepairError {
    #[error("cannot write {}: {}", .0.display(), .1)]
    Write(PathBuf, #[source] io::Error),

    #[error("cannot encode descriptor for {0}: {1}")]
    Encode(String, #[source] serde_json::Error),
}

/// Result of one heal pass.
#[derive(Debug, Default)]
pub struct HealOutcome {
    /// Repairs actually performed.
    pub repairs: usize,
    /// Assets flagged missing, for regeneration.
    pub regen_queue: Vec<AssetDescriptor>,
    pub failures: Vec<RepairError>,
}

/// What backfill does with assets whose file is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealPolicy {
    /// Mark `status = "missing"` and queue for regeneration.
    pub auto_flag: bool,
    /// Drop from the map, marking the descriptor `status = "pruned"`.
    /// Flagged assets are never pruned.
    pub auto_prune: bool,
}

pub struct Healer<'a> {
    base: &'a Path,
    asset_root: &'a Path,
    policy: HealPolicy,
    sink: &'a dyn EventSink,
}

impl<'a> Healer<'a> {
    pub fn new(
        base: &'a Path,
        asset_root: &'a Path,
        policy: HealPolicy,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self {
            base,
            asset_root,
            policy,
            sink,
        }
    }

    pub fn from_runtime(runtime: &'a RuntimeConfig, sink: &'a dyn EventSink) -> Self {
        let policy = HealPolicy {
            auto_flag: runtime.auto_flag,
            auto_prune: runtime.auto_prune,
        };
        Self::new(&runtime.base_path, &runtime.asset_root, policy, sink)
    }

    /// Repair mismatches when a report is given, otherwise backfill the
    /// merged map at `map_path`.
    pub fn heal(&self, report: Option<&MismatchReport>, map_path: &Path) -> Result<HealOutcome> {
        match report {
            Some(report) => Ok(self.repair_mismatches(report)),
            None => self.backfill(map_path),
        }
    }

    /// Write the missing half of every mismatched pair.
    pub fn repair_mismatches(&self, report: &MismatchReport) -> HealOutcome {
        let mut outcome = HealOutcome::default();

        if !report.has_mismatches() {
            event!(self.sink, "heal"; "no mismatches detected");
            return outcome;
        }

        for id in &report.missing_json {
            let dir = self.dir_for(report, id);
            let svg_path = dir.join(format!("{id}.{BINARY_EXT}"));
            let json_path = dir.join(format!("{id}.{DESCRIPTOR_EXT}"));
            let desc = placeholder_descriptor(id, to_rel_string(&svg_path, self.base));

            let result = serde_json::to_vec_pretty(&desc)
                .map_err(|e| RepairError::Encode(id.clone(), e))
                .and_then(|mut bytes| {
                    bytes.push(b'\n');
                    write_new(&json_path, &bytes).map_err(|e| RepairError::Write(json_path.clone(), e))
                });
            self.record(&mut outcome, result, "created descriptor", &json_path);
        }

        for id in &report.missing_svg {
            let svg_path = self.dir_for(report, id).join(format!("{id}.{BINARY_EXT}"));
            let result = write_new(&svg_path, placeholder_svg(id).as_bytes())
                .map_err(|e| RepairError::Write(svg_path.clone(), e));
            self.record(&mut outcome, result, "created stub svg", &svg_path);
        }

        event!(self.sink, "heal"; "{} applied", plural_count(outcome.repairs, "repair"));
        outcome
    }

    /// Backfill the merged map on disk; saved with `status = "healed"` when
    /// anything changed.
    pub fn backfill(&self, map_path: &Path) -> Result<HealOutcome> {
        let map = MergedAssetMap::load(map_path)?;
        self.backfill_scanned(map, map_path)
    }

    /// Backfill a map already in memory and save it to `map_path`.
    pub fn backfill_scanned(&self, mut map: MergedAssetMap, map_path: &Path) -> Result<HealOutcome> {
        let scanned = map.assets.len();
        let outcome = self.backfill_map(&mut map);
        // previously pruned entries leave without counting as repairs
        if outcome.repairs > 0 || map.assets.len() != scanned {
            map.save(map_path)
                .with_context(|| format!("Failed to save healed map {}", map_path.display()))?;
        }
        event!(
            self.sink, "heal";
            "backfill complete: {}, {} flagged for regeneration",
            plural_count(outcome.repairs, "repair"),
            outcome.regen_queue.len()
        );
        Ok(outcome)
    }

    /// Backfill `map` in place.
    pub fn backfill_map(&self, map: &mut MergedAssetMap) -> HealOutcome {
        let mut outcome = HealOutcome::default();
        let mut kept = Vec::with_capacity(map.assets.len());

        for mut asset in mem::take(&mut map.assets) {
            // Entries without id/path are carried through untouched.
            if !asset.is_valid() {
                kept.push(asset);
                continue;
            }
            let before = asset.clone();
            let present = asset
                .key()
                .is_some_and(|(_, path)| self.base.join(path).exists());
            let label = asset.label().to_string();

            let mut flagged = false;
            let mut pruned = false;
            if present {
                if matches!(asset.status, Some(AssetStatus::Missing | AssetStatus::Pruned)) {
                    asset.status = None;
                    outcome.repairs += 1;
                    event!(self.sink, "heal"; "[RESTORED] {label} found on disk again");
                }
            } else if self.policy.auto_flag {
                flagged = true;
                if asset.status != Some(AssetStatus::Missing) {
                    asset.status = Some(AssetStatus::Missing);
                    outcome.repairs += 1;
                    event!(self.sink, "heal"; "[FLAGGED] {label} marked for regeneration");
                }
            } else if self.policy.auto_prune {
                pruned = true;
                if asset.status != Some(AssetStatus::Pruned) {
                    asset.status = Some(AssetStatus::Pruned);
                    outcome.repairs += 1;
                    event!(self.sink, "heal"; "[PRUNED] removed missing asset {label}");
                }
            }

            if !pruned {
                outcome.repairs += self.fill_defaults(&mut asset, &label);
            }
            if asset != before {
                self.write_back(&asset, &mut outcome);
            }
            if pruned {
                continue;
            }
            if flagged {
                outcome.regen_queue.push(asset.clone());
            }
            kept.push(asset);
        }

        map.assets = kept;
        if outcome.repairs > 0 {
            map.status = MapStatus::Healed;
            map.last_updated = Some(now_rfc3339());
        }
        outcome
    }

    /// Persist a changed entry to the descriptor file it was scanned from.
    fn write_back(&self, asset: &AssetDescriptor, outcome: &mut HealOutcome) {
        let Some(source) = asset.source.as_deref() else {
            return;
        };
        if let Err(e) = write_json(source, asset) {
            let err = RepairError::Write(source.to_path_buf(), e);
            event!(self.sink, "heal"; "RepairSoftFailure: {err}");
            outcome.failures.push(err);
        }
    }

    fn fill_defaults(&self, asset: &mut AssetDescriptor, label: &str) -> usize {
        let mut repairs = 0;
        if asset.version.is_none() {
            asset.version = Some("1.0".to_string());
            event!(self.sink, "heal"; "[REPAIRED] added default version to {label}");
            repairs += 1;
        }
        if asset.last_updated.is_none() {
            asset.last_updated = Some(now_rfc3339());
            event!(self.sink, "heal"; "[REPAIRED] added last_updated to {label}");
            repairs += 1;
        }
        if asset.auto_optimize.is_none() {
            asset.auto_optimize = Some(true);
            event!(self.sink, "heal"; "[REPAIRED] enabled auto_optimize for {label}");
            repairs += 1;
        }
        if asset.web_optimized.is_none() {
            asset.web_optimized = Some(true);
            event!(self.sink, "heal"; "[REPAIRED] enabled web_optimized for {label}");
            repairs += 1;
        }
        repairs
    }

    fn dir_for(&self, report: &MismatchReport, id: &str) -> PathBuf {
        report
            .location(id)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.asset_root.join("ui"))
    }

    fn record(
        &self,
        outcome: &mut HealOutcome,
        result: Result<bool, RepairError>,
        action: &str,
        path: &Path,
    ) {
        match result {
            Ok(true) => {
                outcome.repairs += 1;
                event!(self.sink, "heal"; "[HEALED] {action}: {}", path.display());
            }
            Ok(false) => {}
            Err(e) => {
                event!(self.sink, "heal"; "RepairSoftFailure: {e}");
                outcome.failures.push(e);
            }
        }
    }
}
