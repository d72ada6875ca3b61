//! `runtime` section configuration.
//!
//! Paths, cycle timing and healing policy.
//!
//! # Example
//!
//! ```json
//! "runtime": {
//!   "base_path": ".",
//!   "asset_root": "systems/dvos/assets",
//!   "merged_map": "systems/dvos/runtime/merged-asset-map.json",
//!   "log_path": "systems/dvos/runtime/logs/asset-sync.log",
//!   "auto_cycle_interval": "6h",
//!   "reload_interval": 30,
//!   "min_sleep": 5,
//!   "auto_heal": true,
//!   "auto_flag": true,
//!   "auto_prune": true,
//!   "timeout": 15,
//!   "retry": { "attempts": 3, "base_delay": 2.0 }
//! }
//! ```
//!
//! All relative paths resolve against `base_path`, which itself resolves
//! against the directory the config file was found from.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::types::duration_from_secs;
use crate::utils::path::resolve_path;

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Root every other relative path hangs off.
    pub base_path: PathBuf,

    /// Directory walked by the mismatch detector.
    pub asset_root: PathBuf,

    /// Merged asset map location.
    pub merged_map: PathBuf,

    /// Append-only event log.
    pub log_path: PathBuf,

    /// Cycle interval with unit suffix (`90s`, `5m`, `6h`) or bare seconds.
    pub auto_cycle_interval: String,

    /// Minimum seconds between config file revalidations.
    pub reload_interval: u64,

    /// Floor for the scheduler's sleep between cycles, in seconds.
    pub min_sleep: u64,

    /// Repair detected issues automatically.
    pub auto_heal: bool,

    /// Mark descriptors whose file is gone as `missing` and queue them.
    pub auto_flag: bool,

    /// Drop descriptors whose file is gone from the healed map.
    pub auto_prune: bool,

    /// Per-call timeout for git and webhook calls, in seconds.
    pub timeout: u64,

    /// Backoff for the commit step.
    pub retry: RetryConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            asset_root: PathBuf::from("systems/dvos/assets"),
            merged_map: PathBuf::from("systems/dvos/runtime/merged-asset-map.json"),
            log_path: PathBuf::from("systems/dvos/runtime/logs/asset-sync.log"),
            auto_cycle_interval: "5m".to_string(),
            reload_interval: 30,
            min_sleep: 5,
            auto_heal: true,
            auto_flag: true,
            auto_prune: true,
            timeout: 15,
            retry: RetryConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Resolve all paths to absolute form. `root` anchors `base_path`.
    pub fn normalize(&mut self, root: &Path) {
        self.base_path = resolve_path(&self.base_path, root);
        let base = self.base_path.clone();
        self.asset_root = resolve_path(&self.asset_root, &base);
        self.merged_map = resolve_path(&self.merged_map, &base);
        self.log_path = resolve_path(&self.log_path, &base);
    }

    pub fn reload_interval(&self) -> Duration {
        Duration::from_secs(self.reload_interval)
    }

    pub fn min_sleep(&self) -> Duration {
        Duration::from_secs(self.min_sleep)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.max(1))
    }
}

/// Retry settings for side-effecting steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub attempts: u32,

    /// Base delay in seconds; doubles after every failed attempt.
    pub base_delay: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        duration_from_secs(self.base_delay)
    }
}
