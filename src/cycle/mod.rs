//! The reconciliation cycle.
//!
//! ```text
//! Start → Scan → Verify/Detect → Heal? → Generate? → Commit? → Notify → Complete
//! ```
//!
//! A scan or verify failure marks the cycle `error` and skips straight to
//! the summary; a heal failure is logged and the cycle continues. The
//! summary is always produced, logged, and (when configured) sent.

mod summary;
#[cfg(test)]
mod tests;

pub use summary::{CycleStatus, CycleSummary};

use std::{sync::Arc, time::Instant};

use crate::asset::{
    MergedAssetMap,
    generate::{regenerate, run_variants},
    heal::Healer,
    mismatch::{MismatchReport, detect},
    scan::run_scan,
    verify::{check, load_merged_map},
};
use crate::config::{ConfigStore, RegistryConfig};
use crate::core::Sleeper;
use crate::{debug, event};
use crate::logger::EventSink;
use crate::publish::{
    Backoff, CommitOutcome, VcsRunner, WebhookTransport, commit_and_push, notify, retry,
};

/// Anything that can run one cycle. The scheduler drives this.
pub trait CycleRunner: Send + Sync {
    fn run_cycle(&self) -> CycleSummary;
}

/// Sequences one full cycle over the current configuration.
pub struct Orchestrator {
    store: Arc<ConfigStore>,
    sink: Arc<dyn EventSink>,
    vcs: Arc<dyn VcsRunner>,
    transport: Arc<dyn WebhookTransport>,
    sleeper: Arc<dyn Sleeper>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<ConfigStore>,
        sink: Arc<dyn EventSink>,
        vcs: Arc<dyn VcsRunner>,
        transport: Arc<dyn WebhookTransport>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            store,
            sink,
            vcs,
            transport,
            sleeper,
        }
    }

    /// Run one cycle. Never fails; problems are reflected in the summary.
    pub fn run(&self) -> CycleSummary {
        let sink = self.sink.as_ref();
        let started = Instant::now();
        event!(sink, "cycle"; "--- Starting DVOS Cycle ---");

        let mut summary = CycleSummary::default();
        let config = match self.store.load(false) {
            Ok(config) => Some(config),
            Err(e) => {
                event!(sink, "cycle"; "[ERROR] config: {e}");
                summary.fail(format!("config: {e}"));
                None
            }
        };

        if let Some(config) = &config {
            self.reconcile(config, &mut summary);
        }
        summary.duration = started.elapsed();

        if let Some(config) = &config {
            summary.notified = notify(
                &config.notifications,
                &summary.text(),
                &summary,
                self.transport.as_ref(),
                self.sleeper.as_ref(),
                sink,
            );
        }

        event!(sink, "cycle"; "{}", summary.text());
        event!(sink, "cycle"; "--- DVOS Cycle Complete ---");
        summary
    }

    fn reconcile(&self, config: &RegistryConfig, summary: &mut CycleSummary) {
        let sink = self.sink.as_ref();
        let runtime = &config.runtime;

        let scanned = match run_scan(config, sink) {
            Ok(map) => map,
            Err(e) => {
                event!(sink, "cycle"; "[ERROR] scan failed: {e:#}");
                summary.fail(format!("scan: {e:#}"));
                return;
            }
        };
        summary.assets = scanned.assets.len();

        let map = match load_merged_map(&runtime.merged_map) {
            Ok(map) => map,
            Err(e) => {
                event!(sink, "cycle"; "[ERROR] VerifyHardFailure: {e}");
                summary.fail(format!("verify: {e}"));
                return;
            }
        };
        let integrity = check(&map, &runtime.base_path, sink);
        let mismatches = detect(&runtime.asset_root, sink);

        let issues = !integrity.is_clean() || mismatches.has_mismatches();
        if issues {
            summary.status.escalate(CycleStatus::Issues);
        }
        if runtime.auto_heal {
            summary.healed = self.heal(config, &mismatches, scanned);
            if summary.healed > 0 {
                summary.status.escalate(CycleStatus::Healed);
            }
        } else if issues {
            event!(
                sink, "cycle";
                "[ISSUES] {} integrity issues, {} mismatches; auto_heal disabled",
                integrity.issue_count(),
                mismatches.len()
            );
        }

        if config.generator.enable && !config.generator.variants.is_empty() {
            run_variants(config, sink);
        }

        if config.repo.auto_commit {
            summary.commit = self.commit(config, summary);
        }
    }

    /// Mismatch repair, then the backfill pass over the scanned map.
    /// Returns the number of repairs.
    fn heal(
        &self,
        config: &RegistryConfig,
        mismatches: &MismatchReport,
        scanned: MergedAssetMap,
    ) -> usize {
        let sink = self.sink.as_ref();
        let runtime = &config.runtime;
        let healer = Healer::from_runtime(runtime, sink);
        let mut repairs = 0;

        if mismatches.has_mismatches() {
            repairs += healer.repair_mismatches(mismatches).repairs;
        }

        match healer.backfill_scanned(scanned, &runtime.merged_map) {
            Ok(outcome) => {
                repairs += outcome.repairs;
                if config.generator.enable && !outcome.regen_queue.is_empty() {
                    regenerate(&outcome.regen_queue, &runtime.base_path, sink);
                }
            }
            Err(e) => event!(sink, "heal"; "[ERROR] backfill failed: {e:#}"),
        }

        event!(sink, "heal"; "complete: {repairs} assets repaired");
        repairs
    }

    fn commit(&self, config: &RegistryConfig, summary: &CycleSummary) -> bool {
        let sink = self.sink.as_ref();
        let message = format!(
            "{} [{}: {} assets, {} healed]",
            config.repo.commit_message, summary.status, summary.assets, summary.healed
        );
        let backoff = Backoff::from_config(&config.runtime.retry);
        debug!("commit"; "retry delays {:?} (plus jitter)", backoff.delays());

        let mut last = CommitOutcome::Skipped;
        let ok = retry("commit", &backoff, self.sleeper.as_ref(), sink, |_| {
            last = commit_and_push(&config.repo, Some(&message), self.vcs.as_ref(), sink);
            Ok(last.succeeded())
        });
        if let CommitOutcome::Failed(reason) = &last {
            event!(sink, "commit"; "[ERROR] giving up: {reason}");
        }
        ok
    }
}

impl CycleRunner for Orchestrator {
    fn run_cycle(&self) -> CycleSummary {
        self.run()
    }
}
