//! Periodic cycle scheduling.
//!
//! Cycles never overlap: a trigger while one is running is skipped. The
//! interval is re-read from the config after every cycle, so edits take
//! effect without a restart. Sleeping happens in short slices so Ctrl+C is
//! noticed quickly; a cycle in flight always completes.

use parking_lot::Mutex;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::config::ConfigStore;
use crate::core::{Sleeper, is_shutdown};
use crate::cycle::{CycleRunner, CycleSummary};
use crate::event;
use crate::logger::EventSink;

/// Used until the config yields a valid interval.
const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);
const DEFAULT_MIN_SLEEP: Duration = Duration::from_secs(5);

/// Longest single sleep between shutdown checks.
const SLEEP_SLICE: Duration = Duration::from_secs(1);

pub struct Scheduler {
    runner: Arc<dyn CycleRunner>,
    store: Arc<ConfigStore>,
    sleeper: Arc<dyn Sleeper>,
    sink: Arc<dyn EventSink>,
    guard: Mutex<()>,
}

impl Scheduler {
    pub fn new(
        runner: Arc<dyn CycleRunner>,
        store: Arc<ConfigStore>,
        sleeper: Arc<dyn Sleeper>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            runner,
            store,
            sleeper,
            sink,
            guard: Mutex::new(()),
        }
    }

    /// Run one cycle unless another is in progress.
    pub fn trigger(&self) -> Option<CycleSummary> {
        let Some(_running) = self.guard.try_lock() else {
            event!(self.sink, "scheduler"; "[SKIP] previous cycle still running");
            return None;
        };
        event!(self.sink, "scheduler"; "==== cycle start ====");
        let summary = self.runner.run_cycle();
        event!(self.sink, "scheduler"; "==== cycle complete ({}) ====", summary.status);
        Some(summary)
    }

    /// Loop until Ctrl+C.
    pub fn run(&self) {
        self.run_with(&is_shutdown);
    }

    /// Loop until `stop` returns true. `stop` is checked before every cycle
    /// and between sleep slices.
    pub fn run_with(&self, stop: &dyn Fn() -> bool) {
        let mut interval = DEFAULT_INTERVAL;
        let mut floor = DEFAULT_MIN_SLEEP;

        while !stop() {
            let started = Instant::now();
            self.trigger();

            match self.store.cycle_interval() {
                Ok(next) => interval = next,
                Err(e) => event!(
                    self.sink, "scheduler";
                    "[WARN] invalid cycle interval, keeping {}s: {e}",
                    interval.as_secs()
                ),
            }
            if let Ok(runtime) = self.store.runtime() {
                floor = runtime.min_sleep();
            }

            let wait = next_sleep(interval, started.elapsed(), floor);
            event!(self.sink, "scheduler"; "next cycle in {}s", wait.as_secs());
            self.sleep_until_stopped(wait, stop);
        }
        event!(self.sink, "scheduler"; "stopped");
    }

    fn sleep_until_stopped(&self, total: Duration, stop: &dyn Fn() -> bool) {
        let mut remaining = total;
        while !remaining.is_zero() && !stop() {
            let slice = remaining.min(SLEEP_SLICE);
            self.sleeper.sleep(slice);
            remaining -= slice;
        }
    }
}

/// Time left in the interval after a cycle took `elapsed`, never below `floor`.
pub fn next_sleep(interval: Duration, elapsed: Duration, floor: Duration) -> Duration {
    interval.saturating_sub(elapsed).max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RecordingSleeper, SystemClock};
    use crate::logger::MemorySink;
    use std::{
        fs,
        sync::{
            atomic::{AtomicUsize, Ordering},
            mpsc,
        },
        thread,
    };
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingRunner {
        runs: AtomicUsize,
    }

    impl CycleRunner for CountingRunner {
        fn run_cycle(&self) -> CycleSummary {
            self.runs.fetch_add(1, Ordering::SeqCst);
            CycleSummary::default()
        }
    }

    /// Blocks inside the cycle until released.
    struct BlockingRunner {
        started: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl CycleRunner for BlockingRunner {
        fn run_cycle(&self) -> CycleSummary {
            self.started.lock().send(()).ok();
            self.release.lock().recv().ok();
            CycleSummary::default()
        }
    }

    fn store_with(dir: &TempDir, runtime: &str) -> Arc<ConfigStore> {
        let path = dir.path().join("registry.json");
        fs::write(&path, format!(r#"{{"runtime": {runtime}}}"#)).unwrap();
        Arc::new(ConfigStore::new(path, dir.path(), Arc::new(SystemClock)))
    }

    #[test]
    fn test_next_sleep() {
        let secs = Duration::from_secs;
        assert_eq!(next_sleep(secs(300), secs(20), secs(5)), secs(280));
        assert_eq!(next_sleep(secs(300), secs(299), secs(5)), secs(5));
        assert_eq!(next_sleep(secs(300), secs(900), secs(5)), secs(5));
    }

    #[test]
    fn test_overlapping_trigger_is_skipped() {
        let dir = TempDir::new().unwrap();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let runner = Arc::new(BlockingRunner {
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
        });
        let sink = Arc::new(MemorySink::new());
        let scheduler = Scheduler::new(
            runner,
            store_with(&dir, "{}"),
            Arc::new(RecordingSleeper::new()),
            sink.clone(),
        );

        thread::scope(|s| {
            let first = s.spawn(|| scheduler.trigger());
            started_rx.recv().unwrap();

            assert!(scheduler.trigger().is_none());

            release_tx.send(()).unwrap();
            assert!(first.join().unwrap().is_some());
        });
        assert!(sink.contains("previous cycle still running"));
    }

    #[test]
    fn test_run_until_stopped() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(CountingRunner::default());
        let sleeper = Arc::new(RecordingSleeper::new());
        let scheduler = Scheduler::new(
            runner.clone(),
            store_with(&dir, r#"{"auto_cycle_interval": "3s", "min_sleep": 1}"#),
            sleeper.clone(),
            Arc::new(MemorySink::new()),
        );

        scheduler.run_with(&|| runner.runs.load(Ordering::SeqCst) >= 2);

        assert_eq!(runner.runs.load(Ordering::SeqCst), 2);
        // one wait between the two cycles, cut into slices
        let slept = sleeper.slept();
        assert!(!slept.is_empty());
        assert!(slept.iter().all(|d| *d <= SLEEP_SLICE));
        assert!(sleeper.total() <= Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_interval_keeps_last_good() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(CountingRunner::default());
        let sink = Arc::new(MemorySink::new());
        let scheduler = Scheduler::new(
            runner.clone(),
            store_with(&dir, r#"{"auto_cycle_interval": "often"}"#),
            Arc::new(RecordingSleeper::new()),
            sink.clone(),
        );

        scheduler.run_with(&|| runner.runs.load(Ordering::SeqCst) >= 1);

        assert!(sink.contains("invalid cycle interval, keeping 300s"));
        assert!(sink.contains("next cycle in 300s") || sink.contains("next cycle in 299s"));
    }

    #[test]
    fn test_stop_before_first_cycle() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(CountingRunner::default());
        let scheduler = Scheduler::new(
            runner.clone(),
            store_with(&dir, "{}"),
            Arc::new(RecordingSleeper::new()),
            Arc::new(MemorySink::new()),
        );
        scheduler.run_with(&|| true);
        assert_eq!(runner.runs.load(Ordering::SeqCst), 0);
    }
}
