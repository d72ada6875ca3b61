use super::*;
use crate::core::{RecordingSleeper, SystemClock};
use crate::logger::MemorySink;
use crate::publish::{commit::fake::FakeVcs, notify::fake::FakeTransport};
use serde_json::json;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    root: PathBuf,
    sink: Arc<MemorySink>,
    vcs: Arc<FakeVcs>,
    transport: Arc<FakeTransport>,
    orchestrator: Orchestrator,
}

fn write_pair(root: &Path, id: &str) {
    let dir = root.join("assets/ui");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{id}.svg")), "<svg/>").unwrap();
    let desc = json!({
        "id": id,
        "path": format!("assets/ui/{id}.svg"),
        "category": "ui",
        "version": "1.0",
        "auto_optimize": true,
        "web_optimized": true,
        "last_updated": "2025-01-01T00:00:00Z"
    });
    fs::write(dir.join(format!("{id}.json")), desc.to_string()).unwrap();
}

fn harness(runtime: serde_json::Value, vcs: FakeVcs) -> Harness {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();

    let mut runtime_doc = json!({
        "asset_root": "assets",
        "merged_map": "runtime/merged-asset-map.json",
        "log_path": "runtime/asset-sync.log",
        "retry": { "attempts": 2, "base_delay": 0.0 }
    });
    if let (Some(base), Some(extra)) = (runtime_doc.as_object_mut(), runtime.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    let doc = json!({
        "runtime": runtime_doc,
        "repo": { "auto_commit": true },
        "notifications": { "webhook_url": "https://hooks.test/dvos" }
    });
    let config_path = root.join("registry.json");
    fs::write(&config_path, doc.to_string()).unwrap();

    let sink = Arc::new(MemorySink::new());
    let vcs = Arc::new(vcs);
    let transport = Arc::new(FakeTransport::default());
    let store = Arc::new(ConfigStore::new(&config_path, &root, Arc::new(SystemClock)));
    let orchestrator = Orchestrator::new(
        store,
        sink.clone(),
        vcs.clone(),
        transport.clone(),
        Arc::new(RecordingSleeper::new()),
    );

    Harness {
        _dir: dir,
        root,
        sink,
        vcs,
        transport,
        orchestrator,
    }
}

#[test]
fn test_cycle_heals_orphan_binary() {
    let h = harness(json!({}), FakeVcs::dirty());
    for id in ["a", "b", "c"] {
        write_pair(&h.root, id);
    }
    fs::write(h.root.join("assets/ui/d.svg"), "<svg/>").unwrap();

    let summary = h.orchestrator.run();

    assert_eq!(summary.assets, 3);
    assert_eq!(summary.healed, 1);
    assert_eq!(summary.status, CycleStatus::Healed);
    assert!(summary.commit);
    assert!(summary.notified);
    assert!(summary.error.is_none());

    assert!(h.root.join("assets/ui/d.json").exists());
    assert!(h.root.join("runtime/merged-asset-map.json").exists());
    assert_eq!(h.vcs.subcommands(), vec!["status", "add", "commit", "push"]);
    assert_eq!(h.transport.post_count(), 1);
    assert!(h.sink.contains("--- Starting DVOS Cycle ---"));
    assert!(h.sink.contains("--- DVOS Cycle Complete ---"));
}

#[test]
fn test_second_cycle_is_clean() {
    let h = harness(json!({}), FakeVcs::default());
    write_pair(&h.root, "a");
    fs::write(h.root.join("assets/ui/b.svg"), "<svg/>").unwrap();

    let first = h.orchestrator.run();
    assert_eq!(first.status, CycleStatus::Healed);

    // b.json now exists and is picked up by the scan
    let second = h.orchestrator.run();
    assert_eq!(second.status, CycleStatus::Ok);
    assert_eq!(second.assets, 2);
    assert_eq!(second.healed, 0);
    // clean working tree counts as a successful commit step
    assert!(second.commit);
}

#[test]
fn test_issues_left_when_auto_heal_disabled() {
    let h = harness(json!({ "auto_heal": false }), FakeVcs::default());
    write_pair(&h.root, "a");
    fs::write(h.root.join("assets/ui/orphan.svg"), "<svg/>").unwrap();

    let summary = h.orchestrator.run();

    assert_eq!(summary.status, CycleStatus::Issues);
    assert_eq!(summary.healed, 0);
    assert!(!h.root.join("assets/ui/orphan.json").exists());
    assert!(h.sink.contains("auto_heal disabled"));
}

#[test]
fn test_missing_file_is_flagged() {
    let h = harness(json!({}), FakeVcs::default());
    write_pair(&h.root, "a");
    // descriptor points at a file that was never written
    let ghost = json!({
        "id": "ghost",
        "path": "assets/img/ghost.png",
        "category": "ui",
        "version": "1.0",
        "auto_optimize": true,
        "web_optimized": true,
        "last_updated": "2025-01-01T00:00:00Z"
    });
    fs::write(h.root.join("assets/ui/ghost.json"), ghost.to_string()).unwrap();

    let summary = h.orchestrator.run();

    // stub ghost.svg for the mismatch, plus the flag in the map
    assert_eq!(summary.status, CycleStatus::Healed);
    assert_eq!(summary.healed, 2);
    assert!(h.root.join("assets/ui/ghost.svg").exists());

    let map = load_merged_map(&h.root.join("runtime/merged-asset-map.json")).unwrap();
    let flagged = &map.assets[map.position("ghost").unwrap()];
    assert_eq!(flagged.status, Some(crate::asset::AssetStatus::Missing));

    // the flag lives in ghost.json now, so it is not applied twice
    let again = h.orchestrator.run();
    assert_eq!(again.healed, 0);
    assert_eq!(again.status, CycleStatus::Issues);
}

#[test]
fn test_backfill_runs_on_clean_tree() {
    let h = harness(json!({}), FakeVcs::default());
    let dir = h.root.join("assets/ui");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("bare.svg"), "<svg/>").unwrap();
    fs::write(
        dir.join("bare.json"),
        json!({"id": "bare", "path": "assets/ui/bare.svg", "version": "2.0"}).to_string(),
    )
    .unwrap();

    let summary = h.orchestrator.run();

    // last_updated, auto_optimize and web_optimized defaulted in the map
    assert_eq!(summary.status, CycleStatus::Healed);
    assert_eq!(summary.healed, 3);
    let map = load_merged_map(&h.root.join("runtime/merged-asset-map.json")).unwrap();
    assert_eq!(map.assets[0].version.as_deref(), Some("2.0"));
    assert_eq!(map.assets[0].web_optimized, Some(true));
}

#[test]
fn test_missing_config_is_error_without_notify() {
    let dir = TempDir::new().unwrap();
    let sink = Arc::new(MemorySink::new());
    let transport = Arc::new(FakeTransport::default());
    let store = Arc::new(ConfigStore::new(
        dir.path().join("registry.json"),
        dir.path(),
        Arc::new(SystemClock),
    ));
    let orchestrator = Orchestrator::new(
        store,
        sink.clone(),
        Arc::new(FakeVcs::default()),
        transport.clone(),
        Arc::new(RecordingSleeper::new()),
    );

    let summary = orchestrator.run();

    assert_eq!(summary.status, CycleStatus::Error);
    assert!(summary.error.as_deref().is_some_and(|e| e.starts_with("config")));
    assert!(!summary.notified);
    assert_eq!(transport.post_count(), 0);
    assert!(sink.contains("--- DVOS Cycle Complete ---"));
}

#[test]
fn test_scan_failure_still_notifies() {
    // the merged map's parent is a plain file, so writing it fails
    let h = harness(json!({ "merged_map": "blocker/map.json" }), FakeVcs::dirty());
    write_pair(&h.root, "a");
    fs::write(h.root.join("blocker"), "not a directory").unwrap();

    let summary = h.orchestrator.run();

    assert_eq!(summary.status, CycleStatus::Error);
    assert!(summary.error.as_deref().is_some_and(|e| e.starts_with("scan")));
    assert!(!summary.commit);
    assert!(h.vcs.calls.lock().is_empty());
    assert!(summary.notified);
    assert_eq!(h.transport.post_count(), 1);
}

#[test]
fn test_commit_failure_is_retried_then_reported() {
    let h = harness(json!({}), FakeVcs::failing("push", None));
    write_pair(&h.root, "a");

    let summary = h.orchestrator.run();

    assert_eq!(summary.status, CycleStatus::Ok);
    assert!(!summary.commit);
    let pushes = h.vcs.subcommands().iter().filter(|c| *c == "push").count();
    assert_eq!(pushes, 2);
    assert!(h.sink.contains("gave up after 2 attempts"));
}

#[test]
fn test_backfilled_descriptor_converges() {
    let h = harness(json!({}), FakeVcs::dirty());
    write_pair(&h.root, "a");
    let source = h.root.join("assets/ui/a.json");
    let mut desc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&source).unwrap()).unwrap();
    desc.as_object_mut().unwrap().remove("web_optimized");
    fs::write(&source, desc.to_string()).unwrap();

    let first = h.orchestrator.run();
    assert_eq!(first.status, CycleStatus::Healed);
    assert_eq!(first.healed, 1);
    assert!(fs::read_to_string(&source).unwrap().contains("web_optimized"));

    let second = h.orchestrator.run();
    assert_eq!(second.status, CycleStatus::Ok);
    assert_eq!(second.healed, 0);
    assert!(second.commit);
    // one commit for the repair, nothing afterwards
    let commits = h.vcs.subcommands().iter().filter(|c| *c == "commit").count();
    assert_eq!(commits, 1);
}

#[test]
fn test_push_retried_after_partial_commit() {
    let h = harness(json!({}), FakeVcs::failing("push", Some(1)));
    write_pair(&h.root, "a");

    let summary = h.orchestrator.run();

    assert!(summary.commit);
    assert_eq!(
        h.vcs.subcommands(),
        vec!["status", "add", "commit", "push", "status", "push"]
    );
    assert!(h.sink.contains("pushed to origin/main"));
}

#[test]
fn test_backfill_write_failure_does_not_stop_cycle() {
    let h = harness(json!({}), FakeVcs::dirty());
    let dir = h.root.join("assets/ui");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("bare.svg"), "<svg/>").unwrap();
    fs::write(
        dir.join("bare.json"),
        json!({"id": "bare", "path": "assets/ui/bare.svg"}).to_string(),
    )
    .unwrap();
    // a directory where the descriptor's temp file goes makes the write-back fail
    fs::create_dir_all(dir.join(".bare.json.tmp")).unwrap();

    let summary = h.orchestrator.run();

    assert!(h.sink.contains("RepairSoftFailure"));
    assert_eq!(summary.status, CycleStatus::Healed);
    assert!(summary.error.is_none());
    assert!(summary.commit);
    assert!(summary.notified);
    assert_eq!(h.transport.post_count(), 1);
}
