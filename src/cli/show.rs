//! `config` command.

use anyhow::Result;
use serde_json::{Value, json};

use super::Env;
use crate::config::ConfigStore;

/// Print one value by dot path, or every section as the store resolves it.
pub fn show_config(env: &Env, key: Option<&str>) -> Result<()> {
    let value = match key {
        Some(key) => env.store.get(key, Value::Null),
        None => resolved_sections(&env.store)?,
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Sections after defaults and path resolution.
fn resolved_sections(store: &ConfigStore) -> Result<Value> {
    let interval = store.cycle_interval()?;
    Ok(json!({
        "config_path": store.path(),
        "runtime": store.runtime()?,
        "cycle_interval_secs": interval.as_secs(),
        "repo": store.repo()?,
        "notifications": store.notifications()?,
        "generator": store.generator()?,
        "asset_sources": store.asset_sources()?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SystemClock;
    use std::{fs, sync::Arc};
    use tempfile::TempDir;

    #[test]
    fn test_resolved_sections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        fs::write(
            &path,
            r#"{"runtime": {"auto_cycle_interval": "2h"}, "asset_sources": ["assets/ui"]}"#,
        )
        .unwrap();
        let store = ConfigStore::new(&path, dir.path(), Arc::new(SystemClock));

        let value = resolved_sections(&store).unwrap();
        assert_eq!(value["cycle_interval_secs"], 7200);
        assert_eq!(value["repo"]["branch"], "main");
        assert_eq!(value["generator"]["enable"], false);
        let source = value["asset_sources"][0].as_str().unwrap();
        assert!(source.ends_with("assets/ui"));
        assert_eq!(store.get("runtime.auto_cycle_interval", Value::Null), "2h");
    }
}
