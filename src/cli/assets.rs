//! One-shot asset commands: scan, verify, detect, heal and generate.

use anyhow::{Context, Result, bail};
use std::path::Path;

use super::Env;
use crate::asset::{self, heal::Healer};
use crate::log;
use crate::utils::plural::plural_count;

pub fn scan(env: &Env) -> Result<()> {
    let map = asset::scan::run_scan(&env.config, env.sink.as_ref())?;
    log!("scan"; "{} in merged map", plural_count(map.assets.len(), "asset"));
    Ok(())
}

/// Print the integrity report; fails when any issue is found.
pub fn verify(env: &Env) -> Result<()> {
    let runtime = &env.config.runtime;
    let map = asset::verify::load_merged_map(&runtime.merged_map)?;
    let report = asset::verify::check(&map, &runtime.base_path, env.sink.as_ref());
    println!("{}", report.summary());
    if !report.is_clean() {
        bail!("{} found", plural_count(report.issue_count(), "integrity issue"));
    }
    Ok(())
}

/// Print the mismatch report as JSON.
pub fn detect(env: &Env) -> Result<()> {
    let report = asset::mismatch::detect(&env.config.runtime.asset_root, env.sink.as_ref());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn heal(env: &Env, backfill: bool) -> Result<()> {
    let config = &env.config;
    let runtime = &config.runtime;
    let sink = env.sink.as_ref();
    let healer = Healer::from_runtime(runtime, sink);

    let outcome = if backfill {
        healer.heal(None, &runtime.merged_map)?
    } else {
        let report = asset::mismatch::detect(&runtime.asset_root, sink);
        healer.heal(Some(&report), &runtime.merged_map)?
    };

    if config.generator.enable && !outcome.regen_queue.is_empty() {
        asset::generate::regenerate(&outcome.regen_queue, &runtime.base_path, sink);
    }
    log!("heal"; "{} applied, {} failed", plural_count(outcome.repairs, "repair"), outcome.failures.len());
    Ok(())
}

pub fn generate(
    env: &Env,
    id: &str,
    style: &str,
    output: Option<&Path>,
    register: bool,
) -> Result<()> {
    let config = &env.config;
    let runtime = &config.runtime;
    let output = output.unwrap_or(config.generator.output_dir.as_path());

    let desc = asset::generate::generate(id, style, output, &runtime.base_path)
        .with_context(|| format!("Failed to generate {id}-{style}"))?;
    log!("generate"; "wrote {} ({})", desc.label(), desc.path.as_deref().unwrap_or_default());

    if register {
        asset::generate::register(&desc, &runtime.merged_map)?;
        log!("generate"; "registered {} in {}", desc.label(), runtime.merged_map.display());
        asset::generate::trigger_resync(config, env.sink.as_ref());
    }
    Ok(())
}
