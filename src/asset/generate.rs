//! Variant generation and merged map registration.
//!
//! Generated assets are written as `<id>-<style>.svg` plus a sibling
//! descriptor, then registered into the merged map by id.

use anyhow::{Context, Result};
use std::path::Path;

use super::{
    AssetDescriptor, AssetStatus, BINARY_EXT, DESCRIPTOR_EXT, MapStatus, MergedAssetMap,
    VerifyError,
    scan::run_scan,
    stub::{placeholder_svg, variant_svg},
};
use crate::config::RegistryConfig;
use crate::event;
use crate::logger::EventSink;
use crate::utils::{
    date::now_rfc3339,
    fs::{write_atomic, write_json, write_new},
    path::to_rel_string,
    plural::plural_count,
};

/// Write a variant of `asset_id` in `style` under `output_dir`.
///
/// The descriptor path is relative to `base`.
pub fn generate(asset_id: &str, style: &str, output_dir: &Path, base: &Path) -> Result<AssetDescriptor> {
    let variant_id = format!("{asset_id}-{style}");
    let svg_path = output_dir.join(format!("{variant_id}.{BINARY_EXT}"));
    let json_path = output_dir.join(format!("{variant_id}.{DESCRIPTOR_EXT}"));

    write_atomic(&svg_path, variant_svg(asset_id, style).as_bytes())
        .with_context(|| format!("Failed to write {}", svg_path.display()))?;

    let desc = AssetDescriptor {
        id: Some(variant_id),
        path: Some(to_rel_string(&svg_path, base)),
        category: Some("generated".to_string()),
        style: Some(style.to_string()),
        source_asset: Some(asset_id.to_string()),
        generated_at: Some(now_rfc3339()),
        status: Some(AssetStatus::Regenerated),
        ..Default::default()
    };
    write_json(&json_path, &desc)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;
    Ok(desc)
}

/// Append `desc` to the merged map, replacing any entry with the same id.
///
/// A missing map is created.
pub fn register(desc: &AssetDescriptor, map_path: &Path) -> Result<()> {
    let mut map = match MergedAssetMap::load(map_path) {
        Ok(map) => map,
        Err(VerifyError::MapMissing(_)) => MergedAssetMap {
            generated_at: now_rfc3339(),
            ..Default::default()
        },
        Err(e) => return Err(e.into()),
    };

    match desc.id.as_deref().and_then(|id| map.position(id)) {
        Some(i) => map.assets[i] = desc.clone(),
        None => map.assets.push(desc.clone()),
    }
    if map.status == MapStatus::Empty {
        map.status = MapStatus::Ok;
    }
    map.last_updated = Some(now_rfc3339());

    map.save(map_path)
        .with_context(|| format!("Failed to save merged map {}", map_path.display()))
}

/// Re-run the scanner when `generator.resync` is on. Failures are logged.
pub fn trigger_resync(config: &RegistryConfig, sink: &dyn EventSink) {
    if !config.generator.resync {
        return;
    }
    if let Err(e) = run_scan(config, sink) {
        event!(sink, "generate"; "[ERROR] resync failed: {e:#}");
    }
}

/// Generate and register every configured variant, then resync.
///
/// Returns how many variants were produced.
pub fn run_variants(config: &RegistryConfig, sink: &dyn EventSink) -> usize {
    let generator = &config.generator;
    let runtime = &config.runtime;
    let mut produced = 0;

    for variant in &generator.variants {
        let result = generate(&variant.id, &variant.style, &generator.output_dir, &runtime.base_path)
            .and_then(|desc| register(&desc, &runtime.merged_map).map(|()| desc));
        match result {
            Ok(desc) => {
                produced += 1;
                event!(sink, "generate"; "variant generated: {}", desc.label());
            }
            Err(e) => event!(sink, "generate"; "[ERROR] {}-{}: {e:#}", variant.id, variant.style),
        }
    }

    if produced > 0 {
        trigger_resync(config, sink);
    }
    produced
}

/// Write stub binaries for assets flagged missing.
///
/// Existing files are left alone. Returns how many were written.
pub fn regenerate(queue: &[AssetDescriptor], base: &Path, sink: &dyn EventSink) -> usize {
    let mut written = 0;
    for asset in queue {
        let Some((id, path)) = asset.key() else {
            continue;
        };
        let target = base.join(path);
        match write_new(&target, placeholder_svg(id).as_bytes()) {
            Ok(true) => {
                written += 1;
                event!(sink, "generate"; "[REGENERATED] {id}: {}", target.display());
            }
            Ok(false) => {}
            Err(e) => event!(sink, "generate"; "[ERROR] cannot regenerate {id}: {e}"),
        }
    }
    if !queue.is_empty() {
        event!(sink, "generate"; "{} regenerated", plural_count(written, "asset"));
    }
    written
}
