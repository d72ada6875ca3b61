//! Placeholder payloads for repaired and generated assets.

use serde_json::{Map, Value};

use super::AssetDescriptor;
use crate::utils::date::now_rfc3339;

const WIDTH: u32 = 240;
const HEIGHT: u32 = 64;

/// Minimal valid SVG with `label` centred.
pub fn placeholder_svg(label: &str) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}">
  <rect width="{WIDTH}" height="{HEIGHT}" fill="#1A1A1A" stroke="#FF00FF" stroke-width="2" rx="12" ry="12"/>
  <text x="50%" y="50%" fill="#FFFFFF" font-size="14" text-anchor="middle" dominant-baseline="middle">
    {}
  </text>
</svg>
"##,
        escape(label)
    )
}

/// SVG for a generated `id` variant in `style`.
pub fn variant_svg(id: &str, style: &str) -> String {
    placeholder_svg(&format!("{id} ({style})"))
}

/// Descriptor synthesized for a binary that has none.
pub fn placeholder_descriptor(id: &str, path: String) -> AssetDescriptor {
    let mut extra = Map::new();
    extra.insert(
        "resolution_target".to_string(),
        Value::String(format!("{WIDTH}x{HEIGHT}")),
    );
    extra.insert(
        "description".to_string(),
        Value::String(format!("Auto-generated descriptor for recovered asset '{id}'.")),
    );

    AssetDescriptor {
        id: Some(id.to_string()),
        path: Some(path),
        category: Some("ui".to_string()),
        style: Some("auto-healed".to_string()),
        version: Some("1.0".to_string()),
        auto_optimize: Some(true),
        web_optimized: Some(true),
        last_updated: Some(now_rfc3339()),
        extra,
        ..Default::default()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
