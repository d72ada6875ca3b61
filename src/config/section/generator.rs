//! `generator` section configuration.
//!
//! Optional variant generation stage of the cycle.
//!
//! # Example
//!
//! ```json
//! "generator": {
//!   "enable": true,
//!   "output_dir": "systems/dvos/assets/generated",
//!   "resync": true,
//!   "variants": [{ "id": "button-primary", "style": "energetic-creator" }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::path::resolve_path;

/// Variant generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Run the generation stage (and regenerate flagged assets) each cycle.
    pub enable: bool,

    /// Where generated variants are written.
    pub output_dir: PathBuf,

    /// Re-run the scanner after registering variants.
    pub resync: bool,

    /// Variants produced every cycle.
    pub variants: Vec<VariantSpec>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            enable: false,
            output_dir: PathBuf::from("systems/dvos/assets/generated"),
            resync: true,
            variants: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    pub fn normalize(&mut self, base: &Path) {
        self.output_dir = resolve_path(&self.output_dir, base);
    }
}

/// One `(base id, style)` pair to derive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSpec {
    pub id: String,
    pub style: String,
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_generator_config() {
        let config = test_parse_config(
            r#"{"generator": {"enable": true, "variants": [{"id": "button-primary", "style": "neon"}]}}"#,
        );
        assert!(config.generator.enable);
        assert!(config.generator.resync);
        assert_eq!(config.generator.variants.len(), 1);
        assert_eq!(config.generator.variants[0].style, "neon");
    }

    #[test]
    fn test_generator_config_defaults() {
        let config = test_parse_config("{}");
        assert!(!config.generator.enable);
        assert!(config.generator.variants.is_empty());
    }
}
