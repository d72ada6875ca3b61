//! Registry configuration management.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── runtime    # paths, interval, healing policy
//! │   ├── repo       # auto-commit target
//! │   ├── notifications
//! │   └── generator
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError
//! │   ├── handle     # ConfigStore (cached, reloadable)
//! │   └── interval   # "5m" / "6h" parsing
//! └── mod.rs         # RegistryConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section          | Purpose                                        |
//! |------------------|------------------------------------------------|
//! | `runtime`        | Paths, cycle interval, heal/flag/prune policy  |
//! | `repo`           | Auto-commit and push target                    |
//! | `notifications`  | Webhook destinations, filters, style           |
//! | `generator`      | Variant generation stage                       |
//! | `asset_sources`  | Directories the scanner collects from          |
//! | `metadata`       | Free-form, reachable through dot-path `get`    |

pub mod section;
pub mod types;
mod util;

pub use util::{extract_host, find_config_file};

pub use section::{
    Destination, DestinationKind, GeneratorConfig, NotificationsConfig, RepoConfig, RuntimeConfig,
    VariantSpec,
};
pub use types::{ConfigError, ConfigStore, parse_interval};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::utils::path::resolve_path;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing the registry document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory the config file was found from (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// The document as read, for dot-path lookups.
    #[serde(skip)]
    pub raw: Value,

    pub runtime: RuntimeConfig,
    pub repo: RepoConfig,
    pub notifications: NotificationsConfig,
    pub generator: GeneratorConfig,

    /// Directories scanned for descriptors, relative to `runtime.base_path`.
    pub asset_sources: Vec<PathBuf>,

    pub metadata: Map<String, Value>,

    pub visual_profile: Option<String>,
}

impl RegistryConfig {
    /// Parse JSON content, collecting any unknown fields.
    pub fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), serde_json::Error> {
        let raw: Value = serde_json::from_str(content)?;

        let mut ignored = Vec::new();
        let mut config: Self = serde_ignored::deserialize(raw.clone(), |path| {
            ignored.push(path.to_string());
        })?;
        config.raw = raw;
        Ok((config, ignored))
    }

    /// Record where the document came from and resolve every path.
    pub fn finalize(&mut self, config_path: &Path, root: &Path) {
        self.config_path = config_path.to_path_buf();
        self.root = root.to_path_buf();

        self.runtime.normalize(root);
        let base = self.runtime.base_path.clone();
        self.generator.normalize(&base);
        for source in &mut self.asset_sources {
            *source = resolve_path(source, &base);
        }
    }

    /// Walk the raw document by dot path.
    ///
    /// Returns `default` on a missing segment or when the value does not
    /// deserialize into `T`.
    pub fn get<T: DeserializeOwned>(&self, dot_path: &str, default: T) -> T {
        util::lookup(&self.raw, dot_path)
            .and_then(|value| T::deserialize(value).ok())
            .unwrap_or(default)
    }

    pub fn cycle_interval(&self) -> Result<Duration, ConfigError> {
        parse_interval(&self.runtime.auto_cycle_interval)
    }
}

/// Parse a registry document for section tests, rejecting unknown fields.
#[cfg(test)]
pub fn test_parse_config(json: &str) -> RegistryConfig {
    let (parsed, ignored) = RegistryConfig::parse_with_ignored(json).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
