//! Config store with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and whole-document replacement: a
//! reader always sees one complete registry, never a mix of two loads.
//!
//! Reload policy (checked on every non-forced `load`):
//! - nothing cached yet → read
//! - less than `runtime.reload_interval` since the last check → cached
//! - otherwise stat the file; reload only if its mtime is newer than the
//!   last load, else remember the check time and return the cached value

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, SystemTime},
};

use super::ConfigError;
use crate::config::RegistryConfig;
use crate::config::section::{GeneratorConfig, NotificationsConfig, RepoConfig, RuntimeConfig};
use crate::core::Clock;
use crate::{debug, log};
use crate::utils::path::get_mtime;

struct Loaded {
    config: Arc<RegistryConfig>,
    loaded_at: SystemTime,
    checked_at: SystemTime,
}

/// Cached, self-revalidating registry configuration.
pub struct ConfigStore {
    path: PathBuf,
    root: PathBuf,
    clock: Arc<dyn Clock>,
    current: ArcSwapOption<Loaded>,
    reload_lock: Mutex<()>,
}

impl ConfigStore {
    /// Create a store for `path`. Relative `runtime.base_path` values
    /// resolve against `root`. Nothing is read until the first access.
    pub fn new(path: impl Into<PathBuf>, root: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            root: root.into(),
            clock,
            current: ArcSwapOption::empty(),
            reload_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the registry, reading it when forced, missing or stale.
    ///
    /// A failed background reload keeps the cached document; a failed first
    /// load or forced reload is returned to the caller.
    pub fn load(&self, force: bool) -> Result<Arc<RegistryConfig>, ConfigError> {
        let now = self.clock.now();

        if !force && let Some(cur) = self.current.load_full() {
            if !self.needs_reload(&cur, now) {
                return Ok(Arc::clone(&cur.config));
            }
            return match self.read(now) {
                Ok(config) => Ok(config),
                Err(e) => {
                    log!("warning"; "config reload failed, keeping cached copy: {e}");
                    self.mark_checked(&cur, now);
                    Ok(Arc::clone(&cur.config))
                }
            };
        }

        self.read(now)
    }

    /// Walk the document by dot path; `default` on any miss or failure.
    pub fn get<T: DeserializeOwned>(&self, dot_path: &str, default: T) -> T {
        match self.load(false) {
            Ok(config) => config.get(dot_path, default),
            Err(_) => default,
        }
    }

    pub fn runtime(&self) -> Result<RuntimeConfig, ConfigError> {
        Ok(self.load(false)?.runtime.clone())
    }

    pub fn repo(&self) -> Result<RepoConfig, ConfigError> {
        Ok(self.load(false)?.repo.clone())
    }

    pub fn notifications(&self) -> Result<NotificationsConfig, ConfigError> {
        Ok(self.load(false)?.notifications.clone())
    }

    pub fn generator(&self) -> Result<GeneratorConfig, ConfigError> {
        Ok(self.load(false)?.generator.clone())
    }

    pub fn asset_sources(&self) -> Result<Vec<PathBuf>, ConfigError> {
        Ok(self.load(false)?.asset_sources.clone())
    }

    /// Current cycle interval, re-read through the cache.
    pub fn cycle_interval(&self) -> Result<Duration, ConfigError> {
        self.load(false)?.cycle_interval()
    }

    fn needs_reload(&self, cur: &Loaded, now: SystemTime) -> bool {
        let elapsed = now.duration_since(cur.checked_at).unwrap_or_default();
        if elapsed <= cur.config.runtime.reload_interval() {
            return false;
        }

        let newer = get_mtime(&self.path)
            .is_some_and(|mtime| mtime > cur.loaded_at);
        if !newer {
            self.mark_checked(cur, now);
        }
        newer
    }

    fn mark_checked(&self, cur: &Loaded, now: SystemTime) {
        self.current.store(Some(Arc::new(Loaded {
            config: Arc::clone(&cur.config),
            loaded_at: cur.loaded_at,
            checked_at: now,
        })));
    }

    fn read(&self, now: SystemTime) -> Result<Arc<RegistryConfig>, ConfigError> {
        let _guard = self.reload_lock.lock();

        let content = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound(self.path.clone()),
            _ => ConfigError::Io(self.path.clone(), e),
        })?;

        let (mut config, ignored) = RegistryConfig::parse_with_ignored(&content)
            .map_err(|e| ConfigError::Json(self.path.clone(), e))?;
        if !ignored.is_empty() {
            log!("warning"; "unknown fields in {}: {}", self.path.display(), ignored.join(", "));
        }
        config.finalize(&self.path, &self.root);
        debug!("config"; "loaded {}", self.path.display());

        let config = Arc::new(config);
        self.current.store(Some(Arc::new(Loaded {
            config: Arc::clone(&config),
            loaded_at: now,
            checked_at: now,
        })));
        Ok(config)
    }
}
