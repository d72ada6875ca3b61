//! Command-line interface module.
//!
//! | Command    | Handler                 |
//! |------------|-------------------------|
//! | `run`      | [`runtime::run_forever`] |
//! | `cycle`    | [`runtime::run_once`]    |
//! | `config`   | [`show::show_config`]   |
//! | `scan`     | [`assets::scan`]        |
//! | `verify`   | [`assets::verify`]      |
//! | `detect`   | [`assets::detect`]      |
//! | `heal`     | [`assets::heal`]        |
//! | `generate` | [`assets::generate`]    |

mod args;
pub mod assets;
pub mod runtime;
pub mod show;

pub use args::{Cli, Commands};

use anyhow::{Result, anyhow};
use std::sync::Arc;

use crate::config::{ConfigStore, RegistryConfig, find_config_file};
use crate::core::SystemClock;
use crate::logger::{EventLog, EventSink};

/// Services shared by every command.
pub struct Env {
    pub store: Arc<ConfigStore>,
    pub config: Arc<RegistryConfig>,
    pub sink: Arc<dyn EventSink>,
}

impl Env {
    /// Locate and load the registry, and open the event log it names.
    pub fn load(cli: &Cli) -> Result<Self> {
        let (path, root) = find_config_file(&cli.config)
            .ok_or_else(|| anyhow!("config file `{}` not found", cli.config.display()))?;
        let store = Arc::new(ConfigStore::new(path, root, Arc::new(SystemClock)));
        let config = store.load(true)?;
        let log = EventLog::new(&config.runtime.log_path);
        // keep stdout clean for commands whose output is JSON
        let sink: Arc<dyn EventSink> = if cli.command.prints_json() {
            Arc::new(log.quiet())
        } else {
            Arc::new(log)
        };
        Ok(Self {
            store,
            config,
            sink,
        })
    }
}

/// Run the selected command.
pub fn dispatch(cli: &Cli) -> Result<()> {
    let env = Env::load(cli)?;
    match &cli.command {
        Commands::Run => runtime::run_forever(&env),
        Commands::Cycle => runtime::run_once(&env),
        Commands::Config { key } => show::show_config(&env, key.as_deref()),
        Commands::Scan => assets::scan(&env),
        Commands::Verify => assets::verify(&env),
        Commands::Detect => assets::detect(&env),
        Commands::Heal { backfill } => assets::heal(&env, *backfill),
        Commands::Generate {
            id,
            style,
            output,
            register,
        } => assets::generate(&env, id, style, output.as_deref(), *register),
    }
}
