//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// DVOS asset runtime: scan, verify, heal and publish design assets
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Registry config path, searched upward from the current directory
    #[arg(
        short = 'C',
        long,
        global = true,
        default_value = "systems/dvos/schema/registry.json",
        value_hint = clap::ValueHint::FilePath
    )]
    pub config: PathBuf,

    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run cycles forever on the configured interval
    #[command(visible_alias = "r")]
    Run,

    /// Run a single full cycle and exit
    #[command(visible_alias = "c")]
    Cycle,

    /// Print the resolved configuration, or one value by dot path
    Config {
        /// Dot path such as `runtime.auto_cycle_interval` or `asset_sources.0`
        key: Option<String>,
    },

    /// Collect descriptors into the merged asset map
    Scan,

    /// Check the merged asset map for missing, duplicate and invalid entries
    Verify,

    /// Report descriptor/binary pairs with one half missing
    Detect,

    /// Repair mismatched pairs, or backfill the merged map
    Heal {
        /// Backfill metadata and flag missing assets in the merged map
        #[arg(long)]
        backfill: bool,
    },

    /// Generate a style variant of an asset
    #[command(visible_alias = "g")]
    Generate {
        /// Base asset id
        id: String,

        /// Style name appended to the id
        style: String,

        /// Output directory (default: generator.output_dir)
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        output: Option<PathBuf>,

        /// Also register the variant in the merged asset map
        #[arg(short, long)]
        register: bool,
    },
}

impl Commands {
    /// Commands whose stdout is a JSON document.
    pub fn prints_json(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Detect)
    }
}
