use clap::{Parser, Subcommand};
use reelmerge_common::MediaKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reelmerge")]
#[command(author, version, about = "Metadata reconciliation engine for media libraries")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile pre-fetched source records from a JSON file
    Reconcile {
        /// JSON array of source records
        #[arg(required = true)]
        input: PathBuf,

        /// Show the deltas without writing them
        #[arg(long)]
        dry_run: bool,

        /// Output the pass report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch one item from the configured providers and reconcile it
    Fetch {
        /// Content key (file checksum)
        key: String,

        /// Title to search providers for
        #[arg(long)]
        title: String,

        /// Movie or series
        #[arg(long, default_value = "series")]
        kind: MediaKind,

        /// Show the deltas without writing them
        #[arg(long)]
        dry_run: bool,

        /// Output the pass report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the canonical record for a content key
    Show {
        /// Content key (file checksum)
        key: String,

        /// Include the merge history
        #[arg(long)]
        history: bool,
    },

    /// Normalize a raw value the way a field would
    Normalize {
        /// Canonical field name (e.g. "resolution")
        field: String,

        /// Raw value
        value: String,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
