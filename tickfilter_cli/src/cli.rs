//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "tickfilter", version, about = "Tick filter CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/tickfilter.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded event file through a configured filter
    Replay {
        /// JSON-lines event file: {"t": <seconds>, "state": <value>, "unit": ...}
        #[arg(long, value_name = "FILE")]
        events: PathBuf,

        /// Which [[sensor]] table to run (unique_id or source); default first
        #[arg(long, value_name = "ID")]
        sensor: Option<String>,

        /// Playback speed multiplier (2.0 replays twice as fast)
        #[arg(long, value_name = "FACTOR", default_value_t = 1.0)]
        speed: f64,

        /// Seed the estimate from a previously persisted value
        #[arg(long, value_name = "VALUE")]
        restore: Option<f64>,
    },
    /// Parse and validate the config, then exit
    CheckConfig,
}
