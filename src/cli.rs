//! Command-line arguments

use clap::Parser;
use std::path::PathBuf;

/// midi-sliders - clean slider move events from a MIDI surface
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Also write logs to this directory
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log every slider move
    #[arg(short, long)]
    pub verbose: bool,

    /// List available MIDI input ports
    #[arg(long)]
    pub list_ports: bool,
}
