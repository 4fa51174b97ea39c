use std::path::PathBuf;

use clap::Parser;
use common::logger::LogFormat;

/// Checks asset prices against configured alert conditions and sends a
/// notification the first time each condition is crossed. Meant to be run
/// from cron or a systemd timer.
#[derive(Debug, Parser)]
#[command(name = "asset-alerts", version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Path to the state file (default: from config, else state.json next to the config file)
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Check prices but don't send notifications
    #[arg(long)]
    pub dry_run: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    pub fn log_format(&self) -> LogFormat {
        if self.json_logs {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}
