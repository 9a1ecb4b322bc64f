use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

use super::DEFAULT_POLL_INTERVAL;

#[derive(Parser)]
#[command(about = "Logs launched software and foreground window time")]
pub struct MonitorArgs {
    /// Where to append activity lines. Defaults to daily_activity.txt in the home
    /// directory.
    #[arg(long = "log-path")]
    pub log_path: Option<PathBuf>,
    /// Seconds between polls of the process list and the foreground window.
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    pub interval: u64,
    /// Detach and keep monitoring in the background.
    #[arg(long)]
    pub daemon: bool,
    /// Internal flag set on the re-executed child after detaching.
    #[arg(long, hide = true)]
    pub force: bool,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
}
