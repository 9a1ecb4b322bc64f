use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    snapshot::{GenericSnapshotProvider, SnapshotProvider},
    utils::clock::{Clock, DefaultClock},
};

use event::ActivityEvent;
use log_file::ActivityLog;
use watch::{process::ProcessWatcher, window::WindowWatcher};
use writer::WriterModule;

pub mod args;
pub mod event;
pub mod log_file;
pub mod shutdown;
pub mod watch;
pub mod writer;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct MonitorOptions {
    pub log_path: PathBuf,
    pub poll_interval: Duration,
}

/// Represents the starting point for the monitor.
///
/// Opens the activity log (fatal if that fails), then runs both watchers and the writer
/// until a shutdown signal arrives. Each watcher owns its own snapshot provider, so a
/// stalled query in one never blocks the other. One watcher failing is partial
/// degradation: its error is logged and the rest keep running.
pub async fn start_monitor(options: MonitorOptions) -> Result<()> {
    let log = ActivityLog::create_or_append(&options.log_path).await?;
    info!("Monitoring activity into {:?}", log.path());

    let (sender, receiver) = mpsc::channel::<ActivityEvent>(10);
    let shutdown_token = CancellationToken::new();

    let process_watcher = create_process_watcher(
        sender.clone(),
        GenericSnapshotProvider::new()?,
        &shutdown_token,
        options.poll_interval,
        DefaultClock,
    );
    let window_watcher = create_window_watcher(
        sender,
        GenericSnapshotProvider::new()?,
        &shutdown_token,
        options.poll_interval,
        DefaultClock,
    );
    let writer = WriterModule::new(receiver, log);

    let (_, process_result, window_result, writer_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token),
        process_watcher.run(),
        window_watcher.run(),
        writer.run(),
    );

    if let Err(process_result) = process_result {
        error!("Process watcher got an error {:?}", process_result);
    }

    if let Err(window_result) = window_result {
        error!("Window watcher got an error {:?}", window_result);
    }

    if let Err(writer_result) = writer_result {
        error!("Writer module got an error {:?}", writer_result);
    }

    Ok(())
}

fn create_process_watcher(
    sender: mpsc::Sender<ActivityEvent>,
    provider: impl SnapshotProvider + 'static,
    shutdown_token: &CancellationToken,
    poll_interval: Duration,
    clock: impl Clock,
) -> ProcessWatcher {
    ProcessWatcher::new(
        sender,
        Box::new(provider),
        shutdown_token.clone(),
        poll_interval,
        Box::new(clock),
    )
}

fn create_window_watcher(
    sender: mpsc::Sender<ActivityEvent>,
    provider: impl SnapshotProvider + 'static,
    shutdown_token: &CancellationToken,
    poll_interval: Duration,
    clock: impl Clock,
) -> WindowWatcher {
    WindowWatcher::new(
        sender,
        Box::new(provider),
        shutdown_token.clone(),
        poll_interval,
        Box::new(clock),
    )
}
