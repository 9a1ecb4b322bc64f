use std::{collections::HashSet, sync::Arc, time::Duration};

use anyhow::Result;
use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::{
    monitor::event::{ActivityEvent, ActivityKind},
    snapshot::SnapshotProvider,
    utils::clock::Clock,
};

/// Diffs one process snapshot against the previous one. Names present in `current` but
/// not in `previous` become SoftwareLaunched events, sorted so output is reproducible.
/// Names that disappeared are ignored: the log records activity starts, not exits.
pub fn poll_once(
    previous: &HashSet<Arc<str>>,
    current: HashSet<Arc<str>>,
    now: DateTime<Local>,
) -> (HashSet<Arc<str>>, Vec<ActivityEvent>) {
    let mut launched: Vec<&Arc<str>> = current.difference(previous).collect();
    launched.sort();

    let events = launched
        .into_iter()
        .map(|name| ActivityEvent {
            timestamp: now,
            kind: ActivityKind::SoftwareLaunched,
            subject: name.clone(),
            duration_secs: None,
        })
        .collect();

    (current, events)
}

/// Watches the running-process set and reports newly launched software.
pub struct ProcessWatcher {
    next: mpsc::Sender<ActivityEvent>,
    provider: Box<dyn SnapshotProvider>,
    shutdown: CancellationToken,
    poll_interval: Duration,
    clock: Box<dyn Clock>,
}

impl ProcessWatcher {
    pub fn new(
        next: mpsc::Sender<ActivityEvent>,
        provider: Box<dyn SnapshotProvider>,
        shutdown: CancellationToken,
        poll_interval: Duration,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            provider,
            shutdown,
            poll_interval,
            clock,
        }
    }

    /// Executes the watcher event loop. The very first snapshot only seeds the baseline:
    /// reporting every process that was already running at startup would be noise.
    pub async fn run(mut self) -> Result<()> {
        let mut previous: Option<HashSet<Arc<str>>> = None;
        let mut poll_point = self.clock.instant();
        loop {
            poll_point += self.poll_interval;

            match self.provider.process_names() {
                Ok(current) => {
                    let (next, events) = match previous.take() {
                        Some(known) => poll_once(&known, current, self.clock.time()),
                        None => (current, Vec::new()),
                    };
                    previous = Some(next);
                    for event in events {
                        self.next
                            .send(event)
                            .await
                            .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
                    }
                }
                Err(e) => {
                    // Transient failure. Skip this cycle's diff; the retained baseline
                    // still covers the next one.
                    warn!("Couldn't read process snapshot {:?}", e)
                }
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.clock.sleep_until(poll_point) => ()
            }
        }
    }
}
