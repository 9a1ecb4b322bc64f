use std::{sync::Arc, time::Duration};

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

/// One maximal contiguous interval during which the foreground window's title did not
/// change. The title is displayed text, not a stable process identity. At most one
/// session exists at a time; it becomes final the moment its successor starts.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSession {
    pub title: Arc<str>,
    pub started_at: DateTime<Local>,
}

/// Closes a session, accounting the time it spent in the foreground. The duration is
/// clamped at zero so a clock step backwards can't produce a negative reading.
pub fn close_event(session: &WindowSession, now: DateTime<Local>) -> ActivityEvent {
    let duration = (now - session.started_at).num_milliseconds() as f64 / 1000.0;
    ActivityEvent {
        timestamp: now,
        kind: ActivityKind::WindowChanged,
        subject: session.title.clone(),
        duration_secs: Some(duration.max(0.0)),
    }
}

/// Applies one title observation to the current session.
///
/// An absent or empty title is "no change": a transient failure to read the title must
/// not end the session or reset its start time. A differing title closes the previous
/// session (if any) and activates the new one; both resulting events belong together
/// and are returned as one batch.
pub fn observe(
    session: Option<WindowSession>,
    observed: Option<Arc<str>>,
    now: DateTime<Local>,
) -> (Option<WindowSession>, Vec<ActivityEvent>) {
    let Some(title) = observed.filter(|title| !title.is_empty()) else {
        return (session, Vec::new());
    };

    if let Some(current) = &session {
        if current.title == title {
            return (session, Vec::new());
        }
    }

    let mut events = Vec::with_capacity(2);
    if let Some(previous) = &session {
        events.push(close_event(previous, now));
    }
    events.push(ActivityEvent {
        timestamp: now,
        kind: ActivityKind::WindowActivated,
        subject: title.clone(),
        duration_secs: None,
    });

    let next = WindowSession {
        title,
        started_at: now,
    };
    (Some(next), events)
}

/// Watches the foreground window and reports activations and the time spent on each
/// window before switching away.
pub struct WindowWatcher {
    next: mpsc::Sender<ActivityEvent>,
    provider: Box<dyn SnapshotProvider>,
    shutdown: CancellationToken,
    poll_interval: Duration,
    clock: Box<dyn Clock>,
}

impl WindowWatcher {
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

    /// Executes the watcher event loop. On shutdown the in-progress session is flushed
    /// as a final WindowChanged event so its time isn't silently lost.
    pub async fn run(mut self) -> Result<()> {
        let mut session: Option<WindowSession> = None;
        let mut poll_point = self.clock.instant();
        loop {
            poll_point += self.poll_interval;

            match self.provider.active_window_title() {
                Ok(observed) => {
                    let (next, events) = observe(session.take(), observed, self.clock.time());
                    session = next;
                    for event in events {
                        self.next
                            .send(event)
                            .await
                            .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
                    }
                }
                Err(e) => {
                    // Transient failure. The current session stays open untouched.
                    warn!("Couldn't read foreground window title {:?}", e)
                }
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    if let Some(last) = session.take() {
                        let event = close_event(&last, self.clock.time());
                        if let Err(e) = self.next.send(event).await {
                            error!("Couldn't flush final session {e:?}");
                        }
                    }
                    return Ok(())
                }
                _ = self.clock.sleep_until(poll_point) => ()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};

    use crate::monitor::event::ActivityKind;

    use super::{close_event, observe, WindowSession};

    fn base_time() -> DateTime<Local> {
        let naive = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Local.from_utc_datetime(&naive)
    }

    fn title(value: &str) -> Option<Arc<str>> {
        Some(Arc::from(value))
    }

    #[test]
    fn first_observation_only_activates() {
        let (session, events) = observe(None, title("Editor"), base_time());

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ActivityKind::WindowActivated);
        assert_eq!(&*events[0].subject, "Editor");
        assert_eq!(events[0].duration_secs, None);
        let session = session.unwrap();
        assert_eq!(&*session.title, "Editor");
        assert_eq!(session.started_at, base_time());
    }

    #[test]
    fn unchanged_title_emits_nothing() {
        let (session, _) = observe(None, title("Editor"), base_time());
        let (session, events) = observe(session, title("Editor"), base_time() + Duration::seconds(5));

        assert!(events.is_empty());
        // started_at must still point at the first observation
        assert_eq!(session.unwrap().started_at, base_time());
    }

    #[test]
    fn absent_title_does_not_close_or_reset_the_session() {
        let (session, _) = observe(None, title("Editor"), base_time());

        let (session, events) = observe(session, None, base_time() + Duration::seconds(5));
        assert!(events.is_empty());

        let (session, events) = observe(session, title(""), base_time() + Duration::seconds(10));
        assert!(events.is_empty());

        let (session, events) =
            observe(session, title("Editor"), base_time() + Duration::seconds(15));
        assert!(events.is_empty());
        assert_eq!(session.unwrap().started_at, base_time());
    }

    #[test]
    fn title_change_closes_previous_and_activates_next() {
        let (session, _) = observe(None, title("Editor"), base_time());
        let switch_at = base_time() + Duration::milliseconds(12_500);
        let (session, events) = observe(session, title("Browser"), switch_at);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, ActivityKind::WindowChanged);
        assert_eq!(&*events[0].subject, "Editor");
        assert_eq!(events[0].duration_secs, Some(12.5));
        assert_eq!(events[1].kind, ActivityKind::WindowActivated);
        assert_eq!(&*events[1].subject, "Browser");

        let session = session.unwrap();
        assert_eq!(&*session.title, "Browser");
        assert_eq!(session.started_at, switch_at);
    }

    #[test]
    fn sampled_title_sequence_accounts_all_time() {
        let titles = ["Editor", "Editor", "Browser", "Browser", "Terminal"];
        let interval = Duration::seconds(5);

        let mut session = None;
        let mut events = vec![];
        for (cycle, value) in titles.into_iter().enumerate() {
            let now = base_time() + interval * cycle as i32;
            let (next, mut batch) = observe(session, title(value), now);
            session = next;
            events.append(&mut batch);
        }

        let changed: Vec<_> = events
            .iter()
            .filter(|e| e.kind == ActivityKind::WindowChanged)
            .collect();
        let activated: Vec<_> = events
            .iter()
            .filter(|e| e.kind == ActivityKind::WindowActivated)
            .collect();

        assert_eq!(activated.len(), 3);
        assert_eq!(changed.len(), 2);
        assert_eq!(&*changed[0].subject, "Editor");
        assert_eq!(changed[0].duration_secs, Some(10.0));
        assert_eq!(&*changed[1].subject, "Browser");
        assert_eq!(changed[1].duration_secs, Some(10.0));
    }

    #[test]
    fn close_event_clamps_negative_durations_to_zero() {
        let session = WindowSession {
            title: "Editor".into(),
            started_at: base_time(),
        };
        let event = close_event(&session, base_time() - Duration::seconds(3));
        assert_eq!(event.duration_secs, Some(0.0));
    }
}
