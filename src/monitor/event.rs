use std::sync::Arc;

use chrono::{DateTime, Local};

/// What happened. Process exits deliberately have no variant: the log records activity
/// starts, and window time is accounted for by [ActivityKind::WindowChanged].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    SoftwareLaunched,
    WindowActivated,
    WindowChanged,
}

/// A single detected change, constructed once, formatted once, written once.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEvent {
    pub timestamp: DateTime<Local>,
    pub kind: ActivityKind,
    /// Process name or window title, depending on [ActivityEvent::kind].
    pub subject: Arc<str>,
    /// Seconds the window was in the foreground. Only present for
    /// [ActivityKind::WindowChanged].
    pub duration_secs: Option<f64>,
}

/// Renders an event into its log line. Pure: the timestamp is a field of the event, not
/// read from the wall clock here.
pub fn format_event(event: &ActivityEvent) -> String {
    let message = match event.kind {
        ActivityKind::SoftwareLaunched => "Software launched",
        ActivityKind::WindowActivated => "Active window",
        ActivityKind::WindowChanged => "Window closed/changed",
    };
    let mut line = format!(
        "{}: {message}: {}",
        event.timestamp.format("%Y-%m-%d %H:%M:%S"),
        event.subject
    );
    if let Some(duration) = event.duration_secs {
        line.push_str(&format!(" (Duration: {duration:.2} seconds)"));
    }
    line.push('\n');
    line
}
