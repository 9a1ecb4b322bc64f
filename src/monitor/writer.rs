use anyhow::Result;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error, info};

use super::event::ActivityEvent;

/// Destination for fully-formed events. Abstracting this keeps the receive loop testable
/// and would let appends go somewhere other than the default log file.
pub trait EventSink {
    fn write_event(&mut self, event: ActivityEvent) -> impl std::future::Future<Output = Result<()>>;

    fn finalize(&mut self) -> impl std::future::Future<Output = Result<()>>;
}

/// Receives events from both watchers over a single channel and writes them to the sink.
/// Owning the sink here is what serializes the writes: lines from the two watchers can
/// never interleave their bytes.
pub struct WriterModule<Sink> {
    receiver: Receiver<ActivityEvent>,
    sink: Sink,
}

impl<S: EventSink> WriterModule<S> {
    pub fn new(receiver: Receiver<ActivityEvent>, sink: S) -> Self {
        Self { receiver, sink }
    }

    /// Runs until every sender is dropped. A failed write drops that one event and keeps
    /// the loop alive; logging failures must never take the watchers down with them.
    pub async fn run(mut self) -> Result<()> {
        while let Some(event) = self.receiver.recv().await {
            debug!("Writing event {:?}", event);
            match self.sink.write_event(event.clone()).await {
                Ok(_) => {
                    info!("Wrote event {:?}", event)
                }
                Err(e) => {
                    error!("Error writing event {:?}: {e:?}", event)
                }
            }
        }

        let result = self.sink.finalize().await;
        self.receiver.close();
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    };

    use anyhow::{anyhow, Result};
    use chrono::Local;
    use tokio::sync::mpsc;

    use crate::monitor::event::{ActivityEvent, ActivityKind};

    use super::{EventSink, WriterModule};

    struct FlakySink {
        written: Arc<Mutex<Vec<ActivityEvent>>>,
        fail_next: bool,
        finalized: Arc<AtomicBool>,
    }

    impl EventSink for FlakySink {
        async fn write_event(&mut self, event: ActivityEvent) -> Result<()> {
            if self.fail_next {
                self.fail_next = false;
                return Err(anyhow!("disk full"));
            }
            self.written.lock().unwrap().push(event);
            Ok(())
        }

        async fn finalize(&mut self) -> Result<()> {
            self.finalized.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn launch_event(subject: &str) -> ActivityEvent {
        ActivityEvent {
            timestamp: Local::now(),
            kind: ActivityKind::SoftwareLaunched,
            subject: subject.into(),
            duration_secs: None,
        }
    }

    #[tokio::test]
    async fn write_failure_drops_one_event_and_continues() -> Result<()> {
        let written = Arc::new(Mutex::new(vec![]));
        let finalized = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = mpsc::channel(10);
        let writer = WriterModule::new(
            receiver,
            FlakySink {
                written: written.clone(),
                fail_next: true,
                finalized: finalized.clone(),
            },
        );

        sender.send(launch_event("lost")).await?;
        sender.send(launch_event("kept")).await?;
        drop(sender);

        writer.run().await?;

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(&*written[0].subject, "kept");
        assert!(finalized.load(Ordering::SeqCst));
        Ok(())
    }
}
