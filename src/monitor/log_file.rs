use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
};
use tracing::info;

use super::{
    event::{format_event, ActivityEvent},
    writer::EventSink,
};

const LOG_HEADER: &str = "--- Daily Activity Log ---\n";

/// The append-only activity log. Opened once for the lifetime of the process and held
/// under an exclusive advisory lock so a second instance can't interleave its appends.
///
/// An existing file is never truncated. Users keep this file around for months, so the
/// open path can only ever create or append.
pub struct ActivityLog {
    file: File,
    path: PathBuf,
}

impl ActivityLog {
    /// Opens the log at `path`, writing the header line only when the file is created
    /// fresh. Failure here is fatal to the whole monitor: there is no point sampling
    /// activity nobody can record.
    pub async fn create_or_append(path: &Path) -> Result<Self> {
        let file = match OpenOptions::new()
            .append(true)
            .create_new(true)
            .open(path)
            .await
        {
            Ok(mut file) => {
                file.write_all(LOG_HEADER.as_bytes()).await?;
                file.flush().await?;
                info!("Created activity log at {path:?}");
                file
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                info!("Activity log already exists at {path:?}");
                OpenOptions::new().append(true).open(path).await?
            }
            Err(e) => {
                return Err(e).context(format!("Couldn't create activity log at {path:?}"))
            }
        };

        file.try_lock_exclusive()
            .context(format!("Activity log {path:?} is locked by another instance"))?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append_line(&mut self, line: &str) -> Result<()> {
        self.file
            .write_all(line.as_bytes())
            .await
            .context(format!("Couldn't append to activity log {:?}", self.path))?;
        self.file.flush().await?;
        Ok(())
    }
}

impl EventSink for ActivityLog {
    async fn write_event(&mut self, event: ActivityEvent) -> Result<()> {
        self.append_line(&format_event(&event)).await
    }

    async fn finalize(&mut self) -> Result<()> {
        self.file.flush().await?;
        self.file.unlock_async().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::Local;
    use tempfile::tempdir;

    use crate::monitor::{
        event::{ActivityEvent, ActivityKind},
        writer::EventSink,
    };

    use super::{ActivityLog, LOG_HEADER};

    fn window_event(subject: &str) -> ActivityEvent {
        ActivityEvent {
            timestamp: Local::now(),
            kind: ActivityKind::WindowActivated,
            subject: subject.into(),
            duration_secs: None,
        }
    }

    #[tokio::test]
    async fn fresh_log_starts_with_header() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("daily_activity.txt");

        let mut log = ActivityLog::create_or_append(&path).await?;
        log.finalize().await?;

        let content = tokio::fs::read_to_string(&path).await?;
        assert_eq!(content, LOG_HEADER);
        Ok(())
    }

    #[tokio::test]
    async fn existing_log_is_preserved_and_appended() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("daily_activity.txt");

        {
            let mut log = ActivityLog::create_or_append(&path).await?;
            log.write_event(window_event("first run")).await?;
            log.finalize().await?;
        }

        let before = tokio::fs::read_to_string(&path).await?;

        {
            let mut log = ActivityLog::create_or_append(&path).await?;
            log.write_event(window_event("second run")).await?;
            log.finalize().await?;
        }

        let after = tokio::fs::read_to_string(&path).await?;
        assert!(after.starts_with(&before));
        assert_eq!(after.matches(LOG_HEADER.trim_end()).count(), 1);
        assert!(after.trim_end().ends_with("Active window: second run"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_parent_directory_is_fatal() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("no_such_dir").join("daily_activity.txt");

        assert!(ActivityLog::create_or_append(&path).await.is_err());
        Ok(())
    }
}
