use std::{collections::HashSet, sync::Arc};

use anyhow::Result;
use sysinfo::System;
use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowTextW};

use super::{processes::running_process_names, SnapshotProvider};

pub struct WindowsSnapshotProvider {
    system: System,
}

impl WindowsSnapshotProvider {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl SnapshotProvider for WindowsSnapshotProvider {
    #[tracing::instrument(skip(self))]
    fn process_names(&mut self) -> Result<HashSet<Arc<str>>> {
        Ok(running_process_names(&mut self.system))
    }

    #[tracing::instrument(skip(self))]
    fn active_window_title(&mut self) -> Result<Option<Arc<str>>> {
        let window = unsafe { GetForegroundWindow() };

        // No foreground window exists, for example while the lock screen is up. This is a
        // normal reading, not a failure.
        if window.is_invalid() {
            return Ok(None);
        }

        let mut text: [u16; 1024] = [0; 1024];
        let length = unsafe { GetWindowTextW(window, &mut text) };
        if length <= 0 {
            return Ok(None);
        }

        let title = String::from_utf16_lossy(&text[..length as usize]);
        Ok(Some(title.into()))
    }
}
