//! Contains logic for sampling the desktop environment: the set of currently
//! running process names and the title of the foreground window.
//! [GenericSnapshotProvider] is the main artifact of this module that abstracts
//! the operations.

pub mod processes;
#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use std::{collections::HashSet, sync::Arc};

use anyhow::Result;

/// Intended to serve as a contract windows and linux systems must implement.
///
/// Both operations read fast-changing OS state and may fail transiently; callers treat a
/// failure as "skip this cycle", never as fatal. A missing foreground window is a normal
/// value, not an error.
#[cfg_attr(test, mockall::automock)]
pub trait SnapshotProvider {
    /// One point-in-time read of the names of all running processes.
    fn process_names(&mut self) -> Result<HashSet<Arc<str>>>;

    /// Title of the current foreground window, or [None] when there is no
    /// foreground window or its title is empty.
    fn active_window_title(&mut self) -> Result<Option<Arc<str>>>;
}

/// Serves as a cross-compatible [SnapshotProvider] implementation.
pub struct GenericSnapshotProvider {
    inner: Box<dyn SnapshotProvider>,
}

impl GenericSnapshotProvider {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsSnapshotProvider;
                Ok(Self {
                    inner: Box::new(WindowsSnapshotProvider::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                use x11::X11SnapshotProvider;
                Ok(Self {
                    inner: Box::new(X11SnapshotProvider::new()?),
                })
            }
            else {
                // This runtime error is needed to allow the project to be compiled for during testing.
                unimplemented!("No snapshot provider was specified")
            }
        }
    }
}

impl SnapshotProvider for GenericSnapshotProvider {
    fn process_names(&mut self) -> Result<HashSet<Arc<str>>> {
        self.inner.process_names()
    }

    fn active_window_title(&mut self) -> Result<Option<Arc<str>>> {
        self.inner.active_window_title()
    }
}
