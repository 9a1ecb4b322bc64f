//! Personal desktop activity logger. Appends a timestamped line to a plain-text file in
//! the home directory whenever new software is launched or the foreground window
//! changes, including how long each window stayed in front.
//!

pub mod monitor;
pub mod snapshot;
pub mod utils;
