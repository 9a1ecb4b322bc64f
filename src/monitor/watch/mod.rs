//! The two sampling loops. Each watcher polls its own slice of the environment, diffs
//! against its prior snapshot, and sends derived events into the shared writer channel.
//! The watchers never talk to each other.

pub mod process;
pub mod window;
