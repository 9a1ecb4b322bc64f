use std::{collections::HashSet, sync::Arc};

use sysinfo::{ProcessesToUpdate, System};

/// Collects the distinct names of all currently running processes. The [System] is reused
/// between calls so sysinfo only refreshes the process table instead of rebuilding it.
pub fn running_process_names(system: &mut System) -> HashSet<Arc<str>> {
    system.refresh_processes(ProcessesToUpdate::All, true);
    system
        .processes()
        .values()
        .map(|process| Arc::from(process.name().to_string_lossy()))
        .collect()
}
