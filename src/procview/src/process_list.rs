//! Process discovery
//!
//! The read-only list of running processes a selection UI (or the CLI)
//! offers for attaching. Discovery policy beyond what the OS reports is
//! out of scope here.

use serde::Serialize;
use sysinfo::System;

/// One selectable process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
}

/// All processes visible to the caller, sorted by pid.
pub fn list_processes() -> Vec<ProcessEntry> {
    let mut system = System::new_all();
    system.refresh_all();

    let mut entries: Vec<ProcessEntry> = system
        .processes()
        .values()
        .map(|process| ProcessEntry {
            pid: process.pid().as_u32(),
            name: process.name().to_string_lossy().into_owned(),
        })
        .collect();

    entries.sort_by_key(|entry| entry.pid);
    entries
}

/// Display name for a single pid, for building a process identity from a
/// bare id.
pub fn process_name(pid: u32) -> Option<String> {
    let mut system = System::new_all();
    system.refresh_all();
    system
        .process(sysinfo::Pid::from_u32(pid))
        .map(|process| process.name().to_string_lossy().into_owned())
}
