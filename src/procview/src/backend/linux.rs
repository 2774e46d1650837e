//! Linux foreign memory backend
//!
//! The pid itself is the handle: attach probes the target with a null
//! signal so dead or forbidden pids fail up front, and transfers go through
//! one `process_vm_readv`/`process_vm_writev` iovec call each. Modules and
//! mappings both come from `/proc/<pid>/maps`; file-backed lines become the
//! module list, everything else becomes the mapping list.

use std::io::{self, IoSlice, IoSliceMut};
use std::path::Path;

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::sys::uio::{process_vm_readv, process_vm_writev, RemoteIoVec};
use nix::unistd::Pid;
use tracing::debug;

use super::MemoryBackend;
use crate::error::{AttachError, EnumerationError, Transfer, TransferError};
use crate::region::{MemoryRegion, Region};

pub struct LinuxBackend {
    pid: Pid,
}

impl LinuxBackend {
    /// Attach to a running process.
    pub fn attach(pid: u32) -> Result<Self, AttachError> {
        let target = Pid::from_raw(pid as i32);
        match kill(target, None) {
            Ok(()) => {}
            Err(Errno::ESRCH) => return Err(AttachError::ProcessNotFound { pid }),
            Err(Errno::EPERM) => {
                return Err(AttachError::AccessDenied {
                    pid,
                    source: io::Error::from_raw_os_error(Errno::EPERM as i32),
                })
            }
            Err(errno) => {
                return Err(AttachError::OpenFailed {
                    pid,
                    source: io::Error::from_raw_os_error(errno as i32),
                })
            }
        }

        debug!(pid, "attached to process");
        Ok(LinuxBackend { pid: target })
    }

    fn maps_entries(&self) -> Result<Vec<MapsEntry>, EnumerationError> {
        let maps_path = format!("/proc/{}/maps", self.pid);
        let content = std::fs::read_to_string(&maps_path).map_err(EnumerationError::Mappings)?;
        Ok(parse_maps_content(&content))
    }
}

impl MemoryBackend for LinuxBackend {
    fn read(&self, address: u64, buf: &mut [u8]) -> Result<Transfer, TransferError> {
        let requested = buf.len();
        if requested == 0 {
            return Ok(Transfer::Complete(0));
        }

        let remote = [RemoteIoVec {
            base: address as usize,
            len: requested,
        }];
        let mut local = [IoSliceMut::new(buf)];

        match process_vm_readv(self.pid, &mut local, &remote) {
            Ok(n) if n == requested => Ok(Transfer::Complete(n)),
            Ok(n) if n > 0 => Ok(Transfer::Partial(n)),
            Ok(_) => Err(TransferError::Read {
                address,
                requested,
                source: io::Error::from(io::ErrorKind::UnexpectedEof),
            }),
            Err(errno) => Err(TransferError::Read {
                address,
                requested,
                source: io::Error::from_raw_os_error(errno as i32),
            }),
        }
    }

    fn write(&self, address: u64, data: &[u8]) -> Result<Transfer, TransferError> {
        let requested = data.len();
        if requested == 0 {
            return Ok(Transfer::Complete(0));
        }

        let remote = [RemoteIoVec {
            base: address as usize,
            len: requested,
        }];
        let local = [IoSlice::new(data)];

        match process_vm_writev(self.pid, &local, &remote) {
            Ok(n) if n == requested => Ok(Transfer::Complete(n)),
            Ok(n) if n > 0 => Ok(Transfer::Partial(n)),
            Ok(_) => Err(TransferError::Write {
                address,
                requested,
                source: io::Error::from(io::ErrorKind::WriteZero),
            }),
            Err(errno) => Err(TransferError::Write {
                address,
                requested,
                source: io::Error::from_raw_os_error(errno as i32),
            }),
        }
    }

    fn modules(&self) -> Result<Vec<MemoryRegion>, EnumerationError> {
        Ok(module_entries(&self.maps_entries()?))
    }

    fn mappings(&self, ceiling: u64) -> Result<Vec<MemoryRegion>, EnumerationError> {
        Ok(mapping_entries(&self.maps_entries()?, ceiling))
    }
}

/// One parsed `/proc/<pid>/maps` line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MapsEntry {
    start: u64,
    end: u64,
    perms: String,
    path: Option<String>,
}

/// Parse the content of a maps file. Malformed lines are skipped.
fn parse_maps_content(content: &str) -> Vec<MapsEntry> {
    let mut entries = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        let addr_parts: Vec<&str> = parts[0].split('-').collect();
        if addr_parts.len() != 2 {
            continue;
        }

        let (Ok(start), Ok(end)) = (
            u64::from_str_radix(addr_parts[0], 16),
            u64::from_str_radix(addr_parts[1], 16),
        ) else {
            debug!(line, "skipping unparseable maps line");
            continue;
        };
        if end <= start {
            continue;
        }

        let perms = parts.get(1).unwrap_or(&"").to_string();
        let path = parts.get(5).map(|s| s.to_string());

        entries.push(MapsEntry {
            start,
            end,
            perms,
            path,
        });
    }

    entries
}

/// File-backed maps lines, one catalog entry each, named by file name only.
fn module_entries(entries: &[MapsEntry]) -> Vec<MemoryRegion> {
    entries
        .iter()
        .filter_map(|entry| {
            let path = entry.path.as_deref()?;
            if !path.starts_with('/') {
                return None;
            }
            let name = Path::new(path)
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string());
            Some(MemoryRegion::new(
                Region::new(entry.start, entry.end - entry.start),
                name,
            ))
        })
        .collect()
}

/// Non-file-backed maps lines: kernel labels verbatim, anonymous ranges
/// named by their permission flags.
fn mapping_entries(entries: &[MapsEntry], ceiling: u64) -> Vec<MemoryRegion> {
    entries
        .iter()
        .filter(|entry| entry.start < ceiling)
        .filter(|entry| !entry.path.as_deref().is_some_and(|p| p.starts_with('/')))
        .map(|entry| {
            let name = match entry.path.as_deref() {
                Some(label) => label.to_string(),
                None => perms_label(&entry.perms),
            };
            MemoryRegion::new(Region::new(entry.start, entry.end - entry.start), name)
        })
        .collect()
}

/// Space-joined classification label for an anonymous range, e.g.
/// "read write private".
fn perms_label(perms: &str) -> String {
    let mut flags = Vec::new();
    let mut chars = perms.chars();
    if chars.next() == Some('r') {
        flags.push("read");
    }
    if chars.next() == Some('w') {
        flags.push("write");
    }
    if chars.next() == Some('x') {
        flags.push("exec");
    }
    match chars.next() {
        Some('s') => flags.push("shared"),
        Some('p') => flags.push("private"),
        _ => {}
    }
    flags.join(" ")
}
