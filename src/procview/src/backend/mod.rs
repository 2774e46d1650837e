//! Foreign memory backends
//!
//! One backend per OS behind the [`MemoryBackend`] trait: attach acquires
//! the process handle, `Drop` releases it, and reads/writes are single-shot
//! OS calls against the foreign address space. The session controller and
//! region catalog are written once against this seam.

pub mod enumerate;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(windows)]
mod windows;

#[cfg(test)]
pub(crate) mod mock;

#[cfg(target_os = "linux")]
pub use linux::LinuxBackend;
#[cfg(windows)]
pub use windows::WindowsBackend;

use crate::error::{AttachError, EnumerationError, Transfer, TransferError};
use crate::region::MemoryRegion;

/// Raw access to one attached process.
///
/// Deliberately not `Send`/`Sync`: the whole accessor runs a synchronous,
/// single-threaded model and callers must serialize access to a session.
pub trait MemoryBackend {
    /// Copy bytes out of the foreign address space. One OS call, no retry.
    fn read(&self, address: u64, buf: &mut [u8]) -> Result<Transfer, TransferError>;

    /// Copy bytes into the foreign address space. One OS call, no retry.
    fn write(&self, address: u64, data: &[u8]) -> Result<Transfer, TransferError>;

    /// Loaded modules of the target, one entry per module image, named by
    /// file name only. May legitimately be empty on platforms where module
    /// names arrive through the mapping listing instead.
    fn modules(&self) -> Result<Vec<MemoryRegion>, EnumerationError>;

    /// The target's virtual memory layout, excluding ranges already covered
    /// by the module list. The walk stops at `ceiling` or when the OS
    /// signals end-of-mappings, whichever comes first.
    fn mappings(&self, ceiling: u64) -> Result<Vec<MemoryRegion>, EnumerationError>;
}

/// Open the native backend for this platform.
#[cfg(target_os = "linux")]
pub fn attach(pid: u32) -> Result<Box<dyn MemoryBackend>, AttachError> {
    Ok(Box::new(LinuxBackend::attach(pid)?))
}

/// Open the native backend for this platform.
#[cfg(windows)]
pub fn attach(pid: u32) -> Result<Box<dyn MemoryBackend>, AttachError> {
    Ok(Box::new(WindowsBackend::attach(pid)?))
}

/// Open the native backend for this platform.
#[cfg(not(any(target_os = "linux", windows)))]
pub fn attach(_pid: u32) -> Result<Box<dyn MemoryBackend>, AttachError> {
    Err(AttachError::Unsupported)
}
