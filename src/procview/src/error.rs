//! Error taxonomy and transfer results

use std::io;

use thiserror::Error;

/// Outcome of a successful read or write against the foreign address space.
///
/// A transfer that moves nothing is an error, not a variant here; see
/// [`TransferError`]. On a partial transfer only the first `n` bytes of the
/// caller's buffer are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// All requested bytes were moved.
    Complete(usize),
    /// Only the first `n` bytes were moved (unmapped page or permission
    /// fault partway through the range).
    Partial(usize),
}

impl Transfer {
    /// Number of bytes actually moved.
    pub fn bytes(&self) -> usize {
        match *self {
            Transfer::Complete(n) | Transfer::Partial(n) => n,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Transfer::Complete(_))
    }
}

/// The target process could not be opened. No session state survives this.
#[derive(Debug, Error)]
pub enum AttachError {
    #[error("no process selected")]
    NoProcessSelected,

    #[error("process {pid} not found")]
    ProcessNotFound { pid: u32 },

    #[error("access denied opening process {pid}: {source}")]
    AccessDenied { pid: u32, source: io::Error },

    #[error("failed to open process {pid}: {source}")]
    OpenFailed { pid: u32, source: io::Error },

    #[error("no foreign memory backend for this platform")]
    Unsupported,
}

/// An OS enumeration source failed outright. Per-entry lookup failures
/// during a refresh are skipped instead of raising this.
#[derive(Debug, Error)]
pub enum EnumerationError {
    #[error("module enumeration failed: {0}")]
    Modules(io::Error),

    #[error("memory map enumeration failed: {0}")]
    Mappings(io::Error),
}

/// A read or write against the foreign address space moved no bytes.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("no process attached")]
    NotAttached,

    #[error("read of {requested} bytes at {address:#x} failed: {source}")]
    Read {
        address: u64,
        requested: usize,
        source: io::Error,
    },

    #[error("write of {requested} bytes at {address:#x} failed: {source}")]
    Write {
        address: u64,
        requested: usize,
        source: io::Error,
    },

    /// A typed read needed the full value but the transfer came up short.
    #[error("short transfer at {address:#x}: {transferred} of {requested} bytes")]
    Short {
        address: u64,
        requested: usize,
        transferred: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_bytes() {
        assert_eq!(Transfer::Complete(8).bytes(), 8);
        assert_eq!(Transfer::Partial(3).bytes(), 3);
        assert!(Transfer::Complete(8).is_complete());
        assert!(!Transfer::Partial(3).is_complete());
    }
}
