//! Provider boundary
//!
//! The fixed contract the surrounding provider framework consumes: the
//! activation lifecycle, raw unaligned byte access for its paging layer,
//! address classification, and metadata queries. [`Session`] is the one
//! implementation in this crate.

use crate::error::{AttachError, Transfer, TransferError};
use crate::region::Region;
use crate::session::{QueryValue, Session};

pub trait Provider {
    /// Activation hook: attach to the selected process.
    fn open(&mut self) -> Result<(), AttachError>;

    /// Deactivation hook: release the process handle.
    fn close(&mut self);

    /// Read an arbitrary byte range. No alignment is assumed.
    fn read_raw(&self, address: u64, buf: &mut [u8]) -> Result<Transfer, TransferError>;

    /// Write an arbitrary byte range. No alignment is assumed.
    fn write_raw(&self, address: u64, data: &[u8]) -> Result<Transfer, TransferError>;

    /// Classify an address as backed (a cataloged region) or unbacked (a
    /// synthesized gap, or the invalid sentinel outside all knowledge).
    fn region_validity(&self, address: u64) -> (Region, bool);

    /// Metadata lookup; `None` delegates to the framework's default
    /// handling for the category.
    fn query_information(&self, category: &str, argument: &str) -> Option<QueryValue>;

    /// Size of the addressable space, externally supplied; bounds the
    /// memory-map walk.
    fn actual_size(&self) -> u64;
}

impl Provider for Session {
    fn open(&mut self) -> Result<(), AttachError> {
        self.attach()
    }

    fn close(&mut self) {
        self.detach();
    }

    fn read_raw(&self, address: u64, buf: &mut [u8]) -> Result<Transfer, TransferError> {
        self.read_memory(address, buf)
    }

    fn write_raw(&self, address: u64, data: &[u8]) -> Result<Transfer, TransferError> {
        self.write_memory(address, data)
    }

    fn region_validity(&self, address: u64) -> (Region, bool) {
        Session::region_validity(self, address)
    }

    fn query_information(&self, category: &str, argument: &str) -> Option<QueryValue> {
        Session::query_information(self, category, argument)
    }

    fn actual_size(&self) -> u64 {
        self.ceiling()
    }
}
