//! Mock foreign memory backend for tests
//!
//! Simulates one mapped, writable range of a foreign address space plus
//! configurable module/mapping listings, so session and catalog behavior
//! can be tested without a live target process. Shared attach counters back
//! the open/close pairing assertions.

use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;

use super::MemoryBackend;
use crate::error::{AttachError, EnumerationError, Transfer, TransferError};
use crate::region::{MemoryRegion, Region};

/// Open/close call counts shared between a test and its backends.
#[derive(Debug, Default)]
pub struct AttachCounters {
    pub opened: Cell<usize>,
    pub closed: Cell<usize>,
}

pub struct MockBackend {
    base: u64,
    data: RefCell<Vec<u8>>,
    modules: Vec<MemoryRegion>,
    mappings: Vec<MemoryRegion>,
    counters: Rc<AttachCounters>,
}

impl MockBackend {
    /// "Open" a fake process whose memory is `data` mapped at `base`.
    /// A failed attach counts neither an open nor a close.
    pub fn attach(
        pid: u32,
        exists: bool,
        data: Vec<u8>,
        base: u64,
        counters: Rc<AttachCounters>,
    ) -> Result<Self, AttachError> {
        if !exists {
            return Err(AttachError::ProcessNotFound { pid });
        }

        counters.opened.set(counters.opened.get() + 1);
        let mappings = vec![MemoryRegion::new(
            Region::new(base, data.len() as u64),
            "read write private",
        )];
        Ok(MockBackend {
            base,
            data: RefCell::new(data),
            modules: Vec::new(),
            mappings,
            counters,
        })
    }

    pub fn with_modules(mut self, modules: Vec<MemoryRegion>) -> Self {
        self.modules = modules;
        self
    }

    pub fn with_mappings(mut self, mappings: Vec<MemoryRegion>) -> Self {
        self.mappings = mappings;
        self
    }

    /// Byte offset into the backing buffer, or None when the address is
    /// outside the mapped range entirely.
    fn offset_of(&self, address: u64) -> Option<usize> {
        if address < self.base {
            return None;
        }
        let offset = (address - self.base) as usize;
        (offset < self.data.borrow().len()).then_some(offset)
    }
}

impl MemoryBackend for MockBackend {
    fn read(&self, address: u64, buf: &mut [u8]) -> Result<Transfer, TransferError> {
        let requested = buf.len();
        if requested == 0 {
            return Ok(Transfer::Complete(0));
        }

        let Some(offset) = self.offset_of(address) else {
            return Err(TransferError::Read {
                address,
                requested,
                source: io::Error::from_raw_os_error(14), // EFAULT
            });
        };

        let data = self.data.borrow();
        let n = requested.min(data.len() - offset);
        buf[..n].copy_from_slice(&data[offset..offset + n]);
        if n == requested {
            Ok(Transfer::Complete(n))
        } else {
            Ok(Transfer::Partial(n))
        }
    }

    fn write(&self, address: u64, data: &[u8]) -> Result<Transfer, TransferError> {
        let requested = data.len();
        if requested == 0 {
            return Ok(Transfer::Complete(0));
        }

        let Some(offset) = self.offset_of(address) else {
            return Err(TransferError::Write {
                address,
                requested,
                source: io::Error::from_raw_os_error(14), // EFAULT
            });
        };

        let mut backing = self.data.borrow_mut();
        let n = requested.min(backing.len() - offset);
        backing[offset..offset + n].copy_from_slice(&data[..n]);
        if n == requested {
            Ok(Transfer::Complete(n))
        } else {
            Ok(Transfer::Partial(n))
        }
    }

    fn modules(&self) -> Result<Vec<MemoryRegion>, EnumerationError> {
        Ok(self.modules.clone())
    }

    fn mappings(&self, ceiling: u64) -> Result<Vec<MemoryRegion>, EnumerationError> {
        Ok(self
            .mappings
            .iter()
            .filter(|m| m.region.start < ceiling)
            .cloned()
            .collect())
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.counters.closed.set(self.counters.closed.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock(data: Vec<u8>, base: u64) -> MockBackend {
        MockBackend::attach(1, true, data, base, Rc::new(AttachCounters::default())).unwrap()
    }

    #[test]
    fn test_read_within_range() {
        let backend = mock(vec![0x41, 0x42, 0x43, 0x44], 0x1000);
        let mut buf = [0u8; 2];
        let transfer = backend.read(0x1001, &mut buf).unwrap();
        assert_eq!(transfer, Transfer::Complete(2));
        assert_eq!(buf, [0x42, 0x43]);
    }

    #[test]
    fn test_read_past_end_is_partial() {
        let backend = mock(vec![1, 2, 3, 4], 0x1000);
        let mut buf = [0u8; 8];
        let transfer = backend.read(0x1002, &mut buf).unwrap();
        assert_eq!(transfer, Transfer::Partial(2));
        assert_eq!(&buf[..2], &[3, 4]);
    }

    #[test]
    fn test_read_outside_range_fails() {
        let backend = mock(vec![1, 2, 3, 4], 0x1000);
        let mut buf = [0u8; 4];
        assert!(backend.read(0x500, &mut buf).is_err());
        assert!(backend.read(0x2000, &mut buf).is_err());
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let backend = mock(vec![0u8; 16], 0x1000);
        let payload = [0xde, 0xad, 0xbe, 0xef];
        assert_eq!(
            backend.write(0x1004, &payload).unwrap(),
            Transfer::Complete(4)
        );

        let mut buf = [0u8; 4];
        backend.read(0x1004, &mut buf).unwrap();
        assert_eq!(buf, payload);
    }

    #[test]
    fn test_failed_attach_counts_nothing() {
        let counters = Rc::new(AttachCounters::default());
        let result = MockBackend::attach(7, false, vec![0; 4], 0x1000, Rc::clone(&counters));
        assert!(matches!(result, Err(AttachError::ProcessNotFound { pid: 7 })));
        assert_eq!(counters.opened.get(), 0);
        assert_eq!(counters.closed.get(), 0);
    }

    #[test]
    fn test_drop_closes_once() {
        let counters = Rc::new(AttachCounters::default());
        {
            let _backend =
                MockBackend::attach(7, true, vec![0; 4], 0x1000, Rc::clone(&counters)).unwrap();
            assert_eq!(counters.opened.get(), 1);
            assert_eq!(counters.closed.get(), 0);
        }
        assert_eq!(counters.opened.get(), 1);
        assert_eq!(counters.closed.get(), 1);
    }
}
