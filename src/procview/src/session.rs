//! Session controller
//!
//! Owns the attach/detach lifecycle for one target process: the selected
//! identity, the open backend handle, and the region catalog rebuilt on
//! every refresh. All operations are synchronous and the session is not
//! meant to be shared across threads.

use byteorder::{ByteOrder, LE};
use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::{self, MemoryBackend};
use crate::catalog::RegionCatalog;
use crate::error::{AttachError, EnumerationError, Transfer, TransferError};
use crate::region::Region;

/// Upper bound of the user address space on 64-bit targets; bounds the
/// memory-map walk when the surrounding framework supplies nothing better.
pub const DEFAULT_ADDRESS_CEILING: u64 = 0x0000_7fff_ffff_ffff;

/// The process a session is (or will be) attached to. Immutable per attach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessIdentity {
    pub pid: u32,
    pub name: String,
}

/// Value returned by the structured query interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Int(i128),
    Str(String),
}

impl std::fmt::Display for QueryValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryValue::Int(value) => write!(f, "{value}"),
            QueryValue::Str(value) => f.write_str(value),
        }
    }
}

struct Attached {
    identity: ProcessIdentity,
    backend: Box<dyn MemoryBackend>,
    catalog: RegionCatalog,
}

/// One attach/detach lifecycle over a foreign process.
///
/// A session is detached until [`Session::attach`] succeeds; at most one
/// process is attached at a time. Dropping the session (or calling
/// [`Session::detach`]) releases the OS handle exactly once.
pub struct Session {
    ceiling: u64,
    selection: Option<ProcessIdentity>,
    attached: Option<Attached>,
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Session {
            ceiling: DEFAULT_ADDRESS_CEILING,
            selection: None,
            attached: None,
        }
    }

    /// Override the address-space ceiling bounding the memory-map walk.
    pub fn with_ceiling(mut self, ceiling: u64) -> Self {
        self.ceiling = ceiling;
        self
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    /// Store the externally supplied process selection used by the next
    /// attach. Does not touch an existing attachment.
    pub fn select(&mut self, identity: ProcessIdentity) {
        self.selection = Some(identity);
    }

    pub fn selection(&self) -> Option<&ProcessIdentity> {
        self.selection.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    /// Identity of the currently attached process.
    pub fn identity(&self) -> Option<&ProcessIdentity> {
        self.attached.as_ref().map(|att| &att.identity)
    }

    /// Region catalog of the currently attached process.
    pub fn catalog(&self) -> Option<&RegionCatalog> {
        self.attached.as_ref().map(|att| &att.catalog)
    }

    /// Open the native backend for the selected process and rebuild the
    /// catalog. A failed open leaves the session detached with no resource
    /// held; a failed refresh is tolerated and only logged.
    pub fn attach(&mut self) -> Result<(), AttachError> {
        let identity = self
            .selection
            .clone()
            .ok_or(AttachError::NoProcessSelected)?;
        let backend = backend::attach(identity.pid)?;
        self.finish_attach(identity, backend);
        Ok(())
    }

    /// Attach with a caller-supplied backend instead of the native one.
    pub fn attach_with(&mut self, backend: Box<dyn MemoryBackend>) -> Result<(), AttachError> {
        let identity = self
            .selection
            .clone()
            .ok_or(AttachError::NoProcessSelected)?;
        self.finish_attach(identity, backend);
        Ok(())
    }

    fn finish_attach(&mut self, identity: ProcessIdentity, backend: Box<dyn MemoryBackend>) {
        debug!(pid = identity.pid, name = %identity.name, "session attached");
        self.attached = Some(Attached {
            identity,
            backend,
            catalog: RegionCatalog::new(),
        });
        if let Err(err) = self.refresh() {
            warn!(%err, "catalog refresh failed after attach");
        }
    }

    /// Release the handle. Safe to call when already detached; the catalog
    /// is rebuilt from scratch on the next attach anyway.
    pub fn detach(&mut self) {
        if let Some(att) = self.attached.take() {
            debug!(pid = att.identity.pid, "session detached");
        }
    }

    /// Clear and fully rebuild the catalog from the backend's module and
    /// mapping listings; module entries are inserted first so they win
    /// start-address collisions. A source that fails outright contributes
    /// nothing while the other still populates the catalog; only a failed
    /// mapping walk is reported to the caller.
    pub fn refresh(&mut self) -> Result<(), EnumerationError> {
        let Some(att) = self.attached.as_mut() else {
            return Ok(());
        };

        let modules = match att.backend.modules() {
            Ok(modules) => modules,
            Err(err) => {
                warn!(%err, "module enumeration failed, continuing with mappings");
                Vec::new()
            }
        };

        match att.backend.mappings(self.ceiling) {
            Ok(mappings) => {
                att.catalog.rebuild(modules, mappings);
                debug!(entries = att.catalog.len(), "catalog refreshed");
                Ok(())
            }
            Err(err) => {
                att.catalog.rebuild(modules, Vec::new());
                Err(err)
            }
        }
    }

    /// Read a byte range from the attached process.
    pub fn read_memory(&self, address: u64, buf: &mut [u8]) -> Result<Transfer, TransferError> {
        let att = self.attached.as_ref().ok_or(TransferError::NotAttached)?;
        att.backend.read(address, buf)
    }

    /// Write a byte range into the attached process.
    pub fn write_memory(&self, address: u64, data: &[u8]) -> Result<Transfer, TransferError> {
        let att = self.attached.as_ref().ok_or(TransferError::NotAttached)?;
        att.backend.write(address, data)
    }

    fn read_exact(&self, address: u64, buf: &mut [u8]) -> Result<(), TransferError> {
        match self.read_memory(address, buf)? {
            Transfer::Complete(_) => Ok(()),
            Transfer::Partial(transferred) => Err(TransferError::Short {
                address,
                requested: buf.len(),
                transferred,
            }),
        }
    }

    /// Read a little-endian u32.
    pub fn read_u32(&self, address: u64) -> Result<u32, TransferError> {
        let mut buf = [0u8; 4];
        self.read_exact(address, &mut buf)?;
        Ok(LE::read_u32(&buf))
    }

    /// Read a little-endian u64.
    pub fn read_u64(&self, address: u64) -> Result<u64, TransferError> {
        let mut buf = [0u8; 8];
        self.read_exact(address, &mut buf)?;
        Ok(LE::read_u64(&buf))
    }

    /// Read a 64-bit pointer value.
    pub fn read_ptr(&self, address: u64) -> Result<u64, TransferError> {
        self.read_u64(address)
    }

    /// Read a null-terminated string, scanning at most `max_len` bytes. A
    /// partial transfer is fine here as long as the terminator was reached.
    pub fn read_cstring(&self, address: u64, max_len: usize) -> Result<String, TransferError> {
        let mut buf = vec![0u8; max_len];
        let transfer = self.read_memory(address, &mut buf)?;
        buf.truncate(transfer.bytes());
        let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        Ok(String::from_utf8_lossy(&buf[..end]).to_string())
    }

    /// Classify an address against the catalog: the containing entry, a
    /// synthesized gap between entries, or the invalid sentinel.
    pub fn region_validity(&self, address: u64) -> (Region, bool) {
        match &self.attached {
            Some(att) => att.catalog.resolve_region(address),
            None => (Region::INVALID, false),
        }
    }

    /// Structured lookup over session state. `None` means the category is
    /// not handled here and the surrounding framework should apply its
    /// default handling.
    pub fn query_information(&self, category: &str, argument: &str) -> Option<QueryValue> {
        let att = self.attached.as_ref()?;
        match category {
            "region_address" => Some(QueryValue::Int(
                att.catalog
                    .find_by_name(argument)
                    .map(|entry| entry.region.start as i128)
                    .unwrap_or(0),
            )),
            "region_size" => Some(QueryValue::Int(
                att.catalog
                    .find_by_name(argument)
                    .map(|entry| entry.region.size as i128)
                    .unwrap_or(0),
            )),
            "process_id" => Some(QueryValue::Int(i128::from(att.identity.pid))),
            "process_name" => Some(QueryValue::Str(att.identity.name.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::backend::mock::{AttachCounters, MockBackend};
    use crate::region::MemoryRegion;

    fn identity(pid: u32) -> ProcessIdentity {
        ProcessIdentity {
            pid,
            name: format!("proc-{pid}"),
        }
    }

    fn attached_session(data: Vec<u8>, base: u64) -> Session {
        let counters = Rc::new(AttachCounters::default());
        let backend = MockBackend::attach(42, true, data, base, counters).unwrap();
        let mut session = Session::new();
        session.select(identity(42));
        session.attach_with(Box::new(backend)).unwrap();
        session
    }

    #[test]
    fn test_attach_requires_selection() {
        let mut session = Session::new();
        assert!(matches!(
            session.attach(),
            Err(AttachError::NoProcessSelected)
        ));
        assert!(!session.is_attached());
    }

    #[test]
    fn test_attach_populates_catalog() {
        let session = attached_session(vec![0u8; 0x100], 0x1000);
        assert!(session.is_attached());
        assert_eq!(session.identity().unwrap().pid, 42);

        let catalog = session.catalog().unwrap();
        assert_eq!(catalog.len(), 1);
        let entry = catalog.iter().next().unwrap();
        assert_eq!(entry.region, Region::new(0x1000, 0x100));
        assert_eq!(entry.name, "read write private");
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let mut session = attached_session(vec![0u8; 0x100], 0x1000);
        let first: Vec<MemoryRegion> = session.catalog().unwrap().iter().cloned().collect();
        session.refresh().unwrap();
        let second: Vec<MemoryRegion> = session.catalog().unwrap().iter().cloned().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_module_precedence_in_rebuild() {
        let counters = Rc::new(AttachCounters::default());
        let backend = MockBackend::attach(42, true, vec![0u8; 0x100], 0x1000, counters)
            .unwrap()
            .with_modules(vec![MemoryRegion::new(
                Region::new(0x1000, 0x2000),
                "libfoo.so",
            )]);
        let mut session = Session::new();
        session.select(identity(42));
        session.attach_with(Box::new(backend)).unwrap();

        // The mapping at 0x1000 collides with the module and loses.
        let catalog = session.catalog().unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.iter().next().unwrap().name, "libfoo.so");
    }

    #[test]
    fn test_round_trip_write_then_read() {
        let session = attached_session(vec![0u8; 0x40], 0x2000);
        let payload = b"procview".to_vec();
        let written = session.write_memory(0x2010, &payload).unwrap();
        assert_eq!(written, Transfer::Complete(8));

        let mut buf = [0u8; 8];
        let read = session.read_memory(0x2010, &mut buf).unwrap();
        assert_eq!(read, Transfer::Complete(8));
        assert_eq!(&buf, b"procview");
    }

    #[test]
    fn test_partial_read_is_reported() {
        let session = attached_session(vec![1, 2, 3, 4], 0x1000);
        let mut buf = [0u8; 16];
        let transfer = session.read_memory(0x1002, &mut buf).unwrap();
        assert_eq!(transfer, Transfer::Partial(2));
    }

    #[test]
    fn test_detached_session_refuses_transfers() {
        let mut session = attached_session(vec![0u8; 4], 0x1000);
        session.detach();
        let mut buf = [0u8; 4];
        assert!(matches!(
            session.read_memory(0x1000, &mut buf),
            Err(TransferError::NotAttached)
        ));
        assert!(matches!(
            session.write_memory(0x1000, &buf),
            Err(TransferError::NotAttached)
        ));
    }

    #[test]
    fn test_detach_is_idempotent_and_closes_once() {
        let counters = Rc::new(AttachCounters::default());
        let backend =
            MockBackend::attach(42, true, vec![0u8; 4], 0x1000, Rc::clone(&counters)).unwrap();
        let mut session = Session::new();
        session.select(identity(42));
        session.attach_with(Box::new(backend)).unwrap();

        session.detach();
        session.detach();
        assert_eq!(counters.opened.get(), 1);
        assert_eq!(counters.closed.get(), 1);
    }

    #[test]
    fn test_failed_attach_leaves_no_open_handle() {
        let counters = Rc::new(AttachCounters::default());
        let result = MockBackend::attach(999, false, vec![0u8; 4], 0x1000, Rc::clone(&counters));
        assert!(result.is_err());
        assert_eq!(counters.opened.get(), counters.closed.get());

        let mut session = Session::new();
        session.select(identity(999));
        // Session never saw a backend, so it stays detached.
        assert!(!session.is_attached());
    }

    #[test]
    fn test_query_information_scenarios() {
        let counters = Rc::new(AttachCounters::default());
        let backend = MockBackend::attach(42, true, vec![0u8; 0x10], 0x8000, counters)
            .unwrap()
            .with_modules(vec![MemoryRegion::new(Region::new(0x1000, 0x100), "libfoo")]);
        let mut session = Session::new();
        session.select(identity(42));
        session.attach_with(Box::new(backend)).unwrap();

        assert_eq!(
            session.query_information("region_address", "libfoo"),
            Some(QueryValue::Int(0x1000))
        );
        assert_eq!(
            session.query_information("region_size", "libfoo"),
            Some(QueryValue::Int(0x100))
        );
        assert_eq!(
            session.query_information("region_address", "missing"),
            Some(QueryValue::Int(0))
        );
        assert_eq!(
            session.query_information("process_id", ""),
            Some(QueryValue::Int(42))
        );
        assert_eq!(
            session.query_information("process_name", ""),
            Some(QueryValue::Str("proc-42".to_string()))
        );
        assert_eq!(session.query_information("no_such_category", ""), None);
    }

    #[test]
    fn test_query_information_when_detached() {
        let session = Session::new();
        assert_eq!(session.query_information("process_id", ""), None);
    }

    #[test]
    fn test_region_validity_routes_through_catalog() {
        let session = attached_session(vec![0u8; 0x100], 0x1000);
        assert_eq!(
            session.region_validity(0x1010),
            (Region::new(0x1000, 0x100), true)
        );
        assert_eq!(session.region_validity(0x10), (Region::INVALID, false));

        let detached = Session::new();
        assert_eq!(detached.region_validity(0x1010), (Region::INVALID, false));
    }

    #[test]
    fn test_typed_reads() {
        let mut data = vec![0u8; 0x20];
        data[..8].copy_from_slice(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
        data[0x10..0x16].copy_from_slice(b"hello\0");
        let session = attached_session(data, 0x1000);

        assert_eq!(session.read_u32(0x1000).unwrap(), 0x04030201);
        assert_eq!(session.read_u64(0x1000).unwrap(), 0x0807060504030201);
        assert_eq!(session.read_ptr(0x1000).unwrap(), 0x0807060504030201);
        assert_eq!(session.read_cstring(0x1010, 0x10).unwrap(), "hello");
    }

    #[test]
    fn test_typed_read_rejects_short_transfer() {
        let session = attached_session(vec![0u8; 4], 0x1000);
        assert!(matches!(
            session.read_u64(0x1000),
            Err(TransferError::Short {
                requested: 8,
                transferred: 4,
                ..
            })
        ));
    }
}
