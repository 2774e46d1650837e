//! # procview
//!
//! Live process memory accessor: attach to a running process, enumerate
//! its loaded modules and memory mappings into an address-ordered catalog,
//! and read/write arbitrary byte ranges of its address space.
//!
//! This library provides functionality to:
//! - Discover running processes for selection
//! - Attach to and detach from a target process (Linux and Windows)
//! - Enumerate modules and memory mappings into a named region catalog
//! - Resolve addresses to regions, including the gaps between mappings
//! - Read and write foreign memory with explicit partial-transfer results
//! - Answer structured metadata queries over the attached session
//!
//! ## Example
//!
//! ```no_run
//! use procview::{ProcessIdentity, Session};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::new();
//! session.select(ProcessIdentity {
//!     pid: 1234,
//!     name: procview::process_name(1234).unwrap_or_default(),
//! });
//! session.attach()?;
//!
//! for entry in session.catalog().unwrap().iter() {
//!     println!(
//!         "{:#018x} - {:#018x} {}",
//!         entry.region.start,
//!         entry.region.end(),
//!         entry.name
//!     );
//! }
//!
//! let mut buf = [0u8; 16];
//! let transfer = session.read_memory(0x7f0000001000, &mut buf)?;
//! println!("read {} bytes", transfer.bytes());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod catalog;
pub mod error;
pub mod process_list;
pub mod provider;
pub mod region;
pub mod session;

// Re-export commonly used items
pub use backend::MemoryBackend;
pub use catalog::RegionCatalog;
pub use error::{AttachError, EnumerationError, Transfer, TransferError};
pub use process_list::{list_processes, process_name, ProcessEntry};
pub use provider::Provider;
pub use region::{MemoryRegion, Region};
pub use session::{ProcessIdentity, QueryValue, Session, DEFAULT_ADDRESS_CEILING};
