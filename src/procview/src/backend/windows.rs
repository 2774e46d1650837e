//! Windows foreign memory backend
//!
//! Opens the most-privileged handle available and releases it on drop.
//! Transfers are single `ReadProcessMemory`/`WriteProcessMemory` calls with
//! the bytes-transferred out-parameter. Modules come from
//! `EnumProcessModules` behind the grow-and-retry helper; mappings come
//! from a `VirtualQueryEx` walk up to the address-space ceiling.

use std::ffi::c_void;
use std::io;
use std::mem::size_of;
use std::path::Path;

use tracing::{debug, warn};
use windows::Win32::Foundation::{CloseHandle, FALSE, HANDLE, HMODULE, MAX_PATH};
use windows::Win32::System::Diagnostics::Debug::{ReadProcessMemory, WriteProcessMemory};
use windows::Win32::System::Memory::{
    VirtualQueryEx, MEMORY_BASIC_INFORMATION, MEM_COMMIT, MEM_FREE, MEM_IMAGE, MEM_MAPPED,
    MEM_PRIVATE, MEM_RESERVE,
};
use windows::Win32::System::ProcessStatus::{
    EnumProcessModules, GetMappedFileNameA, GetModuleFileNameExA, GetModuleInformation, MODULEINFO,
};
use windows::Win32::System::Threading::{OpenProcess, PROCESS_ALL_ACCESS};

use super::enumerate::{retry_with_growth, INITIAL_CAPACITY};
use super::MemoryBackend;
use crate::error::{AttachError, EnumerationError, Transfer, TransferError};
use crate::region::{MemoryRegion, Region};

pub struct WindowsBackend {
    handle: HANDLE,
}

impl WindowsBackend {
    /// Attach to a running process with full access rights.
    pub fn attach(pid: u32) -> Result<Self, AttachError> {
        let handle = unsafe { OpenProcess(PROCESS_ALL_ACCESS, FALSE, pid) }.map_err(|err| {
            AttachError::OpenFailed {
                pid,
                source: io::Error::from_raw_os_error(err.code().0),
            }
        })?;

        debug!(pid, "attached to process");
        Ok(WindowsBackend { handle })
    }

    fn module_region(&self, module: HMODULE) -> Option<MemoryRegion> {
        let mut info = MODULEINFO::default();
        if unsafe {
            GetModuleInformation(
                self.handle,
                module,
                &mut info,
                size_of::<MODULEINFO>() as u32,
            )
        }
        .is_err()
        {
            debug!(?module, "skipping module without information");
            return None;
        }

        let mut name_buf = [0u8; MAX_PATH as usize];
        let len = unsafe { GetModuleFileNameExA(self.handle, module, &mut name_buf) } as usize;
        if len == 0 {
            debug!(?module, "skipping module without file name");
            return None;
        }

        let full_name = String::from_utf8_lossy(&name_buf[..len]).into_owned();
        let name = Path::new(&full_name)
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or(full_name);

        Some(MemoryRegion::new(
            Region::new(info.lpBaseOfDll as u64, info.SizeOfImage as u64),
            name,
        ))
    }

    /// Name for a plain mapping: the backing file verbatim when the OS
    /// reports one, otherwise the space-joined classification flags.
    fn mapping_name(&self, info: &MEMORY_BASIC_INFORMATION) -> String {
        if info.Type.0 & MEM_MAPPED.0 != 0 {
            let mut name_buf = [0u8; MAX_PATH as usize];
            let len =
                unsafe { GetMappedFileNameA(self.handle, info.BaseAddress, &mut name_buf) }
                    as usize;
            if len > 0 {
                return String::from_utf8_lossy(&name_buf[..len]).into_owned();
            }
        }

        let mut flags = Vec::new();
        if info.State.0 & MEM_COMMIT.0 != 0 {
            flags.push("commit");
        }
        if info.State.0 & MEM_RESERVE.0 != 0 {
            flags.push("reserve");
        }
        if info.Type.0 & MEM_PRIVATE.0 != 0 {
            flags.push("private");
        }
        if info.Type.0 & MEM_MAPPED.0 != 0 {
            flags.push("mapped");
        }
        flags.join(" ")
    }
}

impl MemoryBackend for WindowsBackend {
    fn read(&self, address: u64, buf: &mut [u8]) -> Result<Transfer, TransferError> {
        let requested = buf.len();
        if requested == 0 {
            return Ok(Transfer::Complete(0));
        }

        let mut transferred = 0usize;
        let result = unsafe {
            ReadProcessMemory(
                self.handle,
                address as *const c_void,
                buf.as_mut_ptr() as *mut c_void,
                requested,
                Some(&mut transferred),
            )
        };

        match result {
            Ok(()) => Ok(Transfer::Complete(transferred)),
            Err(_) if transferred > 0 => Ok(Transfer::Partial(transferred)),
            Err(err) => Err(TransferError::Read {
                address,
                requested,
                source: io::Error::from_raw_os_error(err.code().0),
            }),
        }
    }

    fn write(&self, address: u64, data: &[u8]) -> Result<Transfer, TransferError> {
        let requested = data.len();
        if requested == 0 {
            return Ok(Transfer::Complete(0));
        }

        let mut transferred = 0usize;
        let result = unsafe {
            WriteProcessMemory(
                self.handle,
                address as *const c_void,
                data.as_ptr() as *const c_void,
                requested,
                Some(&mut transferred),
            )
        };

        match result {
            Ok(()) => Ok(Transfer::Complete(transferred)),
            Err(_) if transferred > 0 => Ok(Transfer::Partial(transferred)),
            Err(err) => Err(TransferError::Write {
                address,
                requested,
                source: io::Error::from_raw_os_error(err.code().0),
            }),
        }
    }

    fn modules(&self) -> Result<Vec<MemoryRegion>, EnumerationError> {
        let modules = retry_with_growth(INITIAL_CAPACITY, |buf: &mut [HMODULE]| {
            let mut needed = 0u32;
            unsafe {
                EnumProcessModules(
                    self.handle,
                    buf.as_mut_ptr(),
                    (buf.len() * size_of::<HMODULE>()) as u32,
                    &mut needed,
                )
            }
            .map_err(|err| {
                EnumerationError::Modules(io::Error::from_raw_os_error(err.code().0))
            })?;
            Ok(needed as usize / size_of::<HMODULE>())
        })?;

        Ok(modules
            .into_iter()
            .filter_map(|module| self.module_region(module))
            .collect())
    }

    fn mappings(&self, ceiling: u64) -> Result<Vec<MemoryRegion>, EnumerationError> {
        let mut regions = Vec::new();
        let mut address = 0u64;

        while address < ceiling {
            let mut info = MEMORY_BASIC_INFORMATION::default();
            let written = unsafe {
                VirtualQueryEx(
                    self.handle,
                    Some(address as *const c_void),
                    &mut info,
                    size_of::<MEMORY_BASIC_INFORMATION>(),
                )
            };
            if written == 0 {
                break;
            }
            if info.RegionSize == 0 {
                break;
            }

            let skip = info.State.0 & MEM_FREE.0 != 0 || info.Type.0 & MEM_IMAGE.0 != 0;
            if !skip {
                regions.push(MemoryRegion::new(
                    Region::new(info.BaseAddress as u64, info.RegionSize as u64),
                    self.mapping_name(&info),
                ));
            }

            address = (info.BaseAddress as u64).saturating_add(info.RegionSize as u64);
        }

        Ok(regions)
    }
}

impl Drop for WindowsBackend {
    fn drop(&mut self) {
        if let Err(err) = unsafe { CloseHandle(self.handle) } {
            warn!(?err, "failed to close process handle");
        }
    }
}
