//! Memory access commands: read, write, resolve, query

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use procview::Transfer;

use super::{attach_session, parse_address};

pub fn read(pid: u32, address: &str, length: usize, output: Option<&Path>) -> Result<()> {
    let address = parse_address(address)?;
    let session = attach_session(pid)?;

    let mut buf = vec![0u8; length];
    let transfer = session
        .read_memory(address, &mut buf)
        .with_context(|| format!("read of {length} bytes at {address:#x} failed"))?;

    if let Transfer::Partial(n) = transfer {
        eprintln!("warning: only {n} of {length} bytes were readable");
        buf.truncate(n);
    }

    match output {
        Some(path) => {
            fs::write(path, &buf)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("wrote {} bytes to {}", buf.len(), path.display());
        }
        None => print!("{}", hex_dump(address, &buf)),
    }

    Ok(())
}

pub fn write(pid: u32, address: &str, data: &str) -> Result<()> {
    let address = parse_address(address)?;
    let payload = hex::decode(data.trim().trim_start_matches("0x"))
        .context("data must be an even-length hex string")?;
    if payload.is_empty() {
        bail!("nothing to write");
    }

    let session = attach_session(pid)?;
    let transfer = session
        .write_memory(address, &payload)
        .with_context(|| format!("write of {} bytes at {address:#x} failed", payload.len()))?;

    match transfer {
        Transfer::Complete(n) => eprintln!("wrote {n} bytes at {address:#x}"),
        Transfer::Partial(n) => eprintln!(
            "warning: only {n} of {} bytes were written at {address:#x}",
            payload.len()
        ),
    }

    Ok(())
}

pub fn resolve(pid: u32, address: &str) -> Result<()> {
    let address = parse_address(address)?;
    let session = attach_session(pid)?;

    let (region, backed) = session.region_validity(address);
    if region.is_invalid() {
        println!("{address:#x}: outside all known regions");
    } else if backed {
        let name = session
            .catalog()
            .and_then(|catalog| {
                catalog
                    .iter()
                    .find(|entry| entry.region == region)
                    .map(|entry| entry.name.clone())
            })
            .unwrap_or_default();
        println!(
            "{address:#x}: {:#x} - {:#x} {name}",
            region.start,
            region.end()
        );
    } else {
        println!(
            "{address:#x}: gap {:#x} - {:#x} (unbacked)",
            region.start,
            region.end()
        );
    }

    Ok(())
}

pub fn query(pid: u32, category: &str, argument: &str) -> Result<()> {
    let session = attach_session(pid)?;

    match session.query_information(category, argument) {
        Some(procview::QueryValue::Int(value)) => println!("{value} ({value:#x})"),
        Some(value) => println!("{value}"),
        None => bail!("unrecognized query category: {category}"),
    }

    Ok(())
}

/// Classic 16-bytes-per-row hex dump with an ASCII column.
fn hex_dump(base: u64, bytes: &[u8]) -> String {
    let mut out = String::new();
    for (i, row) in bytes.chunks(16).enumerate() {
        let addr = base + (i * 16) as u64;
        let mut hex_col = String::with_capacity(16 * 3);
        for (j, byte) in row.iter().enumerate() {
            if j == 8 {
                hex_col.push(' ');
            }
            hex_col.push_str(&format!("{byte:02x} "));
        }
        let ascii: String = row
            .iter()
            .map(|&b| {
                if (0x20..0x7f).contains(&b) {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        out.push_str(&format!("{addr:#018x}  {hex_col:<49} |{ascii}|\n"));
    }
    out
}
