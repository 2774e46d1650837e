//! Command handlers for the procview CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod memory;
pub mod ps;
pub mod regions;

use anyhow::{Context, Result};
use procview::{process_name, ProcessIdentity, Session};

/// Attach a session to a pid, resolving a display name for the identity.
pub fn attach_session(pid: u32) -> Result<Session> {
    let name = process_name(pid).unwrap_or_else(|| pid.to_string());
    let mut session = Session::new();
    session.select(ProcessIdentity { pid, name });
    session
        .attach()
        .with_context(|| format!("failed to attach to process {pid}"))?;
    Ok(session)
}

/// Parse a 0x-prefixed hex or decimal address.
pub fn parse_address(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let parsed = if let Some(hex_digits) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        u64::from_str_radix(hex_digits, 16)
    } else {
        trimmed.parse()
    };
    parsed.with_context(|| format!("invalid address: {input}"))
}
