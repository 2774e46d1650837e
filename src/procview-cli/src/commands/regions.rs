//! Region catalog listing command

use anyhow::Result;
use procview::MemoryRegion;

use super::attach_session;

pub fn handle(pid: u32, json: bool) -> Result<()> {
    let session = attach_session(pid)?;
    let catalog = session.catalog().expect("attached session has a catalog");

    if json {
        let entries: Vec<&MemoryRegion> = catalog.iter().collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!(
        "{:<18} {:<18} {:>12}  NAME",
        "START", "END", "SIZE"
    );
    for entry in catalog.iter() {
        println!(
            "{:#018x} {:#018x} {:>12}  {}",
            entry.region.start,
            entry.region.end(),
            entry.region.size,
            entry.name
        );
    }
    eprintln!("{} regions", catalog.len());

    Ok(())
}
