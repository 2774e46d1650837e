//! Process listing command

use anyhow::Result;
use procview::list_processes;

pub fn handle(filter: Option<&str>, json: bool) -> Result<()> {
    let mut entries = list_processes();

    if let Some(filter) = filter {
        let needle = filter.to_lowercase();
        entries.retain(|entry| entry.name.to_lowercase().contains(&needle));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{:>8}  NAME", "PID");
    for entry in &entries {
        println!("{:>8}  {}", entry.pid, entry.name);
    }
    eprintln!("{} processes", entries.len());

    Ok(())
}
