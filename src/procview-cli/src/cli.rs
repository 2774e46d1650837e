//! CLI argument definitions for procview

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "procview")]
#[command(about = "Inspect and edit the memory of a running process", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List running processes available for attaching
    Ps {
        /// Only show processes whose name contains this string
        #[arg(short, long)]
        filter: Option<String>,

        /// Emit the list as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the modules and memory regions of a process
    Regions {
        /// Target process id
        pid: u32,

        /// Emit the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read bytes from a process address
    Read {
        /// Target process id
        pid: u32,

        /// Address to read from (0x-prefixed hex or decimal)
        address: String,

        /// Number of bytes to read
        length: usize,

        /// Write the bytes to a file instead of hex-dumping them
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write bytes to a process address
    Write {
        /// Target process id
        pid: u32,

        /// Address to write to (0x-prefixed hex or decimal)
        address: String,

        /// Bytes to write, as a hex string (e.g. "deadbeef")
        data: String,
    },

    /// Show which region contains an address
    Resolve {
        /// Target process id
        pid: u32,

        /// Address to resolve (0x-prefixed hex or decimal)
        address: String,
    },

    /// Query session metadata
    Query {
        /// Target process id
        pid: u32,

        /// Category: region_address, region_size, process_id, process_name
        category: String,

        /// Category argument (a region name for the region_* categories)
        #[arg(default_value = "")]
        argument: String,
    },
}
