mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ps { filter, json } => commands::ps::handle(filter.as_deref(), json),

        Commands::Regions { pid, json } => commands::regions::handle(pid, json),

        Commands::Read {
            pid,
            address,
            length,
            output,
        } => commands::memory::read(pid, &address, length, output.as_deref()),

        Commands::Write { pid, address, data } => commands::memory::write(pid, &address, &data),

        Commands::Resolve { pid, address } => commands::memory::resolve(pid, &address),

        Commands::Query {
            pid,
            category,
            argument,
        } => commands::memory::query(pid, &category, &argument),
    }
}
