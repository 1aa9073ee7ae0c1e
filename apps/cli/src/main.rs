//! reqgraph CLI — requirement ingestion tool.
//!
//! Crawls a requirements documentation site and exports Notion requirement
//! tables into artifact and trace-link JSON documents.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
