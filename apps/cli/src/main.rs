//! nbview CLI: render computational notebooks as clean, sectioned pages.
//!
//! Loads notebooks from disk or URL, strips assignment scaffolding, highlights
//! code, and writes standalone HTML or JSON.

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
