//! docsite CLI: build, index, and publish Doxygen documentation.
//!
//! Every publishing job (TOC conversion, fragment extraction, site
//! rendering, search upload, PDF concatenation) is a subcommand.

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
