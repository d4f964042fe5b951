use anyhow::Result;
use clap::Parser;

mod cli;
mod demo;

fn main() -> Result<()> {
    pretty_env_logger::init();

    let cli = cli::Cli::parse();
    demo::run(&cli)?;

    Ok(())
}
