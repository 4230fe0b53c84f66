// cloud_collector - main.rs
// Parses the command line and hands off to the dispatcher

use clap::Parser;
use cloud_collector::cli::{dispatch, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dispatch(cli)?;
    Ok(())
}
