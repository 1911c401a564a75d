use clap::Parser;

use blobfs::cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    run(cli)?;
    Ok(())
}
