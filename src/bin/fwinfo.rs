//! Dumps the headers of an 88MW30x firmware image and verifies its checksums.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use mrvl_fwtools::{Firmware, Report};

#[derive(Parser)]
#[command(name = "fwinfo")]
#[command(about = "Show the contents of a Marvell 88MW30x firmware image", long_about = None)]
struct Cli {
    /// Firmware image to inspect
    #[arg(value_name = "FIRMWARE_FILE")]
    input: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let firmware = Firmware::open(&cli.input)
        .with_context(|| format!("cannot read firmware {}", cli.input.display()))?;
    print!("{}", Report::from_firmware(&firmware));
    Ok(())
}
