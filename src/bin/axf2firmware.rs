//! Packs the loadable segments of a 32-bit ELF (.axf) into an 88MW30x
//! firmware image.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use mrvl_fwtools::{ElfImage, FirmwareBuilder};

#[derive(Parser)]
#[command(name = "axf2firmware")]
#[command(about = "Convert an ELF executable into a Marvell 88MW30x firmware image", long_about = None)]
struct Cli {
    /// ELF file to read
    #[arg(value_name = "AXF_FILE")]
    input: PathBuf,

    /// Firmware image to write
    #[arg(value_name = "FIRMWARE_FILE")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let data = fs::read(&cli.input)
        .with_context(|| format!("open {} failed", cli.input.display()))?;
    let elf = ElfImage::parse(&data)
        .with_context(|| format!("cannot read ELF {}", cli.input.display()))?;
    let builder = FirmwareBuilder::try_from(&elf)?;

    let file = File::create(&cli.output)
        .with_context(|| format!("open {} failed", cli.output.display()))?;
    let mut out = BufWriter::new(file);
    let headers = builder.write(&mut out).context("cannot write firmware")?;
    out.flush().context("cannot write firmware")?;

    log::info!(
        "wrote {} segments to {}",
        headers.len(),
        cli.output.display()
    );
    Ok(())
}
