//! Rebuilds an ELF executable from an 88MW30x firmware image, guessing
//! section identities from segment positions.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use mrvl_fwtools::{Firmware, Profile, SectionReconstructor};

#[derive(Parser)]
#[command(name = "firmware2elf")]
#[command(about = "Convert a Marvell 88MW30x firmware image into an ELF executable", long_about = None)]
struct Cli {
    /// Firmware image to read
    #[arg(value_name = "FIRMWARE_FILE")]
    input: PathBuf,

    /// ELF file to write
    #[arg(value_name = "ELF_FILE")]
    output: PathBuf,

    /// YAML layout profile to use instead of the built-in 88MW30x one
    #[arg(long)]
    profile: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let profile = match &cli.profile {
        Some(path) => Profile::from_path(path)?,
        None => Profile::builtin().context("built-in profile is broken")?,
    };

    let firmware = Firmware::open(&cli.input)
        .with_context(|| format!("cannot read firmware {}", cli.input.display()))?;
    let header = firmware.header();
    log::info!(
        "MRVL image: ctime {}, {} segments, ELF version {:08x}",
        header.ctime,
        header.segment_count,
        header.elf_version
    );
    for (index, segment) in firmware.segment_headers().iter().enumerate() {
        log::info!(
            "segment {index}: size {:8x}, vaddr {:8x}, checksum {:08x}",
            segment.size,
            segment.vaddr,
            segment.checksum
        );
    }

    let elf = SectionReconstructor::new(&profile)
        .reconstruct(&firmware)
        .context("cannot build ELF")?;
    fs::write(&cli.output, elf)
        .with_context(|| format!("cannot write {}", cli.output.display()))?;
    Ok(())
}
