pub mod elf;
pub mod error;
pub mod firmware;
pub mod profile;
pub mod serializable;

pub use elf::{ElfImage, SectionReconstructor};
pub use error::{CapacityError, Error, PreconditionError, Result};
pub use firmware::{Firmware, FirmwareBuilder, LoadableSegment, Report};
pub use profile::{Profile, ProfileError};
pub use serializable::{FormatError, Serializable};

impl<'data> TryFrom<&ElfImage<'data>> for FirmwareBuilder<'data> {
    type Error = Error;

    /// Collects the ELF's loadable segments, rejecting images the loader
    /// cannot take before anything is written.
    fn try_from(elf: &ElfImage<'data>) -> Result<Self, Self::Error> {
        let mut builder = FirmwareBuilder::new(elf.version());
        for segment in elf.loadable_segments()? {
            builder.push(segment);
        }
        builder.header()?;
        log::info!("found {} loadable segments", builder.segment_count());
        Ok(builder)
    }
}
