use object::elf::{SHF_ALLOC, SHF_STRINGS, SHT_PROGBITS, SHT_STRTAB};

use super::strtab::NameTable;
use super::writer::{ElfWriter, SectionRecord};
use crate::error::Result;
use crate::firmware::Firmware;
use crate::profile::Profile;

const SECTION_NAMES: &str = ".shstrtab";

/// Rebuilds an ELF executable skeleton from a firmware image.
///
/// Every segment becomes one section (and one load segment) named after its
/// position, followed by the profile's attribute section and the section
/// name table. Nothing is recovered beyond that.
pub struct SectionReconstructor<'p> {
    profile: &'p Profile,
}

impl<'p> SectionReconstructor<'p> {
    pub fn new(profile: &'p Profile) -> Self {
        SectionReconstructor { profile }
    }

    pub fn reconstruct(&self, firmware: &Firmware) -> Result<Vec<u8>> {
        let mut names = NameTable::new();
        let mut writer = ElfWriter::new(self.profile.machine, self.profile.flags);

        for (index, (header, data)) in firmware.segments().enumerate() {
            let inference = self.profile.section_for(index);
            let rule = inference.rule;
            if !inference.known {
                log::warn!(
                    "firmware contains unknown segment {index}, treating it as {}",
                    rule.name
                );
            }

            let section = writer.add_section(SectionRecord {
                name_offset: names.get_or_add(&rule.name),
                sh_type: SHT_PROGBITS,
                flags: rule.flags.bits(),
                addr: header.vaddr,
                align: rule.align,
                data: data.to_vec(),
            });
            writer.add_load_segment(section, rule.flags.segment_bits());
            log::debug!(
                "segment {index} -> {} at {:#010x}, {} bytes",
                rule.name,
                header.vaddr,
                data.len()
            );
        }

        if let Some(entry) = self.profile.entry_point(firmware.segment_headers()) {
            log::debug!("entry point {entry:#010x}");
            writer.set_entry(entry);
        }

        let attributes = &self.profile.attributes;
        writer.add_section(SectionRecord {
            name_offset: names.get_or_add(&attributes.name),
            sh_type: attributes.section_type,
            flags: 0,
            addr: 0,
            align: 1,
            data: attributes.data.clone(),
        });

        let name_offset = names.get_or_add(SECTION_NAMES);
        let shstrndx = writer.add_section(SectionRecord {
            name_offset,
            sh_type: SHT_STRTAB,
            flags: SHF_STRINGS | SHF_ALLOC,
            addr: 0,
            align: 1,
            data: names.into_bytes(),
        });
        writer.set_shstrndx(shstrndx);

        writer.finish()
    }
}
