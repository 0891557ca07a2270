use object::elf::{FileHeader32, PT_LOAD};
use object::read::elf::{FileHeader, ProgramHeader};
use object::{Endianness, FileKind, ReadRef};

use crate::error::{Error, PreconditionError, Result};
use crate::firmware::LoadableSegment;

/// One program header, as reported by the ELF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramSegment {
    pub index: usize,
    pub p_type: u32,
    pub offset: u64,
    pub vaddr: u32,
    pub file_size: u64,
}

impl ProgramSegment {
    /// Only non-empty `PT_LOAD` segments make it into a firmware image.
    pub fn is_loadable(&self) -> bool {
        self.p_type == PT_LOAD && self.file_size > 0
    }
}

/// A parsed 32-bit ELF input.
pub struct ElfImage<'data> {
    data: &'data [u8],
    header: &'data FileHeader32<Endianness>,
    endian: Endianness,
}

impl<'data> ElfImage<'data> {
    pub fn parse(data: &'data [u8]) -> Result<Self> {
        match FileKind::parse(data) {
            Ok(FileKind::Elf32) => {}
            Ok(FileKind::Elf64) => return Err(PreconditionError::UnsupportedClass.into()),
            _ => return Err(PreconditionError::NotElf.into()),
        }
        let header = FileHeader32::<Endianness>::parse(data)?;
        let endian = header.endian()?;
        Ok(ElfImage {
            data,
            header,
            endian,
        })
    }

    /// The ELF's own `e_version`, carried into the firmware header.
    pub fn version(&self) -> u32 {
        self.header.e_version(self.endian)
    }

    pub fn program_segments(&self) -> Result<Vec<ProgramSegment>> {
        let headers = self.header.program_headers(self.endian, self.data)?;
        Ok(headers
            .iter()
            .enumerate()
            .map(|(index, header)| {
                let segment = ProgramSegment {
                    index,
                    p_type: header.p_type(self.endian),
                    offset: header.p_offset(self.endian).into(),
                    vaddr: header.p_vaddr(self.endian),
                    file_size: header.p_filesz(self.endian).into(),
                };
                log::debug!(
                    "PHDR {index}: type {:#x}, offset {:#x}, vaddr {:#010x}, filesz {:#x}",
                    segment.p_type,
                    segment.offset,
                    segment.vaddr,
                    segment.file_size
                );
                segment
            })
            .collect())
    }

    pub fn read(&self, segment: &ProgramSegment) -> Result<&'data [u8]> {
        self.data
            .read_bytes_at(segment.offset, segment.file_size)
            .map_err(|()| {
                Error::from(PreconditionError::SegmentOutOfRange {
                    index: segment.index,
                })
            })
    }

    /// Loadable segments with their raw bytes, in program-header order.
    pub fn loadable_segments(&self) -> Result<Vec<LoadableSegment<'data>>> {
        self.program_segments()?
            .iter()
            .filter(|segment| segment.is_loadable())
            .map(|segment| Ok(LoadableSegment::new(segment.vaddr, self.read(segment)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::writer::{ElfWriter, SectionRecord};
    use object::elf::{EM_ARM, PF_R, PF_X, SHF_ALLOC, SHT_PROGBITS, SHT_STRTAB};

    fn elf_with(blocks: &[(u32, &[u8])]) -> Vec<u8> {
        let mut writer = ElfWriter::new(EM_ARM, 0);
        for (addr, data) in blocks {
            let index = writer.add_section(SectionRecord {
                name_offset: 0,
                sh_type: SHT_PROGBITS,
                flags: SHF_ALLOC,
                addr: *addr,
                align: 4,
                data: data.to_vec(),
            });
            writer.add_load_segment(index, PF_R | PF_X);
        }
        let names = writer.add_section(SectionRecord {
            name_offset: 1,
            sh_type: SHT_STRTAB,
            flags: 0,
            addr: 0,
            align: 1,
            data: b"\0.shstrtab\0".to_vec(),
        });
        writer.set_shstrndx(names);
        writer.finish().unwrap()
    }

    #[test]
    fn loadable_segments_keep_program_header_order() {
        let bytes = elf_with(&[
            (0x2000_0000, &[1, 2, 3][..]),
            (0x1000_0000, &[4, 5, 6, 7][..]),
        ]);
        let image = ElfImage::parse(&bytes).unwrap();
        assert_eq!(image.version(), 1);

        let segments = image.loadable_segments().unwrap();
        assert_eq!(
            segments,
            vec![
                LoadableSegment::new(0x2000_0000, &[1, 2, 3]),
                LoadableSegment::new(0x1000_0000, &[4, 5, 6, 7]),
            ]
        );
    }

    #[test]
    fn empty_segments_are_skipped() {
        let bytes = elf_with(&[(0x100, &[][..]), (0x200, &[9; 4][..])]);
        let image = ElfImage::parse(&bytes).unwrap();
        assert_eq!(image.program_segments().unwrap().len(), 2);
        let segments = image.loadable_segments().unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].vaddr, 0x200);
    }

    #[test]
    fn non_elf_input_is_rejected() {
        assert!(matches!(
            ElfImage::parse(b"MRVL\x7b\xf1\x9c\x2e"),
            Err(Error::Precondition(PreconditionError::NotElf))
        ));
    }

    #[test]
    fn elf64_is_rejected() {
        let mut bytes = vec![0u8; 64];
        bytes[..4].copy_from_slice(&object::elf::ELFMAG);
        bytes[4] = object::elf::ELFCLASS64;
        bytes[5] = object::elf::ELFDATA2LSB;
        bytes[6] = object::elf::EV_CURRENT;
        assert!(matches!(
            ElfImage::parse(&bytes),
            Err(Error::Precondition(PreconditionError::UnsupportedClass))
        ));
    }

    #[test]
    fn truncated_segment_is_rejected() {
        let mut bytes = elf_with(&[(0x100, &[1; 64][..])]);
        // Point the only program header far past the end of the file
        let p_offset = 52 + 4;
        bytes[p_offset..p_offset + 4].copy_from_slice(&0x0010_0000u32.to_le_bytes());
        let image = ElfImage::parse(&bytes).unwrap();
        assert!(matches!(
            image.loadable_segments(),
            Err(Error::Precondition(PreconditionError::SegmentOutOfRange { index: 0 }))
        ));
    }
}
