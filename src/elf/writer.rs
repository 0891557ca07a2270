use std::mem::size_of;

use object::elf::{
    FileHeader32, Ident, ProgramHeader32, SectionHeader32, ELFCLASS32, ELFDATA2LSB, ELFMAG,
    ELFOSABI_NONE, ET_EXEC, EV_CURRENT, PT_LOAD,
};
use object::endian::{LittleEndian, U16, U32};
use object::pod::bytes_of;

use crate::error::{Error, Result};

const LE: LittleEndian = LittleEndian;
const EHDR_SIZE: usize = size_of::<FileHeader32<LittleEndian>>();
const PHDR_SIZE: usize = size_of::<ProgramHeader32<LittleEndian>>();
const SHDR_SIZE: usize = size_of::<SectionHeader32<LittleEndian>>();

/// A section as requested by the reconstructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRecord {
    pub name_offset: u32,
    pub sh_type: u32,
    pub flags: u32,
    pub addr: u32,
    pub align: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
struct LoadSegment {
    section: usize,
    flags: u32,
}

/// Minimal little-endian ELF32 executable writer.
///
/// File layout: ELF header, program headers, section data, section header
/// table. Section index 0 is the null section; `add_section` returns the
/// index the section will have in the output.
#[derive(Debug, Clone)]
pub struct ElfWriter {
    machine: u16,
    flags: u32,
    entry: u32,
    shstrndx: usize,
    sections: Vec<SectionRecord>,
    segments: Vec<LoadSegment>,
}

impl ElfWriter {
    pub fn new(machine: u16, flags: u32) -> Self {
        ElfWriter {
            machine,
            flags,
            entry: 0,
            shstrndx: 0,
            sections: Vec::new(),
            segments: Vec::new(),
        }
    }

    pub fn set_entry(&mut self, entry: u32) {
        self.entry = entry;
    }

    pub fn set_shstrndx(&mut self, index: usize) {
        self.shstrndx = index;
    }

    pub fn add_section(&mut self, section: SectionRecord) -> usize {
        self.sections.push(section);
        self.sections.len()
    }

    /// Adds a `PT_LOAD` program header covering section `index`.
    pub fn add_load_segment(&mut self, index: usize, flags: u32) {
        self.segments.push(LoadSegment {
            section: index,
            flags,
        });
    }

    pub fn finish(self) -> Result<Vec<u8>> {
        if !self.sections.is_empty()
            && (self.shstrndx == 0 || self.shstrndx > self.sections.len())
        {
            return Err(Error::Internal(format!(
                "section name table index {} does not name a section",
                self.shstrndx
            )));
        }
        let phnum = self.segments.len();
        let shnum = self.sections.len() + 1;
        let mut offset = EHDR_SIZE + phnum * PHDR_SIZE;

        // Place each section at an offset congruent to its address modulo
        // its alignment, so load segments stay valid.
        let mut body = Vec::new();
        let mut placed = Vec::with_capacity(self.sections.len());
        for section in &self.sections {
            let align = section.align.max(1) as usize;
            let want = section.addr as usize % align;
            let mut start = offset - offset % align + want;
            if start < offset {
                start += align;
            }
            body.resize(body.len() + (start - offset), 0);
            body.extend(&section.data);
            placed.push(start);
            offset = start + section.data.len();
        }
        let shoff = (offset + 3) & !3;
        body.resize(body.len() + (shoff - offset), 0);

        let header = FileHeader32::<LittleEndian> {
            e_ident: Ident {
                magic: ELFMAG,
                class: ELFCLASS32,
                data: ELFDATA2LSB,
                version: EV_CURRENT,
                os_abi: ELFOSABI_NONE,
                abi_version: 0,
                padding: [0; 7],
            },
            e_type: U16::new(LE, ET_EXEC),
            e_machine: U16::new(LE, self.machine),
            e_version: U32::new(LE, EV_CURRENT.into()),
            e_entry: U32::new(LE, self.entry),
            e_phoff: U32::new(LE, if phnum > 0 { EHDR_SIZE as u32 } else { 0 }),
            e_shoff: U32::new(LE, word(shoff, "section header offset")?),
            e_flags: U32::new(LE, self.flags),
            e_ehsize: U16::new(LE, EHDR_SIZE as u16),
            e_phentsize: U16::new(LE, PHDR_SIZE as u16),
            e_phnum: U16::new(LE, half(phnum, "program header count")?),
            e_shentsize: U16::new(LE, SHDR_SIZE as u16),
            e_shnum: U16::new(LE, half(shnum, "section count")?),
            e_shstrndx: U16::new(LE, half(self.shstrndx, "section name table index")?),
        };

        let mut data = Vec::with_capacity(shoff + shnum * SHDR_SIZE);
        data.extend(bytes_of(&header));

        for segment in &self.segments {
            let (section, start) = segment
                .section
                .checked_sub(1)
                .and_then(|i| self.sections.get(i).map(|s| (s, placed[i])))
                .ok_or_else(|| {
                    Error::Internal(format!("load segment names section {}", segment.section))
                })?;
            let size = word(section.data.len(), "segment size")?;
            let program_header = ProgramHeader32::<LittleEndian> {
                p_type: U32::new(LE, PT_LOAD),
                p_offset: U32::new(LE, word(start, "segment offset")?),
                p_vaddr: U32::new(LE, section.addr),
                p_paddr: U32::new(LE, section.addr),
                p_filesz: U32::new(LE, size),
                p_memsz: U32::new(LE, size),
                p_flags: U32::new(LE, segment.flags),
                p_align: U32::new(LE, section.align.max(1)),
            };
            data.extend(bytes_of(&program_header));
        }

        data.extend(body);

        data.extend([0u8; SHDR_SIZE]);
        for (section, start) in self.sections.iter().zip(placed) {
            let section_header = SectionHeader32::<LittleEndian> {
                sh_name: U32::new(LE, section.name_offset),
                sh_type: U32::new(LE, section.sh_type),
                sh_flags: U32::new(LE, section.flags),
                sh_addr: U32::new(LE, section.addr),
                sh_offset: U32::new(LE, word(start, "section offset")?),
                sh_size: U32::new(LE, word(section.data.len(), "section size")?),
                sh_link: U32::new(LE, 0),
                sh_info: U32::new(LE, 0),
                sh_addralign: U32::new(LE, section.align.max(1)),
                sh_entsize: U32::new(LE, 0),
            };
            data.extend(bytes_of(&section_header));
        }

        log::debug!(
            "ELF layout: {phnum} program headers, {shnum} sections, section headers at {shoff:#x}"
        );
        Ok(data)
    }
}

fn word(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::Internal(format!("{what} {value:#x} exceeds ELF32")))
}

fn half(value: usize, what: &str) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::Internal(format!("{what} {value} exceeds ELF32")))
}
