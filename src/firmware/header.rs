use crate::serializable::*;

pub const MAGIC_TAG: [u8; 4] = *b"MRVL";
pub const FORMAT_MAGIC: u32 = 0x2E9C_F17B;
pub const HEADER_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareHeader {
    pub ctime: u32,
    pub segment_count: u32,
    pub elf_version: u32,
}

impl Serializable for FirmwareHeader {
    fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(HEADER_SIZE);
        data.extend(MAGIC_TAG);
        data.extend(FORMAT_MAGIC.to_le_bytes());
        data.extend(self.ctime.to_le_bytes());
        data.extend(self.segment_count.to_le_bytes());
        data.extend(self.elf_version.to_le_bytes());
        data
    }

    fn deserialize(data: &[u8]) -> Result<(usize, Self), FormatError> {
        ensure_len(data, HEADER_SIZE)?;

        let tag = [data[0], data[1], data[2], data[3]];
        if tag != MAGIC_TAG {
            return Err(FormatError::BadMagic(tag));
        }
        let format_magic = read_u32(data, 4);
        if format_magic != FORMAT_MAGIC {
            return Err(FormatError::BadVersion(format_magic));
        }

        Ok((
            HEADER_SIZE,
            FirmwareHeader {
                ctime: read_u32(data, 8),
                segment_count: read_u32(data, 12),
                elf_version: read_u32(data, 16),
            },
        ))
    }
}

impl FirmwareHeader {
    pub fn new(ctime: u32, segment_count: u32, elf_version: u32) -> Self {
        FirmwareHeader {
            ctime,
            segment_count,
            elf_version,
        }
    }
}
