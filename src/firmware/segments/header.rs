use crate::serializable::*;

/// Type tag written into every segment header; the bootloader expects 2.
pub const SEGMENT_TYPE: u32 = 2;
pub const SEGMENT_HEADER_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    pub segment_type: u32,
    pub offset: u32, // from the start of the image
    pub size: u32,   // padded
    pub vaddr: u32,
    pub checksum: u32,
}

impl Serializable for SegmentHeader {
    fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(SEGMENT_HEADER_SIZE);
        data.extend(self.segment_type.to_le_bytes());
        data.extend(self.offset.to_le_bytes());
        data.extend(self.size.to_le_bytes());
        data.extend(self.vaddr.to_le_bytes());
        data.extend(self.checksum.to_le_bytes());
        data
    }

    // The type tag is the only thing checked here; offset and size are
    // validated against the image by `Firmware::deserialize`.
    fn deserialize(data: &[u8]) -> Result<(usize, Self), FormatError> {
        ensure_len(data, SEGMENT_HEADER_SIZE)?;

        let segment_type = read_u32(data, 0);
        if segment_type != SEGMENT_TYPE {
            return Err(FormatError::BadSegmentType(segment_type));
        }

        Ok((
            SEGMENT_HEADER_SIZE,
            SegmentHeader {
                segment_type,
                offset: read_u32(data, 4),
                size: read_u32(data, 8),
                vaddr: read_u32(data, 12),
                checksum: read_u32(data, 16),
            },
        ))
    }
}

impl SegmentHeader {
    pub fn new(offset: u32, size: u32, vaddr: u32, checksum: u32) -> Self {
        SegmentHeader {
            segment_type: SEGMENT_TYPE,
            offset,
            size,
            vaddr,
            checksum,
        }
    }

    pub fn end(&self) -> u64 {
        self.offset as u64 + self.size as u64
    }
}
