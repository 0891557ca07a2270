use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("data too short: need {needed} bytes, got {available}")]
    DataTooShort { needed: usize, available: usize },
    #[error("bad magic tag {0:02x?}, expected \"MRVL\"")]
    BadMagic([u8; 4]),
    #[error("bad format magic {0:#010x}")]
    BadVersion(u32),
    #[error("unexpected segment type {0}")]
    BadSegmentType(u32),
    #[error("segment {index} ({offset:#x}+{size:#x}) lies outside the {len} byte image")]
    SegmentOutOfBounds {
        index: usize,
        offset: u32,
        size: u32,
        len: usize,
    },
}

pub trait Serializable: Sized {
    fn serialize(&self) -> Vec<u8>;
    fn deserialize(data: &[u8]) -> Result<(usize, Self), FormatError>;
}

pub(crate) fn ensure_len(data: &[u8], needed: usize) -> Result<(), FormatError> {
    if data.len() < needed {
        return Err(FormatError::DataTooShort {
            needed,
            available: data.len(),
        });
    }
    Ok(())
}

/// Reads a little-endian `u32` at `at`. Callers check the length first.
pub(crate) fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}
