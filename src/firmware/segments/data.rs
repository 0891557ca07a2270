/// Erased-flash value used to fill the tail of a segment.
pub const PADDING_BYTE: u8 = 0xFF;

/// Length rounded up to the next multiple of 4.
pub fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

/// Copies `raw` into a buffer of `padded_len(raw.len())` bytes whose tail is
/// filled with `PADDING_BYTE`.
pub fn pad(raw: &[u8]) -> Vec<u8> {
    let mut buffer = vec![PADDING_BYTE; padded_len(raw.len())];
    buffer[..raw.len()].copy_from_slice(raw);
    buffer
}

/// CRC-32 (IEEE) of a padded segment, padding included.
pub fn checksum(padded: &[u8]) -> u32 {
    crc32fast::hash(padded)
}
