pub use builder::{FirmwareBuilder, LoadableSegment};
pub use header::{FirmwareHeader, FORMAT_MAGIC, HEADER_SIZE, MAGIC_TAG};
pub use inspect::Report;
pub use segments::{SegmentHeader, SEGMENT_HEADER_SIZE, SEGMENT_TYPE};

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::serializable::*;

pub mod builder;
pub mod header;
pub mod inspect;
pub mod segments;

/// Largest segment count the on-device loader accepts.
pub const MAX_SEGMENTS: usize = 9;

/// A fully decoded firmware image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Firmware {
    header: FirmwareHeader,
    segment_headers: Vec<SegmentHeader>,
    segments: Vec<Vec<u8>>,
}

impl Serializable for Firmware {
    /// Header, segment-header table and segment data back to back. This is
    /// the layout `FirmwareBuilder` produces, so images written by this crate
    /// come back byte for byte.
    fn serialize(&self) -> Vec<u8> {
        let mut data = self.header.serialize();
        for header in &self.segment_headers {
            data.extend(header.serialize());
        }
        for segment in &self.segments {
            data.extend(segment);
        }
        data
    }

    fn deserialize(data: &[u8]) -> Result<(usize, Self), FormatError> {
        // Magic is checked before anything sized by segment_count exists
        let (header_size, header) = FirmwareHeader::deserialize(data)?;
        let count = header.segment_count as usize;

        let table_end = count
            .checked_mul(SEGMENT_HEADER_SIZE)
            .and_then(|table| table.checked_add(header_size))
            .unwrap_or(usize::MAX);
        ensure_len(data, table_end)?;

        let mut segment_headers = Vec::with_capacity(count);
        let mut offset = header_size;
        for _ in 0..count {
            let (size, segment_header) = SegmentHeader::deserialize(&data[offset..])?;
            segment_headers.push(segment_header);
            offset += size;
        }

        let mut segments = Vec::with_capacity(count);
        let mut end = offset;
        for (index, segment_header) in segment_headers.iter().enumerate() {
            if segment_header.end() > data.len() as u64 {
                return Err(FormatError::SegmentOutOfBounds {
                    index,
                    offset: segment_header.offset,
                    size: segment_header.size,
                    len: data.len(),
                });
            }
            let start = segment_header.offset as usize;
            let stop = segment_header.end() as usize;
            segments.push(data[start..stop].to_vec());
            end = end.max(stop);
        }

        Ok((
            end,
            Firmware {
                header,
                segment_headers,
                segments,
            },
        ))
    }
}

impl Firmware {
    pub fn parse(data: &[u8]) -> Result<Self, FormatError> {
        Firmware::deserialize(data).map(|(_, firmware)| firmware)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(Error::io(format!("open {}", path.display())))?;
        let firmware = Firmware::parse(&data)?;
        log::debug!(
            "read {} with {} segments",
            path.display(),
            firmware.segment_count()
        );
        Ok(firmware)
    }

    pub fn header(&self) -> &FirmwareHeader {
        &self.header
    }

    pub fn segment_count(&self) -> usize {
        self.segment_headers.len()
    }

    pub fn segment_headers(&self) -> &[SegmentHeader] {
        &self.segment_headers
    }

    /// Segment headers paired with their padded data, in image order.
    pub fn segments(&self) -> impl Iterator<Item = (&SegmentHeader, &[u8])> {
        self.segment_headers
            .iter()
            .zip(self.segments.iter().map(Vec::as_slice))
    }
}
