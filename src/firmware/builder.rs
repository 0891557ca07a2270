use std::io::{Cursor, Seek, SeekFrom, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use super::header::{FirmwareHeader, HEADER_SIZE};
use super::segments::{checksum, pad, SegmentHeader, SEGMENT_HEADER_SIZE};
use super::MAX_SEGMENTS;
use crate::error::{CapacityError, Error, Result};
use crate::serializable::Serializable;

/// A loadable block of code or data and the address it is loaded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadableSegment<'a> {
    pub vaddr: u32,
    pub data: &'a [u8],
}

impl<'a> LoadableSegment<'a> {
    pub fn new(vaddr: u32, data: &'a [u8]) -> Self {
        LoadableSegment { vaddr, data }
    }
}

/// Packs loadable segments into a firmware image.
///
/// The segment-header table is written twice: first as a zero-filled
/// placeholder, then once more after all segment data has been laid out and
/// every offset and checksum is known. Segment order is kept as pushed.
#[derive(Debug, Clone)]
pub struct FirmwareBuilder<'a> {
    ctime: u32,
    elf_version: u32,
    segments: Vec<LoadableSegment<'a>>,
}

impl<'a> FirmwareBuilder<'a> {
    pub fn new(elf_version: u32) -> Self {
        FirmwareBuilder {
            ctime: unix_time(),
            elf_version,
            segments: Vec::new(),
        }
    }

    pub fn with_ctime(mut self, ctime: u32) -> Self {
        self.ctime = ctime;
        self
    }

    pub fn push(&mut self, segment: LoadableSegment<'a>) {
        self.segments.push(segment);
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn header(&self) -> Result<FirmwareHeader, CapacityError> {
        match self.segments.len() {
            0 => Err(CapacityError::NoSegments),
            n if n > MAX_SEGMENTS => Err(CapacityError::TooManySegments(n)),
            n => Ok(FirmwareHeader::new(self.ctime, n as u32, self.elf_version)),
        }
    }

    /// Writes the image at the current position of `out` and returns the
    /// final segment headers. Offsets are relative to that starting position.
    /// The cursor is left at the end of the image.
    pub fn write<W: Write + Seek>(&self, out: &mut W) -> Result<Vec<SegmentHeader>> {
        let header = self.header()?;
        let base = out
            .stream_position()
            .map_err(Error::io("locate firmware start"))?;

        out.write_all(&header.serialize())
            .map_err(Error::io("write firmware header"))?;
        out.write_all(&vec![0u8; self.segments.len() * SEGMENT_HEADER_SIZE])
            .map_err(Error::io("reserve segment header table"))?;

        let mut headers = Vec::with_capacity(self.segments.len());
        for (index, segment) in self.segments.iter().enumerate() {
            let padded = pad(segment.data);
            let crc = checksum(&padded);

            let position = out
                .stream_position()
                .map_err(Error::io("locate segment data"))?
                - base;
            let offset = u32::try_from(position)
                .map_err(|_| CapacityError::SegmentTooLarge { index })?;
            let size = u32::try_from(padded.len())
                .ok()
                .filter(|size| offset.checked_add(*size).is_some())
                .ok_or(CapacityError::SegmentTooLarge { index })?;

            out.write_all(&padded)
                .map_err(Error::io(format!("write segment {index}")))?;
            log::debug!(
                "segment {index}: vaddr {:#010x}, {} bytes at {offset:#x} (padded to {size}), crc {crc:08x}",
                segment.vaddr,
                segment.data.len(),
            );
            headers.push(SegmentHeader::new(offset, size, segment.vaddr, crc));
        }
        let end = out
            .stream_position()
            .map_err(Error::io("locate firmware end"))?;

        out.seek(SeekFrom::Start(base + HEADER_SIZE as u64))
            .map_err(Error::io("seek to segment header table"))?;
        for header in &headers {
            out.write_all(&header.serialize())
                .map_err(Error::io("write segment header"))?;
        }

        let table_end = out
            .stream_position()
            .map_err(Error::io("locate segment header table end"))?
            - base;
        if table_end != headers[0].offset as u64 {
            return Err(Error::Internal(format!(
                "segment header table ends at {table_end:#x} but first segment starts at {:#x}",
                headers[0].offset
            )));
        }

        out.seek(SeekFrom::Start(end))
            .map_err(Error::io("seek to firmware end"))?;
        Ok(headers)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

fn unix_time() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as u32)
        .unwrap_or(0)
}
