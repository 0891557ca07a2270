use std::fmt;

use super::segments::checksum;
use super::{Firmware, FirmwareHeader, SegmentHeader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentReport {
    pub index: usize,
    pub header: SegmentHeader,
    /// CRC-32 recomputed over the stored bytes.
    pub actual_checksum: u32,
}

impl SegmentReport {
    pub fn is_intact(&self) -> bool {
        self.header.checksum == self.actual_checksum
    }
}

/// Read-only summary of a firmware image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub header: FirmwareHeader,
    pub segments: Vec<SegmentReport>,
}

impl Report {
    pub fn from_firmware(firmware: &Firmware) -> Self {
        let segments = firmware
            .segments()
            .enumerate()
            .map(|(index, (header, data))| SegmentReport {
                index,
                header: *header,
                actual_checksum: checksum(data),
            })
            .collect::<Vec<_>>();

        for segment in segments.iter().filter(|s| !s.is_intact()) {
            log::warn!(
                "segment {}: stored checksum {:08x} does not match {:08x}",
                segment.index,
                segment.header.checksum,
                segment.actual_checksum
            );
        }

        Report {
            header: *firmware.header(),
            segments,
        }
    }

    pub fn is_intact(&self) -> bool {
        self.segments.iter().all(SegmentReport::is_intact)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MRVL")?;
        writeln!(f, "ctime:        {}", self.header.ctime)?;
        writeln!(f, "num_segments: {}", self.header.segment_count)?;
        writeln!(f, "ELF version:  {:08x}", self.header.elf_version)?;
        for segment in &self.segments {
            let header = &segment.header;
            writeln!(f, "segment {}:", segment.index)?;
            writeln!(f, "  Offset:            {:8x}", header.offset)?;
            writeln!(f, "  Size:              {:8x}", header.size)?;
            writeln!(f, "  Virtual address:   {:8x}", header.vaddr)?;
            writeln!(f, "  Checksum:          {:08x}", header.checksum)?;
            writeln!(f, "  Checksum (actual): {:08x}", segment.actual_checksum)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firmware::{FirmwareBuilder, LoadableSegment, HEADER_SIZE, SEGMENT_HEADER_SIZE};

    fn image() -> Vec<u8> {
        let mut builder = FirmwareBuilder::new(1).with_ctime(1234);
        builder.push(LoadableSegment::new(0x1F00_0000, b"boot"));
        builder.push(LoadableSegment::new(0x1F00_0100, b"main!!"));
        builder.to_bytes().unwrap()
    }

    #[test]
    fn fresh_image_is_intact() {
        let report = Report::from_firmware(&Firmware::parse(&image()).unwrap());
        assert!(report.is_intact());
        assert_eq!(report.segments.len(), 2);
        assert_eq!(report.segments[1].actual_checksum, report.segments[1].header.checksum);
    }

    #[test]
    fn corrupted_padding_is_reported() {
        let mut bytes = image();
        let last = bytes.len() - 1;
        bytes[last] = 0x00;
        let report = Report::from_firmware(&Firmware::parse(&bytes).unwrap());
        assert!(report.segments[0].is_intact());
        assert!(!report.segments[1].is_intact());
        assert!(!report.is_intact());
    }

    #[test]
    fn dump_lists_every_field() {
        let report = Report::from_firmware(&Firmware::parse(&image()).unwrap());
        let text = report.to_string();
        assert!(text.starts_with("MRVL\nctime:        1234\nnum_segments: 2\n"));
        assert!(text.contains("ELF version:  00000001"));
        assert!(text.contains("segment 1:"));
        assert!(text.contains("  Virtual address:   1f000100"));
        let first_offset = HEADER_SIZE + 2 * SEGMENT_HEADER_SIZE;
        assert!(text.contains(&format!("  Offset:            {first_offset:8x}")));
    }
}
