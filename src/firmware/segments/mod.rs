pub mod data;
pub mod header;

pub use data::{checksum, pad, padded_len, PADDING_BYTE};
pub use header::{SegmentHeader, SEGMENT_HEADER_SIZE, SEGMENT_TYPE};
