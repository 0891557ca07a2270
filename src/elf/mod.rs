pub use convention::{SectionFlags, SectionInference, SectionRule};
pub use reader::{ElfImage, ProgramSegment};
pub use reconstruct::SectionReconstructor;
pub use strtab::NameTable;
pub use writer::{ElfWriter, SectionRecord};

pub mod convention;
pub mod reader;
pub mod reconstruct;
pub mod strtab;
pub mod writer;
