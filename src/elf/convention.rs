//! Positional section inference.
//!
//! A firmware image does not say what its segments are. The segment index
//! alone decides the reconstructed section's name, permissions and
//! alignment. This is a heuristic taken from a handful of vendor samples,
//! not a faithful recovery of the original ELF.

use object::elf::{PF_R, PF_W, PF_X, SHF_ALLOC, SHF_EXECINSTR, SHF_WRITE};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SectionFlags {
    pub alloc: bool,
    pub write: bool,
    pub execute: bool,
}

impl SectionFlags {
    pub const CODE: SectionFlags = SectionFlags {
        alloc: true,
        write: false,
        execute: true,
    };

    /// `sh_flags` value.
    pub fn bits(&self) -> u32 {
        let mut bits = 0;
        if self.alloc {
            bits |= SHF_ALLOC;
        }
        if self.write {
            bits |= SHF_WRITE;
        }
        if self.execute {
            bits |= SHF_EXECINSTR;
        }
        bits
    }

    /// `p_flags` value for a load segment covering the section.
    pub fn segment_bits(&self) -> u32 {
        let mut bits = PF_R;
        if self.write {
            bits |= PF_W;
        }
        if self.execute {
            bits |= PF_X;
        }
        bits
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRule {
    pub name: String,
    pub flags: SectionFlags,
    pub align: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionInference<'p> {
    pub rule: &'p SectionRule,
    /// False when the index is past the table and the fallback was used.
    pub known: bool,
}

/// Looks up `index` in the ordered rule table, falling back for anything
/// past its end.
pub fn infer<'p>(
    rules: &'p [SectionRule],
    fallback: &'p SectionRule,
    index: usize,
) -> SectionInference<'p> {
    match rules.get(index) {
        Some(rule) => SectionInference { rule, known: true },
        None => SectionInference {
            rule: fallback,
            known: false,
        },
    }
}
