use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::elf::convention::{infer, SectionFlags, SectionInference, SectionRule};
use crate::error::{Error, Result};
use crate::firmware::SegmentHeader;

const BUILTIN_PROFILE: &str = include_str!("profiles/88mw30x.yaml");

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to parse profile: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid profile: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSectionRule {
    pub name: String,
    #[serde(default)]
    pub flags: SectionFlags,
    #[serde(default = "default_align")]
    pub align: u32,
}

/// Largest section alignment a profile may ask for. Section data is placed at
/// a file offset congruent to its address, so this bounds the padding.
pub const MAX_ALIGN: u32 = 4096;

fn default_align() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryRule {
    pub segment: usize,
    #[serde(default)]
    pub thumb: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawAttributes {
    pub name: String,
    #[serde(rename = "type")]
    pub section_type: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawProfile {
    pub name: String,
    pub machine: u16,
    #[serde(default)]
    pub flags: u32,
    pub entry: Option<EntryRule>,
    pub sections: Vec<RawSectionRule>,
    pub fallback: RawSectionRule,
    pub attributes: RawAttributes,
}

impl RawProfile {
    pub fn from_str(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }
}

/// Fixed architecture metadata stamped into every reconstructed ELF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attributes {
    pub name: String,
    pub section_type: u32,
    pub data: Vec<u8>,
}

/// Describes how a firmware image maps back onto an ELF for one chip family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub machine: u16,
    pub flags: u32,
    pub entry: Option<EntryRule>,
    pub sections: Vec<SectionRule>,
    pub fallback: SectionRule,
    pub attributes: Attributes,
}

impl TryFrom<RawSectionRule> for SectionRule {
    type Error = ProfileError;

    fn try_from(raw: RawSectionRule) -> Result<Self, Self::Error> {
        check_name(&raw.name)?;
        if !raw.align.is_power_of_two() {
            return Err(ProfileError::Invalid(format!(
                "alignment {} of {} is not a power of two",
                raw.align, raw.name
            )));
        }
        if raw.align > MAX_ALIGN {
            return Err(ProfileError::Invalid(format!(
                "alignment {:#x} of {} exceeds {MAX_ALIGN:#x}",
                raw.align, raw.name
            )));
        }
        Ok(SectionRule {
            name: raw.name,
            flags: raw.flags,
            align: raw.align,
        })
    }
}

fn check_name(name: &str) -> Result<(), ProfileError> {
    if name.is_empty() || name.contains('\0') {
        return Err(ProfileError::Invalid(format!(
            "bad section name {name:?}"
        )));
    }
    Ok(())
}

impl TryFrom<RawProfile> for Profile {
    type Error = ProfileError;

    fn try_from(raw: RawProfile) -> Result<Self, Self::Error> {
        if raw.sections.is_empty() {
            return Err(ProfileError::Invalid(
                "at least one positional section is required".to_string(),
            ));
        }
        let sections = raw
            .sections
            .into_iter()
            .map(SectionRule::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let fallback = SectionRule::try_from(raw.fallback)?;

        if let Some(entry) = raw.entry {
            if entry.segment >= sections.len() {
                return Err(ProfileError::Invalid(format!(
                    "entry segment {} has no positional section",
                    entry.segment
                )));
            }
        }

        check_name(&raw.attributes.name)?;
        if raw.attributes.data.is_empty() {
            return Err(ProfileError::Invalid(
                "attribute section is empty".to_string(),
            ));
        }

        Ok(Profile {
            name: raw.name,
            machine: raw.machine,
            flags: raw.flags,
            entry: raw.entry,
            sections,
            fallback,
            attributes: Attributes {
                name: raw.attributes.name,
                section_type: raw.attributes.section_type,
                data: raw.attributes.data,
            },
        })
    }
}

impl TryFrom<String> for Profile {
    type Error = ProfileError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let raw = RawProfile::from_str(&s)?;
        Profile::try_from(raw)
    }
}

impl Profile {
    /// The 88MW30x layout.
    pub fn builtin() -> Result<Self, ProfileError> {
        Profile::try_from(BUILTIN_PROFILE.to_string())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(Error::io(format!("read profile {}", path.display())))?;
        Ok(Profile::try_from(text)?)
    }

    pub fn section_for(&self, index: usize) -> SectionInference<'_> {
        infer(&self.sections, &self.fallback, index)
    }

    /// Entry point for an image with these segments, if the rule applies.
    pub fn entry_point(&self, segments: &[SegmentHeader]) -> Option<u32> {
        let entry = self.entry?;
        let segment = segments.get(entry.segment)?;
        Some(if entry.thumb {
            segment.vaddr | 1
        } else {
            segment.vaddr
        })
    }
}
