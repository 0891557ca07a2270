use std::io;

use thiserror::Error;

use crate::profile::ProfileError;
use crate::serializable::FormatError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CapacityError {
    #[error("ELF contains no suitable segments")]
    NoSegments,
    #[error("ELF contains {0} segments, more than the maximum allowed 9")]
    TooManySegments(usize),
    #[error("segment {index} does not fit in a 32-bit firmware image")]
    SegmentTooLarge { index: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("input is not an ELF object")]
    NotElf,
    #[error("only 32-bit ELF is supported")]
    UnsupportedClass,
    #[error("program header {index} points outside the file")]
    SegmentOutOfRange { index: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error("ELF: {0}")]
    Elf(#[from] object::read::Error),
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn io(context: impl Into<String>) -> impl FnOnce(io::Error) -> Error {
        let context = context.into();
        move |source| Error::Io { context, source }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
