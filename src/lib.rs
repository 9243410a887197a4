//! Reads the table directory of TrueType / OpenType (sfnt) fonts, verifies
//! their checksums and maps Unicode code points to glyph indices through
//! the cmap table.

use buffer::ReaderError;
use checksum::ChecksumError;
use tables::{FormatError, cmap::CmapError};
use thiserror::Error;

pub mod buffer;
pub mod checksum;
mod font;
pub mod tables;

pub use font::{Font, FontOptions};
pub use font_types::Tag;

#[derive(Debug, Error)]
pub enum SfntError {
    #[error(transparent)]
    FormatError(#[from] FormatError),

    #[error(transparent)]
    ChecksumError(#[from] ChecksumError),

    #[error(transparent)]
    CmapError(#[from] CmapError),

    #[error(transparent)]
    ReaderError(#[from] ReaderError),
}
