//! Table and whole-file checksum verification.
//!
//! A checksum is the wrapping `u32` sum of the big-endian words of the data.
//! Summation stops at the first word that cannot be read completely: a
//! trailing partial word contributes nothing, it is not zero padded. Font
//! compilers computed the stored values the same way.

use std::io::{Read, Seek};

use font_types::Tag;
use thiserror::Error;

use crate::{
    SfntError,
    buffer::{ReaderError, SfntReader},
    tables::{RequiredTables, TableDirectory, TableRecord, head},
};

/// The whole font, `checkSumAdjustment` included, must sum to this value
pub const FONT_CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;

#[derive(Error, Debug)]
pub enum ChecksumError {
    #[error("Missing required table '{0}'")]
    MissingRequiredTable(Tag),

    #[error("Table '{tag}' checksum failed: stored 0x{stored:08X}, computed 0x{computed:08X}")]
    TableChecksumMismatch { tag: Tag, stored: u32, computed: u32 },

    #[error("Font checksum failed: adjustment 0x{adjustment:08X}, computed 0x{computed:08X}")]
    FontChecksumMismatch { adjustment: u32, computed: u32 },
}

/// Sums the words starting at `offset`, reading at most `max_words` of
/// them, or everything up to the end of the source when `None`.
pub fn word_sum<B: Read + Seek>(
    reader: &mut SfntReader<B>,
    offset: u64,
    max_words: Option<u64>,
) -> Result<u32, ReaderError> {
    reader.seek_to(offset)?;

    let mut sum = 0u32;
    let mut words = 0u64;
    while max_words.is_none_or(|max| words < max) {
        match reader.read_u32() {
            Ok(word) => sum = sum.wrapping_add(word),
            Err(err) if err.is_unexpected_eof() => break,
            Err(err) => return Err(err),
        }
        words += 1;
    }

    Ok(sum)
}

/// Computes the checksum of a table over its length rounded up to a
/// multiple of 4. For `head` the embedded `checkSumAdjustment` is taken
/// out again, since it was zero when the stored checksum was computed.
pub fn table_checksum<B: Read + Seek>(
    reader: &mut SfntReader<B>,
    record: &TableRecord,
) -> Result<u32, SfntError> {
    let sum = word_sum(reader, record.offset().into(), Some(record.padded_length() / 4))?;

    if record.tag() == RequiredTables::Head.tag() {
        let adjustment = head::read_checksum_adjustment(reader, record)?;
        return Ok(sum.wrapping_sub(adjustment));
    }

    Ok(sum)
}

/// Verifies a font, reporting the first problem found.
///
/// Required tables are checked first, then every table checksum, then the
/// checksum of the whole file.
pub fn check<B: Read + Seek>(
    reader: &mut SfntReader<B>,
    directory: &TableDirectory,
) -> Result<(), SfntError> {
    for required in RequiredTables::ALL {
        if directory.get(required.tag()).is_none() {
            log::warn!("required table '{}' is missing", required.tag());
            return Err(ChecksumError::MissingRequiredTable(required.tag()).into());
        }
    }

    for (tag, record) in directory {
        let computed = table_checksum(reader, record)?;
        if computed != record.checksum() {
            log::warn!(
                "table '{tag}' checksum mismatch: stored 0x{:08X}, computed 0x{computed:08X}",
                record.checksum()
            );
            return Err(ChecksumError::TableChecksumMismatch {
                tag: *tag,
                stored: record.checksum(),
                computed,
            }
            .into());
        }
    }

    check_font_checksum(reader, directory)
}

fn check_font_checksum<B: Read + Seek>(
    reader: &mut SfntReader<B>,
    directory: &TableDirectory,
) -> Result<(), SfntError> {
    let head = directory.record(RequiredTables::Head.tag())?;
    let adjustment = head::read_checksum_adjustment(reader, head)?;
    let total = word_sum(reader, 0, None)?;

    // The adjustment is part of `total`, so this only holds when the file
    // sums to the magic constant
    let computed = FONT_CHECKSUM_MAGIC.wrapping_sub(total).wrapping_add(adjustment);
    if computed != adjustment {
        log::warn!("font checksum mismatch: whole file sums to 0x{total:08X}");
        return Err(ChecksumError::FontChecksumMismatch {
            adjustment,
            computed,
        }
        .into());
    }

    Ok(())
}
