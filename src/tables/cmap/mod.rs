//! The [cmap table](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6cmap.html)
//! maps character codes to glyph indices through one or more subtables,
//! each keyed by platform and encoding.

use std::{
    fmt,
    io::{Read, Seek},
};

use bytes::TryGetError;
use thiserror::Error;

use crate::{SfntError, buffer::SfntReader};

use super::TableRecord;

mod format4;

pub use format4::{Format4Mapper, Format4Range};

/// Glyph index of the `.notdef` glyph, returned for unmapped code points
pub const NOTDEF_GLYPH: u16 = 0;

/// version + numTables
pub const CMAP_HEADER_SIZE: u32 = 4;
/// platformID + encodingID + offset
pub const ENCODING_RECORD_SIZE: u32 = 8;

/// Errors raised while locating, parsing or querying a cmap subtable
#[derive(Error, Debug)]
pub enum CmapError {
    #[error("No cmap subtable for platform {0}")]
    NoMatchingPlatform(PlatformId),

    #[error("Unsupported cmap subtable format {0}")]
    UnsupportedCmapFormat(u16),

    #[error("Segment {segment} maps through the glyph index array (idRangeOffset {range_offset}), which is not supported")]
    UnsupportedIndirectMapping { segment: usize, range_offset: u16 },

    #[error("Code point U+{0:04X} is outside the range of a format 4 subtable")]
    CodePointOutOfRange(u32),

    #[error("cmap data ended early, needed {requested} bytes but only {available} were left")]
    TruncatedSubtable { requested: usize, available: usize },

    #[error("Subtable at offset {offset} with length {length} does not fit in a cmap table of {cmap_length} bytes")]
    SubtableOutOfBounds {
        offset: u32,
        length: u32,
        cmap_length: u32,
    },
}

impl From<TryGetError> for CmapError {
    fn from(value: TryGetError) -> Self {
        Self::TruncatedSubtable {
            requested: value.requested,
            available: value.available,
        }
    }
}

/// Represents the platform identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlatformId {
    #[default]
    Unicode,
    Macintosh,
    Reserved,
    Microsoft,
    Unknown(u16),
}

impl From<u16> for PlatformId {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Unicode,
            1 => Self::Macintosh,
            2 => Self::Reserved,
            3 => Self::Microsoft,
            _ => Self::Unknown(value),
        }
    }
}

impl From<PlatformId> for u16 {
    fn from(value: PlatformId) -> Self {
        match value {
            PlatformId::Unicode => 0,
            PlatformId::Macintosh => 1,
            PlatformId::Reserved => 2,
            PlatformId::Microsoft => 3,
            PlatformId::Unknown(value) => value,
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, u16::from(*self))
    }
}

/// A record of the cmap index pointing at one subtable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingRecord {
    /// The platform identifier
    platform_id: PlatformId,

    /// The platform specific encoding identifier
    encoding_id: u16,

    /// The offset of the subtable from the start of the cmap table
    offset: u32,
}

impl EncodingRecord {
    pub fn platform_id(&self) -> PlatformId {
        self.platform_id
    }

    pub fn encoding_id(&self) -> u16 {
        self.encoding_id
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}

/// Walks the cmap index and returns the first record for `platform`.
///
/// Records are scanned in file order and the scan stops at the first
/// match. When no record matches, this is an error; there is no fall back
/// to some other platform.
pub fn locate_subtable<B: Read + Seek>(
    reader: &mut SfntReader<B>,
    cmap: &TableRecord,
    platform: PlatformId,
) -> Result<EncodingRecord, SfntError> {
    reader.seek_to(cmap.offset().into())?;
    // version, always 0
    reader.skip(2)?;
    let num_subtables = reader.read_u16()?;

    for index in 0..u32::from(num_subtables) {
        // records past the end of the cmap table are only an error once
        // the scan gets there
        let record_end = CMAP_HEADER_SIZE + (index + 1) * ENCODING_RECORD_SIZE;
        if record_end > cmap.length() {
            return Err(CmapError::TruncatedSubtable {
                requested: record_end as usize,
                available: cmap.length() as usize,
            }
            .into());
        }

        let record = EncodingRecord {
            platform_id: reader.read_u16()?.into(),
            encoding_id: reader.read_u16()?,
            offset: reader.read_u32()?,
        };

        if record.platform_id == platform {
            return Ok(record);
        }
    }

    Err(CmapError::NoMatchingPlatform(platform).into())
}

/// Strategy used to turn a code point into a glyph index.
///
/// Each variant wraps one parsed subtable format. Only format 4 is
/// supported for now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlyphMapper {
    Format4(Format4Mapper),
}

impl GlyphMapper {
    /// Locates the subtable for `platform` in the cmap table and parses it.
    pub fn load<B: Read + Seek>(
        reader: &mut SfntReader<B>,
        cmap: &TableRecord,
        platform: PlatformId,
    ) -> Result<Self, SfntError> {
        let record = locate_subtable(reader, cmap, platform)?;
        let subtable_start = u64::from(cmap.offset()) + u64::from(record.offset());

        // Every format starts with its format number, the meaning of the
        // next field depends on it
        reader.seek_to(subtable_start)?;
        let format = reader.read_u16()?;
        let length = u32::from(reader.read_u16()?);

        let mapper = match format {
            4 => {
                if u64::from(record.offset()) + u64::from(length) > u64::from(cmap.length()) {
                    return Err(CmapError::SubtableOutOfBounds {
                        offset: record.offset(),
                        length,
                        cmap_length: cmap.length(),
                    }
                    .into());
                }

                let data = reader.read_vec(subtable_start, length as usize)?;
                Self::Format4(Format4Mapper::parse(&data)?)
            }
            other => return Err(CmapError::UnsupportedCmapFormat(other).into()),
        };

        log::debug!(
            "using cmap subtable platform {} encoding {} format {} ({} segments)",
            record.platform_id(),
            record.encoding_id(),
            format,
            mapper.segment_count()
        );

        Ok(mapper)
    }

    /// Maps a code point to a glyph index, `0` meaning `.notdef`
    pub fn map(&self, code_point: u32) -> Result<u16, CmapError> {
        match self {
            Self::Format4(mapper) => mapper.map(code_point),
        }
    }

    /// The cmap format this mapper was parsed from
    pub fn format(&self) -> u16 {
        match self {
            Self::Format4(_) => 4,
        }
    }

    fn segment_count(&self) -> usize {
        match self {
            Self::Format4(mapper) => mapper.ranges().len(),
        }
    }
}
