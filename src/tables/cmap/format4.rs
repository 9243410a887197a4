use bytes::Buf;

use super::{CmapError, NOTDEF_GLYPH};

/// Fixed header of a format 4 subtable, before the segment arrays
pub(crate) const FORMAT4_HEADER_SIZE: usize = 14;

/// One segment of a format 4 subtable that maps through `idDelta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format4Range {
    start_code: u16,
    end_code: u16,
    /// Signed, stored raw and applied modulo 65536
    id_delta: u16,
}

impl Format4Range {
    pub fn new(start_code: u16, end_code: u16, id_delta: u16) -> Self {
        Self {
            start_code,
            end_code,
            id_delta,
        }
    }

    pub fn start_code(&self) -> u16 {
        self.start_code
    }

    pub fn end_code(&self) -> u16 {
        self.end_code
    }

    /// The delta as the signed value the format defines
    pub fn id_delta(&self) -> i16 {
        self.id_delta as i16
    }

    /// Glyph for a code point inside this range, modulo 65536
    fn glyph(&self, code: u16) -> u16 {
        self.id_delta.wrapping_add(code)
    }
}

/// A parsed [format 4](https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-4-segment-mapping-to-delta-values)
/// "segment mapping to delta values" subtable.
///
/// Only segments with a zero `idRangeOffset` are supported; the ranges keep
/// the file order, which the format requires to be ascending by end code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format4Mapper {
    language: u16,
    ranges: Vec<Format4Range>,
}

impl Format4Mapper {
    /// Parses a complete format 4 subtable, starting at its format field.
    pub fn parse(mut data: &[u8]) -> Result<Self, CmapError> {
        if data.len() < FORMAT4_HEADER_SIZE {
            return Err(CmapError::TruncatedSubtable {
                requested: FORMAT4_HEADER_SIZE,
                available: data.len(),
            });
        }

        let format = data.try_get_u16()?;
        if format != 4 {
            return Err(CmapError::UnsupportedCmapFormat(format));
        }

        let _length = data.try_get_u16()?;
        let language = data.try_get_u16()?;
        let seg_count = usize::from(data.try_get_u16()? / 2);
        // searchRange, entrySelector and rangeShift only help a binary search
        data.try_get_u16()?;
        data.try_get_u16()?;
        data.try_get_u16()?;

        let end_codes = read_array(&mut data, seg_count)?;
        let _reserved_pad = data.try_get_u16()?;
        let start_codes = read_array(&mut data, seg_count)?;
        let id_deltas = read_array(&mut data, seg_count)?;
        let id_range_offsets = read_array(&mut data, seg_count)?;

        let mut ranges = Vec::with_capacity(seg_count);
        for segment in 0..seg_count {
            let range_offset = id_range_offsets[segment];
            if range_offset != 0 {
                return Err(CmapError::UnsupportedIndirectMapping {
                    segment,
                    range_offset,
                });
            }

            ranges.push(Format4Range::new(
                start_codes[segment],
                end_codes[segment],
                id_deltas[segment],
            ));
        }

        Ok(Self { language, ranges })
    }

    pub fn language(&self) -> u16 {
        self.language
    }

    pub fn ranges(&self) -> &[Format4Range] {
        &self.ranges
    }

    /// Maps a code point to a glyph index.
    ///
    /// Code points between two segments, or after the last one, map to
    /// glyph 0 (`.notdef`).
    pub fn map(&self, code_point: u32) -> Result<u16, CmapError> {
        let Ok(code) = u16::try_from(code_point) else {
            return Err(CmapError::CodePointOutOfRange(code_point));
        };

        for range in &self.ranges {
            if range.end_code < code {
                continue;
            }
            if range.start_code > code {
                return Ok(NOTDEF_GLYPH);
            }
            return Ok(range.glyph(code));
        }

        Ok(NOTDEF_GLYPH)
    }
}

fn read_array(data: &mut &[u8], count: usize) -> Result<Vec<u16>, CmapError> {
    (0..count)
        .map(|_| data.try_get_u16().map_err(CmapError::from))
        .collect()
}
