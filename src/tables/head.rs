use std::io::{Read, Seek};

use bytes::Buf;

use crate::{SfntError, buffer::SfntReader};

use super::{FormatError, TableRecord};

/// Byte offset of `checkSumAdjustment` inside the head table
pub const CHECKSUM_ADJUSTMENT_OFFSET: u32 = 8;

/// Value of the (obsolete) magic number field of every head table
pub const HEAD_MAGIC_NUMBER: u32 = 0x5F0F_3CF5;

/// Size of the fixed head table layout
pub const HEAD_TABLE_SIZE: usize = 54;

/// A representation of the [head table](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6head.html)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    /// The version of the head table
    /// it's almost guarenteed to be set to version 0x00010000
    version: u32,

    /// Font revision set by the font author/manufacturer
    font_revision: u32,

    /// Check sum adjustment
    /// To compute: set it to 0, calculate the checksum for the 'head'
    /// table and put it in the table directory,
    /// sum the entire font as a uint32_t,
    /// then store 0xB1B0AFBA - sum.
    /// (The checksum for the 'head' table will be wrong as a result.
    ///  That is OK; do not reset it.)
    checksum_adjustment: u32,

    /// Magic number, obselete, always set to 0x5F0F3CF5
    magic_number: u32,

    flags: u16,

    /// Units per em (ranges from 64 to 16384)
    units_per_em: u16,

    /// Seconds since 12:00 midnight, January 1, 1904
    created: i64,
    modified: i64,

    x_min: i16,
    y_min: i16,
    x_max: i16,
    y_max: i16,

    mac_style: u16,

    /// Smallest readable size in pixel
    lowest_rec_ppem: u16,

    font_direction_hint: i16,

    /// Index to loc format, 0 for short offsets and 1 for long
    index_to_loc_format: i16,

    /// Glyph data format (0 is for the current format)
    glyph_data_format: i16,
}

impl Head {
    /// Parses the fixed part of a head table. Trailing bytes are ignored.
    pub fn from_buffer(mut buf: &[u8]) -> Result<Self, FormatError> {
        Ok(Self {
            version: buf.try_get_u32()?,
            font_revision: buf.try_get_u32()?,
            checksum_adjustment: buf.try_get_u32()?,
            magic_number: buf.try_get_u32()?,
            flags: buf.try_get_u16()?,
            units_per_em: buf.try_get_u16()?,
            created: buf.try_get_i64()?,
            modified: buf.try_get_i64()?,
            x_min: buf.try_get_i16()?,
            y_min: buf.try_get_i16()?,
            x_max: buf.try_get_i16()?,
            y_max: buf.try_get_i16()?,
            mac_style: buf.try_get_u16()?,
            lowest_rec_ppem: buf.try_get_u16()?,
            font_direction_hint: buf.try_get_i16()?,
            index_to_loc_format: buf.try_get_i16()?,
            glyph_data_format: buf.try_get_i16()?,
        })
    }

    /// Reads the head table described by `record` from the source.
    pub(crate) fn from_reader<B: Read + Seek>(
        reader: &mut SfntReader<B>,
        record: &TableRecord,
    ) -> Result<Self, SfntError> {
        let len = (record.length() as usize).min(HEAD_TABLE_SIZE);
        let buf = reader.read_vec(record.offset().into(), len)?;

        Ok(Self::from_buffer(&buf)?)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn font_revision(&self) -> u32 {
        self.font_revision
    }

    pub fn checksum_adjustment(&self) -> u32 {
        self.checksum_adjustment
    }

    pub fn magic_number(&self) -> u32 {
        self.magic_number
    }

    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    pub fn created(&self) -> i64 {
        self.created
    }

    pub fn modified(&self) -> i64 {
        self.modified
    }

    /// Bounding box of all glyphs as `(x_min, y_min, x_max, y_max)`
    pub fn bounding_box(&self) -> (i16, i16, i16, i16) {
        (self.x_min, self.y_min, self.x_max, self.y_max)
    }

    pub fn mac_style(&self) -> u16 {
        self.mac_style
    }

    pub fn lowest_rec_ppem(&self) -> u16 {
        self.lowest_rec_ppem
    }

    pub fn font_direction_hint(&self) -> i16 {
        self.font_direction_hint
    }

    pub fn index_to_loc_format(&self) -> i16 {
        self.index_to_loc_format
    }

    pub fn glyph_data_format(&self) -> i16 {
        self.glyph_data_format
    }
}

/// Reads only the `checkSumAdjustment` field of the head table.
///
/// This is a separate 4 byte read at `offset + 8` and does not depend on
/// the rest of the table being well formed. The field itself must lie
/// inside the table.
pub fn read_checksum_adjustment<B: Read + Seek>(
    reader: &mut SfntReader<B>,
    head: &TableRecord,
) -> Result<u32, SfntError> {
    let required = CHECKSUM_ADJUSTMENT_OFFSET + 4;
    if head.length() < required {
        return Err(FormatError::TableTooShort {
            tag: head.tag(),
            length: head.length(),
            required,
        }
        .into());
    }

    reader.seek_to(u64::from(head.offset()) + u64::from(CHECKSUM_ADJUSTMENT_OFFSET))?;

    Ok(reader.read_u32()?)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use font_types::Tag;
    use pretty_assertions::assert_eq;

    use super::*;

    fn head_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend(0x0001_0000u32.to_be_bytes());
        buf.extend(0x0002_8000u32.to_be_bytes());
        buf.extend(0xDEAD_BEEFu32.to_be_bytes());
        buf.extend(HEAD_MAGIC_NUMBER.to_be_bytes());
        buf.extend(0x000Bu16.to_be_bytes());
        buf.extend(1000u16.to_be_bytes());
        buf.extend(3_600_000_000i64.to_be_bytes());
        buf.extend(3_700_000_000i64.to_be_bytes());
        for v in [-50i16, -200, 950, 800] {
            buf.extend(v.to_be_bytes());
        }
        buf.extend(0u16.to_be_bytes());
        buf.extend(8u16.to_be_bytes());
        buf.extend(2i16.to_be_bytes());
        buf.extend(1i16.to_be_bytes());
        buf.extend(0i16.to_be_bytes());
        buf
    }

    #[test]
    fn parses_fixed_layout() {
        let bytes = head_bytes();
        assert_eq!(bytes.len(), HEAD_TABLE_SIZE);

        let head = Head::from_buffer(&bytes).unwrap();
        assert_eq!(head.version(), 0x0001_0000);
        assert_eq!(head.font_revision(), 0x0002_8000);
        assert_eq!(head.checksum_adjustment(), 0xDEAD_BEEF);
        assert_eq!(head.magic_number(), HEAD_MAGIC_NUMBER);
        assert_eq!(head.flags(), 0x000B);
        assert_eq!(head.units_per_em(), 1000);
        assert_eq!(head.created(), 3_600_000_000);
        assert_eq!(head.modified(), 3_700_000_000);
        assert_eq!(head.bounding_box(), (-50, -200, 950, 800));
        assert_eq!(head.mac_style(), 0);
        assert_eq!(head.lowest_rec_ppem(), 8);
        assert_eq!(head.font_direction_hint(), 2);
        assert_eq!(head.index_to_loc_format(), 1);
        assert_eq!(head.glyph_data_format(), 0);
    }

    #[test]
    fn short_head_table() {
        let bytes = head_bytes();
        let err = Head::from_buffer(&bytes[..40]).unwrap_err();
        assert!(matches!(err, FormatError::UnexpectedEnd { .. }));
    }

    #[test]
    fn adjustment_is_read_at_offset_eight() {
        let mut data = vec![0xFFu8; 16];
        data.extend(head_bytes());
        let record = TableRecord::new(Tag::new(b"head"), 0, 16, HEAD_TABLE_SIZE as u32);

        let mut reader = SfntReader::from_buffer(Cursor::new(data));
        assert_eq!(
            read_checksum_adjustment(&mut reader, &record).unwrap(),
            0xDEAD_BEEF
        );
        assert_eq!(
            Head::from_reader(&mut reader, &record).unwrap().units_per_em(),
            1000
        );
    }

    #[test]
    fn adjustment_outside_short_head() {
        // the next table starts right after an 8 byte head
        let mut data = head_bytes();
        data.truncate(8);
        data.extend(0x1234_5678u32.to_be_bytes());
        let record = TableRecord::new(Tag::new(b"head"), 0, 0, 8);

        let mut reader = SfntReader::from_buffer(Cursor::new(data));
        let err = read_checksum_adjustment(&mut reader, &record).unwrap_err();
        assert!(matches!(
            err,
            SfntError::FormatError(FormatError::TableTooShort {
                length: 8,
                required: 12,
                ..
            })
        ));
    }
}
