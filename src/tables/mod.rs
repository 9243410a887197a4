use std::{
    collections::{BTreeMap, btree_map::Iter},
    io::{Read, Seek},
};

use bytes::{Buf, TryGetError};
use font_types::Tag;
use thiserror::Error;

use crate::{SfntError, buffer::SfntReader};

pub mod cmap;
pub mod head;

/// Scalar type of a standard TrueType / OpenType font
pub const TRUETYPE_SCALAR: u32 = 0x0001_0000;
/// Scalar type used by Apple for TrueType fonts, ASCII `true`
pub const APPLE_TRUE_SCALAR: u32 = 0x7472_7565;

/// Size of the offset table which opens every sfnt file
pub const OFFSET_TABLE_SIZE: usize = 12;
/// Size of a single table record in the table directory
pub const TABLE_RECORD_SIZE: usize = 16;

/// An enum for the required tables
/// tables where every TrueType formatted font must include in it's
/// file's table directory.
/// For more information, see the [Apple Documentation Table 2](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6.html)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RequiredTables {
    Cmap,
    Glyf,
    Head,
    Hhea,
    Hmtx,
    Loca,
    Maxp,
    Name,
    Post,
}

impl RequiredTables {
    /// Every required table, in the order presence is verified
    pub const ALL: [RequiredTables; 9] = [
        Self::Cmap,
        Self::Glyf,
        Self::Head,
        Self::Hhea,
        Self::Hmtx,
        Self::Loca,
        Self::Maxp,
        Self::Name,
        Self::Post,
    ];

    pub const fn tag(self) -> Tag {
        match self {
            Self::Cmap => Tag::new(b"cmap"),
            Self::Glyf => Tag::new(b"glyf"),
            Self::Head => Tag::new(b"head"),
            Self::Hhea => Tag::new(b"hhea"),
            Self::Hmtx => Tag::new(b"hmtx"),
            Self::Loca => Tag::new(b"loca"),
            Self::Maxp => Tag::new(b"maxp"),
            Self::Name => Tag::new(b"name"),
            Self::Post => Tag::new(b"post"),
        }
    }
}

/// Represents the error messages which may occur when trying
/// to parse the table directory or a fixed-size table
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Invalid magic number 0x{0:08X}, expected 0x00010000 or 'true'")]
    InvalidMagic(u32),

    #[error("The table directory declares {declared} tables but only {parsed} records could be read")]
    TruncatedDirectory { declared: u16, parsed: u16 },

    #[error("Unexpected end of data, needed {requested} bytes but only {available} were left")]
    UnexpectedEnd { requested: usize, available: usize },

    #[error("Table '{tag}' spans bytes {offset}..{end} but the file is only {file_len} bytes long")]
    TableOutOfBounds {
        tag: Tag,
        offset: u32,
        end: u64,
        file_len: u64,
    },

    #[error("Table '{0}' not found")]
    TableNotFound(Tag),

    #[error("Table '{tag}' is {length} bytes long, at least {required} are needed")]
    TableTooShort { tag: Tag, length: u32, required: u32 },
}

impl From<TryGetError> for FormatError {
    fn from(value: TryGetError) -> Self {
        Self::UnexpectedEnd {
            requested: value.requested,
            available: value.available,
        }
    }
}

/// Represents the offset subtable directory and it's metadata
/// providing us with a important info such as the number of tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetTable {
    scalar_type: u32,
    num_tables: u16,
    search_range: u16,
    entry_selector: u16,
    range_shift: u16,
}

impl OffsetTable {
    /// Constructs the offset sub table from a raw buffer.
    ///
    /// The magic number is checked before anything else, so a buffer
    /// holding at least 4 bytes of something that isn't a font is always
    /// reported as [`FormatError::InvalidMagic`].
    pub fn from_buffer(mut buf: &[u8]) -> Result<Self, FormatError> {
        let scalar_type = buf.try_get_u32()?;
        if scalar_type != TRUETYPE_SCALAR && scalar_type != APPLE_TRUE_SCALAR {
            return Err(FormatError::InvalidMagic(scalar_type));
        }

        Ok(Self {
            scalar_type,
            num_tables: buf.try_get_u16()?,
            search_range: buf.try_get_u16()?,
            entry_selector: buf.try_get_u16()?,
            range_shift: buf.try_get_u16()?,
        })
    }

    /// Parses the offset table from the very start of the source
    pub(crate) fn from_reader<B: Read + Seek>(
        reader: &mut SfntReader<B>,
    ) -> Result<Self, SfntError> {
        reader.seek_to(0)?;

        // A short file is not a read error here: whatever is there still
        // decides between a bad magic and a truncated header
        let mut buffer = [0u8; OFFSET_TABLE_SIZE];
        let filled = reader.read_available(&mut buffer)?;

        Ok(Self::from_buffer(&buffer[..filled])?)
    }

    pub fn scalar_type(&self) -> u32 {
        self.scalar_type
    }

    /// Returns the number of tables declared by the font file
    pub fn num_tables(&self) -> u16 {
        self.num_tables
    }

    pub fn search_range(&self) -> u16 {
        self.search_range
    }

    pub fn entry_selector(&self) -> u16 {
        self.entry_selector
    }

    pub fn range_shift(&self) -> u16 {
        self.range_shift
    }
}

/// A single entry of the table directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRecord {
    tag: Tag,
    /// The checksum of the table as stored by the font compiler.
    checksum: u32,
    /// The offset of the table, in bytes, from the beginning of the file.
    offset: u32,
    /// The length of this table in bytes, without padding.
    length: u32,
}

impl TableRecord {
    pub fn new(tag: Tag, checksum: u32, offset: u32, length: u32) -> Self {
        Self {
            tag,
            checksum,
            offset,
            length,
        }
    }

    /// Constructs a `TableRecord` from a raw 16 byte record.
    ///
    /// * Bytes 0-3: Tag
    /// * Bytes 4-7: Checksum of the table
    /// * Bytes 8-11: Offset of the table from the beginning of the file
    /// * Bytes 12-15: Length of the table in bytes
    pub fn from_buffer(mut buf: &[u8]) -> Result<Self, FormatError> {
        Ok(Self {
            tag: Tag::from_u32(buf.try_get_u32()?),
            checksum: buf.try_get_u32()?,
            offset: buf.try_get_u32()?,
            length: buf.try_get_u32()?,
        })
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    /// Length rounded up to the next 4 byte boundary, which is the span
    /// covered by the table checksum.
    pub fn padded_length(&self) -> u64 {
        (u64::from(self.length) + 3) & !3
    }

    /// Offset of the first byte after the table
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.length)
    }
}

/// Maps every table tag to its record.
///
/// Records are inserted in file order, so when a tag appears twice the
/// later record replaces the earlier one.
#[derive(Debug, Clone)]
pub struct TableDirectory {
    offset_table: OffsetTable,
    records: BTreeMap<Tag, TableRecord>,
}

impl TableDirectory {
    /// Parses the offset table and every table record.
    ///
    /// `file_len` bounds the records: a table reaching past the end of the
    /// file is rejected instead of being read later.
    pub fn from_reader<B: Read + Seek>(
        reader: &mut SfntReader<B>,
        file_len: u64,
    ) -> Result<Self, SfntError> {
        let offset_table = OffsetTable::from_reader(reader)?;
        let declared = offset_table.num_tables();

        let mut buffer = vec![0u8; usize::from(declared) * TABLE_RECORD_SIZE];
        reader.seek_to(OFFSET_TABLE_SIZE as u64)?;
        let filled = reader.read_available(&mut buffer)?;

        if filled < buffer.len() {
            return Err(FormatError::TruncatedDirectory {
                declared,
                parsed: (filled / TABLE_RECORD_SIZE) as u16,
            }
            .into());
        }

        let mut records = BTreeMap::new();
        for raw_record in buffer.chunks_exact(TABLE_RECORD_SIZE) {
            let record = TableRecord::from_buffer(raw_record)?;

            if record.end() > file_len {
                return Err(FormatError::TableOutOfBounds {
                    tag: record.tag,
                    offset: record.offset,
                    end: record.end(),
                    file_len,
                }
                .into());
            }

            if records.insert(record.tag, record).is_some() {
                log::warn!(
                    "table '{}' is listed more than once, keeping the later record",
                    record.tag
                );
            }
        }

        log::debug!(
            "parsed table directory: scalar 0x{:08X}, {} records, {} distinct tables",
            offset_table.scalar_type(),
            declared,
            records.len()
        );

        Ok(Self {
            offset_table,
            records,
        })
    }

    pub fn offset_table(&self) -> &OffsetTable {
        &self.offset_table
    }

    pub fn get(&self, tag: Tag) -> Option<&TableRecord> {
        self.records.get(&tag)
    }

    /// Like [`TableDirectory::get`] but a missing table is an error
    pub fn record(&self, tag: Tag) -> Result<&TableRecord, FormatError> {
        self.get(tag).ok_or(FormatError::TableNotFound(tag))
    }

    /// Number of distinct tables in the directory
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, Tag, TableRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a TableDirectory {
    type Item = (&'a Tag, &'a TableRecord);

    type IntoIter = Iter<'a, Tag, TableRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
