//! Helpers shared by the integration tests

#![allow(dead_code)]

use std::{
    cell::Cell,
    io::{self, Cursor, Read, Seek, SeekFrom},
    rc::Rc,
};

pub const DEJAVU_SANS_MONO: &[u8] = include_bytes!("../data/DejaVuSansMono.ttf");

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A convenience type for generating a buffer of big-endian bytes.
#[derive(Debug, Clone, Default)]
pub struct BeBuffer(Vec<u8>);

impl BeBuffer {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn u16(mut self, value: u16) -> Self {
        self.0.extend(value.to_be_bytes());
        self
    }

    pub fn u32(mut self, value: u32) -> Self {
        self.0.extend(value.to_be_bytes());
        self
    }

    pub fn i64(mut self, value: i64) -> Self {
        self.0.extend(value.to_be_bytes());
        self
    }

    pub fn u16s(self, values: impl IntoIterator<Item = u16>) -> Self {
        values.into_iter().fold(self, Self::u16)
    }

    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

/// Wrapping sum of the complete big-endian words in `data`
pub fn sum_words(data: &[u8]) -> u32 {
    data.chunks_exact(4)
        .map(|word| u32::from_be_bytes([word[0], word[1], word[2], word[3]]))
        .fold(0u32, u32::wrapping_add)
}

/// A format 4 subtable, segments given as (start, end, delta, range offset)
pub fn format4_subtable(segments: &[(u16, u16, u16, u16)]) -> Vec<u8> {
    let seg_count = segments.len() as u16;
    BeBuffer::new()
        .u16(4)
        .u16(16 + 8 * seg_count)
        .u16(0)
        .u16(seg_count * 2)
        .u16s([0, 0, 0])
        .u16s(segments.iter().map(|s| s.1))
        .u16(0)
        .u16s(segments.iter().map(|s| s.0))
        .u16s(segments.iter().map(|s| s.2))
        .u16s(segments.iter().map(|s| s.3))
        .into_inner()
}

/// A cmap table holding one subtable per (platform, encoding, subtable) entry
pub fn cmap_table(entries: &[(u16, u16, Vec<u8>)]) -> Vec<u8> {
    let mut index = BeBuffer::new().u16(0).u16(entries.len() as u16);
    let mut offset = 4 + 8 * entries.len() as u32;
    for (platform, encoding, subtable) in entries {
        index = index.u16(*platform).u16(*encoding).u32(offset);
        offset += subtable.len() as u32;
    }
    for (_, _, subtable) in entries {
        index = index.bytes(subtable);
    }
    index.into_inner()
}

/// The ASCII segment used by DejaVu Sans Mono, which puts 'A' at glyph 36,
/// followed by Latin-1 and the closing 0xFFFF segment.
pub fn latin_cmap() -> Vec<u8> {
    cmap_table(&[
        (
            0,
            3,
            format4_subtable(&[
                (0x20, 0x7E, 0xFFE3, 0),
                (0xA0, 0xFF, 0xFFE6, 0),
                (0xFFFF, 0xFFFF, 0x0001, 0),
            ]),
        ),
        (3, 1, format4_subtable(&[(0x20, 0x7E, 0x0010, 0), (0xFFFF, 0xFFFF, 1, 0)])),
    ])
}

/// A 54 byte head table with a zero checksum adjustment
pub fn head_table() -> Vec<u8> {
    BeBuffer::new()
        .u32(0x0001_0000)
        .u32(0x0001_0000)
        .u32(0)
        .u32(0x5F0F_3CF5)
        .u16(0x000B)
        .u16(2048)
        .i64(3_500_000_000)
        .i64(3_600_000_000)
        .u16s([0xFB88, 0xFD01, 0x05BE, 0x083A])
        .u16s([0, 8, 2, 1, 0])
        .into_inner()
}

/// Builds a complete sfnt file with correct table checksums and a correct
/// `checkSumAdjustment`.
#[derive(Debug, Clone)]
pub struct FontBuilder {
    magic: u32,
    tables: Vec<([u8; 4], Vec<u8>)>,
    pad_last_table: bool,
}

impl FontBuilder {
    pub fn new() -> Self {
        Self {
            magic: 0x0001_0000,
            tables: Vec::new(),
            pad_last_table: true,
        }
    }

    /// All required tables, with filler data for the ones nothing reads
    pub fn minimal() -> Self {
        Self::new()
            .table(b"cmap", latin_cmap())
            .table(b"glyf", vec![0x11; 40])
            .table(b"head", head_table())
            .table(b"hhea", vec![0x22; 36])
            .table(b"hmtx", vec![0x33; 18])
            .table(b"loca", vec![0x44; 10])
            .table(b"maxp", vec![0x55; 6])
            .table(b"name", vec![0x66; 13])
            .table(b"post", vec![0x77; 32])
    }

    pub fn magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    pub fn table(mut self, tag: &[u8; 4], data: Vec<u8>) -> Self {
        self.tables.push((*tag, data));
        self
    }

    pub fn without(mut self, tag: &[u8; 4]) -> Self {
        self.tables.retain(|(t, _)| t != tag);
        self
    }

    /// Leave the last table unpadded, so the file ends in a partial word
    pub fn unpadded_tail(mut self) -> Self {
        self.pad_last_table = false;
        self
    }

    /// Offset of the data of `tag` in the built file
    pub fn offset_of(&self, tag: &[u8; 4]) -> usize {
        let mut offset = 12 + 16 * self.tables.len();
        for (t, data) in &self.tables {
            if t == tag {
                return offset;
            }
            offset += data.len().next_multiple_of(4);
        }
        panic!("no table {tag:?}")
    }

    pub fn build(&self) -> Vec<u8> {
        let num_tables = self.tables.len();
        let mut file = BeBuffer::new()
            .u32(self.magic)
            .u16(num_tables as u16)
            .u16s([0, 0, 0])
            .into_inner();

        let mut offset = 12 + 16 * num_tables;
        let mut layout = Vec::new();
        for (i, (tag, data)) in self.tables.iter().enumerate() {
            let padded = if i + 1 == num_tables && !self.pad_last_table {
                data.len()
            } else {
                data.len().next_multiple_of(4)
            };
            layout.push((tag, offset, data));
            offset += padded;
        }
        file.resize(offset, 0);

        for (i, (tag, offset, data)) in layout.iter().enumerate() {
            file[*offset..*offset + data.len()].copy_from_slice(data);

            let end = (*offset + data.len().next_multiple_of(4)).min(file.len());
            let checksum = sum_words(&file[*offset..end]);

            let record = BeBuffer::new()
                .bytes(*tag)
                .u32(checksum)
                .u32(*offset as u32)
                .u32(data.len() as u32)
                .into_inner();
            file[12 + 16 * i..28 + 16 * i].copy_from_slice(&record);
        }

        if let Some((_, head_offset, _)) = layout.iter().find(|(tag, _, _)| *tag == b"head") {
            let adjustment = 0xB1B0_AFBAu32.wrapping_sub(sum_words(&file));
            file[head_offset + 8..head_offset + 12].copy_from_slice(&adjustment.to_be_bytes());
        }

        file
    }
}

/// A `Read + Seek` source counting how often it is read from
pub struct CountingSource {
    inner: Cursor<Vec<u8>>,
    reads: Rc<Cell<usize>>,
}

impl CountingSource {
    pub fn new(data: Vec<u8>) -> (Self, Rc<Cell<usize>>) {
        let reads = Rc::new(Cell::new(0));
        let source = Self {
            inner: Cursor::new(data),
            reads: Rc::clone(&reads),
        };
        (source, reads)
    }
}

impl Read for CountingSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads.set(self.reads.get() + 1);
        self.inner.read(buf)
    }
}

impl Seek for CountingSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}
