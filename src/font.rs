use std::io::{Read, Seek};

use crate::{
    SfntError,
    buffer::SfntReader,
    checksum,
    tables::{
        RequiredTables, TableDirectory,
        cmap::{GlyphMapper, PlatformId},
        head::Head,
    },
};

/// Options applied when a font is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontOptions {
    /// Platform whose cmap subtable maps code points
    pub platform: PlatformId,
    /// Build the glyph mapper while opening instead of on the first lookup
    pub eager_mapper: bool,
}

impl FontOptions {
    pub fn with_platform(mut self, platform: PlatformId) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_eager_mapper(mut self, eager: bool) -> Self {
        self.eager_mapper = eager;
        self
    }
}

/// An opened TrueType / OpenType font.
///
/// The table directory is parsed when the font is opened and never changes
/// afterwards. The glyph mapper is built on the first lookup and reused;
/// lookups take `&mut self`, so that first build can never race with
/// another one.
#[derive(Debug)]
pub struct Font<B: Read + Seek> {
    reader: SfntReader<B>,
    directory: TableDirectory,
    file_len: u64,
    options: FontOptions,
    mapper: Option<GlyphMapper>,
}

impl<B> Font<B>
where
    B: Read + Seek,
{
    /// Opens a font with the default options: Unicode cmap, built lazily
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use sfnt_reader::Font;
    ///
    /// let mut font = Font::open(File::open("DejaVuSansMono.ttf")?)?;
    /// font.check()?;
    /// println!("{} tables", font.table_count());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(source: B) -> Result<Self, SfntError> {
        Self::open_with(source, FontOptions::default())
    }

    pub fn open_with(source: B, options: FontOptions) -> Result<Self, SfntError> {
        let mut reader = SfntReader::from_buffer(source);
        let file_len = reader.stream_len()?;
        let directory = TableDirectory::from_reader(&mut reader, file_len)?;

        let mut font = Self {
            reader,
            directory,
            file_len,
            options,
            mapper: None,
        };

        if options.eager_mapper {
            font.prepare_mapper(options.platform)?;
        }

        Ok(font)
    }

    /// Number of distinct tables in the table directory
    pub fn table_count(&self) -> usize {
        self.directory.len()
    }

    pub fn directory(&self) -> &TableDirectory {
        &self.directory
    }

    /// Length of the underlying source in bytes
    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    pub fn options(&self) -> &FontOptions {
        &self.options
    }

    /// Reads and parses the head table
    pub fn head(&mut self) -> Result<Head, SfntError> {
        let record = self.directory.record(RequiredTables::Head.tag())?;
        Head::from_reader(&mut self.reader, record)
    }

    /// Verifies required tables, every table checksum and the whole-file
    /// checksum, stopping at the first failure.
    pub fn check(&mut self) -> Result<(), SfntError> {
        checksum::check(&mut self.reader, &self.directory)
    }

    /// Builds the glyph mapper for `platform` and caches it, replacing any
    /// mapper built before.
    pub fn prepare_mapper(&mut self, platform: PlatformId) -> Result<&GlyphMapper, SfntError> {
        let mapper = self.load_mapper(platform)?;
        Ok(self.mapper.insert(mapper))
    }

    /// The cached glyph mapper, if one was built already
    pub fn mapper(&self) -> Option<&GlyphMapper> {
        self.mapper.as_ref()
    }

    /// Maps a code point to a glyph index, `0` being `.notdef`.
    ///
    /// The first call builds the mapper for the configured platform. If
    /// that fails the error is returned and the next call tries again.
    pub fn map_glyph(&mut self, code_point: u32) -> Result<u16, SfntError> {
        let mapper = match self.mapper.take() {
            Some(mapper) => mapper,
            None => {
                let mapper = self.load_mapper(self.options.platform)?;
                log::debug!("glyph mapper ready (format {})", mapper.format());
                mapper
            }
        };

        Ok(self.mapper.insert(mapper).map(code_point)?)
    }

    fn load_mapper(&mut self, platform: PlatformId) -> Result<GlyphMapper, SfntError> {
        let cmap = self.directory.record(RequiredTables::Cmap.tag())?;
        GlyphMapper::load(&mut self.reader, cmap, platform)
    }
}
