use std::io::{self, BufReader, Read, Seek, SeekFrom};

use thiserror::Error;

macro_rules! impl_read {
    ($fn_name:ident, $typ:ty) => {
        pub fn $fn_name(&mut self) -> Result<$typ, ReaderError> {
            let mut buf = [0u8; size_of::<$typ>()];

            self.inner.read_exact(&mut buf)?;

            Ok(<$typ>::from_be_bytes(buf))
        }
    };
}

/// Represents the possible errors that can occur when using `SfntReader`.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// An error occurred during a read operation on the underlying source.
    /// This variant transparently wraps `std::io::Error`.
    #[error(transparent)]
    ReadError(#[from] io::Error),

    /// An error occurred during a seek operation on the underlying source.
    #[error("Failed to seek, error context: {0}")]
    FailedToSeek(io::Error),
}

impl ReaderError {
    /// True when a read ran into the end of the source before the
    /// requested amount of bytes was available.
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self, Self::ReadError(err) if err.kind() == io::ErrorKind::UnexpectedEof)
    }
}

/// Random access, big-endian reader over a font byte source.
///
/// Any `Read + Seek` works: a `File`, a `Cursor` over a downloaded buffer,
/// or a test double. Every read is addressed from the start of the source.
#[derive(Debug)]
pub struct SfntReader<B: Read + Seek> {
    inner: BufReader<B>,
}

impl<B> SfntReader<B>
where
    B: Read + Seek,
{
    /// Wraps a byte source in a buffered reader
    pub fn from_buffer(buffer: B) -> Self {
        Self {
            inner: BufReader::new(buffer),
        }
    }

    /// Seeks to a specifc place in the source
    /// from the start of the file
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use sfnt_reader::buffer::SfntReader;
    ///
    /// let data = vec![0, 0, 0, 10, 0, 0, 0, 20];
    /// let mut reader = SfntReader::from_buffer(Cursor::new(data));
    ///
    /// reader.seek_to(4).unwrap();
    /// assert_eq!(reader.read_u32().unwrap(), 20);
    /// ```
    pub fn seek_to(&mut self, pos: u64) -> Result<(), ReaderError> {
        self.inner
            .seek(SeekFrom::Start(pos))
            .map_err(ReaderError::FailedToSeek)?;

        Ok(())
    }

    /// Skips n bytes from the CURRENT cursor positon
    pub fn skip(&mut self, n: i64) -> Result<(), ReaderError> {
        self.inner
            .seek_relative(n)
            .map_err(ReaderError::FailedToSeek)?;

        Ok(())
    }

    /// Returns the total length of the source in bytes.
    ///
    /// This moves the cursor to the end of the source; callers seek before
    /// their next read anyway.
    pub fn stream_len(&mut self) -> Result<u64, ReaderError> {
        self.inner
            .seek(SeekFrom::End(0))
            .map_err(ReaderError::FailedToSeek)
    }

    /// Fills `buf` completely or fails with an `UnexpectedEof` read error.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ReaderError> {
        self.inner.read_exact(buf)?;
        Ok(())
    }

    /// Reads as many bytes as the source still has, up to `buf.len()`,
    /// and returns how many were read. Hitting the end of the source is
    /// not an error here.
    pub fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, ReaderError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }

        Ok(filled)
    }

    /// Reads exactly `len` bytes starting at the absolute offset `pos`.
    pub fn read_vec(&mut self, pos: u64, len: usize) -> Result<Vec<u8>, ReaderError> {
        self.seek_to(pos)?;
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;

        Ok(buf)
    }

    impl_read!(read_u32, u32);
    impl_read!(read_u16, u16);
}
