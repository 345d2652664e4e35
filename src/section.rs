use crate::buffer::{ByteReader, ByteWriter};
use crate::error::Error;

/// `perf_file_section`: a pointer to another region of the file.
///
/// The header contains three of these (attributes, data, legacy event
/// types), and the feature index after the data section is an array of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileSection {
    /// Offset from the start of the file.
    pub offset: u64,
    /// Size of the section in bytes.
    pub size: u64,
}

impl FileSection {
    pub const STRUCT_SIZE: usize = 8 + 8;

    pub fn parse(reader: &mut ByteReader) -> Result<Self, Error> {
        let offset = reader.read_u64()?;
        let size = reader.read_u64()?;
        Ok(Self { offset, size })
    }

    pub fn write(&self, writer: &mut ByteWriter) {
        writer.write_u64(self.offset);
        writer.write_u64(self.size);
    }

    /// Whether this section lies entirely within a buffer of `len` bytes.
    /// The comparison stays in the u64 domain; nothing is truncated.
    pub fn fits_within(&self, len: u64) -> bool {
        self.offset
            .checked_add(self.size)
            .is_some_and(|end| end <= len)
    }

    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}
