use crate::buffer::{ByteReader, ByteWriter};
use crate::endian::Endianness;
use crate::error::Error;
use crate::features::FeatureSet;
use crate::section::FileSection;

pub const PERF_MAGIC: &[u8; 8] = b"PERFILE2";
pub const PERF_MAGIC_SWAPPED: &[u8; 8] = b"2ELIFREP";

/// `perf_header`: the 104-byte header of a seekable perf.data file.
///
/// The magic value identifies the file and its byte order: when the stored
/// magic compares equal to the byte-swapped constant, every field in the
/// file is in the foreign order.
#[derive(Debug, Clone, Copy)]
pub struct FileHeader {
    pub header_size: u64,
    /// Stride of the entries in the attribute section.
    pub attr_size: u64,
    pub attr_section: FileSection,
    pub data_section: FileSection,
    /// Legacy table of attr + id-section pairs; zero-sized in current files.
    pub event_types_section: FileSection,
    pub features: FeatureSet,
}

impl FileHeader {
    pub const STRUCT_SIZE: usize = 8 + 8 + 8 + 3 * FileSection::STRUCT_SIZE + 32;
    pub const PIPE_STRUCT_SIZE: usize = 16;

    /// Read the magic and decide the endianness of everything that follows.
    /// A little-endian producer leaves the bytes `PERFILE2` in the file; a
    /// big-endian producer leaves them reversed.
    pub fn detect_endian(magic: &[u8; 8]) -> Result<Endianness, Error> {
        if magic == PERF_MAGIC {
            Ok(Endianness::LittleEndian)
        } else if magic == PERF_MAGIC_SWAPPED {
            Ok(Endianness::BigEndian)
        } else {
            Err(Error::UnrecognizedMagicValue(*magic))
        }
    }

    fn magic_for(endian: Endianness) -> &'static [u8; 8] {
        match endian {
            Endianness::LittleEndian => PERF_MAGIC,
            Endianness::BigEndian => PERF_MAGIC_SWAPPED,
        }
    }

    /// Parse the fixed header. The cursor must sit just past the magic and
    /// already carry the detected endianness.
    pub fn parse(reader: &mut ByteReader) -> Result<Self, Error> {
        let header_size = reader.read_u64()?;
        let attr_size = reader.read_u64()?;
        let attr_section = FileSection::parse(reader)?;
        let data_section = FileSection::parse(reader)?;
        let event_types_section = FileSection::parse(reader)?;
        let features = FeatureSet([
            reader.read_u64()?,
            reader.read_u64()?,
            reader.read_u64()?,
            reader.read_u64()?,
        ]);
        Ok(Self {
            header_size,
            attr_size,
            attr_section,
            data_section,
            event_types_section,
            features,
        })
    }

    pub fn write(&self, writer: &mut ByteWriter) {
        writer.write_bytes(Self::magic_for(writer.endian()));
        writer.write_u64(self.header_size);
        writer.write_u64(self.attr_size);
        self.attr_section.write(writer);
        self.data_section.write(writer);
        self.event_types_section.write(writer);
        for chunk in self.features.0 {
            writer.write_u64(chunk);
        }
    }
}

/// `perf_pipe_file_header`: the 16-byte header of a piped stream. Everything
/// else in the stream is self-describing.
#[derive(Debug, Clone, Copy)]
pub struct PipeHeader {
    pub size: u64,
}

impl PipeHeader {
    pub fn write(writer: &mut ByteWriter) {
        writer.write_bytes(FileHeader::magic_for(writer.endian()));
        writer.write_u64(FileHeader::PIPE_STRUCT_SIZE as u64);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn header_struct_size_is_104() {
        assert_eq!(FileHeader::STRUCT_SIZE, 104);
    }

    #[test]
    fn endian_detection() {
        assert_eq!(
            FileHeader::detect_endian(PERF_MAGIC).unwrap(),
            Endianness::LittleEndian
        );
        assert_eq!(
            FileHeader::detect_endian(PERF_MAGIC_SWAPPED).unwrap(),
            Endianness::BigEndian
        );
        assert!(FileHeader::detect_endian(b"PERFILE1").is_err());
    }
}
