use crate::attr::EventAttr;
use crate::buffer::{ByteReader, ByteWriter};
use crate::error::Error;
use crate::types::{RecordType, SampleFormat};

/// The per-record metadata that kernel-generated records carry in their
/// sample-info trailer (and that SAMPLE records carry inline).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleInfo {
    pub pid: Option<u32>,
    pub tid: Option<u32>,
    pub time: Option<u64>,
    pub id: Option<u64>,
    pub stream_id: Option<u64>,
    pub cpu: Option<u32>,
}

/// Where the event ID lives inside record bodies.
///
/// SAMPLE records lay their fields forward from the start of the body, so
/// the ID has a fixed word index from the front. All other kernel records
/// append the sample-info trailer at the end, so there the ID has a fixed
/// word index from the back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPosition {
    NotPresent,
    /// Word index; from the front for SAMPLE, from the back for the rest.
    Pos(usize),
}

/// The ID word positions implied by a `sample_type` bitmask.
///
/// Every attribute in a file must produce identical positions, otherwise
/// records cannot be routed to their attribute at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPositions {
    pub sample: IdPosition,
    pub other: IdPosition,
}

impl IdPositions {
    pub fn from_sample_format(sample_format: SampleFormat) -> Self {
        if sample_format.contains(SampleFormat::IDENTIFIER) {
            return Self {
                sample: IdPosition::Pos(0),
                other: IdPosition::Pos(1),
            };
        }
        if sample_format.contains(SampleFormat::ID) {
            let mut sample_pos = 0;
            for field in [
                SampleFormat::IP,
                SampleFormat::TID,
                SampleFormat::TIME,
                SampleFormat::ADDR,
            ] {
                if sample_format.contains(field) {
                    sample_pos += 1;
                }
            }
            let mut other_pos = 1;
            for field in [SampleFormat::CPU, SampleFormat::STREAM_ID] {
                if sample_format.contains(field) {
                    other_pos += 1;
                }
            }
            return Self {
                sample: IdPosition::Pos(sample_pos),
                other: IdPosition::Pos(other_pos),
            };
        }
        Self {
            sample: IdPosition::NotPresent,
            other: IdPosition::NotPresent,
        }
    }

    /// Pull the event ID out of a record body (everything after the 8-byte
    /// header). Returns `None` when no ID is carried, or when the body is too
    /// short to contain the addressed word.
    pub fn extract_id(
        &self,
        record_type: RecordType,
        body: &[u8],
        reader_endian: crate::endian::Endianness,
    ) -> Option<u64> {
        let pos = if record_type == RecordType::SAMPLE {
            self.sample
        } else {
            self.other
        };
        let word_index_from_front = match pos {
            IdPosition::NotPresent => return None,
            IdPosition::Pos(pos) => {
                if record_type == RecordType::SAMPLE {
                    pos
                } else {
                    // Counted from the end of the body.
                    (body.len() / 8).checked_sub(pos)?
                }
            }
        };
        let offset = word_index_from_front.checked_mul(8)?;
        if offset + 8 > body.len() {
            return None;
        }
        let mut reader = ByteReader::new(body, reader_endian);
        reader.seek_set(offset).ok()?;
        reader.read_u64().ok()
    }
}

/// Encoder/decoder for the sample-info trailer of one attribute.
///
/// The trailer layout is a pure function of the attribute's `sample_type`:
/// pid/tid, time, id, stream id, cpu, identifier, in that order, each present
/// iff the corresponding bit is set.
#[derive(Debug, Clone, Copy)]
pub struct SampleInfoCodec {
    sample_format: SampleFormat,
}

impl SampleInfoCodec {
    pub fn new(attr: &EventAttr) -> Self {
        Self {
            sample_format: attr.sample_format,
        }
    }

    pub fn sample_format(&self) -> SampleFormat {
        self.sample_format
    }

    /// Trailer size in bytes. Every present field occupies one u64 word
    /// (TID packs pid+tid, CPU packs cpu+reserved).
    pub fn trailer_size(&self) -> usize {
        let mut size = 0;
        for field in [
            SampleFormat::TID,
            SampleFormat::TIME,
            SampleFormat::ID,
            SampleFormat::STREAM_ID,
            SampleFormat::CPU,
            SampleFormat::IDENTIFIER,
        ] {
            if self.sample_format.contains(field) {
                size += 8;
            }
        }
        size
    }

    /// Parse a trailer. The cursor must sit at the trailer's first byte and
    /// the trailer must run to the end of the record.
    pub fn parse(&self, reader: &mut ByteReader) -> Result<SampleInfo, Error> {
        if reader.remaining() < self.trailer_size() {
            return Err(Error::Truncated("sample-info trailer"));
        }
        let mut info = SampleInfo::default();
        if self.sample_format.contains(SampleFormat::TID) {
            info.pid = Some(reader.read_u32()?);
            info.tid = Some(reader.read_u32()?);
        }
        if self.sample_format.contains(SampleFormat::TIME) {
            info.time = Some(reader.read_u64()?);
        }
        if self.sample_format.contains(SampleFormat::ID) {
            info.id = Some(reader.read_u64()?);
        }
        if self.sample_format.contains(SampleFormat::STREAM_ID) {
            info.stream_id = Some(reader.read_u64()?);
        }
        if self.sample_format.contains(SampleFormat::CPU) {
            info.cpu = Some(reader.read_u32()?);
            let _res = reader.read_u32()?;
        }
        if self.sample_format.contains(SampleFormat::IDENTIFIER) {
            let identifier = reader.read_u64()?;
            // IDENTIFIER duplicates ID; prefer whichever is present.
            info.id.get_or_insert(identifier);
        }
        Ok(info)
    }

    /// Serialize a trailer, one statement per optional field.
    pub fn write(&self, writer: &mut ByteWriter, info: &SampleInfo) {
        if self.sample_format.contains(SampleFormat::TID) {
            writer.write_u32(info.pid.unwrap_or(0));
            writer.write_u32(info.tid.unwrap_or(0));
        }
        if self.sample_format.contains(SampleFormat::TIME) {
            writer.write_u64(info.time.unwrap_or(0));
        }
        if self.sample_format.contains(SampleFormat::ID) {
            writer.write_u64(info.id.unwrap_or(0));
        }
        if self.sample_format.contains(SampleFormat::STREAM_ID) {
            writer.write_u64(info.stream_id.unwrap_or(0));
        }
        if self.sample_format.contains(SampleFormat::CPU) {
            writer.write_u32(info.cpu.unwrap_or(0));
            writer.write_u32(0);
        }
        if self.sample_format.contains(SampleFormat::IDENTIFIER) {
            writer.write_u64(info.id.unwrap_or(0));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::endian::Endianness;

    #[test]
    fn identifier_positions() {
        let positions = IdPositions::from_sample_format(
            SampleFormat::IDENTIFIER | SampleFormat::IP | SampleFormat::TID,
        );
        assert_eq!(positions.sample, IdPosition::Pos(0));
        assert_eq!(positions.other, IdPosition::Pos(1));
    }

    #[test]
    fn id_positions_count_neighbors() {
        let positions = IdPositions::from_sample_format(
            SampleFormat::IP
                | SampleFormat::TID
                | SampleFormat::TIME
                | SampleFormat::ID
                | SampleFormat::CPU,
        );
        // ID comes after IP, TID and TIME in a SAMPLE body.
        assert_eq!(positions.sample, IdPosition::Pos(3));
        // From the end of other records: CPU is last-but-identifier, then ID.
        assert_eq!(positions.other, IdPosition::Pos(2));
    }

    #[test]
    fn no_id_fields() {
        let positions =
            IdPositions::from_sample_format(SampleFormat::IP | SampleFormat::TIME);
        assert_eq!(positions.sample, IdPosition::NotPresent);
        assert_eq!(positions.other, IdPosition::NotPresent);
    }

    #[test]
    fn extract_id_from_sample_body() {
        let positions = IdPositions::from_sample_format(
            SampleFormat::IP | SampleFormat::TID | SampleFormat::ID,
        );
        let mut w = ByteWriter::new(Endianness::LittleEndian);
        w.write_u64(0x1000); // ip
        w.write_u32(12); // pid
        w.write_u32(13); // tid
        w.write_u64(77); // id
        let body = w.into_vec();
        assert_eq!(
            positions.extract_id(RecordType::SAMPLE, &body, Endianness::LittleEndian),
            Some(77)
        );
    }

    #[test]
    fn extract_id_from_trailer_counts_from_end() {
        let positions = IdPositions::from_sample_format(
            SampleFormat::TID | SampleFormat::ID | SampleFormat::CPU,
        );
        // A FORK body: pid, ppid, tid, ptid, time, then the trailer
        // {pid,tid}, id, {cpu,res}.
        let mut w = ByteWriter::new(Endianness::LittleEndian);
        for v in [101u32, 100, 101, 100] {
            w.write_u32(v);
        }
        w.write_u64(123456);
        w.write_u32(101);
        w.write_u32(101);
        w.write_u64(42); // id
        w.write_u32(3);
        w.write_u32(0);
        let body = w.into_vec();
        assert_eq!(
            positions.extract_id(RecordType::FORK, &body, Endianness::LittleEndian),
            Some(42)
        );
    }

    #[test]
    fn trailer_round_trip() {
        let attr = crate::attr::EventAttr {
            sample_format: SampleFormat::TID
                | SampleFormat::TIME
                | SampleFormat::ID
                | SampleFormat::CPU
                | SampleFormat::IDENTIFIER,
            ..test_attr()
        };
        let codec = SampleInfoCodec::new(&attr);
        let info = SampleInfo {
            pid: Some(10),
            tid: Some(11),
            time: Some(999),
            id: Some(5),
            stream_id: None,
            cpu: Some(2),
        };
        let mut w = ByteWriter::new(Endianness::LittleEndian);
        codec.write(&mut w, &info);
        let buf = w.into_vec();
        assert_eq!(buf.len(), codec.trailer_size());
        let mut r = ByteReader::new(&buf, Endianness::LittleEndian);
        let parsed = codec.parse(&mut r).unwrap();
        assert_eq!(parsed, info);
    }

    fn test_attr() -> crate::attr::EventAttr {
        crate::attr::EventAttr {
            type_: 0,
            size: crate::attr::EventAttr::CURRENT_SIZE,
            config: 0,
            sample_period_or_freq: 0,
            sample_format: SampleFormat::empty(),
            read_format: crate::types::ReadFormat::empty(),
            flags: crate::types::AttrFlags::empty(),
            wakeup_events_or_watermark: 0,
            bp_type: crate::types::HwBreakpointType::empty(),
            bp_addr_or_config1: 0,
            bp_len_or_config2: 0,
            branch_sample_format: crate::types::BranchSampleFormat::empty(),
            sample_regs_user: 0,
            sample_stack_user: 0,
            clockid: 0,
            sample_regs_intr: 0,
            aux_watermark: 0,
            sample_max_stack: 0,
            aux_sample_size: 0,
            sig_data: 0,
        }
    }
}
