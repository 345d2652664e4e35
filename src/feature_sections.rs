use crate::attr::EventAttr;
use crate::buffer::{ByteReader, ByteWriter};
use crate::error::Error;
use crate::section::FileSection;

/// Fallible conversion of a section offset for seeking; a truncating cast
/// would wrap on 32-bit targets.
fn section_offset(section: &FileSection) -> Result<usize, Error> {
    usize::try_from(section.offset).map_err(|_| Error::SectionSizeTooBig)
}

/// The number of available and online CPUs (`HEADER_NRCPUS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NrCpus {
    /// CPUs not yet onlined.
    pub nr_cpus_available: u32,
    pub nr_cpus_online: u32,
}

impl NrCpus {
    pub const STRUCT_SIZE: usize = 4 + 4;

    pub fn parse(reader: &mut ByteReader) -> Result<Self, Error> {
        if reader.remaining() < Self::STRUCT_SIZE {
            return Err(Error::NotEnoughSpaceForNrCpus);
        }
        let nr_cpus_available = reader.read_u32()?;
        let nr_cpus_online = reader.read_u32()?;
        Ok(Self {
            nr_cpus_available,
            nr_cpus_online,
        })
    }

    pub fn write(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.nr_cpus_available);
        writer.write_u32(self.nr_cpus_online);
    }
}

/// The timestamps of the first and last sample (`HEADER_SAMPLE_TIME`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleTimeRange {
    pub first_sample_time: u64,
    pub last_sample_time: u64,
}

impl SampleTimeRange {
    pub fn parse(reader: &mut ByteReader) -> Result<Self, Error> {
        Ok(Self {
            first_sample_time: reader.read_u64()?,
            last_sample_time: reader.read_u64()?,
        })
    }
}

/// A `perf_header_string`: u32 padded length, then the NUL-terminated
/// string, NUL-padded to an 8-byte boundary.
pub struct HeaderString;

impl HeaderString {
    /// Parse a string. Strings that are not valid UTF-8 come back as
    /// `None`; the surrounding structure stays parseable.
    pub fn parse(reader: &mut ByteReader) -> Result<Option<String>, Error> {
        let bytes = Self::parse_bytes(reader)?;
        Ok(String::from_utf8(bytes.to_vec()).ok())
    }

    /// Parse a string, failing on invalid UTF-8.
    pub fn parse_strict(reader: &mut ByteReader) -> Result<String, Error> {
        let bytes = Self::parse_bytes(reader)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| Error::StringUtf8)
    }

    fn parse_bytes<'a>(reader: &mut ByteReader<'a>) -> Result<&'a [u8], Error> {
        if reader.remaining() < 4 {
            return Err(Error::NotEnoughSpaceForStringLen);
        }
        let len = reader.read_u32()?;
        let len = usize::try_from(len).map_err(|_| Error::StringLengthBiggerThanUsize)?;
        if len > reader.remaining() {
            return Err(Error::StringLengthTooLong);
        }
        reader.read_string_padded(len)
    }
}

/// One event attribute with its name and the IDs that tie sample records
/// back to it.
#[derive(Debug, Clone)]
pub struct AttributeDescription {
    pub attr: EventAttr,
    pub name: Option<String>,
    pub event_ids: Vec<u64>,
}

impl AttributeDescription {
    /// Parse the `HEADER_EVENT_DESC` feature section.
    ///
    /// ```c
    /// struct {
    ///   uint32_t nr;
    ///   uint32_t attr_size;
    ///   struct {
    ///     struct perf_event_attr attr;
    ///     uint32_t nr_ids;
    ///     struct perf_header_string event_string;
    ///     uint64_t ids[nr_ids];
    ///   } events[nr];
    /// };
    /// ```
    pub fn parse_event_desc_section(reader: &mut ByteReader) -> Result<Vec<Self>, Error> {
        let nr = reader.read_u32()?;
        let attr_size = reader.read_u32()?;
        let mut attributes = Vec::with_capacity(nr as usize);
        for _ in 0..nr {
            let attr = EventAttr::parse(reader, Some(attr_size))?;
            let nr_ids = reader.read_u32()?;
            let name = HeaderString::parse(reader)?;
            if nr_ids as usize > reader.remaining() / 8 {
                return Err(Error::Truncated("event desc ids"));
            }
            let mut event_ids = Vec::with_capacity(nr_ids as usize);
            for _ in 0..nr_ids {
                event_ids.push(reader.read_u64()?);
            }
            attributes.push(AttributeDescription {
                attr,
                name,
                event_ids,
            });
        }
        Ok(attributes)
    }

    /// Regenerate the `HEADER_EVENT_DESC` section.
    pub fn write_event_desc_section(writer: &mut ByteWriter, attributes: &[Self]) {
        writer.write_u32(attributes.len() as u32);
        writer.write_u32(EventAttr::CURRENT_SIZE);
        for desc in attributes {
            let mut attr = desc.attr;
            attr.size = EventAttr::CURRENT_SIZE;
            attr.write(writer);
            writer.write_u32(desc.event_ids.len() as u32);
            let name = desc.name.as_deref().unwrap_or("");
            writer.write_perf_string(name.as_bytes());
            for id in &desc.event_ids {
                writer.write_u64(*id);
            }
        }
    }

    /// Parse the attribute table pointed to by the file header. Each entry
    /// is one attr followed by a section pointing at its array of u64 IDs;
    /// the header's `attr_size` gives the entry stride.
    pub fn parse_attr_section(
        file: &mut ByteReader,
        attr_section: &FileSection,
        attr_size: u64,
    ) -> Result<Vec<Self>, Error> {
        if attr_size <= FileSection::STRUCT_SIZE as u64 {
            return Err(Error::Malformed("attr stride too small"));
        }
        let attr_count = attr_section.size / attr_size;
        let mut entries = Vec::with_capacity(attr_count as usize);
        file.seek_set(section_offset(attr_section)?)?;
        for _ in 0..attr_count {
            let attr = EventAttr::parse(file, None)?;
            let ids_section = FileSection::parse(file)?;
            if !ids_section.fits_within(file.size() as u64) {
                return Err(Error::Malformed("attr ID section out of bounds"));
            }
            let saved_offset = file.tell();
            file.seek_set(section_offset(&ids_section)?)?;
            let mut event_ids = Vec::with_capacity((ids_section.size / 8) as usize);
            for _ in 0..ids_section.size / 8 {
                event_ids.push(file.read_u64()?);
            }
            file.seek_set(saved_offset)?;
            entries.push(AttributeDescription {
                attr,
                name: None,
                event_ids,
            });
        }
        Ok(entries)
    }

    /// Parse the legacy `event_types` table: attr + id-section pairs. Only
    /// consulted when EVENT_DESC is absent.
    pub fn parse_event_types_section(
        file: &mut ByteReader,
        event_types_section: &FileSection,
        attr_size: u64,
    ) -> Result<Vec<Self>, Error> {
        let entry_size = attr_size + FileSection::STRUCT_SIZE as u64;
        let entry_count = event_types_section.size / entry_size;
        let mut pairs = Vec::with_capacity(entry_count as usize);
        file.seek_set(section_offset(event_types_section)?)?;
        for _ in 0..entry_count {
            let attr = EventAttr::parse(file, Some(attr_size as u32))?;
            let ids_section = FileSection::parse(file)?;
            pairs.push((attr, ids_section));
        }

        let mut entries = Vec::with_capacity(pairs.len());
        for (attr, ids_section) in pairs {
            if !ids_section.fits_within(file.size() as u64) {
                return Err(Error::Malformed("event_types ID section out of bounds"));
            }
            file.seek_set(section_offset(&ids_section)?)?;
            let mut event_ids = Vec::with_capacity((ids_section.size / 8) as usize);
            for _ in 0..ids_section.size / 8 {
                event_ids.push(file.read_u64()?);
            }
            entries.push(AttributeDescription {
                attr,
                name: None,
                event_ids,
            });
        }
        Ok(entries)
    }
}

/// `HEADER_CPU_TOPOLOGY`: sibling lists, plus per-CPU core/socket IDs in
/// newer files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuTopology {
    pub core_siblings: Vec<String>,
    pub thread_siblings: Vec<String>,
    pub per_cpu: Vec<CpuTopologyEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTopologyEntry {
    pub core_id: u32,
    pub socket_id: u32,
}

impl CpuTopology {
    /// `nr_cpus_available` from the NRCPUS feature decides whether the
    /// per-CPU extension is present: the section only carries it if there is
    /// room for one entry per available CPU after the sibling lists.
    pub fn parse(reader: &mut ByteReader, nr_cpus_available: Option<u32>) -> Result<Self, Error> {
        let nr_core = reader.read_u32()?;
        let mut core_siblings = Vec::with_capacity(nr_core as usize);
        for _ in 0..nr_core {
            core_siblings.push(HeaderString::parse(reader)?.unwrap_or_default());
        }
        let nr_thread = reader.read_u32()?;
        let mut thread_siblings = Vec::with_capacity(nr_thread as usize);
        for _ in 0..nr_thread {
            thread_siblings.push(HeaderString::parse(reader)?.unwrap_or_default());
        }
        let mut per_cpu = Vec::new();
        if let Some(nr_cpus) = nr_cpus_available {
            if reader.remaining() >= nr_cpus as usize * 8 {
                for _ in 0..nr_cpus {
                    per_cpu.push(CpuTopologyEntry {
                        core_id: reader.read_u32()?,
                        socket_id: reader.read_u32()?,
                    });
                }
            }
        }
        Ok(Self {
            core_siblings,
            thread_siblings,
            per_cpu,
        })
    }

    pub fn write(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.core_siblings.len() as u32);
        for s in &self.core_siblings {
            writer.write_perf_string(s.as_bytes());
        }
        writer.write_u32(self.thread_siblings.len() as u32);
        for s in &self.thread_siblings {
            writer.write_perf_string(s.as_bytes());
        }
        for entry in &self.per_cpu {
            writer.write_u32(entry.core_id);
            writer.write_u32(entry.socket_id);
        }
    }
}

/// `HEADER_NUMA_TOPOLOGY`: one entry per NUMA node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumaNode {
    pub node_id: u32,
    pub mem_total: u64,
    pub mem_free: u64,
    pub cpus: String,
}

pub struct NumaTopology;

impl NumaTopology {
    pub fn parse(reader: &mut ByteReader) -> Result<Vec<NumaNode>, Error> {
        let nr = reader.read_u32()?;
        let mut nodes = Vec::with_capacity(nr as usize);
        for _ in 0..nr {
            let node_id = reader.read_u32()?;
            let mem_total = reader.read_u64()?;
            let mem_free = reader.read_u64()?;
            let cpus = HeaderString::parse(reader)?.unwrap_or_default();
            nodes.push(NumaNode {
                node_id,
                mem_total,
                mem_free,
                cpus,
            });
        }
        Ok(nodes)
    }

    pub fn write(writer: &mut ByteWriter, nodes: &[NumaNode]) {
        writer.write_u32(nodes.len() as u32);
        for node in nodes {
            writer.write_u32(node.node_id);
            writer.write_u64(node.mem_total);
            writer.write_u64(node.mem_free);
            writer.write_perf_string(node.cpus.as_bytes());
        }
    }
}

/// `HEADER_PMU_MAPPINGS`: names of the dynamic PMU types, so that a
/// `type` value in an attr can be traced back to e.g. a kprobe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PmuMapping {
    pub pmu_type: u32,
    pub pmu_name: String,
}

pub struct PmuMappings;

impl PmuMappings {
    pub fn parse(reader: &mut ByteReader) -> Result<Vec<PmuMapping>, Error> {
        let nr = reader.read_u32()?;
        let mut mappings = Vec::with_capacity(nr as usize);
        for _ in 0..nr {
            let pmu_type = reader.read_u32()?;
            if let Some(pmu_name) = HeaderString::parse(reader)? {
                mappings.push(PmuMapping { pmu_type, pmu_name });
            }
        }
        Ok(mappings)
    }

    pub fn write(writer: &mut ByteWriter, mappings: &[PmuMapping]) {
        writer.write_u32(mappings.len() as u32);
        for mapping in mappings {
            writer.write_u32(mapping.pmu_type);
            writer.write_perf_string(mapping.pmu_name.as_bytes());
        }
    }
}

/// `HEADER_GROUP_DESC`: counter group names and membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDesc {
    pub name: String,
    pub leader_idx: u32,
    pub nr_members: u32,
}

impl GroupDesc {
    pub fn parse_section(reader: &mut ByteReader) -> Result<Vec<Self>, Error> {
        let nr = reader.read_u32()?;
        let mut groups = Vec::with_capacity(nr as usize);
        for _ in 0..nr {
            let name = HeaderString::parse(reader)?.unwrap_or_default();
            let leader_idx = reader.read_u32()?;
            let nr_members = reader.read_u32()?;
            groups.push(GroupDesc {
                name,
                leader_idx,
                nr_members,
            });
        }
        Ok(groups)
    }

    pub fn write_section(writer: &mut ByteWriter, groups: &[Self]) {
        writer.write_u32(groups.len() as u32);
        for group in groups {
            writer.write_perf_string(group.name.as_bytes());
            writer.write_u32(group.leader_idx);
            writer.write_u32(group.nr_members);
        }
    }
}

/// Parse a `HEADER_CMDLINE`-style repeated string section.
pub fn parse_string_list(reader: &mut ByteReader) -> Result<Vec<String>, Error> {
    if reader.remaining() < 4 {
        return Err(Error::NotEnoughSpaceForStringListLen);
    }
    let nr = reader.read_u32()?;
    let nr = usize::try_from(nr).map_err(|_| Error::StringListLengthBiggerThanUsize)?;
    let mut strings = Vec::with_capacity(nr);
    for _ in 0..nr {
        strings.push(HeaderString::parse_strict(reader)?);
    }
    Ok(strings)
}

pub fn write_string_list(writer: &mut ByteWriter, strings: &[String]) {
    writer.write_u32(strings.len() as u32);
    for s in strings {
        writer.write_perf_string(s.as_bytes());
    }
}
