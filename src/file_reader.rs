use std::collections::{HashMap, HashSet};

use linear_map::LinearMap;
use log::warn;

use crate::attr::EventAttr;
use crate::buffer::ByteReader;
use crate::build_id_event::BuildIdRecord;
use crate::buildid::BuildIdStore;
use crate::constants::{
    PERF_RECORD_MISC_CPUMODE_MASK, PERF_RECORD_MISC_KERNEL,
    PERF_RECORD_MISC_PROC_MAP_PARSE_TIMEOUT,
};
use crate::endian::Endianness;
use crate::error::Error;
use crate::event_record::{Event, EventData};
use crate::feature_sections::{
    parse_string_list, AttributeDescription, CpuTopology, GroupDesc, HeaderString, NrCpus,
    NumaNode, NumaTopology, PmuMapping, PmuMappings, SampleTimeRange,
};
use crate::features::{Feature, FeatureSet};
use crate::header::FileHeader;
use crate::sample_info::{IdPositions, SampleInfoCodec};
use crate::types::{AttrFlags, RecordType, SampleFormat};

/// Fallible u64 → usize conversion for file offsets and sizes; truncating
/// casts would silently wrap on 32-bit targets.
fn usize_from(value: u64) -> Result<usize, Error> {
    usize::try_from(value).map_err(|_| Error::SectionSizeTooBig)
}

/// The parsed model of one perf.data input: attributes, the event stream in
/// wire order, and the feature metadata. This struct owns all deserialized
/// data; writing it back out never mutates it.
#[derive(Debug, Clone)]
pub struct PerfData {
    endian: Endianness,
    pub attrs: Vec<AttributeDescription>,
    pub events: Vec<Event>,
    pub features: FeatureSet,
    /// Raw feature section payloads, in feature-bit order.
    pub feature_sections: LinearMap<Feature, Vec<u8>>,
    pub build_ids: BuildIdStore,
    /// Opaque ftrace metadata (from the TRACING_DATA feature section or the
    /// piped HEADER_TRACING_DATA record).
    pub tracing_data: Vec<u8>,
    pub is_piped: bool,
    id_positions: IdPositions,
    event_id_to_attr_index: HashMap<u64, usize>,
}

impl PerfData {
    /// Parse a perf.data file from memory, in either the seekable or the
    /// piped layout. Dispatch is by the declared header size.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < FileHeader::PIPE_STRUCT_SIZE {
            return Err(Error::Truncated("file header"));
        }
        let mut magic = [0u8; 8];
        magic.copy_from_slice(&bytes[..8]);
        let endian = FileHeader::detect_endian(&magic)?;

        let mut reader = ByteReader::new(bytes, endian);
        reader.seek_set(8)?;
        let header_size = reader.read_u64()?;
        if header_size == FileHeader::PIPE_STRUCT_SIZE as u64 {
            Self::parse_pipe(reader, endian)
        } else if header_size == FileHeader::STRUCT_SIZE as u64 {
            Self::parse_normal(reader, endian)
        } else {
            Err(Error::Malformed("unrecognized header size"))
        }
    }

    pub fn endian(&self) -> Endianness {
        self.endian
    }

    pub fn id_positions(&self) -> IdPositions {
        self.id_positions
    }

    pub fn attr_index_for_id(&self, id: u64) -> Option<usize> {
        self.event_id_to_attr_index.get(&id).copied()
    }

    fn parse_normal(mut reader: ByteReader, endian: Endianness) -> Result<Self, Error> {
        // The header parser expects the cursor just past the magic; the
        // dispatch above has already consumed the size field.
        reader.seek_set(8)?;
        let header = FileHeader::parse(&mut reader)?;
        let buffer_len = reader.size() as u64;
        for section in [
            &header.attr_section,
            &header.data_section,
            &header.event_types_section,
        ] {
            if !section.fits_within(buffer_len) {
                return Err(Error::Malformed("header section out of bounds"));
            }
        }

        // The feature index sits right after the data section: one
        // (offset, size) entry per set feature bit, in bit order.
        reader.seek_set(usize_from(header.data_section.end())?)?;
        let mut feature_sections_info = Vec::new();
        for feature in header.features.iter() {
            let section = crate::section::FileSection::parse(&mut reader)?;
            if !section.fits_within(buffer_len) {
                return Err(Error::Malformed("feature section out of bounds"));
            }
            feature_sections_info.push((feature, section));
        }

        let mut feature_sections = LinearMap::new();
        for (feature, section) in feature_sections_info {
            reader.seek_set(usize_from(section.offset)?)?;
            let data = reader.read_bytes(usize_from(section.size)?)?.to_vec();
            feature_sections.insert(feature, data);
        }

        // EVENT_DESC supersedes both the legacy event_types table and the
        // plain attribute table; it is the only source that carries names.
        let attrs = if let Some(event_desc) = feature_sections.get(&Feature::EVENT_DESC) {
            let mut desc_reader = ByteReader::new(event_desc, endian);
            AttributeDescription::parse_event_desc_section(&mut desc_reader)?
        } else if header.event_types_section.size != 0 {
            AttributeDescription::parse_event_types_section(
                &mut reader,
                &header.event_types_section,
                header.attr_size,
            )?
        } else {
            AttributeDescription::parse_attr_section(
                &mut reader,
                &header.attr_section,
                header.attr_size,
            )?
        };

        let mut data = PerfData {
            endian,
            attrs: Vec::new(),
            events: Vec::new(),
            features: header.features,
            feature_sections,
            build_ids: BuildIdStore::new(),
            tracing_data: Vec::new(),
            is_piped: false,
            id_positions: IdPositions::from_sample_format(SampleFormat::empty()),
            event_id_to_attr_index: HashMap::new(),
        };
        for attr in attrs {
            data.register_attr(attr)?;
        }
        if data.attrs.is_empty() {
            return Err(Error::NoAttributes);
        }

        data.collect_feature_metadata()?;

        reader.seek_set(usize_from(header.data_section.offset)?)?;
        let data_end = usize_from(header.data_section.end())?;
        while reader.tell() < data_end {
            data.read_one_record(&mut reader, data_end)?;
        }

        Ok(data)
    }

    fn parse_pipe(mut reader: ByteReader, endian: Endianness) -> Result<Self, Error> {
        let mut data = PerfData {
            endian,
            attrs: Vec::new(),
            events: Vec::new(),
            features: FeatureSet::default(),
            feature_sections: LinearMap::new(),
            build_ids: BuildIdStore::new(),
            tracing_data: Vec::new(),
            is_piped: true,
            id_positions: IdPositions::from_sample_format(SampleFormat::empty()),
            event_id_to_attr_index: HashMap::new(),
        };
        let mut seen_ids = HashSet::new();
        let mut seen_configs = HashSet::new();

        let end = reader.size();
        while reader.tell() < end {
            data.read_one_pipe_record(&mut reader, end, &mut seen_ids, &mut seen_configs)?;
        }

        if data.attrs.is_empty() {
            return Err(Error::NoAttributes);
        }
        Ok(data)
    }

    /// Add one attribute, keeping the ID routing table and the cross-attr
    /// position invariant up to date.
    fn register_attr(&mut self, desc: AttributeDescription) -> Result<(), Error> {
        let positions = IdPositions::from_sample_format(desc.attr.sample_format);
        if self.attrs.is_empty() {
            self.id_positions = positions;
        } else if positions != self.id_positions {
            return Err(Error::InconsistentSampleIdPosition(self.attrs.len()));
        }
        let attr_index = self.attrs.len();
        for id in &desc.event_ids {
            self.event_id_to_attr_index.insert(*id, attr_index);
        }
        self.attrs.push(desc);

        // With several attributes, records must carry an ID or they cannot
        // be routed; refuse the file rather than guessing.
        if self.attrs.len() > 1 {
            for (i, desc) in self.attrs.iter().enumerate() {
                let sample_format = desc.attr.sample_format;
                if !sample_format.contains(SampleFormat::ID)
                    && !sample_format.contains(SampleFormat::IDENTIFIER)
                {
                    return Err(Error::MissingIdWithMultipleAttrs(i));
                }
            }
        }
        Ok(())
    }

    /// Replace the whole attribute set (EVENT_DESC redefining attrs that
    /// already appeared elsewhere replaces wholesale).
    fn replace_attrs(&mut self, attrs: Vec<AttributeDescription>) -> Result<(), Error> {
        self.attrs.clear();
        self.event_id_to_attr_index.clear();
        for attr in attrs {
            self.register_attr(attr)?;
        }
        Ok(())
    }

    fn attr_index_for_record(&self, record_type: RecordType, body: &[u8]) -> Result<usize, Error> {
        if self.event_id_to_attr_index.is_empty() {
            return Ok(0);
        }
        // Non-SAMPLE records only carry an ID inside their sample-info
        // trailer, which exists iff sample_id_all is set.
        if record_type != RecordType::SAMPLE {
            let sample_id_all = self
                .attrs
                .first()
                .is_some_and(|desc| desc.attr.sample_id_all());
            if !sample_id_all {
                return Ok(0);
            }
        }
        match self.id_positions.extract_id(record_type, body, self.endian) {
            Some(id) => match self.event_id_to_attr_index.get(&id) {
                Some(index) => Ok(*index),
                None if record_type == RecordType::SAMPLE => Err(Error::UnknownEventId(id)),
                None => Ok(0),
            },
            None => Ok(0),
        }
    }

    /// Read one record from the data section / pipe stream. Returns the
    /// record type, or `None` for records that were skipped.
    fn read_one_record(
        &mut self,
        reader: &mut ByteReader,
        end: usize,
    ) -> Result<Option<RecordType>, Error> {
        let record_start = reader.tell();
        if end - record_start < 8 {
            return Err(Error::Truncated("record header"));
        }
        let type_ = reader.read_u32()?;
        let misc = reader.read_u16()?;
        let size = reader.read_u16()? as usize;
        if size < 8 {
            return Err(Error::InvalidPerfEventSize);
        }
        if record_start + size > end {
            return Err(Error::Truncated("record payload"));
        }
        let record_type = RecordType(type_);
        let body = reader.read_bytes(size - 8)?;

        if EventData::fixed_payload_size(record_type).is_none() {
            warn!("skipping unrecognized record type {}", type_);
            return Ok(None);
        }

        // MMAP records from a timed-out /proc/PID/maps walk are unreliable.
        if (record_type == RecordType::MMAP || record_type == RecordType::MMAP2)
            && misc & PERF_RECORD_MISC_PROC_MAP_PARSE_TIMEOUT != 0
        {
            warn!("skipping MMAP record from timed-out proc map parse");
            return Ok(None);
        }

        let attr_index = if record_type.is_kernel_type() {
            self.attr_index_for_record(record_type, body)?
        } else {
            0
        };
        let attr = self
            .attrs
            .get(attr_index)
            .ok_or(Error::NoAttributes)?
            .attr;

        let codec = SampleInfoCodec::new(&attr);
        let trailer_size = if EventData::embeds_sample_info(record_type) && attr.sample_id_all() {
            codec.trailer_size()
        } else {
            0
        };

        let mut body_reader = ByteReader::new(body, self.endian);
        let event_data = EventData::parse(record_type, misc, &mut body_reader, &attr, trailer_size)?;
        let sample_info = if trailer_size != 0 {
            Some(codec.parse(&mut body_reader)?)
        } else {
            None
        };

        // A kernel MMAP of length zero under exclude_kernel comes from a
        // broken capture; drop it like the original tool does.
        if let EventData::Mmap(mmap) = &event_data {
            if mmap.len == 0
                && misc & PERF_RECORD_MISC_CPUMODE_MASK == PERF_RECORD_MISC_KERNEL
                && attr.flags.contains(AttrFlags::EXCLUDE_KERNEL)
            {
                warn!("skipping zero-length kernel MMAP from broken capture");
                return Ok(Some(record_type));
            }
        }

        let mut event = Event {
            misc,
            data: event_data,
            sample_info,
            attr_index,
        };

        // AUXTRACE is followed by its trace bytes, which are not counted in
        // the record's own size.
        if let EventData::Auxtrace(auxtrace) = &mut event.data {
            let trace_len = usize_from(auxtrace.size)?;
            match reader.tell().checked_add(trace_len) {
                Some(trace_end) if trace_end <= end => {}
                _ => return Err(Error::Truncated("auxtrace data")),
            }
            auxtrace.trace_data = reader.read_bytes(trace_len)?.to_vec();
        }

        self.events.push(event);
        Ok(Some(record_type))
    }

    fn read_one_pipe_record(
        &mut self,
        reader: &mut ByteReader,
        end: usize,
        seen_ids: &mut HashSet<u64>,
        seen_configs: &mut HashSet<u64>,
    ) -> Result<(), Error> {
        let record_start = reader.tell();
        if end - record_start < 8 {
            return Err(Error::Truncated("record header"));
        }
        let mut peek = *reader;
        let type_ = peek.read_u32()?;
        let misc = peek.read_u16()?;
        let size = peek.read_u16()? as usize;
        if size < 8 {
            return Err(Error::InvalidPerfEventSize);
        }
        if record_start + size > end {
            return Err(Error::Truncated("record payload"));
        }
        let record_type = RecordType(type_);

        match record_type {
            RecordType::HEADER_ATTR => {
                reader.skip(8)?;
                let body_bytes = reader.read_bytes(size - 8)?;
                let mut body = ByteReader::new(body_bytes, self.endian);
                let attr = EventAttr::parse(&mut body, None)?;
                let mut event_ids = Vec::with_capacity(body.remaining() / 8);
                while body.remaining() >= 8 {
                    event_ids.push(body.read_u64()?);
                }
                self.register_pipe_attr(
                    AttributeDescription {
                        attr,
                        name: None,
                        event_ids,
                    },
                    seen_ids,
                    seen_configs,
                )?;
            }
            RecordType::HEADER_EVENT_TYPE => {
                reader.skip(8)?;
                let body_bytes = reader.read_bytes(size - 8)?;
                let mut body = ByteReader::new(body_bytes, self.endian);
                let event_id = body.read_u64()?;
                let name = body.read_string_padded(body.remaining())?.to_vec();
                // The legacy event-type record names the attr whose config
                // matches its event id.
                for desc in &mut self.attrs {
                    if desc.attr.config == event_id && desc.name.is_none() {
                        desc.name = String::from_utf8(name.clone()).ok();
                    }
                }
            }
            RecordType::HEADER_TRACING_DATA => {
                // This record's header size is a known lie: the actual
                // length of the tracing data is a u32 in the payload, and
                // the data itself follows the record in the stream.
                reader.skip(8)?;
                let body_bytes = reader.read_bytes(size - 8)?;
                let mut body = ByteReader::new(body_bytes, self.endian);
                let tracing_data_size = body.read_u32()? as usize;
                match reader.tell().checked_add(tracing_data_size) {
                    Some(tracing_end) if tracing_end <= end => {}
                    _ => return Err(Error::Truncated("tracing data")),
                }
                self.tracing_data = reader.read_bytes(tracing_data_size)?.to_vec();
                self.features.insert(Feature::TRACING_DATA);
            }
            RecordType::HEADER_BUILD_ID => {
                // The whole record is a build_id_event, header included.
                let record_bytes = reader.read_bytes(size)?;
                let mut record_reader = ByteReader::new(record_bytes, self.endian);
                let record = BuildIdRecord::parse(&mut record_reader)?;
                self.build_ids.observe_record(&record);
                self.features.insert(Feature::BUILD_ID);
            }
            RecordType::HEADER_FEATURE => {
                reader.skip(8)?;
                let body_bytes = reader.read_bytes(size - 8)?;
                let mut body = ByteReader::new(body_bytes, self.endian);
                let feat_id = body.read_u64()? as u32;
                let payload = body.read_bytes(body.remaining())?.to_vec();
                let feature = Feature(feat_id);
                if feature == Feature::EVENT_DESC {
                    // EVENT_DESC replaces any attrs synthesized so far.
                    let mut desc_reader = ByteReader::new(&payload, self.endian);
                    let attrs = AttributeDescription::parse_event_desc_section(&mut desc_reader)?;
                    if !attrs.is_empty() {
                        self.replace_attrs(attrs)?;
                    }
                }
                self.features.insert(feature);
                self.feature_sections.insert(feature, payload);
            }
            _ => {
                if misc == 0 && type_ == 0 {
                    // A zeroed header means a truncated producer; stop.
                    return Err(Error::Malformed("zeroed record header in pipe stream"));
                }
                self.read_one_record(reader, end)?;
                return Ok(());
            }
        }
        Ok(())
    }

    /// Attribute dedup for pipe streams: the same attr arrives both as
    /// HEADER_ATTR and inside EVENT_DESC, keyed by its first ID, or by its
    /// config value when it carries no IDs.
    fn register_pipe_attr(
        &mut self,
        desc: AttributeDescription,
        seen_ids: &mut HashSet<u64>,
        seen_configs: &mut HashSet<u64>,
    ) -> Result<(), Error> {
        if let Some(first_id) = desc.event_ids.first() {
            if !seen_ids.insert(*first_id) {
                return Ok(());
            }
        } else if !seen_configs.insert(desc.attr.config) {
            return Ok(());
        }
        self.register_attr(desc)
    }

    /// Pull the parsed forms out of the BUILD_ID and TRACING_DATA sections.
    fn collect_feature_metadata(&mut self) -> Result<(), Error> {
        if let Some(section) = self.feature_sections.get(&Feature::BUILD_ID) {
            let mut reader = ByteReader::new(section, self.endian);
            let records = BuildIdRecord::parse_section(&mut reader)?;
            if reader.remaining() != 0 {
                warn!(
                    "BUILD_ID feature section has {} unconsumed bytes",
                    reader.remaining()
                );
            }
            for record in &records {
                self.build_ids.observe_record(record);
            }
        }
        if let Some(section) = self.feature_sections.get(&Feature::TRACING_DATA) {
            self.tracing_data = section.clone();
        }
        Ok(())
    }

    fn feature_reader(&self, feature: Feature) -> Option<ByteReader<'_>> {
        self.feature_sections
            .get(&feature)
            .map(|section| ByteReader::new(section, self.endian))
    }

    /// Only call this for features whose section is just a perf_header_string.
    fn feature_string(&self, feature: Feature) -> Result<Option<String>, Error> {
        match self.feature_reader(feature) {
            Some(mut reader) => Ok(Some(HeaderString::parse_strict(&mut reader)?)),
            None => Ok(None),
        }
    }

    /// The hostname where the data was collected (`uname -n`).
    pub fn hostname(&self) -> Result<Option<String>, Error> {
        self.feature_string(Feature::HOSTNAME)
    }

    /// The OS release where the data was collected (`uname -r`).
    pub fn os_release(&self) -> Result<Option<String>, Error> {
        self.feature_string(Feature::OSRELEASE)
    }

    /// The perf user tool version used to collect the data.
    pub fn perf_version(&self) -> Result<Option<String>, Error> {
        self.feature_string(Feature::VERSION)
    }

    /// The CPU architecture (`uname -m`).
    pub fn arch(&self) -> Result<Option<String>, Error> {
        self.feature_string(Feature::ARCH)
    }

    /// The CPU description, e.g. the model name from `/proc/cpuinfo`.
    pub fn cpu_desc(&self) -> Result<Option<String>, Error> {
        self.feature_string(Feature::CPUDESC)
    }

    /// The exact CPU type, e.g. `GenuineIntel,6,69,1`.
    pub fn cpu_id(&self) -> Result<Option<String>, Error> {
        self.feature_string(Feature::CPUID)
    }

    pub fn nr_cpus(&self) -> Result<Option<NrCpus>, Error> {
        self.feature_reader(Feature::NRCPUS)
            .map(|mut reader| NrCpus::parse(&mut reader))
            .transpose()
    }

    /// Total memory in kilobytes (MemTotal from /proc/meminfo).
    pub fn total_mem(&self) -> Result<Option<u64>, Error> {
        self.feature_reader(Feature::TOTAL_MEM)
            .map(|mut reader| reader.read_u64())
            .transpose()
    }

    /// The perf arg-vector used to collect the data.
    pub fn cmdline(&self) -> Result<Option<Vec<String>>, Error> {
        self.feature_reader(Feature::CMDLINE)
            .map(|mut reader| parse_string_list(&mut reader))
            .transpose()
    }

    pub fn cpu_topology(&self) -> Result<Option<CpuTopology>, Error> {
        let nr_cpus = self.nr_cpus()?.map(|n| n.nr_cpus_available);
        self.feature_reader(Feature::CPU_TOPOLOGY)
            .map(|mut reader| CpuTopology::parse(&mut reader, nr_cpus))
            .transpose()
    }

    pub fn numa_topology(&self) -> Result<Option<Vec<NumaNode>>, Error> {
        self.feature_reader(Feature::NUMA_TOPOLOGY)
            .map(|mut reader| NumaTopology::parse(&mut reader))
            .transpose()
    }

    pub fn pmu_mappings(&self) -> Result<Option<Vec<PmuMapping>>, Error> {
        self.feature_reader(Feature::PMU_MAPPINGS)
            .map(|mut reader| PmuMappings::parse(&mut reader))
            .transpose()
    }

    pub fn group_descs(&self) -> Result<Option<Vec<GroupDesc>>, Error> {
        self.feature_reader(Feature::GROUP_DESC)
            .map(|mut reader| GroupDesc::parse_section(&mut reader))
            .transpose()
    }

    pub fn sample_time_range(&self) -> Result<Option<SampleTimeRange>, Error> {
        self.feature_reader(Feature::SAMPLE_TIME)
            .map(|mut reader| SampleTimeRange::parse(&mut reader))
            .transpose()
    }

    /// Whether the data section holds `perf stat record` output.
    pub fn is_stats(&self) -> bool {
        self.features.has_feature(Feature::STAT)
    }

    /// Whether branch stacks were sampled.
    pub fn has_branch_stack(&self) -> bool {
        self.features.has_feature(Feature::BRANCH_STACK)
    }

    /// Sort the events stably by timestamp. Only possible when every
    /// attribute samples TIME; otherwise the order is left untouched.
    /// Returns whether a sort happened.
    pub fn maybe_sort_events_by_time(&mut self) -> bool {
        let all_have_time = self
            .attrs
            .iter()
            .all(|desc| desc.attr.sample_format.contains(SampleFormat::TIME));
        if !all_have_time {
            return false;
        }
        self.events
            .sort_by_key(|event| event.timestamp().unwrap_or(0));
        true
    }

    /// Replace or add build ID entries from a `filename → hex ID` map.
    /// For filenames with no existing entry, the misc field is taken from
    /// the first MMAP or MMAP2 record seen for that filename, defaulting to
    /// a kernel entry.
    pub fn inject_build_ids(&mut self, filenames_to_build_ids: &HashMap<Vec<u8>, String>) {
        let mut filename_to_misc: HashMap<&[u8], u16> = HashMap::new();
        for event in &self.events {
            let filename = match &event.data {
                EventData::Mmap(mmap) => Some(mmap.filename.as_slice()),
                EventData::Mmap2(mmap) => Some(mmap.filename.as_slice()),
                _ => None,
            };
            if let Some(filename) = filename {
                filename_to_misc.entry(filename).or_insert(event.misc);
            }
        }
        for (filename, hex) in filenames_to_build_ids {
            let misc = filename_to_misc.get(filename.as_slice()).copied();
            self.build_ids.inject(filename, hex, misc);
        }
        self.features.insert(Feature::BUILD_ID);
    }

    /// Rewrite filenames keyed by build ID: every file whose stored build
    /// ID appears in the map gets the mapped filename, in MMAP records and
    /// in the build ID store alike.
    pub fn localize_by_build_id(&mut self, build_ids_to_filenames: &HashMap<String, Vec<u8>>) {
        let mut filename_map = HashMap::new();
        for filename in self.build_ids.filenames() {
            if let Some(hex) = self.build_ids.get(filename) {
                if let Some(new_filename) = build_ids_to_filenames.get(hex) {
                    filename_map.insert(filename.to_vec(), new_filename.clone());
                }
            }
        }
        self.localize_by_filename(&filename_map);
    }

    /// Rewrite filenames keyed by old filename.
    pub fn localize_by_filename(&mut self, filename_map: &HashMap<Vec<u8>, Vec<u8>>) {
        for event in &mut self.events {
            let filename = match &mut event.data {
                EventData::Mmap(mmap) => &mut mmap.filename,
                EventData::Mmap2(mmap) => &mut mmap.filename,
                _ => continue,
            };
            if let Some(new_filename) = filename_map.get(filename.as_slice()) {
                *filename = new_filename.clone();
            }
        }
        for (old, new) in filename_map {
            self.build_ids.rename(old, new);
        }
    }

    /// Duplicate each build ID entry under every alternate filename in the
    /// `old → new` multimap.
    pub fn add_alternate_filenames(&mut self, alternates: &[(Vec<u8>, Vec<u8>)]) {
        self.build_ids.add_alternate_filenames(alternates);
    }
}
