//! # linux-perf-convert
//!
//! This crate parses `perf.data` files produced by `perf record` (both the
//! seekable layout and the piped streaming layout, in either byte order),
//! resolves sample addresses against the memory maps observed during
//! recording, and re-emits the profile either as structured messages for
//! downstream analysis pipelines or as a compatible `perf.data` file.
//!
//! ## Example
//!
//! ```no_run
//! use linux_perf_convert::{ParseOptions, PerfData, PerfParser};
//!
//! # fn wrapper() -> Result<(), linux_perf_convert::Error> {
//! let bytes = std::fs::read("perf.data")?;
//! let mut data = PerfData::parse_bytes(&bytes)?;
//! println!("host: {:?}, events: {}", data.hostname()?, data.events.len());
//!
//! let mut parser = PerfParser::new(&mut data, ParseOptions::default());
//! parser.parse()?;
//! let (parsed, stats) = parser.into_parsed();
//! println!("{} of {} samples mapped", stats.num_sample_events_mapped, stats.num_sample_events);
//!
//! let profile = linux_perf_convert::serialize_profile(&data, &parsed, &stats);
//! # let _ = profile;
//! # Ok(())
//! # }
//! ```

mod address_map;
mod attr;
mod buffer;
mod build_id_event;
mod buildid;
pub mod constants;
mod endian;
mod error;
mod event_record;
mod feature_sections;
mod features;
mod file_reader;
mod file_writer;
mod header;
mod parser;
mod probe;
pub mod proto;
mod sample;
mod sample_info;
mod section;
mod serializer;
mod types;

pub use address_map::{InodeInfo, Mapping, MappingTable};
pub use attr::EventAttr;
pub use buffer::{ByteReader, ByteWriter};
pub use build_id_event::BuildIdRecord;
pub use buildid::{
    bytes_to_hex, hex_to_bytes, perfize_build_id, trim_zeroes_build_id, BuildIdStore,
};
pub use endian::Endianness;
pub use error::Error;
pub use event_record::{
    AuxRecord, AuxtraceErrorRecord, AuxtraceInfoRecord, AuxtraceRecord, CgroupRecord, CommRecord,
    Event, EventData, ForkOrExitRecord, ItraceStartRecord, LostRecord, LostSamplesRecord,
    Mmap2FileId, Mmap2Record, MmapRecord, NamespaceEntry, NamespacesRecord, StatConfigEntry,
    StatConfigRecord, StatRecord, StatRoundRecord, SwitchCpuWideRecord, ThreadMapEntry,
    ThreadMapRecord, ThrottleRecord, TimeConvExtension, TimeConvRecord,
};
pub use feature_sections::{
    AttributeDescription, CpuTopology, CpuTopologyEntry, GroupDesc, NrCpus, NumaNode, PmuMapping,
    SampleTimeRange,
};
pub use features::{Feature, FeatureSet};
pub use file_reader::PerfData;
pub use parser::{
    BranchResolution, CancelToken, DsoAndOffset, ParseOptions, ParsedEvent, PerfParser, Stats,
};
pub use probe::{FileStat, FileSystemProbe, LocalFs};
pub use sample::{
    BranchEntry, BranchStack, ReadGroupEntry, ReadValue, RegsDump, SampleRecord, StackDump, Weight,
};
pub use sample_info::{IdPosition, IdPositions, SampleInfo, SampleInfoCodec};
pub use serializer::serialize_profile;
pub use types::{
    AttrFlags, BranchSampleFormat, CpuMode, HwBreakpointType, ReadFormat, RecordType, SampleFormat,
};
